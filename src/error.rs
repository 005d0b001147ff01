use thiserror::Error;

use crate::models::{ElementKind, MetrolineId, SegmentId, StationId};

/// Failures surfaced by map operations.
///
/// A call that returns an error has not modified the map.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Invalid color '{0}': expected rgb(r, g, b) with components 0-255")]
    InvalidColor(String),
    #[error("Invalid orientation {0}: expected one of 0, 45, 90, 135, 180, 225, 270, 315")]
    InvalidOrientation(u16),
    #[error("Invalid connection width {0}: expected 2-7")]
    InvalidWidth(u8),
    #[error("Invalid station shape '{0}'")]
    InvalidShape(String),
    #[error("Invalid coordinate ({x}, {y})")]
    InvalidCoordinate { x: f64, y: f64 },
    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvasSize { width: f64, height: f64 },
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Color {0} is already used by another metroline")]
    DuplicateColor(String),
    #[error("Unknown metroline '{0}'")]
    UnknownMetroline(MetrolineId),
    #[error("Unknown station '{0}'")]
    UnknownStation(StationId),
    #[error("Unknown segment {0}")]
    UnknownSegment(SegmentId),
    #[error("Metroline '{0}' cannot be removed while stations depend on it")]
    MetrolineInUse(MetrolineId),
    #[error("Element {0:?} has no editable text")]
    NotTextElement(ElementKind),
    #[error("No active gesture to {0}")]
    NoActiveGesture(&'static str),
    #[error("A gesture is already in progress")]
    GestureInProgress,
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Rejects NaN and infinite coordinates
///
/// # Errors
/// Returns [`MapError::InvalidCoordinate`] when either value is not finite
pub fn ensure_finite(x: f64, y: f64) -> Result<(), MapError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(MapError::InvalidCoordinate { x, y })
    }
}
