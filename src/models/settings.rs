use serde::{Deserialize, Serialize};

use super::Rgb;
use crate::constants::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DIRECTION_LOCK_MARGIN, GRID_SIZE,
    LEGEND_COLUMN_CAPACITY, LINE_TOLERANCE, REDETECT_INTERVAL_MS, UNDO_CAPACITY,
};
use crate::error::MapError;

/// Editor configuration; omitted fields take their defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub grid_size: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub line_tolerance: f64,
    pub direction_lock_margin: f64,
    pub undo_capacity: usize,
    pub redetect_interval_ms: i64,
    pub use_spatial_index: bool,
    pub legend_column_capacity: usize,
    pub default_color: Rgb,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            line_tolerance: LINE_TOLERANCE,
            direction_lock_margin: DIRECTION_LOCK_MARGIN,
            undo_capacity: UNDO_CAPACITY,
            redetect_interval_ms: REDETECT_INTERVAL_MS,
            use_spatial_index: true,
            legend_column_capacity: LEGEND_COLUMN_CAPACITY,
            default_color: Rgb::default(),
        }
    }
}

impl EditorSettings {
    /// Parse settings from JSON, filling omitted fields with defaults
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a value is out of range
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| MapError::InvalidSettings(format!("Failed to parse settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> Result<String, MapError> {
        serde_json::to_string(self)
            .map_err(|e| MapError::InvalidSettings(format!("Failed to serialize settings: {e}")))
    }

    /// # Errors
    /// Returns an error naming the first out-of-range value
    pub fn validate(&self) -> Result<(), MapError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.grid_size) {
            return Err(MapError::InvalidSettings(format!("grid_size {}", self.grid_size)));
        }
        if !positive(self.canvas_width) || !positive(self.canvas_height) {
            return Err(MapError::InvalidCanvasSize {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if !positive(self.line_tolerance) {
            return Err(MapError::InvalidSettings(format!("line_tolerance {}", self.line_tolerance)));
        }
        if !self.direction_lock_margin.is_finite() || self.direction_lock_margin < 0.0 {
            return Err(MapError::InvalidSettings(format!(
                "direction_lock_margin {}",
                self.direction_lock_margin
            )));
        }
        if self.undo_capacity == 0 {
            return Err(MapError::InvalidSettings("undo_capacity 0".to_string()));
        }
        if self.redetect_interval_ms < 0 {
            return Err(MapError::InvalidSettings(format!(
                "redetect_interval_ms {}",
                self.redetect_interval_ms
            )));
        }
        if self.legend_column_capacity == 0 {
            return Err(MapError::InvalidSettings("legend_column_capacity 0".to_string()));
        }
        Ok(())
    }

    /// Finer alignment used once a metroline exists
    #[must_use]
    pub fn half_grid(&self) -> f64 {
        self.grid_size / 2.0
    }
}
