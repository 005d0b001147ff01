//! In-memory form of a saved map.
//!
//! Format-specific encodings and schema validation belong to the codec;
//! the map only produces and consumes these records.

use serde::{Deserialize, Serialize};

use super::{ElementKind, MetrolineId, Orientation, Rgb, StationShape};
use crate::geometry::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub intermediate: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetrolineRecord {
    pub id: MetrolineId,
    pub color: Rgb,
    pub segments: Vec<SegmentRecord>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "type", default)]
    pub station_type: String,
    pub position: Point,
    pub orientation: Orientation,
    pub shape: StationShape,
    pub width: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    pub metrolines: Vec<MetrolineId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub kind: ElementKind,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub width: f64,
    pub height: f64,
    pub metrolines: Vec<MetrolineRecord>,
    pub stations: Vec<StationRecord>,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
}
