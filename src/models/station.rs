use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{MetrolineId, StationId};
use crate::constants::{
    DEBUG_SAMPLE_STEP, GRID_SIZE, MAX_CONNECTION_WIDTH, MIN_CONNECTION_WIDTH, STATION_SIZE,
    TERMINUS_SIZE,
};
use crate::error::{ensure_finite, MapError};
use crate::geometry::{rotated_rect_vertices, sample_points_on_polygon_edges, Point, Rect};

/// Station marker variant; each has its own geometry and detection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationShape {
    #[default]
    Normal,
    Start,
    End,
    Connection,
}

impl StationShape {
    pub const ALL: [StationShape; 4] = [Self::Normal, Self::Start, Self::End, Self::Connection];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Start => "start",
            Self::End => "end",
            Self::Connection => "connection",
        }
    }

    /// Only connection stations may touch several metrolines
    #[must_use]
    pub fn is_multi_line(self) -> bool {
        matches!(self, Self::Connection)
    }
}

impl FromStr for StationShape {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or_else(|| MapError::InvalidShape(s.to_string()))
    }
}

impl fmt::Display for StationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the eight compass orientations, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Orientation {
    #[default]
    Deg0,
    Deg45,
    Deg90,
    Deg135,
    Deg180,
    Deg225,
    Deg270,
    Deg315,
}

impl Orientation {
    #[must_use]
    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg45 => 45,
            Self::Deg90 => 90,
            Self::Deg135 => 135,
            Self::Deg180 => 180,
            Self::Deg225 => 225,
            Self::Deg270 => 270,
            Self::Deg315 => 315,
        }
    }

    /// Canonical rotation angle plus the inverse flag used to mirror text and buttons.
    ///
    /// 90/135/180/225 render as mirrored 270/315/0/45.
    #[must_use]
    pub fn canonical(self) -> (u16, bool) {
        match self {
            Self::Deg0 => (0, false),
            Self::Deg45 => (45, false),
            Self::Deg270 => (270, false),
            Self::Deg315 => (315, false),
            Self::Deg90 => (270, true),
            Self::Deg135 => (315, true),
            Self::Deg180 => (0, true),
            Self::Deg225 => (45, true),
        }
    }
}

impl TryFrom<u16> for Orientation {
    type Error = MapError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Deg0),
            45 => Ok(Self::Deg45),
            90 => Ok(Self::Deg90),
            135 => Ok(Self::Deg135),
            180 => Ok(Self::Deg180),
            225 => Ok(Self::Deg225),
            270 => Ok(Self::Deg270),
            315 => Ok(Self::Deg315),
            other => Err(MapError::InvalidOrientation(other)),
        }
    }
}

impl From<Orientation> for u16 {
    fn from(value: Orientation) -> Self {
        value.degrees()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub date: String,
    pub station_type: String,
    pub description: String,
    pub link: Option<String>,
    pub orientation: Orientation,
    pub shape: StationShape,
    pub width: u8,
    pub position: Point,
    /// First entry is the primary metroline
    pub metrolines: Vec<MetrolineId>,
}

impl Station {
    #[must_use]
    pub fn new(shape: StationShape, position: Point, metroline: MetrolineId) -> Self {
        Self {
            id: StationId::generate(),
            name: "Station".to_string(),
            date: String::new(),
            station_type: String::new(),
            description: String::new(),
            link: None,
            orientation: Orientation::default(),
            shape,
            width: MIN_CONNECTION_WIDTH,
            position,
            metrolines: vec![metroline],
        }
    }

    #[must_use]
    pub fn primary_metroline(&self) -> Option<&MetrolineId> {
        self.metrolines.first()
    }

    /// Whether this station references `metroline` at all
    #[must_use]
    pub fn uses_metroline(&self, metroline: &MetrolineId) -> bool {
        self.metrolines.contains(metroline)
    }

    /// # Errors
    /// Returns an error if the name is blank
    pub fn set_name(&mut self, name: String) -> Result<(), MapError> {
        if name.trim().is_empty() {
            return Err(MapError::MissingField("name"));
        }
        self.name = name;
        Ok(())
    }

    pub fn set_type(&mut self, station_type: String) {
        self.station_type = station_type;
    }

    pub fn set_date(&mut self, date: String) {
        self.date = date;
    }

    pub fn set_description(&mut self, description: String) {
        self.description = description;
    }

    /// Blank links clear the field
    pub fn set_link(&mut self, link: Option<String>) {
        self.link = link.filter(|l| !l.trim().is_empty());
    }

    /// Non-connection shapes keep only their primary metroline
    pub fn set_shape(&mut self, shape: StationShape) {
        self.shape = shape;
        if !shape.is_multi_line() {
            self.metrolines.truncate(1);
        }
    }

    /// # Errors
    /// Returns an error if `width` is outside 2-7
    pub fn set_width(&mut self, width: u8) -> Result<(), MapError> {
        if !(MIN_CONNECTION_WIDTH..=MAX_CONNECTION_WIDTH).contains(&width) {
            return Err(MapError::InvalidWidth(width));
        }
        self.width = width;
        Ok(())
    }

    /// # Errors
    /// Returns an error if `degrees` is not one of the eight compass values
    pub fn set_orientation(&mut self, degrees: u16) -> Result<(), MapError> {
        self.orientation = Orientation::try_from(degrees)?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if either coordinate is not finite
    pub fn set_position(&mut self, x: f64, y: f64) -> Result<(), MapError> {
        ensure_finite(x, y)?;
        self.position = (x, y);
        Ok(())
    }

    /// Marker extent; only connection stations grow with `width`
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        match self.shape {
            StationShape::Normal => (STATION_SIZE, STATION_SIZE),
            StationShape::Start | StationShape::End => (TERMINUS_SIZE, TERMINUS_SIZE),
            StationShape::Connection => (STATION_SIZE, f64::from(self.width) * GRID_SIZE),
        }
    }

    /// Corners of the connection box, rotated for the station's orientation.
    ///
    /// Unrotated, the long side runs vertically. Canonical 270 swaps the axes
    /// instead of rotating; 45 and 315 rotate about the station position.
    #[must_use]
    pub fn connection_box(&self) -> [Point; 4] {
        let (thickness, length) = self.size();
        let (angle, _) = self.orientation.canonical();
        let (width, height, rotation) = match angle {
            270 => (length, thickness, 0.0),
            0 => (thickness, length, 0.0),
            other => (thickness, length, f64::from(other)),
        };

        let (cx, cy) = self.position;
        rotated_rect_vertices(
            cx - width / 2.0,
            cy - height / 2.0,
            width,
            height,
            rotation,
            self.position,
        )
    }

    /// Sample points along the connection box outline, for debug overlays
    #[must_use]
    pub fn connection_box_samples(&self) -> Vec<Point> {
        sample_points_on_polygon_edges(&self.connection_box(), DEBUG_SAMPLE_STEP)
    }

    /// Axis-aligned bounds of the rendered marker
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self.shape {
            StationShape::Connection => Rect::bounding(&self.connection_box())
                .unwrap_or_else(|| Rect::centered(self.position, STATION_SIZE, STATION_SIZE)),
            _ => {
                let (w, h) = self.size();
                Rect::centered(self.position, w, h)
            }
        }
    }
}
