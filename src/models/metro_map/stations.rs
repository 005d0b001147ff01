use super::MetroMap;
use crate::error::{ensure_finite, MapError};
use crate::events::{MapEvent, StationChanges};
use crate::geometry::{snap_point, Point};
use crate::models::{MetrolineId, Station, StationId, StationShape};

/// A single attribute change applied through [`Stations::edit_station`]
#[derive(Debug, Clone, PartialEq)]
pub enum StationEdit {
    Name(String),
    Type(String),
    Date(String),
    Description(String),
    Link(Option<String>),
    Shape(StationShape),
    Width(u8),
    Orientation(u16),
    Position(f64, f64),
}

impl StationEdit {
    fn changes(&self) -> StationChanges {
        match self {
            Self::Name(_) | Self::Type(_) | Self::Date(_) | Self::Description(_) | Self::Link(_) => {
                StationChanges::TEXT
            }
            Self::Shape(_) | Self::Width(_) => StationChanges::SHAPE,
            Self::Orientation(_) => StationChanges::ORIENTATION,
            Self::Position(..) => StationChanges::POSITION,
        }
    }
}

/// Extension trait for station-related operations on `MetroMap`
pub trait Stations {
    /// Place a station at the grid-aligned position. Returns its id.
    ///
    /// The station gets a provisional metroline right away; full connection
    /// detection runs on the next layout settle.
    fn place_station(&mut self, shape: StationShape, x: f64, y: f64) -> Result<StationId, MapError>;

    fn remove_station(&mut self, id: StationId) -> Result<Station, MapError>;

    /// Apply one attribute change, returning what needs re-synchronizing
    fn edit_station(&mut self, id: StationId, edit: StationEdit) -> Result<StationChanges, MapError>;

    /// Move a station to the grid-aligned position. Returns the aligned position.
    fn move_station(&mut self, id: StationId, x: f64, y: f64) -> Result<Point, MapError>;

    /// Recompute which metrolines a station belongs to.
    /// Returns the associations, primary first.
    fn update_station_metroline_ids(&mut self, id: StationId) -> Result<Vec<MetrolineId>, MapError>;

    /// Recompute associations for every station. Returns how many changed.
    fn update_all_station_metroline_ids(&mut self) -> Result<usize, MapError>;
}

impl MetroMap {
    fn station_mut(&mut self, id: StationId) -> Result<&mut Station, MapError> {
        self.stations.get_mut(&id).ok_or(MapError::UnknownStation(id))
    }

    /// Metrolines a station should reference, primary first
    fn detect_metrolines(&self, station: &Station) -> Vec<MetrolineId> {
        let detected = match station.shape {
            StationShape::Connection => {
                crate::debug_log!(
                    "Detecting connections for {} ({} box samples)",
                    station.id,
                    station.connection_box_samples().len()
                );
                self.metrolines_touching(&station.connection_box())
            }
            _ => {
                let (x, y) = station.position;
                self.find_metroline_at(x, y)
                    .or_else(|| {
                        station
                            .primary_metroline()
                            .filter(|id| self.metrolines.contains_key(*id))
                            .cloned()
                    })
                    .into_iter()
                    .collect()
            }
        };

        if detected.is_empty() {
            self.metrolines.keys().next().cloned().into_iter().collect()
        } else {
            detected
        }
    }
}

impl Stations for MetroMap {
    fn place_station(&mut self, shape: StationShape, x: f64, y: f64) -> Result<StationId, MapError> {
        ensure_finite(x, y)?;
        // Alignment is decided before a default metroline may be created
        let position = snap_point((x, y), self.station_grid_unit());

        if self.metrolines.is_empty() {
            let color = self.settings.default_color;
            self.ensure_metroline(color);
        }
        let primary = self
            .find_metroline_at(position.0, position.1)
            .or_else(|| self.metrolines.keys().next().cloned())
            .ok_or(MapError::MissingField("metrolines"))?;

        let station = Station::new(shape, position, primary);
        let id = station.id;
        self.stations.insert(id, station);

        crate::debug_log!("Placed {} station {} at {:?}", shape, id, position);
        self.emit(MapEvent::StationAdded(id));
        self.schedule_detection(id);
        Ok(id)
    }

    fn remove_station(&mut self, id: StationId) -> Result<Station, MapError> {
        let station = self.stations.shift_remove(&id).ok_or(MapError::UnknownStation(id))?;
        self.pending_detection.shift_remove(&id);
        if self.edited_station == Some(id) {
            self.edited_station = None;
            self.emit(MapEvent::SelectionChanged);
        }
        self.emit(MapEvent::StationRemoved(id));

        if self.stations.is_empty() {
            self.prune_orphans()?;
        }
        Ok(station)
    }

    fn edit_station(&mut self, id: StationId, edit: StationEdit) -> Result<StationChanges, MapError> {
        let station = self.station_mut(id)?;
        let mut changes = edit.changes();
        let before = station.metrolines.len();

        let redetect = match edit {
            StationEdit::Name(name) => {
                station.set_name(name)?;
                false
            }
            StationEdit::Type(station_type) => {
                station.set_type(station_type);
                false
            }
            StationEdit::Date(date) => {
                station.set_date(date);
                false
            }
            StationEdit::Description(description) => {
                station.set_description(description);
                false
            }
            StationEdit::Link(link) => {
                station.set_link(link);
                false
            }
            StationEdit::Shape(shape) => {
                station.set_shape(shape);
                true
            }
            StationEdit::Width(width) => {
                station.set_width(width)?;
                station.shape.is_multi_line()
            }
            StationEdit::Orientation(degrees) => {
                station.set_orientation(degrees)?;
                station.shape.is_multi_line()
            }
            StationEdit::Position(x, y) => {
                station.set_position(x, y)?;
                true
            }
        };
        if station.metrolines.len() != before {
            changes |= StationChanges::METROLINES;
        }

        self.emit(MapEvent::StationChanged { id, changes });
        if redetect {
            self.schedule_detection(id);
        }
        Ok(changes)
    }

    fn move_station(&mut self, id: StationId, x: f64, y: f64) -> Result<Point, MapError> {
        ensure_finite(x, y)?;
        let position = snap_point((x, y), self.station_grid_unit());
        let station = self.station_mut(id)?;
        if station.position == position {
            return Ok(position);
        }
        station.set_position(position.0, position.1)?;

        self.emit(MapEvent::StationChanged {
            id,
            changes: StationChanges::POSITION,
        });
        Ok(position)
    }

    fn update_station_metroline_ids(&mut self, id: StationId) -> Result<Vec<MetrolineId>, MapError> {
        let station = self.stations.get(&id).ok_or(MapError::UnknownStation(id))?;
        let detected = self.detect_metrolines(station);
        if detected.is_empty() {
            return Err(MapError::MissingField("metrolines"));
        }
        if station.metrolines == detected {
            return Ok(detected);
        }

        self.station_mut(id)?.metrolines.clone_from(&detected);
        self.emit(MapEvent::StationChanged {
            id,
            changes: StationChanges::METROLINES,
        });
        Ok(detected)
    }

    fn update_all_station_metroline_ids(&mut self) -> Result<usize, MapError> {
        let ids: Vec<StationId> = self.stations.keys().copied().collect();
        let mut changed = 0;
        for id in ids {
            let before = self.stations.get(&id).map(|s| s.metrolines.clone());
            let after = self.update_station_metroline_ids(id)?;
            if before.as_ref() != Some(&after) {
                changed += 1;
            }
        }
        Ok(changed)
    }
}
