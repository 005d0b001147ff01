use super::{MetroMap, Stations};
use crate::error::{ensure_finite, MapError};
use crate::events::MapEvent;
use crate::geometry::Point;
use crate::models::{Metroline, MetrolineId, Rgb, SegmentId};

/// Extension trait for metroline-related operations on `MetroMap`
pub trait Metrolines {
    /// Choose the drawing color, creating its metroline when no metroline uses it yet
    fn select_color(&mut self, color: &str) -> Result<MetrolineId, MapError>;

    /// Append a segment to a metroline and register it with the spatial index
    fn draw_segment(
        &mut self,
        metroline: &MetrolineId,
        start: Point,
        end: Point,
        intermediate: Vec<Point>,
    ) -> Result<SegmentId, MapError>;

    /// Remove a segment; a metroline left without segments is cleaned up
    fn remove_segment(&mut self, metroline: &MetrolineId, segment: SegmentId) -> Result<(), MapError>;

    /// Remove a metroline with all its segments
    fn remove_metroline(&mut self, metroline: &MetrolineId) -> Result<(), MapError>;

    /// Translate every segment of a metroline
    fn move_metroline(&mut self, metroline: &MetrolineId, dx: f64, dy: f64) -> Result<(), MapError>;

    /// Change the stroke color; the identity is kept
    fn set_metroline_color(&mut self, metroline: &MetrolineId, color: &str) -> Result<(), MapError>;

    fn set_metroline_name(&mut self, metroline: &MetrolineId, name: String) -> Result<(), MapError>;

    fn set_metroline_target_group(&mut self, metroline: &MetrolineId, target_group: String) -> Result<(), MapError>;

    /// Re-derive a metroline's identity from its current color.
    /// Returns the new identity.
    fn rekey_metroline(&mut self, metroline: &MetrolineId) -> Result<MetrolineId, MapError>;
}

impl MetroMap {
    pub(super) fn metroline_mut(&mut self, id: &MetrolineId) -> Result<&mut Metroline, MapError> {
        self.metrolines
            .get_mut(id)
            .ok_or_else(|| MapError::UnknownMetroline(id.clone()))
    }

    /// `base`, or `base` with the smallest free suffix
    fn unique_metroline_id(&self, base: MetrolineId) -> MetrolineId {
        if !self.metrolines.contains_key(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = base.with_suffix(n);
            if !self.metrolines.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// The metroline drawn in `color`, created empty when missing
    pub(super) fn ensure_metroline(&mut self, color: Rgb) -> MetrolineId {
        if let Some(existing) = self.metrolines.values().find(|m| m.color == color) {
            return existing.id.clone();
        }

        let mut metroline = Metroline::new(color, format!("Line {}", self.metrolines.len() + 1));
        metroline.id = self.unique_metroline_id(metroline.id);
        let id = metroline.id.clone();
        self.metrolines.insert(id.clone(), metroline);

        crate::debug_log!("Created metroline {} ({})", id, color);
        self.emit(MapEvent::MetrolineAdded(id.clone()));
        id
    }

    /// Drop a metroline and re-home the stations that referenced it
    pub(super) fn detach_metroline(&mut self, id: &MetrolineId) -> Result<Metroline, MapError> {
        let metroline = self
            .metrolines
            .shift_remove(id)
            .ok_or_else(|| MapError::UnknownMetroline(id.clone()))?;
        for segment in &metroline.segments {
            self.unindex_segment(segment.id);
        }

        let affected: Vec<_> = self
            .stations
            .values_mut()
            .filter(|s| s.uses_metroline(id))
            .map(|s| {
                s.metrolines.retain(|m| m != id);
                s.id
            })
            .collect();

        self.emit(MapEvent::MetrolineRemoved(id.clone()));
        self.refresh_legend();

        if !self.metrolines.is_empty() {
            for station in affected {
                self.update_station_metroline_ids(station)?;
            }
        }

        crate::debug_log!("Removed metroline {}", id);
        Ok(metroline)
    }

    /// Remove metrolines without segments. The last metroline stays while
    /// stations still depend on it.
    pub(super) fn prune_orphans(&mut self) -> Result<usize, MapError> {
        let orphans: Vec<MetrolineId> = self
            .metrolines
            .values()
            .filter(|m| m.is_empty())
            .map(|m| m.id.clone())
            .collect();

        let mut removed = 0;
        for id in orphans {
            if self.metrolines.len() > 1 || self.stations.is_empty() {
                log::warn!("Removing orphan metroline {}", id);
                self.detach_metroline(&id)?;
                removed += 1;
            } else {
                log::warn!("Deferring removal of {}: stations still depend on it", id);
            }
        }
        Ok(removed)
    }

    pub(super) fn reindex_segment(&mut self, metroline: &MetrolineId, segment: SegmentId) {
        self.unindex_segment(segment);
        self.index_segment(metroline, segment);
    }
}

impl Metrolines for MetroMap {
    fn select_color(&mut self, color: &str) -> Result<MetrolineId, MapError> {
        let color: Rgb = color.parse()?;
        let id = self.ensure_metroline(color);
        self.active_color = Some(color);
        Ok(id)
    }

    fn draw_segment(
        &mut self,
        metroline: &MetrolineId,
        start: Point,
        end: Point,
        intermediate: Vec<Point>,
    ) -> Result<SegmentId, MapError> {
        let id = SegmentId(self.next_segment_id + 1);
        self.metroline_mut(metroline)?.draw(id, start, end, intermediate)?;
        self.next_segment_id = id.0;

        self.index_segment(metroline, id);
        self.emit(MapEvent::MetrolineChanged(metroline.clone()));
        self.refresh_legend();
        Ok(id)
    }

    fn remove_segment(&mut self, metroline: &MetrolineId, segment: SegmentId) -> Result<(), MapError> {
        self.metroline_mut(metroline)?
            .remove_segment(segment)
            .ok_or(MapError::UnknownSegment(segment))?;
        self.unindex_segment(segment);
        self.emit(MapEvent::MetrolineChanged(metroline.clone()));
        self.refresh_legend();

        let emptied = self.metrolines.get(metroline).is_some_and(Metroline::is_empty);
        if emptied {
            self.prune_orphans()?;
        }
        Ok(())
    }

    fn remove_metroline(&mut self, metroline: &MetrolineId) -> Result<(), MapError> {
        if !self.metrolines.contains_key(metroline) {
            return Err(MapError::UnknownMetroline(metroline.clone()));
        }
        if self.metrolines.len() == 1 && !self.stations.is_empty() {
            return Err(MapError::MetrolineInUse(metroline.clone()));
        }
        self.detach_metroline(metroline)?;
        Ok(())
    }

    fn move_metroline(&mut self, metroline: &MetrolineId, dx: f64, dy: f64) -> Result<(), MapError> {
        ensure_finite(dx, dy)?;
        let line = self.metroline_mut(metroline)?;
        line.move_all_lines_by_offset(dx, dy);
        let segments: Vec<SegmentId> = line.segments.iter().map(|s| s.id).collect();

        for segment in segments {
            self.reindex_segment(metroline, segment);
        }
        self.emit(MapEvent::MetrolineChanged(metroline.clone()));
        Ok(())
    }

    fn set_metroline_color(&mut self, metroline: &MetrolineId, color: &str) -> Result<(), MapError> {
        let parsed: Rgb = color.parse()?;
        if self.metrolines.values().any(|m| m.color == parsed && &m.id != metroline) {
            return Err(MapError::DuplicateColor(parsed.to_string()));
        }

        let line = self.metroline_mut(metroline)?;
        let previous = line.color;
        line.set_color(color)?;
        if self.active_color == Some(previous) {
            self.active_color = Some(parsed);
        }

        self.emit(MapEvent::MetrolineChanged(metroline.clone()));
        self.refresh_legend();
        Ok(())
    }

    fn set_metroline_name(&mut self, metroline: &MetrolineId, name: String) -> Result<(), MapError> {
        self.metroline_mut(metroline)?.name = name;
        self.emit(MapEvent::MetrolineChanged(metroline.clone()));
        self.refresh_legend();
        Ok(())
    }

    fn set_metroline_target_group(&mut self, metroline: &MetrolineId, target_group: String) -> Result<(), MapError> {
        self.metroline_mut(metroline)?.target_group = target_group;
        self.emit(MapEvent::MetrolineChanged(metroline.clone()));
        self.refresh_legend();
        Ok(())
    }

    fn rekey_metroline(&mut self, metroline: &MetrolineId) -> Result<MetrolineId, MapError> {
        let color = self
            .metrolines
            .get(metroline)
            .map(|m| m.color)
            .ok_or_else(|| MapError::UnknownMetroline(metroline.clone()))?;

        let derived = MetrolineId::from_color(color);
        if &derived == metroline {
            return Ok(derived);
        }
        let new_id = self.unique_metroline_id(derived);

        // Rebuild in place so drawing order is preserved
        self.metrolines = std::mem::take(&mut self.metrolines)
            .into_iter()
            .map(|(key, mut line)| {
                if &key == metroline {
                    line.id = new_id.clone();
                    (new_id.clone(), line)
                } else {
                    (key, line)
                }
            })
            .collect();

        for station in self.stations.values_mut() {
            for reference in &mut station.metrolines {
                if reference == metroline {
                    *reference = new_id.clone();
                }
            }
        }

        if let (Some(index), Some(line)) = (&mut self.spatial_index, self.metrolines.get(&new_id)) {
            for segment in &line.segments {
                index.reassign_owner(segment.id, &new_id);
            }
        }

        self.emit(MapEvent::MetrolineRekeyed {
            from: metroline.clone(),
            to: new_id.clone(),
        });
        self.refresh_legend();
        Ok(new_id)
    }
}
