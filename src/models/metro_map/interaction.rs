use chrono::{DateTime, Duration, Utc};

use super::{MetroMap, Metrolines, Stations};
use crate::error::{ensure_finite, MapError};
use crate::events::MapEvent;
use crate::geometry::{snap_point, snap_to_grid, Point};
use crate::models::{ElementKind, MetrolineId, SegmentId, StateManager, StationId, StationShape};

/// Interaction mode governing pointer dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    /// Draw new segments in the selected color
    Metroline,
    Eraser,
    #[default]
    Move,
    StationEdit,
    TextEdit,
    PlaceStation(StationShape),
}

/// The pointer gesture in progress; at most one at any instant
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    DrawingLine {
        metroline: MetrolineId,
        segment: SegmentId,
    },
    DraggingStation {
        id: StationId,
        last_detection: DateTime<Utc>,
    },
    DraggingMetroline {
        id: MetrolineId,
        last: Point,
    },
    DraggingElement {
        kind: ElementKind,
        /// Pointer position relative to the element's origin
        offset: Point,
    },
}

impl Gesture {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_drawing_line(&self) -> bool {
        matches!(self, Self::DrawingLine { .. })
    }

    #[must_use]
    pub fn is_dragging_station(&self) -> bool {
        matches!(self, Self::DraggingStation { .. })
    }

    #[must_use]
    pub fn is_dragging_metroline(&self) -> bool {
        matches!(self, Self::DraggingMetroline { .. })
    }

    #[must_use]
    pub fn is_dragging_element(&self) -> bool {
        matches!(self, Self::DraggingElement { .. })
    }
}

/// Entity under the pointer
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    Station(StationId),
    Segment {
        metroline: MetrolineId,
        segment: SegmentId,
    },
    Element(ElementKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub timestamp: DateTime<Utc>,
}

impl PointerEvent {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self::at(x, y, Utc::now())
    }

    #[must_use]
    pub fn at(x: f64, y: f64, timestamp: DateTime<Utc>) -> Self {
        Self { x, y, timestamp }
    }

    fn position(&self) -> Point {
        (self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    /// Remove the station being edited
    Delete,
    /// Move by whole half-grid steps
    Nudge { dx: i32, dy: i32 },
    /// Finalize the active gesture
    Finish,
}

/// Pointer and keyboard dispatch on `MetroMap`.
///
/// Every mutating gesture records an undo snapshot in `history` before it
/// changes anything.
pub trait Interaction {
    /// Switch tools; refused while a gesture is in progress
    fn set_tool(&mut self, tool: Tool) -> Result<(), MapError>;

    /// Start a gesture for the current tool. Returns false if nothing was hit.
    fn pointer_down(&mut self, history: &mut StateManager, event: PointerEvent) -> Result<bool, MapError>;

    /// Update the active gesture. Returns false when idle.
    fn pointer_move(&mut self, event: PointerEvent) -> Result<bool, MapError>;

    /// Finalize the active gesture at the release position. Returns false when idle.
    fn pointer_up(&mut self, event: PointerEvent) -> Result<bool, MapError>;

    /// Leaving the canvas finalizes exactly like a release
    fn pointer_leave(&mut self, event: PointerEvent) -> Result<bool, MapError>;

    /// Finalize the active gesture where it currently stands
    fn finish_gesture(&mut self) -> Result<(), MapError>;

    fn key_command(&mut self, history: &mut StateManager, command: KeyCommand) -> Result<bool, MapError>;

    /// Restore the previous snapshot. Returns false when there is nothing to undo.
    fn undo(&mut self, history: &mut StateManager) -> Result<bool, MapError>;

    fn redo(&mut self, history: &mut StateManager) -> Result<bool, MapError>;
}

impl MetroMap {
    fn set_selection(&mut self, station: Option<StationId>, element: Option<ElementKind>) {
        if self.edited_station == station && self.edited_element == element {
            return;
        }
        self.edited_station = station;
        self.edited_element = element;
        self.emit(MapEvent::SelectionChanged);
    }

    fn ensure_idle(&self) -> Result<(), MapError> {
        if self.gesture.is_idle() {
            Ok(())
        } else {
            Err(MapError::GestureInProgress)
        }
    }

    fn begin_drawing(&mut self, history: &mut StateManager, position: Point) -> Result<bool, MapError> {
        history.save_state(self)?;
        let color = self.active_color.unwrap_or(self.settings.default_color);
        let metroline = self.ensure_metroline(color);
        self.active_color = Some(color);

        let start = snap_point(position, self.settings.grid_size);
        let segment = self.draw_segment(&metroline, start, start, Vec::new())?;
        self.gesture = Gesture::DrawingLine { metroline, segment };
        Ok(true)
    }

    fn begin_erase(&mut self, history: &mut StateManager, position: Point) -> Result<bool, MapError> {
        match self.hit_test(position.0, position.1) {
            Some(HitTarget::Station(id)) => {
                history.save_state(self)?;
                self.remove_station(id)?;
                Ok(true)
            }
            Some(HitTarget::Segment { metroline, segment }) => {
                history.save_state(self)?;
                self.remove_segment(&metroline, segment)?;
                self.update_all_station_metroline_ids()?;
                Ok(true)
            }
            Some(HitTarget::Element(_)) | None => Ok(false),
        }
    }

    fn begin_move(&mut self, history: &mut StateManager, event: PointerEvent) -> Result<bool, MapError> {
        let gesture = match self.hit_test(event.x, event.y) {
            Some(HitTarget::Station(id)) => Gesture::DraggingStation {
                id,
                last_detection: event.timestamp,
            },
            Some(HitTarget::Segment { metroline, .. }) => Gesture::DraggingMetroline {
                id: metroline,
                last: event.position(),
            },
            Some(HitTarget::Element(kind)) => {
                let (ox, oy) = self.elements.get(kind).position;
                Gesture::DraggingElement {
                    kind,
                    offset: (event.x - ox, event.y - oy),
                }
            }
            None => return Ok(false),
        };

        history.save_state(self)?;
        self.gesture = gesture;
        Ok(true)
    }

    /// Apply the pointer position to the active gesture
    fn advance_gesture(&mut self, event: PointerEvent) -> Result<bool, MapError> {
        ensure_finite(event.x, event.y)?;

        match self.gesture.clone() {
            Gesture::Idle => Ok(false),
            Gesture::DrawingLine { metroline, segment } => {
                let (x, y) = snap_point(event.position(), self.settings.grid_size);
                let margin = self.settings.direction_lock_margin;
                self.metroline_mut(&metroline)?.draw_new_end_position(segment, x, y, margin)?;
                self.reindex_segment(&metroline, segment);
                self.emit(MapEvent::MetrolineChanged(metroline));
                Ok(true)
            }
            Gesture::DraggingStation { id, last_detection } => {
                self.move_station(id, event.x, event.y)?;
                let interval = Duration::milliseconds(self.settings.redetect_interval_ms);
                if event.timestamp - last_detection >= interval {
                    self.update_station_metroline_ids(id)?;
                    self.gesture = Gesture::DraggingStation {
                        id,
                        last_detection: event.timestamp,
                    };
                }
                Ok(true)
            }
            Gesture::DraggingMetroline { id, last } => {
                let grid = self.settings.grid_size;
                let dx = snap_to_grid(event.x - last.0, grid);
                let dy = snap_to_grid(event.y - last.1, grid);
                if dx == 0.0 && dy == 0.0 {
                    return Ok(false);
                }
                self.move_metroline(&id, dx, dy)?;
                self.gesture = Gesture::DraggingMetroline {
                    id,
                    last: (last.0 + dx, last.1 + dy),
                };
                Ok(true)
            }
            Gesture::DraggingElement { kind, offset } => {
                self.elements.get_mut(kind).position = (event.x - offset.0, event.y - offset.1);
                self.emit(MapEvent::ElementChanged(kind));
                Ok(true)
            }
        }
    }

    /// Complete the active gesture and clear it
    fn finalize_gesture(&mut self) -> Result<(), MapError> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        if let Gesture::DrawingLine { metroline, segment } = &gesture {
            let degenerate = self
                .metrolines
                .get(metroline)
                .and_then(|m| m.segment(*segment))
                .is_some_and(|s| s.is_degenerate());
            if degenerate {
                log::warn!("Dropping zero-length segment {} of {}", segment, metroline);
                self.remove_segment(metroline, *segment)?;
            }
            self.prune_orphans()?;
        }

        self.update_all_station_metroline_ids()?;
        Ok(())
    }

    /// Nudge offsets are whole half-grid steps
    fn nudge_offset(&self, dx: i32, dy: i32) -> Point {
        let step = self.settings.half_grid();
        (f64::from(dx) * step, f64::from(dy) * step)
    }
}

impl Interaction for MetroMap {
    fn set_tool(&mut self, tool: Tool) -> Result<(), MapError> {
        self.ensure_idle()?;
        self.set_selection(None, None);
        if self.tool != tool {
            self.tool = tool;
            self.emit(MapEvent::ToolChanged(tool));
        }
        Ok(())
    }

    fn pointer_down(&mut self, history: &mut StateManager, event: PointerEvent) -> Result<bool, MapError> {
        ensure_finite(event.x, event.y)?;
        self.ensure_idle()?;

        match self.tool {
            Tool::Metroline => self.begin_drawing(history, event.position()),
            Tool::Eraser => self.begin_erase(history, event.position()),
            Tool::Move => self.begin_move(history, event),
            Tool::StationEdit => {
                let station = match self.hit_test(event.x, event.y) {
                    Some(HitTarget::Station(id)) => Some(id),
                    _ => None,
                };
                self.set_selection(station, None);
                Ok(station.is_some())
            }
            Tool::TextEdit => {
                let element = match self.hit_test(event.x, event.y) {
                    Some(HitTarget::Element(kind)) if kind.is_text() => Some(kind),
                    _ => None,
                };
                self.set_selection(None, element);
                Ok(element.is_some())
            }
            Tool::PlaceStation(shape) => {
                history.save_state(self)?;
                self.place_station(shape, event.x, event.y)?;
                Ok(true)
            }
        }
    }

    fn pointer_move(&mut self, event: PointerEvent) -> Result<bool, MapError> {
        self.advance_gesture(event)
    }

    fn pointer_up(&mut self, event: PointerEvent) -> Result<bool, MapError> {
        if self.gesture.is_idle() {
            return Ok(false);
        }
        // The gesture ends even when the release position is rejected
        let advanced = self.advance_gesture(event);
        self.finalize_gesture()?;
        advanced?;
        Ok(true)
    }

    fn pointer_leave(&mut self, event: PointerEvent) -> Result<bool, MapError> {
        self.pointer_up(event)
    }

    fn finish_gesture(&mut self) -> Result<(), MapError> {
        if self.gesture.is_idle() {
            return Err(MapError::NoActiveGesture("finish"));
        }
        self.finalize_gesture()
    }

    fn key_command(&mut self, history: &mut StateManager, command: KeyCommand) -> Result<bool, MapError> {
        match command {
            KeyCommand::Delete => {
                self.ensure_idle()?;
                let Some(id) = self.edited_station else {
                    return Ok(false);
                };
                history.save_state(self)?;
                self.remove_station(id)?;
                Ok(true)
            }
            KeyCommand::Nudge { dx, dy } => {
                let (ox, oy) = self.nudge_offset(dx, dy);
                if let Gesture::DrawingLine { metroline, segment } = self.gesture.clone() {
                    self.metroline_mut(&metroline)?.adjust_end_position_by_amount(segment, ox, oy)?;
                    self.reindex_segment(&metroline, segment);
                    self.emit(MapEvent::MetrolineChanged(metroline));
                    return Ok(true);
                }

                self.ensure_idle()?;
                let Some(id) = self.edited_station else {
                    return Ok(false);
                };
                let (x, y) = self
                    .stations
                    .get(&id)
                    .map(|s| s.position)
                    .ok_or(MapError::UnknownStation(id))?;
                history.save_state(self)?;
                self.move_station(id, x + ox, y + oy)?;
                self.schedule_detection(id);
                Ok(true)
            }
            KeyCommand::Finish => {
                self.finish_gesture()?;
                Ok(true)
            }
        }
    }

    fn undo(&mut self, history: &mut StateManager) -> Result<bool, MapError> {
        self.ensure_idle()?;
        match history.revert_state(self)? {
            Some(snapshot) => {
                self.restore(&snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn redo(&mut self, history: &mut StateManager) -> Result<bool, MapError> {
        self.ensure_idle()?;
        match history.redo_state(self)? {
            Some(snapshot) => {
                self.restore(&snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn at(x: f64, y: f64, millis: i64) -> PointerEvent {
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        PointerEvent::at(x, y, base + Duration::milliseconds(millis))
    }

    #[test]
    fn test_draw_gesture_locks_direction() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::Metroline).expect("tool");
        map.select_color("rgb(200, 0, 0)").expect("color");

        assert!(map.pointer_down(&mut history, at(101.0, 99.0, 0)).expect("down"));
        assert!(map.gesture().is_drawing_line());
        map.pointer_move(at(250.0, 110.0, 10)).expect("move");
        assert!(map.pointer_up(at(300.0, 112.0, 20)).expect("up"));

        assert!(map.gesture().is_idle());
        let line = map.metrolines().next().expect("metroline");
        assert_eq!(line.segments[0].points, vec![(100.0, 100.0), (300.0, 100.0)]);
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(map.metrolines_in_rect(&Rect::new(280.0, 90.0, 10.0, 20.0)), vec![line.id.clone()]);
    }

    #[test]
    fn test_click_without_drag_leaves_no_segment() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::Metroline).expect("tool");

        crate::logging::capture::start();
        map.pointer_down(&mut history, at(100.0, 100.0, 0)).expect("down");
        map.pointer_up(at(101.0, 101.0, 5)).expect("up");
        assert_eq!(map.metroline_count(), 0);
        assert!(map.legend().entries().is_empty());

        let warnings = crate::logging::capture::warnings();
        assert!(warnings.iter().any(|w| w.starts_with("Dropping zero-length segment")));
        assert!(warnings.iter().any(|w| w.starts_with("Removing orphan metroline")));
    }

    #[test]
    fn test_invalid_release_still_ends_gesture() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::Metroline).expect("tool");

        map.pointer_down(&mut history, at(100.0, 100.0, 0)).expect("down");
        map.pointer_move(at(300.0, 100.0, 10)).expect("move");
        assert!(matches!(
            map.pointer_up(at(f64::NAN, 100.0, 20)),
            Err(MapError::InvalidCoordinate { .. })
        ));
        assert!(map.gesture().is_idle());
        let line = map.metrolines().next().expect("metroline");
        assert_eq!(line.segments[0].points, vec![(100.0, 100.0), (300.0, 100.0)]);

        assert!(map.pointer_down(&mut history, at(100.0, 200.0, 30)).expect("down"));
        assert!(map.gesture().is_drawing_line());
    }

    #[test]
    fn test_gestures_are_exclusive() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::Metroline).expect("tool");
        map.pointer_down(&mut history, at(100.0, 100.0, 0)).expect("down");

        assert_eq!(map.pointer_down(&mut history, at(50.0, 50.0, 1)), Err(MapError::GestureInProgress));
        assert_eq!(map.set_tool(Tool::Move), Err(MapError::GestureInProgress));
        assert_eq!(map.undo(&mut history), Err(MapError::GestureInProgress));

        map.pointer_leave(at(200.0, 100.0, 2)).expect("leave finalizes");
        assert!(map.gesture().is_idle());
        assert_eq!(map.finish_gesture(), Err(MapError::NoActiveGesture("finish")));
        assert!(!map.pointer_move(at(10.0, 10.0, 3)).expect("idle move"));
    }

    #[test]
    fn test_station_drag_throttles_detection() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        let a = map.select_color("rgb(255, 0, 0)").expect("color");
        map.draw_segment(&a, (0.0, 100.0), (600.0, 100.0), vec![]).expect("segment");
        let b = map.select_color("rgb(0, 0, 255)").expect("color");
        map.draw_segment(&b, (0.0, 300.0), (600.0, 300.0), vec![]).expect("segment");
        let id = map.place_station(StationShape::Normal, 200.0, 100.0).expect("station");
        map.layout_settled().expect("detection");

        map.set_tool(Tool::Move).expect("tool");
        assert!(map.pointer_down(&mut history, at(200.0, 100.0, 0)).expect("down"));
        assert!(map.gesture().is_dragging_station());

        // Within the interval the association is not recomputed
        map.pointer_move(at(200.0, 300.0, 100)).expect("move");
        assert_eq!(map.station(id).map(|s| s.position), Some((200.0, 300.0)));
        assert_eq!(map.station(id).and_then(|s| s.primary_metroline()), Some(&a));

        map.pointer_move(at(201.0, 301.0, 600)).expect("move");
        assert_eq!(map.station(id).and_then(|s| s.primary_metroline()), Some(&b));

        map.pointer_up(at(201.0, 301.0, 610)).expect("up");
        assert!(map.gesture().is_idle());
    }

    #[test]
    fn test_drag_metroline_moves_in_grid_steps() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        let a = map.select_color("rgb(255, 0, 0)").expect("color");
        map.draw_segment(&a, (100.0, 100.0), (300.0, 100.0), vec![]).expect("segment");

        map.set_tool(Tool::Move).expect("tool");
        assert!(map.pointer_down(&mut history, at(200.0, 102.0, 0)).expect("down"));
        assert!(map.gesture().is_dragging_metroline());
        map.pointer_up(at(223.0, 148.0, 10)).expect("up");

        let points = map.metroline(&a).map(|m| m.segments[0].points.clone());
        assert_eq!(points, Some(vec![(120.0, 150.0), (320.0, 150.0)]));
    }

    #[test]
    fn test_drag_element() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::Move).expect("tool");

        assert!(map.pointer_down(&mut history, at(30.0, 30.0, 0)).expect("down"));
        assert!(map.gesture().is_dragging_element());
        map.pointer_up(at(130.0, 230.0, 10)).expect("up");
        assert_eq!(map.element(ElementKind::Title).position, (120.0, 220.0));
    }

    #[test]
    fn test_eraser_removes_hit_entities() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        let a = map.select_color("rgb(255, 0, 0)").expect("color");
        map.draw_segment(&a, (100.0, 500.0), (300.0, 500.0), vec![]).expect("segment");
        let b = map.select_color("rgb(0, 0, 255)").expect("color");
        map.draw_segment(&b, (100.0, 600.0), (300.0, 600.0), vec![]).expect("segment");
        map.place_station(StationShape::Normal, 600.0, 600.0).expect("station");

        map.set_tool(Tool::Eraser).expect("tool");
        assert!(map.pointer_down(&mut history, at(200.0, 503.0, 0)).expect("erase segment"));
        assert!(map.metroline(&a).is_none());
        assert!(!map.pointer_down(&mut history, at(900.0, 900.0, 1)).expect("miss"));
        assert!(map.pointer_down(&mut history, at(600.0, 600.0, 2)).expect("erase station"));
        assert_eq!(map.station_count(), 0);
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_undo_and_redo_restore_states() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::PlaceStation(StationShape::End)).expect("tool");
        map.pointer_down(&mut history, at(100.0, 100.0, 0)).expect("place");
        map.pointer_down(&mut history, at(200.0, 100.0, 1)).expect("place");
        assert_eq!(map.station_count(), 2);

        assert!(map.undo(&mut history).expect("undo"));
        assert_eq!(map.station_count(), 1);
        assert!(map.redo(&mut history).expect("redo"));
        assert_eq!(map.station_count(), 2);
        assert!(map.undo(&mut history).expect("undo"));
        assert!(map.undo(&mut history).expect("undo"));
        assert_eq!(map.station_count(), 0);
        assert!(!map.undo(&mut history).expect("nothing left"));
    }

    #[test]
    fn test_station_edit_selection_and_keys() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        let id = map.place_station(StationShape::Normal, 400.0, 400.0).expect("station");

        map.set_tool(Tool::StationEdit).expect("tool");
        assert!(map.pointer_down(&mut history, at(400.0, 400.0, 0)).expect("select"));
        assert_eq!(map.edited_station(), Some(id));

        assert!(map.key_command(&mut history, KeyCommand::Nudge { dx: 1, dy: -2 }).expect("nudge"));
        assert_eq!(map.station(id).map(|s| s.position), Some((405.0, 390.0)));

        assert!(map.key_command(&mut history, KeyCommand::Delete).expect("delete"));
        assert_eq!(map.station_count(), 0);
        assert_eq!(map.edited_station(), None);
        assert!(!map.key_command(&mut history, KeyCommand::Delete).expect("nothing selected"));
    }

    #[test]
    fn test_nudge_extends_segment_while_drawing() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::Metroline).expect("tool");
        map.pointer_down(&mut history, at(100.0, 100.0, 0)).expect("down");
        map.pointer_move(at(200.0, 100.0, 1)).expect("move");

        map.key_command(&mut history, KeyCommand::Nudge { dx: 2, dy: 0 }).expect("nudge");
        map.key_command(&mut history, KeyCommand::Finish).expect("finish");
        let line = map.metrolines().next().expect("metroline");
        assert_eq!(line.segments[0].end(), (210.0, 100.0));
    }

    #[test]
    fn test_text_edit_selects_text_elements_only() {
        let mut map = MetroMap::default();
        let mut history = StateManager::default();
        map.set_tool(Tool::TextEdit).expect("tool");

        assert!(map.pointer_down(&mut history, at(30.0, 80.0, 0)).expect("subtitle"));
        assert_eq!(map.edited_element(), Some(ElementKind::Subtitle));
        assert!(!map.pointer_down(&mut history, at(30.0, 850.0, 1)).expect("legend"));
        assert_eq!(map.edited_element(), None);
        assert_eq!(history.undo_depth(), 0);
    }
}
