use indexmap::{IndexMap, IndexSet};

use super::{
    ElementKind, ElementLayout, ElementRecord, Elements, EditorSettings, Legend, MapDocument,
    Metroline, MetrolineId, MetrolineRecord, SegmentId, SegmentRecord, Station, StationId,
    StationRecord,
};
use crate::error::{ensure_finite, MapError};
use crate::events::{EventEmitter, ListenerId, MapEvent};
use crate::geometry::{point_near_segment, segment_intersects_polygon, Point, Rect};
use crate::spatial_index::{SegmentHit, SpatialGridIndex};
use crate::storage::{decode_snapshot, encode_snapshot, Snapshot};

mod interaction;
mod metrolines;
mod stations;

pub use interaction::{Gesture, HitTarget, Interaction, KeyCommand, PointerEvent, Tool};
pub use metrolines::Metrolines;
pub use stations::{StationEdit, Stations};

/// The diagram: metrolines, stations, legend, spatial index and the
/// interaction state driving edits to them.
#[derive(Debug)]
pub struct MetroMap {
    settings: EditorSettings,
    title: String,
    subtitle: String,
    width: f64,
    height: f64,
    /// Insertion order is drawing order
    metrolines: IndexMap<MetrolineId, Metroline>,
    stations: IndexMap<StationId, Station>,
    legend: Legend,
    spatial_index: Option<SpatialGridIndex>,
    elements: Elements,
    next_segment_id: u64,
    active_color: Option<super::Rgb>,
    tool: Tool,
    gesture: Gesture,
    edited_station: Option<StationId>,
    edited_element: Option<ElementKind>,
    pending_detection: IndexSet<StationId>,
    events: EventEmitter<MapEvent>,
}

impl MetroMap {
    /// Create an empty map. `settings` are expected to be validated.
    #[must_use]
    pub fn new(settings: EditorSettings) -> Self {
        let spatial_index = settings.use_spatial_index.then(|| {
            SpatialGridIndex::new(settings.grid_size, settings.canvas_width, settings.canvas_height)
        });

        Self {
            title: String::new(),
            subtitle: String::new(),
            width: settings.canvas_width,
            height: settings.canvas_height,
            metrolines: IndexMap::new(),
            stations: IndexMap::new(),
            legend: Legend::new(settings.legend_column_capacity),
            spatial_index,
            elements: Elements::default(),
            next_segment_id: 0,
            active_color: None,
            tool: Tool::default(),
            gesture: Gesture::Idle,
            edited_station: None,
            edited_element: None,
            pending_detection: IndexSet::new(),
            events: EventEmitter::new(),
            settings,
        }
    }

    /// Build a map from a document
    ///
    /// # Errors
    /// Returns an error if the document is inconsistent
    pub fn from_document(settings: EditorSettings, document: MapDocument) -> Result<Self, MapError> {
        let mut map = Self::new(settings);
        map.load_document(document)?;
        Ok(map)
    }

    #[must_use]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.emit(MapEvent::ElementChanged(ElementKind::Title));
    }

    pub fn set_subtitle(&mut self, subtitle: String) {
        self.subtitle = subtitle;
        self.emit(MapEvent::ElementChanged(ElementKind::Subtitle));
    }

    /// Replace the text of the title or subtitle
    ///
    /// # Errors
    /// Returns an error for elements without text
    pub fn set_element_text(&mut self, kind: ElementKind, text: String) -> Result<(), MapError> {
        match kind {
            ElementKind::Title => self.set_title(text),
            ElementKind::Subtitle => self.set_subtitle(text),
            ElementKind::Legend => return Err(MapError::NotTextElement(kind)),
        }
        Ok(())
    }

    #[must_use]
    pub fn canvas_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn metrolines(&self) -> impl Iterator<Item = &Metroline> {
        self.metrolines.values()
    }

    #[must_use]
    pub fn metroline(&self, id: &MetrolineId) -> Option<&Metroline> {
        self.metrolines.get(id)
    }

    #[must_use]
    pub fn metroline_count(&self) -> usize {
        self.metrolines.len()
    }

    #[must_use]
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    #[must_use]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    #[must_use]
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    #[must_use]
    pub fn element(&self, kind: ElementKind) -> &ElementLayout {
        self.elements.get(kind)
    }

    /// Record the extent the rendering surface measured for an element
    ///
    /// # Errors
    /// Returns an error if the extent is negative or not finite
    pub fn set_element_extent(&mut self, kind: ElementKind, width: f64, height: f64) -> Result<(), MapError> {
        ensure_finite(width, height)?;
        if width < 0.0 || height < 0.0 {
            return Err(MapError::InvalidCoordinate { x: width, y: height });
        }
        self.elements.get_mut(kind).extent = (width, height);
        Ok(())
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    #[must_use]
    pub fn edited_station(&self) -> Option<StationId> {
        self.edited_station
    }

    #[must_use]
    pub fn edited_element(&self) -> Option<ElementKind> {
        self.edited_element
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&MapEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&mut self, event: MapEvent) {
        self.events.emit(&event);
    }

    /// Resize the canvas; the spatial index is rebuilt for the new cell range
    ///
    /// # Errors
    /// Returns an error if either dimension is not positive and finite
    pub fn resize_canvas(&mut self, width: f64, height: f64) -> Result<(), MapError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(MapError::InvalidCanvasSize { width, height });
        }
        self.width = width;
        self.height = height;
        if let Some(index) = &mut self.spatial_index {
            index.rebuild(self.metrolines.values(), width, height);
        }
        self.emit(MapEvent::CanvasResized { width, height });
        Ok(())
    }

    /// Without an index every query scans all segments, with identical results
    pub fn set_spatial_index_enabled(&mut self, enabled: bool) {
        if enabled && self.spatial_index.is_none() {
            let mut index = SpatialGridIndex::new(self.settings.grid_size, self.width, self.height);
            index.rebuild(self.metrolines.values(), self.width, self.height);
            self.spatial_index = Some(index);
        } else if !enabled {
            self.spatial_index = None;
        }
    }

    #[must_use]
    pub fn spatial_index(&self) -> Option<&SpatialGridIndex> {
        self.spatial_index.as_ref()
    }

    /// Alignment unit for stations: full grid until a metroline exists, half grid after
    #[must_use]
    pub fn station_grid_unit(&self) -> f64 {
        if self.metrolines.is_empty() {
            self.settings.grid_size
        } else {
            self.settings.half_grid()
        }
    }

    fn allocate_segment_id(&mut self) -> SegmentId {
        self.next_segment_id += 1;
        SegmentId(self.next_segment_id)
    }

    fn index_segment(&mut self, metroline: &MetrolineId, segment: SegmentId) {
        let Some(index) = &mut self.spatial_index else { return };
        if let Some(seg) = self.metrolines.get(metroline).and_then(|m| m.segment(segment)) {
            index.add_segment(segment, metroline, &seg.points);
        }
    }

    fn unindex_segment(&mut self, segment: SegmentId) {
        if let Some(index) = &mut self.spatial_index {
            index.remove_segment(segment);
        }
    }

    fn reindex_metroline(&mut self, metroline: &MetrolineId) {
        let Some(index) = &mut self.spatial_index else { return };
        if let Some(m) = self.metrolines.get(metroline) {
            for segment in &m.segments {
                index.add_segment(segment.id, metroline, &segment.points);
            }
        }
    }

    /// Re-derive the legend and prune entries of removed metrolines
    fn refresh_legend(&mut self) {
        let mut changed = self.legend.sync(self.metrolines.values());
        let metrolines = &self.metrolines;
        changed |= self.legend.prune(|id| metrolines.contains_key(id)) > 0;
        if changed {
            self.emit(MapEvent::LegendChanged);
        }
    }

    /// Brute-force point scan over every metroline, in drawing order
    #[must_use]
    pub fn find_metroline_at(&self, x: f64, y: f64) -> Option<MetrolineId> {
        let tolerance = self.settings.line_tolerance;
        self.metrolines
            .values()
            .find(|m| m.is_point_on_line(x, y, tolerance))
            .map(|m| m.id.clone())
    }

    /// Segments that may touch `bounds`, from the index when present
    #[must_use]
    pub fn candidate_segments(&self, bounds: &Rect) -> Vec<SegmentHit> {
        match &self.spatial_index {
            Some(index) => index.query(bounds),
            None => self
                .metrolines
                .values()
                .flat_map(|m| {
                    m.segments.iter().map(move |s| SegmentHit {
                        segment: s.id,
                        metroline: m.id.clone(),
                    })
                })
                .collect(),
        }
    }

    /// Distinct metrolines with geometry inside `polygon`, in drawing order
    fn metrolines_touching(&self, polygon: &[Point]) -> Vec<MetrolineId> {
        let Some(bounds) = Rect::bounding(polygon) else {
            return Vec::new();
        };

        let mut found: IndexSet<MetrolineId> = IndexSet::new();
        for hit in self.candidate_segments(&bounds) {
            if found.contains(&hit.metroline) {
                continue;
            }
            let Some(segment) = self.metrolines.get(&hit.metroline).and_then(|m| m.segment(hit.segment)) else {
                continue;
            };
            let touches = segment
                .edges()
                .any(|edge| segment_intersects_polygon(edge, polygon));
            if touches {
                found.insert(hit.metroline);
            }
        }

        let mut found: Vec<MetrolineId> = found.into_iter().collect();
        found.sort_by_key(|id| self.metrolines.get_index_of(id).unwrap_or(usize::MAX));
        found
    }

    /// Distinct metrolines with a segment inside `bounds`, in drawing order
    #[must_use]
    pub fn metrolines_in_rect(&self, bounds: &Rect) -> Vec<MetrolineId> {
        self.metrolines_touching(&bounds.vertices())
    }

    /// Topmost entity under the pointer: stations, then metroline segments, then elements
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<HitTarget> {
        if let Some(station) = self.stations.values().rev().find(|s| s.bounds().contains((x, y))) {
            return Some(HitTarget::Station(station.id));
        }

        let tolerance = self.settings.line_tolerance;
        let area = Rect::centered((x, y), tolerance * 2.0, tolerance * 2.0);
        let segment_hit = self
            .candidate_segments(&area)
            .into_iter()
            .filter(|hit| {
                self.metrolines
                    .get(&hit.metroline)
                    .and_then(|m| m.segment(hit.segment))
                    .is_some_and(|s| s.edges().any(|(p1, p2)| point_near_segment(p1, p2, (x, y), tolerance)))
            })
            .max_by_key(|hit| self.metrolines.get_index_of(&hit.metroline).unwrap_or(0));
        if let Some(hit) = segment_hit {
            return Some(HitTarget::Segment {
                metroline: hit.metroline,
                segment: hit.segment,
            });
        }

        self.elements.element_at((x, y)).map(HitTarget::Element)
    }

    /// Run connection detection for stations waiting on a layout settle.
    /// Called by the rendering surface; returns the number of stations updated.
    ///
    /// # Errors
    /// Propagates detection failures
    pub fn layout_settled(&mut self) -> Result<usize, MapError> {
        let pending: Vec<StationId> = self.pending_detection.drain(..).collect();
        let mut updated = 0;
        for id in pending {
            if self.stations.contains_key(&id) {
                self.update_station_metroline_ids(id)?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    #[must_use]
    pub fn pending_detections(&self) -> usize {
        self.pending_detection.len()
    }

    fn schedule_detection(&mut self, id: StationId) {
        if self.pending_detection.insert(id) {
            self.emit(MapEvent::DetectionScheduled(id));
        }
    }

    /// Current state as a document
    #[must_use]
    pub fn to_document(&self) -> MapDocument {
        MapDocument {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            width: self.width,
            height: self.height,
            metrolines: self
                .metrolines
                .values()
                .map(|m| MetrolineRecord {
                    id: m.id.clone(),
                    color: m.color,
                    segments: m
                        .segments
                        .iter()
                        .map(|s| SegmentRecord {
                            start: s.start(),
                            end: s.end(),
                            intermediate: s.intermediate().to_vec(),
                        })
                        .collect(),
                    name: m.name.clone(),
                    target_group: m.target_group.clone(),
                })
                .collect(),
            stations: self
                .stations
                .values()
                .map(|s| StationRecord {
                    name: s.name.clone(),
                    date: s.date.clone(),
                    station_type: s.station_type.clone(),
                    position: s.position,
                    orientation: s.orientation,
                    shape: s.shape,
                    width: s.width,
                    description: s.description.clone(),
                    link: s.link.clone(),
                    metrolines: s.metrolines.clone(),
                })
                .collect(),
            elements: ElementKind::ALL
                .into_iter()
                .map(|kind| ElementRecord {
                    kind,
                    position: self.elements.get(kind).position,
                })
                .collect(),
        }
    }

    /// Replace the whole map with a document's content.
    /// Everything is validated before anything is replaced.
    ///
    /// # Errors
    /// Returns an error on duplicate metrolines, dangling station references or invalid values
    pub fn load_document(&mut self, document: MapDocument) -> Result<(), MapError> {
        let MapDocument {
            title,
            subtitle,
            width,
            height,
            metrolines: metroline_records,
            stations: station_records,
            elements: element_records,
        } = document;

        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(MapError::InvalidCanvasSize { width, height });
        }

        let mut next_segment_id = 0;
        let mut metrolines: IndexMap<MetrolineId, Metroline> = IndexMap::new();
        for record in metroline_records {
            if metrolines.contains_key(&record.id) {
                return Err(MapError::InvalidDocument(format!("duplicate metroline '{}'", record.id)));
            }
            if metrolines.values().any(|m| m.color == record.color) {
                return Err(MapError::DuplicateColor(record.color.to_string()));
            }

            let mut metroline = Metroline {
                id: record.id.clone(),
                color: record.color,
                name: record.name,
                target_group: record.target_group,
                segments: Vec::with_capacity(record.segments.len()),
            };
            for segment in record.segments {
                next_segment_id += 1;
                metroline.draw(SegmentId(next_segment_id), segment.start, segment.end, segment.intermediate)?;
            }
            metrolines.insert(record.id, metroline);
        }

        let mut stations: IndexMap<StationId, Station> = IndexMap::new();
        for record in station_records {
            let Some(primary) = record.metrolines.first() else {
                return Err(MapError::MissingField("metrolines"));
            };
            if let Some(missing) = record.metrolines.iter().find(|id| !metrolines.contains_key(*id)) {
                return Err(MapError::UnknownMetroline(missing.clone()));
            }
            if !record.shape.is_multi_line() && record.metrolines.len() > 1 {
                return Err(MapError::InvalidDocument(format!(
                    "{} station '{}' references {} metrolines",
                    record.shape,
                    record.name,
                    record.metrolines.len()
                )));
            }

            let mut station = Station::new(record.shape, record.position, primary.clone());
            station.set_name(record.name)?;
            station.set_position(record.position.0, record.position.1)?;
            station.set_width(record.width)?;
            station.orientation = record.orientation;
            station.set_date(record.date);
            station.set_type(record.station_type);
            station.set_description(record.description);
            station.set_link(record.link);
            station.metrolines = record.metrolines;
            stations.insert(station.id, station);
        }

        for record in &element_records {
            ensure_finite(record.position.0, record.position.1)?;
        }

        self.title = title;
        self.subtitle = subtitle;
        self.width = width;
        self.height = height;
        self.metrolines = metrolines;
        self.stations = stations;
        self.next_segment_id = next_segment_id;
        for record in element_records {
            self.elements.get_mut(record.kind).position = record.position;
        }
        self.gesture = Gesture::Idle;
        self.edited_station = None;
        self.edited_element = None;
        self.pending_detection.clear();
        if let Some(index) = &mut self.spatial_index {
            index.rebuild(self.metrolines.values(), width, height);
        }
        self.legend.sync(self.metrolines.values());

        crate::debug_log!(
            "Loaded map with {} metrolines and {} stations",
            self.metrolines.len(),
            self.stations.len()
        );
        self.emit(MapEvent::MapReloaded);
        Ok(())
    }

    /// Encode the current state for the undo/redo stacks
    ///
    /// # Errors
    /// Returns an error if encoding fails
    pub fn snapshot(&self) -> Result<Snapshot, MapError> {
        encode_snapshot(&self.to_document())
    }

    /// Load a snapshot back into the map
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be decoded or is inconsistent
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), MapError> {
        let document = decode_snapshot(snapshot)?;
        self.load_document(document)
    }
}

impl Default for MetroMap {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Orientation, Rgb, StationShape};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample_map() -> MetroMap {
        let mut map = MetroMap::default();
        map.set_title("Sample".to_string());
        let red = map.select_color("rgb(255, 0, 0)").expect("color");
        map.draw_segment(&red, (100.0, 100.0), (400.0, 100.0), vec![(250.0, 100.0)]).expect("segment");
        let blue = map.select_color("rgb(0, 0, 255)").expect("color");
        map.draw_segment(&blue, (100.0, 200.0), (400.0, 200.0), vec![]).expect("segment");
        map.set_metroline_name(&blue, "Blue".to_string()).expect("name");

        let id = map.place_station(StationShape::Normal, 200.0, 100.0).expect("station");
        map.edit_station(id, StationEdit::Name("Central".to_string())).expect("name");
        map.edit_station(id, StationEdit::Orientation(135)).expect("orientation");
        map.edit_station(id, StationEdit::Link(Some("https://example.org".to_string()))).expect("link");
        map
    }

    fn same_content(a: &MetroMap, b: &MetroMap) {
        assert_eq!(a.title(), b.title());
        assert_eq!(a.canvas_size(), b.canvas_size());
        let lines_a: Vec<_> = a.metrolines().map(|m| (&m.id, m.color, &m.name, m.segments.iter().map(|s| s.points.clone()).collect::<Vec<_>>())).collect();
        let lines_b: Vec<_> = b.metrolines().map(|m| (&m.id, m.color, &m.name, m.segments.iter().map(|s| s.points.clone()).collect::<Vec<_>>())).collect();
        assert_eq!(lines_a, lines_b);
        let stations_a: Vec<_> = a.stations().map(|s| (&s.name, s.position, s.orientation, s.shape, &s.link, &s.metrolines)).collect();
        let stations_b: Vec<_> = b.stations().map(|s| (&s.name, s.position, s.orientation, s.shape, &s.link, &s.metrolines)).collect();
        assert_eq!(stations_a, stations_b);
    }

    #[test]
    fn test_document_round_trip() {
        let map = sample_map();
        let restored = MetroMap::from_document(EditorSettings::default(), map.to_document()).expect("valid document");
        same_content(&map, &restored);
        assert_eq!(restored.stations().next().map(|s| s.orientation), Some(Orientation::Deg135));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let map = sample_map();
        let snapshot = map.snapshot().expect("snapshot");
        let mut other = MetroMap::default();
        other.restore(&snapshot).expect("restore");
        same_content(&map, &other);
        assert_eq!(other.legend().entries().len(), 2);
    }

    #[test]
    fn test_json_document_round_trip() {
        let map = sample_map();
        let json = serde_json::to_string(&map.to_document()).expect("serialize");
        let document: MapDocument = serde_json::from_str(&json).expect("parse");
        let restored = MetroMap::from_document(EditorSettings::default(), document).expect("valid");
        same_content(&map, &restored);
    }

    #[test]
    fn test_load_rejects_dangling_station_reference() {
        let mut document = sample_map().to_document();
        document.stations[0].metrolines = vec![MetrolineId::from("metroline-1-1-1")];

        let mut map = sample_map();
        let before = map.to_document();
        let result = map.load_document(document);
        assert_eq!(result, Err(MapError::UnknownMetroline(MetrolineId::from("metroline-1-1-1"))));
        // Nothing was replaced
        assert_eq!(map.to_document(), before);
    }

    #[test]
    fn test_load_rejects_multi_line_normal_station() {
        let mut document = sample_map().to_document();
        let second = document.metrolines[1].id.clone();
        document.stations[0].metrolines.push(second);
        assert!(matches!(
            MetroMap::from_document(EditorSettings::default(), document),
            Err(MapError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_colors_and_bad_canvas() {
        let mut document = sample_map().to_document();
        document.metrolines[1].color = document.metrolines[0].color;
        assert!(matches!(
            MetroMap::from_document(EditorSettings::default(), document),
            Err(MapError::DuplicateColor(_))
        ));

        let mut document = sample_map().to_document();
        document.width = 0.0;
        assert!(matches!(
            MetroMap::from_document(EditorSettings::default(), document),
            Err(MapError::InvalidCanvasSize { .. })
        ));
    }

    #[test]
    fn test_spatial_index_matches_brute_force() {
        let mut map = MetroMap::default();
        let colors = ["rgb(200, 0, 0)", "rgb(0, 200, 0)", "rgb(0, 0, 200)", "rgb(90, 90, 0)"];
        let shapes: [(Point, Point, Vec<Point>); 4] = [
            ((10.0, 10.0), (1490.0, 10.0), vec![]),
            ((30.0, 990.0), (990.0, 30.0), vec![]),
            ((700.0, 0.0), (700.0, 400.0), vec![(700.0, 200.0)]),
            ((120.0, 330.0), (860.0, 540.0), vec![(400.0, 350.0), (500.0, 700.0)]),
        ];
        for (color, (start, end, via)) in colors.iter().zip(shapes) {
            let id = map.select_color(color).expect("color");
            map.draw_segment(&id, start, end, via).expect("segment");
        }
        // Geometry outside the canvas
        let id = map.select_color("rgb(5, 5, 5)").expect("color");
        map.draw_segment(&id, (1600.0, -50.0), (1700.0, 1100.0), vec![]).expect("segment");

        let mut queries = Vec::new();
        for gx in 0..16 {
            for gy in 0..11 {
                let x = f64::from(gx) * 97.0 - 20.0;
                let y = f64::from(gy) * 101.0 - 20.0;
                queries.push(Rect::new(x, y, 13.0 + f64::from(gx), 7.0 + f64::from(gy) * 3.0));
            }
        }
        queries.push(Rect::new(1650.0, 500.0, 20.0, 20.0));
        // Crossings of the vertical line with the horizontal and diagonal ones
        queries.push(Rect::new(690.0, 0.0, 20.0, 20.0));
        queries.push(Rect::new(690.0, 310.0, 20.0, 20.0));
        queries.push(Rect::new(1200.0, 800.0, 10.0, 10.0));

        let indexed: Vec<_> = queries.iter().map(|q| map.metrolines_in_rect(q)).collect();
        map.set_spatial_index_enabled(false);
        let brute: Vec<_> = queries.iter().map(|q| map.metrolines_in_rect(q)).collect();

        assert_eq!(indexed, brute);
        let n = queries.len();
        assert_eq!(indexed[n - 3].len(), 2);
        assert_eq!(indexed[n - 2].len(), 2);
        assert!(indexed[n - 1].is_empty());
    }

    #[test]
    fn test_diagonal_leaving_canvas_matches_brute_force() {
        let mut map = MetroMap::default();
        let id = map.select_color("rgb(10, 20, 30)").expect("color");
        map.draw_segment(&id, (0.0, 0.0), (3000.0, 3000.0), vec![]).expect("segment");

        let queries = [
            Rect::new(990.0, 990.0, 20.0, 5.0),
            Rect::new(500.0, 500.0, 4.0, 4.0),
            Rect::new(1400.0, 1400.0, 10.0, 10.0),
            Rect::new(1200.0, 100.0, 10.0, 10.0),
        ];
        let indexed: Vec<_> = queries.iter().map(|q| map.metrolines_in_rect(q)).collect();
        map.set_spatial_index_enabled(false);
        let brute: Vec<_> = queries.iter().map(|q| map.metrolines_in_rect(q)).collect();

        assert_eq!(indexed, brute);
        assert_eq!(indexed[0], vec![id.clone()]);
        assert_eq!(indexed[2], vec![id]);
        assert!(indexed[3].is_empty());
    }

    #[test]
    fn test_resize_canvas_rebuilds_index() {
        let mut map = MetroMap::default();
        let id = map.select_color("rgb(1, 2, 3)").expect("color");
        map.draw_segment(&id, (1800.0, 500.0), (1900.0, 500.0), vec![]).expect("segment");

        map.resize_canvas(2000.0, 1000.0).expect("resize");
        assert_eq!(map.metrolines_in_rect(&Rect::new(1840.0, 490.0, 20.0, 20.0)), vec![id]);
        assert!(map.resize_canvas(0.0, 10.0).is_err());
        assert_eq!(map.canvas_size(), (2000.0, 1000.0));
    }

    #[test]
    fn test_find_metroline_at_uses_tolerance() {
        let map = sample_map();
        assert_eq!(map.find_metroline_at(300.0, 105.0), Some(MetrolineId::from_color(Rgb::new(255, 0, 0))));
        assert_eq!(map.find_metroline_at(300.0, 150.0), None);
    }

    #[test]
    fn test_hit_test_prefers_stations() {
        let map = sample_map();
        let station = map.stations().next().expect("station").id;
        assert_eq!(map.hit_test(200.0, 100.0), Some(HitTarget::Station(station)));
        assert!(matches!(map.hit_test(300.0, 202.0), Some(HitTarget::Segment { .. })));
        assert_eq!(map.hit_test(30.0, 30.0), Some(HitTarget::Element(ElementKind::Title)));
        assert_eq!(map.hit_test(900.0, 600.0), None);
    }

    #[test]
    fn test_events_reach_subscribers() {
        let mut map = MetroMap::default();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let listener = map.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let id = map.select_color("rgb(9, 9, 9)").expect("color");
        map.draw_segment(&id, (0.0, 0.0), (50.0, 0.0), vec![]).expect("segment");
        assert!(events.borrow().contains(&MapEvent::MetrolineAdded(id.clone())));
        assert!(events.borrow().contains(&MapEvent::LegendChanged));

        assert!(map.unsubscribe(listener));
        let count = events.borrow().len();
        map.set_title("Quiet".to_string());
        assert_eq!(events.borrow().len(), count);
    }

    #[test]
    fn test_set_element_text() {
        let mut map = MetroMap::default();
        map.set_element_text(ElementKind::Subtitle, "Network 2030".to_string()).expect("text");
        assert_eq!(map.subtitle(), "Network 2030");
        assert_eq!(
            map.set_element_text(ElementKind::Legend, "x".to_string()),
            Err(MapError::NotTextElement(ElementKind::Legend))
        );
    }

    #[test]
    fn test_station_grid_unit() {
        let mut map = MetroMap::default();
        assert_eq!(map.station_grid_unit(), 10.0);
        map.select_color("rgb(1, 1, 1)").expect("color");
        assert_eq!(map.station_grid_unit(), 5.0);
    }
}
