use serde::{Deserialize, Serialize};

use super::{MetrolineId, Rgb, SegmentId};
use crate::error::MapError;
use crate::geometry::{point_near_segment, Point};

/// One polyline of a metroline, at least two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub points: Vec<Point>,
}

impl Segment {
    #[must_use]
    pub fn start(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn end(&self) -> Point {
        self.points.last().copied().unwrap_or_default()
    }

    /// Points between the start and end
    #[must_use]
    pub fn intermediate(&self) -> &[Point] {
        match self.points.len() {
            0..=2 => &[],
            n => &self.points[1..n - 1],
        }
    }

    /// Consecutive point pairs
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// All points coincide, so the segment has no length
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let start = self.start();
        self.points.iter().all(|p| *p == start)
    }
}

/// Snap `target` so that the line from `origin` runs horizontal, vertical or at 45°.
///
/// Horizontal wins when the horizontal delta exceeds the vertical one by more
/// than `margin`, vertical in the symmetric case, diagonal otherwise.
#[must_use]
pub fn lock_direction(origin: Point, target: Point, margin: f64) -> Point {
    let dx = target.0 - origin.0;
    let dy = target.1 - origin.1;
    let adx = dx.abs();
    let ady = dy.abs();

    if adx - margin > ady {
        (target.0, origin.1)
    } else if ady - margin > adx {
        (origin.0, target.1)
    } else {
        // Diagonal, driven by the horizontal delta
        (target.0, origin.1 + adx * sign(dy))
    }
}

fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metroline {
    pub id: MetrolineId,
    pub color: Rgb,
    pub name: String,
    pub target_group: String,
    pub segments: Vec<Segment>,
}

impl Metroline {
    /// Create an empty metroline whose identity is derived from `color`
    #[must_use]
    pub fn new(color: Rgb, name: String) -> Self {
        Self {
            id: MetrolineId::from_color(color),
            color,
            name,
            target_group: String::new(),
            segments: Vec::new(),
        }
    }

    /// Append a new segment and return it
    ///
    /// # Errors
    /// Returns an error if any coordinate is not finite
    pub fn draw(
        &mut self,
        id: SegmentId,
        start: Point,
        end: Point,
        intermediate: Vec<Point>,
    ) -> Result<&Segment, MapError> {
        for p in std::iter::once(&start).chain(&intermediate).chain(std::iter::once(&end)) {
            crate::error::ensure_finite(p.0, p.1)?;
        }

        let mut points = Vec::with_capacity(intermediate.len() + 2);
        points.push(start);
        points.extend(intermediate);
        points.push(end);

        self.segments.push(Segment { id, points });
        let index = self.segments.len() - 1;
        Ok(&self.segments[index])
    }

    #[must_use]
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment, MapError> {
        self.segments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(MapError::UnknownSegment(id))
    }

    /// Recompute a segment's terminal point from the point before it, locked
    /// to horizontal, vertical or diagonal. Returns the new terminal point.
    ///
    /// # Errors
    /// Returns an error if the segment is not part of this metroline or the target is not finite
    pub fn draw_new_end_position(
        &mut self,
        segment: SegmentId,
        end_x: f64,
        end_y: f64,
        margin: f64,
    ) -> Result<Point, MapError> {
        crate::error::ensure_finite(end_x, end_y)?;
        let segment = self.segment_mut(segment)?;

        let n = segment.points.len();
        if n < 2 {
            return Err(MapError::UnknownSegment(segment.id));
        }
        let origin = segment.points[n - 2];
        let locked = lock_direction(origin, (end_x, end_y), margin);
        segment.points[n - 1] = locked;
        Ok(locked)
    }

    /// Translate only the terminal point of a segment
    ///
    /// # Errors
    /// Returns an error if the segment is not part of this metroline or the offset is not finite
    pub fn adjust_end_position_by_amount(
        &mut self,
        segment: SegmentId,
        dx: f64,
        dy: f64,
    ) -> Result<Point, MapError> {
        crate::error::ensure_finite(dx, dy)?;
        let segment = self.segment_mut(segment)?;
        let id = segment.id;
        let end = segment.points.last_mut().ok_or(MapError::UnknownSegment(id))?;
        end.0 += dx;
        end.1 += dy;
        Ok(*end)
    }

    /// Translate every point of every segment
    pub fn move_all_lines_by_offset(&mut self, dx: f64, dy: f64) {
        for segment in &mut self.segments {
            for point in &mut segment.points {
                point.0 += dx;
                point.1 += dy;
            }
        }
    }

    /// Whether `(x, y)` is within `tolerance` of any segment edge
    #[must_use]
    pub fn is_point_on_line(&self, x: f64, y: f64, tolerance: f64) -> bool {
        self.segments
            .iter()
            .flat_map(Segment::edges)
            .any(|(p1, p2)| point_near_segment(p1, p2, (x, y), tolerance))
    }

    /// Detach a segment, returning it
    pub fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        let index = self.segments.iter().position(|s| s.id == id)?;
        Some(self.segments.remove(index))
    }

    /// No segments left: the metroline is orphaned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Change the stroke color; applies to every segment
    ///
    /// The identity is kept; re-deriving it is an explicit map operation.
    ///
    /// # Errors
    /// Returns an error if `color` is not an `rgb(r, g, b)` triple
    pub fn set_color(&mut self, color: &str) -> Result<Rgb, MapError> {
        let parsed: Rgb = color.parse()?;
        self.color = parsed;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_line() -> Metroline {
        Metroline::new(Rgb::new(255, 0, 0), "Red".to_string())
    }

    #[test]
    fn test_draw_appends_segment() {
        let mut line = red_line();
        let segment = line
            .draw(SegmentId(1), (0.0, 0.0), (50.0, 0.0), vec![(20.0, 0.0)])
            .expect("valid segment");

        assert_eq!(segment.start(), (0.0, 0.0));
        assert_eq!(segment.end(), (50.0, 0.0));
        assert_eq!(segment.intermediate(), &[(20.0, 0.0)]);
        assert_eq!(line.segments.len(), 1);
    }

    #[test]
    fn test_draw_rejects_non_finite_points() {
        let mut line = red_line();
        let result = line.draw(SegmentId(1), (0.0, 0.0), (f64::NAN, 0.0), vec![]);
        assert!(matches!(result, Err(MapError::InvalidCoordinate { .. })));
        assert!(line.is_empty());
    }

    #[test]
    fn test_lock_direction() {
        let origin = (100.0, 100.0);
        // Mostly horizontal
        assert_eq!(lock_direction(origin, (200.0, 120.0), 25.0), (200.0, 100.0));
        // Mostly vertical
        assert_eq!(lock_direction(origin, (90.0, 0.0), 25.0), (100.0, 0.0));
        // Comparable deltas go diagonal
        assert_eq!(lock_direction(origin, (160.0, 50.0), 25.0), (160.0, 40.0));
        assert_eq!(lock_direction(origin, (40.0, 150.0), 25.0), (40.0, 160.0));
    }

    #[test]
    fn test_draw_new_end_position_locks_from_origin() {
        let mut line = red_line();
        line.draw(SegmentId(1), (0.0, 0.0), (0.0, 0.0), vec![]).expect("segment");

        let end = line
            .draw_new_end_position(SegmentId(1), 100.0, 10.0, 25.0)
            .expect("known segment");
        assert_eq!(end, (100.0, 0.0));

        // Second update still measures from the original first point
        let end = line
            .draw_new_end_position(SegmentId(1), 60.0, 70.0, 25.0)
            .expect("known segment");
        assert_eq!(end, (60.0, 60.0));
    }

    #[test]
    fn test_draw_new_end_position_unknown_segment() {
        let mut line = red_line();
        assert_eq!(
            line.draw_new_end_position(SegmentId(9), 1.0, 1.0, 25.0),
            Err(MapError::UnknownSegment(SegmentId(9)))
        );
    }

    #[test]
    fn test_adjust_end_position_by_amount() {
        let mut line = red_line();
        line.draw(SegmentId(1), (0.0, 0.0), (10.0, 0.0), vec![]).expect("segment");

        let end = line
            .adjust_end_position_by_amount(SegmentId(1), 10.0, 0.0)
            .expect("known segment");
        assert_eq!(end, (20.0, 0.0));
        assert_eq!(line.segments[0].start(), (0.0, 0.0));
    }

    #[test]
    fn test_move_all_lines_by_offset() {
        let mut line = red_line();
        line.draw(SegmentId(1), (0.0, 0.0), (10.0, 0.0), vec![]).expect("segment");
        line.draw(SegmentId(2), (0.0, 10.0), (0.0, 30.0), vec![(0.0, 20.0)]).expect("segment");

        line.move_all_lines_by_offset(5.0, -5.0);
        assert_eq!(line.segments[0].points, vec![(5.0, -5.0), (15.0, -5.0)]);
        assert_eq!(line.segments[1].points, vec![(5.0, 5.0), (5.0, 15.0), (5.0, 25.0)]);
    }

    #[test]
    fn test_is_point_on_line() {
        let mut line = red_line();
        line.draw(SegmentId(1), (0.0, 0.0), (100.0, 0.0), vec![]).expect("segment");

        assert!(line.is_point_on_line(50.0, 5.0, 10.0));
        assert!(!line.is_point_on_line(50.0, 15.0, 10.0));
        assert!(!line.is_point_on_line(120.0, 0.0, 10.0));
    }

    #[test]
    fn test_set_color_validates() {
        let mut line = red_line();
        let id = line.id.clone();

        assert_eq!(line.set_color("rgb(0, 128, 0)"), Ok(Rgb::new(0, 128, 0)));
        assert_eq!(line.color, Rgb::new(0, 128, 0));
        assert_eq!(line.id, id);

        assert!(line.set_color("green").is_err());
        assert_eq!(line.color, Rgb::new(0, 128, 0));
    }

    #[test]
    fn test_remove_segment_orphans_line() {
        let mut line = red_line();
        line.draw(SegmentId(1), (0.0, 0.0), (10.0, 0.0), vec![]).expect("segment");

        assert!(line.remove_segment(SegmentId(1)).is_some());
        assert!(line.is_empty());
        assert!(line.remove_segment(SegmentId(1)).is_none());
    }

    #[test]
    fn test_degenerate_segment() {
        let segment = Segment { id: SegmentId(1), points: vec![(5.0, 5.0), (5.0, 5.0)] };
        assert!(segment.is_degenerate());
        assert_eq!(segment.edges().count(), 1);
    }
}
