//! Pure geometric predicates used for hit testing and connection detection.

/// A point in canvas units
pub type Point = (f64, f64);

/// Axis-aligned rectangle in canvas units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Create a rectangle from its top-left corner and extent
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x.min(x + width),
            min_y: y.min(y + height),
            max_x: x.max(x + width),
            max_y: y.max(y + height),
        }
    }

    /// Create a rectangle centered on a point
    #[must_use]
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.0 - width / 2.0, center.1 - height / 2.0, width, height)
    }

    /// Smallest rectangle containing every point, `None` for an empty slice
    #[must_use]
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut rect = Self {
            min_x: first.0,
            min_y: first.1,
            max_x: first.0,
            max_y: first.1,
        };
        for p in rest {
            rect.min_x = rect.min_x.min(p.0);
            rect.min_y = rect.min_y.min(p.1);
            rect.max_x = rect.max_x.max(p.0);
            rect.max_y = rect.max_y.max(p.1);
        }
        Some(rect)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Inclusive containment test
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.0 >= self.min_x && p.0 <= self.max_x && p.1 >= self.min_y && p.1 <= self.max_y
    }

    /// Corners in winding order, starting at the top-left
    #[must_use]
    pub fn vertices(&self) -> [Point; 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
    }
}

/// Calculates the minimum distance from a point to a line segment.
///
/// Degenerate segments (both endpoints equal) measure the distance to that
/// single point.
///
/// # Arguments
/// * `point` - The point to measure from
/// * `seg_start` - Starting point of the line segment
/// * `seg_end` - Ending point of the line segment
#[must_use]
pub fn point_to_line_segment_distance(point: Point, seg_start: Point, seg_end: Point) -> f64 {
    let dx = seg_end.0 - seg_start.0;
    let dy = seg_end.1 - seg_start.1;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        let px = point.0 - seg_start.0;
        let py = point.1 - seg_start.1;
        return (px * px + py * py).sqrt();
    }

    let t = ((point.0 - seg_start.0) * dx + (point.1 - seg_start.1) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);

    let closest_x = seg_start.0 + t * dx;
    let closest_y = seg_start.1 + t * dy;

    let px = point.0 - closest_x;
    let py = point.1 - closest_y;
    (px * px + py * py).sqrt()
}

/// Checks whether `q` lies strictly closer than `tolerance` to the segment `p1`-`p2`.
#[must_use]
pub fn point_near_segment(p1: Point, p2: Point, q: Point, tolerance: f64) -> bool {
    point_to_line_segment_distance(q, p1, p2) < tolerance
}

/// Rotates the corners of an axis-aligned rectangle about `center`.
///
/// The rectangle has its top-left corner at `(x, y)`. Returns the four
/// rotated corners in the same winding order as [`Rect::vertices`].
#[must_use]
pub fn rotated_rect_vertices(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    angle_deg: f64,
    center: Point,
) -> [Point; 4] {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let corners = [(x, y), (x + width, y), (x + width, y + height), (x, y + height)];

    corners.map(|(cx, cy)| {
        let dx = cx - center.0;
        let dy = cy - center.1;
        (
            center.0 + dx * cos - dy * sin,
            center.1 + dx * sin + dy * cos,
        )
    })
}

/// Ray-casting parity test. Points exactly on an edge may land either side.
#[must_use]
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    let mut inside = false;
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = vertices[i];
        let (xj, yj) = vertices[j];
        if (yi > p.1) != (yj > p.1) && p.0 < (xj - xi) * (p.1 - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Checks if two line segments intersect.
///
/// Uses the parametric line equation method for numerical stability.
/// Returns false if the segments are parallel, collinear overlap included.
///
/// # Arguments
/// * `a1` - First endpoint of segment A
/// * `a2` - Second endpoint of segment A
/// * `b1` - First endpoint of segment B
/// * `b2` - Second endpoint of segment B
#[must_use]
pub fn line_segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d = (a2.0 - a1.0) * (b2.1 - b1.1) - (a2.1 - a1.1) * (b2.0 - b1.0);

    if d.abs() < 1e-10 {
        return false;
    }

    let t = ((b1.0 - a1.0) * (b2.1 - b1.1) - (b1.1 - a1.1) * (b2.0 - b1.0)) / d;
    let u = ((b1.0 - a1.0) * (a2.1 - a1.1) - (b1.1 - a1.1) * (a2.0 - a1.0)) / d;

    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// True if either endpoint lies inside the polygon or the segment crosses one of its edges.
#[must_use]
pub fn segment_intersects_polygon(segment: (Point, Point), vertices: &[Point]) -> bool {
    let (start, end) = segment;
    if point_in_polygon(start, vertices) || point_in_polygon(end, vertices) {
        return true;
    }

    let n = vertices.len();
    (0..n).any(|i| line_segments_intersect(start, end, vertices[i], vertices[(i + 1) % n]))
}

/// Emits points every `step` units along each polygon edge, closing back to the first vertex.
///
/// Only used to visualize a detection box; detection itself never depends on it.
#[must_use]
pub fn sample_points_on_polygon_edges(vertices: &[Point], step: f64) -> Vec<Point> {
    let mut points = Vec::new();
    if vertices.is_empty() || step <= 0.0 {
        return points;
    }

    let n = vertices.len();
    for i in 0..n {
        let start = vertices[i];
        let end = vertices[(i + 1) % n];
        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        let length = (dx * dx + dy * dy).sqrt();
        if length == 0.0 {
            continue;
        }

        let mut travelled = 0.0;
        while travelled < length {
            let t = travelled / length;
            points.push((start.0 + t * dx, start.1 + t * dy));
            travelled += step;
        }
    }

    points
}

/// Rounds a coordinate to the nearest multiple of `unit`.
#[must_use]
pub fn snap_to_grid(value: f64, unit: f64) -> f64 {
    (value / unit).round() * unit
}

/// Rounds both coordinates of a point to the nearest multiple of `unit`.
#[must_use]
pub fn snap_point(point: Point, unit: f64) -> Point {
    (snap_to_grid(point.0, unit), snap_to_grid(point.1, unit))
}
