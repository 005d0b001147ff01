//! Uniform-cell index over metroline segments.
//!
//! Answers "which segments are near this rectangle" without scanning every
//! metroline. Cells cover the canvas only: edges are clipped to the canvas
//! before they are walked, and segments reaching past it are also kept in an
//! overflow set returned for every query that reaches past it too. The index is
//! rebuilt whenever the canvas is resized.

use std::collections::{HashMap, HashSet};

use crate::constants::SPATIAL_CELL_FACTOR;
use crate::geometry::{Point, Rect};
use crate::models::{Metroline, MetrolineId, SegmentId};

type CellKey = (i32, i32);

/// Cells a query is widened by, covering the drift between the integer
/// cell walk and the continuous segment
const QUERY_PADDING_CELLS: i32 = 2;

/// A candidate segment returned by [`SpatialGridIndex::query`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHit {
    pub segment: SegmentId,
    pub metroline: MetrolineId,
}

#[derive(Debug, Clone)]
pub struct SpatialGridIndex {
    cell_size: f64,
    canvas: Rect,
    columns: i32,
    rows: i32,
    cells: HashMap<CellKey, HashSet<SegmentId>>,
    /// Segments with geometry outside the canvas
    overflow: HashSet<SegmentId>,
    segment_cells: HashMap<SegmentId, Vec<CellKey>>,
    segment_owner: HashMap<SegmentId, MetrolineId>,
}

impl SpatialGridIndex {
    /// Create an empty index whose cells are twice the grid snap size
    #[must_use]
    pub fn new(grid_size: f64, width: f64, height: f64) -> Self {
        let cell_size = grid_size * SPATIAL_CELL_FACTOR;
        Self {
            cell_size,
            canvas: Rect::new(0.0, 0.0, width, height),
            columns: Self::cell_count_for(width, cell_size),
            rows: Self::cell_count_for(height, cell_size),
            cells: HashMap::new(),
            overflow: HashSet::new(),
            segment_cells: HashMap::new(),
            segment_owner: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_count_for(extent: f64, cell_size: f64) -> i32 {
        ((extent / cell_size).ceil() as i32).max(1)
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Grid cell containing a world coordinate, clamped to the canvas
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_grid(&self, x: f64, y: f64) -> CellKey {
        let gx = (x / self.cell_size).floor() as i32;
        let gy = (y / self.cell_size).floor() as i32;
        (gx.clamp(0, self.columns - 1), gy.clamp(0, self.rows - 1))
    }

    /// Register every edge of a segment's polyline under `metroline`
    pub fn add_segment(&mut self, segment: SegmentId, metroline: &MetrolineId, points: &[Point]) {
        if self.segment_owner.contains_key(&segment) {
            self.remove_segment(segment);
        }

        let mut visited: Vec<CellKey> = Vec::new();
        let mut outside = points.iter().any(|p| !self.canvas.contains(*p));
        let edges: Vec<(Point, Point)> = match points {
            [] => Vec::new(),
            [only] => vec![(*only, *only)],
            _ => points.windows(2).map(|pair| (pair[0], pair[1])).collect(),
        };

        for (a, b) in edges {
            let Some((a, b)) = clip_edge(a, b, &self.canvas) else {
                outside = true;
                continue;
            };
            let from = self.world_to_grid(a.0, a.1);
            let to = self.world_to_grid(b.0, b.1);
            for cell in traverse_cells(from, to) {
                if !visited.contains(&cell) {
                    visited.push(cell);
                }
            }
        }

        if outside {
            self.overflow.insert(segment);
        }
        for cell in &visited {
            self.cells.entry(*cell).or_default().insert(segment);
        }
        self.segment_cells.insert(segment, visited);
        self.segment_owner.insert(segment, metroline.clone());
    }

    /// Unregister a segment, pruning cells left empty. Returns its former owner.
    pub fn remove_segment(&mut self, segment: SegmentId) -> Option<MetrolineId> {
        if let Some(visited) = self.segment_cells.remove(&segment) {
            for cell in visited {
                if let Some(set) = self.cells.get_mut(&cell) {
                    set.remove(&segment);
                    if set.is_empty() {
                        self.cells.remove(&cell);
                    }
                }
            }
        }
        self.overflow.remove(&segment);
        self.segment_owner.remove(&segment)
    }

    /// Move a segment to a new owning metroline without touching its cells
    pub fn reassign_owner(&mut self, segment: SegmentId, metroline: &MetrolineId) -> bool {
        match self.segment_owner.get_mut(&segment) {
            Some(owner) => {
                *owner = metroline.clone();
                true
            }
            None => false,
        }
    }

    /// Candidate segments whose cells overlap `bounds`, ordered by segment id.
    ///
    /// Candidates are a superset of the segments actually touching `bounds`;
    /// callers run the exact predicate on the result.
    #[must_use]
    pub fn query(&self, bounds: &Rect) -> Vec<SegmentHit> {
        let (min_x, min_y) = self.world_to_grid(bounds.min_x, bounds.min_y);
        let (max_x, max_y) = self.world_to_grid(bounds.max_x, bounds.max_y);

        let min_x = (min_x - QUERY_PADDING_CELLS).max(0);
        let min_y = (min_y - QUERY_PADDING_CELLS).max(0);
        let max_x = (max_x + QUERY_PADDING_CELLS).min(self.columns - 1);
        let max_y = (max_y + QUERY_PADDING_CELLS).min(self.rows - 1);

        let mut working: HashSet<SegmentId> = HashSet::new();
        let within_canvas = self.canvas.contains((bounds.min_x, bounds.min_y))
            && self.canvas.contains((bounds.max_x, bounds.max_y));
        if !within_canvas {
            working.extend(self.overflow.iter().copied());
        }
        for gy in min_y..=max_y {
            for gx in min_x..=max_x {
                if let Some(set) = self.cells.get(&(gx, gy)) {
                    working.extend(set.iter().copied());
                }
            }
        }

        let mut segments: Vec<SegmentId> = working.into_iter().collect();
        segments.sort_unstable();
        segments
            .into_iter()
            .filter_map(|segment| {
                self.segment_owner.get(&segment).map(|metroline| SegmentHit {
                    segment,
                    metroline: metroline.clone(),
                })
            })
            .collect()
    }

    /// Clear and re-register every segment of every metroline for a new canvas size
    pub fn rebuild<'a>(
        &mut self,
        metrolines: impl IntoIterator<Item = &'a Metroline>,
        width: f64,
        height: f64,
    ) {
        self.canvas = Rect::new(0.0, 0.0, width, height);
        self.columns = Self::cell_count_for(width, self.cell_size);
        self.rows = Self::cell_count_for(height, self.cell_size);
        self.cells.clear();
        self.overflow.clear();
        self.segment_cells.clear();
        self.segment_owner.clear();

        for metroline in metrolines {
            for segment in &metroline.segments {
                self.add_segment(segment.id, &metroline.id, &segment.points);
            }
        }
    }

    #[must_use]
    pub fn owner(&self, segment: SegmentId) -> Option<&MetrolineId> {
        self.segment_owner.get(&segment)
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_owner.len()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// The part of edge `a`-`b` inside `bounds` (Liang-Barsky), if any
fn clip_edge(a: Point, b: Point, bounds: &Rect) -> Option<(Point, Point)> {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [
        (-dx, a.0 - bounds.min_x),
        (dx, bounds.max_x - a.0),
        (-dy, a.1 - bounds.min_y),
        (dy, bounds.max_y - a.1),
    ] {
        if p == 0.0 {
            // Parallel to this boundary
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
}

/// Integer line walk between two cells that steps one axis at a time.
///
/// Every pair of consecutive cells shares an edge, so no cell the line
/// passes between is skipped for steep or shallow lines.
fn traverse_cells(from: CellKey, to: CellKey) -> Vec<CellKey> {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = (to.0 - x).signum();
    let sy = (to.1 - y).signum();
    let mut err = dx + dy;

    let capacity = usize::try_from(dx - dy + 1).unwrap_or(1);
    let mut cells = Vec::with_capacity(capacity);
    cells.push((x, y));

    while (x, y) != to {
        let e2 = 2 * err;
        let step_x = if x == to.0 {
            false
        } else if y == to.1 {
            true
        } else {
            e2 - dy > dx - e2
        };

        if step_x {
            err += dy;
            x += sx;
        } else {
            err += dx;
            y += sy;
        }
        cells.push((x, y));
    }

    cells
}
