/// Grid snap unit used for alignment
pub const GRID_SIZE: f64 = 10.0;

/// Spatial index cells span this many grid units
pub const SPATIAL_CELL_FACTOR: f64 = 2.0;

/// Default canvas extent in canvas units
pub const DEFAULT_CANVAS_WIDTH: f64 = 1500.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1000.0;

/// Distance within which a point counts as lying on a metroline
pub const LINE_TOLERANCE: f64 = 10.0;

/// Margin used when locking a drawn segment to horizontal/vertical/diagonal
pub const DIRECTION_LOCK_MARGIN: f64 = 25.0;

/// Maximum number of undo (and redo) snapshots kept
pub const UNDO_CAPACITY: usize = 30;

/// Minimum time between connection re-detections while dragging a station
pub const REDETECT_INTERVAL_MS: i64 = 500;

/// Entries per legend column; the legend has two columns
pub const LEGEND_COLUMN_CAPACITY: usize = 8;

/// Diameter of a `normal` station marker
pub const STATION_SIZE: f64 = 10.0;

/// Length of the terminus bar drawn for `start` and `end` stations
pub const TERMINUS_SIZE: f64 = 14.0;

/// Allowed range for the `width` of a `connection` station
pub const MIN_CONNECTION_WIDTH: u8 = 2;
pub const MAX_CONNECTION_WIDTH: u8 = 7;

/// Spacing of debug sample points along a connection box
pub const DEBUG_SAMPLE_STEP: f64 = 2.0;
