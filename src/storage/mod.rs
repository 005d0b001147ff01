mod snapshot;

pub use snapshot::{decode_snapshot, encode_snapshot, Snapshot};

/// Format version written at the start of every snapshot
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;
