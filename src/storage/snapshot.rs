use crate::error::MapError;
use crate::models::MapDocument;
use crate::storage::CURRENT_SNAPSHOT_VERSION;

/// Opaque serialized copy of a map, as kept on the undo/redo stacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Serialize a document to bytes with version header
///
/// # Errors
/// Returns an error if `MessagePack` serialization fails
pub fn encode_snapshot(document: &MapDocument) -> Result<Snapshot, MapError> {
    let document_bytes = rmp_serde::to_vec(document)
        .map_err(|e| MapError::Snapshot(format!("Failed to serialize map: {e}")))?;

    // Versioned format: [4 bytes u32 version][`MessagePack` data]
    let mut bytes = Vec::with_capacity(4 + document_bytes.len());
    bytes.extend_from_slice(&CURRENT_SNAPSHOT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&document_bytes);

    Ok(Snapshot(bytes))
}

/// Deserialize a document from a snapshot with version header validation
///
/// # Errors
/// Returns an error if the snapshot is truncated, the version is unsupported, or decoding fails
pub fn decode_snapshot(snapshot: &Snapshot) -> Result<MapDocument, MapError> {
    let bytes = snapshot.as_bytes();
    if bytes.len() < 4 {
        return Err(MapError::Snapshot("Invalid snapshot: too small".to_string()));
    }

    let version_bytes: [u8; 4] = bytes[0..4]
        .try_into()
        .map_err(|_| MapError::Snapshot("Invalid version header".to_string()))?;
    let version = u32::from_le_bytes(version_bytes);

    if version != CURRENT_SNAPSHOT_VERSION {
        return Err(MapError::Snapshot(format!("Unsupported snapshot version: {version}")));
    }

    rmp_serde::from_slice(&bytes[4..])
        .map_err(|e| MapError::Snapshot(format!("Failed to parse map: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetrolineId, MetrolineRecord, Rgb, SegmentRecord};

    fn document() -> MapDocument {
        let color = Rgb::new(200, 10, 10);
        MapDocument {
            title: "Test".to_string(),
            subtitle: String::new(),
            width: 800.0,
            height: 600.0,
            metrolines: vec![MetrolineRecord {
                id: MetrolineId::from_color(color),
                color,
                segments: vec![SegmentRecord {
                    start: (0.0, 0.0),
                    end: (100.0, 0.0),
                    intermediate: vec![(50.0, 0.0)],
                }],
                name: "Red".to_string(),
                target_group: "Everyone".to_string(),
            }],
            stations: vec![],
            elements: vec![],
        }
    }

    #[test]
    fn test_encode_decode_preserves_document() {
        let doc = document();
        let snapshot = encode_snapshot(&doc).expect("Failed to encode");
        assert_eq!(&snapshot.as_bytes()[0..4], &CURRENT_SNAPSHOT_VERSION.to_le_bytes());
        assert_eq!(decode_snapshot(&snapshot).expect("Failed to decode"), doc);
    }

    #[test]
    fn test_decode_too_small() {
        let result = decode_snapshot(&Snapshot::from_bytes(vec![0, 1, 2]));
        assert!(matches!(result, Err(MapError::Snapshot(msg)) if msg.contains("too small")));
    }

    #[test]
    fn test_decode_unsupported_version() {
        let mut bytes = vec![0u8; 8];
        bytes[0..4].copy_from_slice(&99u32.to_le_bytes());
        let result = decode_snapshot(&Snapshot::from_bytes(bytes));
        assert!(matches!(result, Err(MapError::Snapshot(msg)) if msg.contains("Unsupported")));
    }
}
