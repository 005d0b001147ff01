/// Identifier types for map entities
///
/// - `MetrolineId` is derived from a metroline's color, one metroline per color
/// - `StationId` is a random UUID, stations have no natural key
/// - `SegmentId` is handed out by the owning map in increasing order
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Rgb;

/// Stable metroline identity, `metroline-<r>-<g>-<b>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetrolineId(String);

impl MetrolineId {
    #[must_use]
    pub fn from_color(color: Rgb) -> Self {
        Self(format!("metroline-{}-{}-{}", color.r, color.g, color.b))
    }

    /// Disambiguates an id still held by a metroline whose color has since changed
    #[must_use]
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetrolineId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MetrolineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(uuid::Uuid);

impl StationId {
    /// Generate a new random station ID
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metroline_id_is_derived_from_color() {
        let a = MetrolineId::from_color(Rgb::new(255, 0, 12));
        let b = MetrolineId::from_color(Rgb::new(255, 0, 12));
        let c = MetrolineId::from_color(Rgb::new(255, 0, 13));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "metroline-255-0-12");
    }

    #[test]
    fn test_generate_many_unique_station_ids() {
        let mut ids = HashSet::new();
        let count = 10_000;

        for _ in 0..count {
            ids.insert(StationId::generate());
        }

        assert_eq!(ids.len(), count);
    }
}
