use serde::{Deserialize, Serialize};

use super::{Metroline, MetrolineId, Rgb};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub metroline: MetrolineId,
    pub name: String,
    pub target_group: String,
    pub color: Rgb,
}

/// Display list derived from the metrolines that have at least one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    entries: Vec<LegendEntry>,
    column_capacity: usize,
}

impl Legend {
    #[must_use]
    pub fn new(column_capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            column_capacity,
        }
    }

    /// Rebuild the entries from the metrolines in drawing order.
    /// Returns true if anything changed.
    pub fn sync<'a>(&mut self, metrolines: impl IntoIterator<Item = &'a Metroline>) -> bool {
        let entries: Vec<LegendEntry> = metrolines
            .into_iter()
            .filter(|m| !m.is_empty())
            .map(|m| LegendEntry {
                metroline: m.id.clone(),
                name: m.name.clone(),
                target_group: m.target_group.clone(),
                color: m.color,
            })
            .collect();

        if entries == self.entries {
            return false;
        }
        self.entries = entries;
        true
    }

    /// Drop entries whose metroline no longer exists
    pub fn prune(&mut self, exists: impl Fn(&MetrolineId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| exists(&entry.metroline));
        before - self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, metroline: &MetrolineId) -> Option<&LegendEntry> {
        self.entries.iter().find(|e| &e.metroline == metroline)
    }

    /// Entries laid out into the two fixed-capacity columns
    #[must_use]
    pub fn columns(&self) -> (&[LegendEntry], &[LegendEntry]) {
        let visible = self.entries.len().min(self.column_capacity * 2);
        let split = visible.min(self.column_capacity);
        (&self.entries[..split], &self.entries[split..visible])
    }

    /// Entries that do not fit into the two columns
    #[must_use]
    pub fn overflow(&self) -> usize {
        self.entries.len().saturating_sub(self.column_capacity * 2)
    }
}
