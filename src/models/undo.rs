use super::{EditorSettings, MetroMap};
use crate::error::MapError;
use crate::storage::Snapshot;

/// Bounded undo/redo stacks of full map snapshots
#[derive(Debug, Clone)]
pub struct StateManager {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    capacity: usize,
    enabled: bool,
}

impl StateManager {
    /// Create a new `StateManager` keeping at most `capacity` snapshots per stack
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
            enabled: true,
        }
    }

    /// Create a `StateManager` sized by the editor's `undo_capacity`
    #[must_use]
    pub fn from_settings(settings: &EditorSettings) -> Self {
        Self::new(settings.undo_capacity)
    }

    fn push_bounded(stack: &mut Vec<Snapshot>, snapshot: Snapshot, capacity: usize) {
        // FIFO eviction
        if stack.len() >= capacity {
            stack.remove(0);
        }
        stack.push(snapshot);
    }

    /// Record the map's current state before a mutation.
    /// This clears the redo stack. Returns false when saving is disabled.
    ///
    /// # Errors
    /// Returns an error if the map cannot be encoded
    pub fn save_state(&mut self, map: &MetroMap) -> Result<bool, MapError> {
        if !self.enabled {
            return Ok(false);
        }
        let snapshot = map.snapshot()?;
        Self::push_bounded(&mut self.undo_stack, snapshot, self.capacity);
        self.redo_stack.clear();
        Ok(true)
    }

    /// Pop the most recent undo snapshot, pushing the map's current state onto redo.
    /// The caller loads the returned snapshot back into the map.
    ///
    /// # Errors
    /// Returns an error if the map cannot be encoded
    pub fn revert_state(&mut self, map: &MetroMap) -> Result<Option<Snapshot>, MapError> {
        if !self.enabled || self.undo_stack.is_empty() {
            return Ok(None);
        }
        let current = map.snapshot()?;
        Self::push_bounded(&mut self.redo_stack, current, self.capacity);
        Ok(self.undo_stack.pop())
    }

    /// Pop the most recent redo snapshot, pushing the map's current state onto undo
    ///
    /// # Errors
    /// Returns an error if the map cannot be encoded
    pub fn redo_state(&mut self, map: &MetroMap) -> Result<Option<Snapshot>, MapError> {
        if !self.enabled || self.redo_stack.is_empty() {
            return Ok(None);
        }
        let current = map.snapshot()?;
        Self::push_bounded(&mut self.undo_stack, current, self.capacity);
        Ok(self.redo_stack.pop())
    }

    /// Clear all undo/redo history
    pub fn clear_states(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.enabled && !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.enabled && !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new(crate::constants::UNDO_CAPACITY)
    }
}
