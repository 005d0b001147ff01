//! Typed event emitter owned by a map.
//!
//! The rendering surface subscribes and projects each change onto its own
//! representation. Listeners live exactly as long as the emitter.

use std::fmt;

use crate::models::{ElementKind, MetrolineId, StationId, Tool};

bitflags::bitflags! {
    /// Which visual attributes of a station need re-synchronizing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StationChanges: u8 {
        const POSITION    = 0b0000_0001;
        const TEXT        = 0b0000_0010;
        const SHAPE       = 0b0000_0100;
        const ORIENTATION = 0b0000_1000;
        const METROLINES  = 0b0001_0000;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    StationAdded(StationId),
    StationChanged { id: StationId, changes: StationChanges },
    StationRemoved(StationId),
    MetrolineAdded(MetrolineId),
    MetrolineChanged(MetrolineId),
    MetrolineRemoved(MetrolineId),
    /// A metroline's identity was re-derived from its color
    MetrolineRekeyed { from: MetrolineId, to: MetrolineId },
    LegendChanged,
    ElementChanged(ElementKind),
    ToolChanged(Tool),
    SelectionChanged,
    /// Connection detection is waiting for the next layout settle
    DetectionScheduled(StationId),
    CanvasResized { width: f64, height: f64 },
    MapReloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

pub struct EventEmitter<E> {
    listeners: Vec<(ListenerId, Listener<E>)>,
    next_id: u64,
}

impl<E> EventEmitter<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a listener, called for every event in emission order
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the listener was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
