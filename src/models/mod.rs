mod color;
mod document;
mod element;
mod id;
mod legend;
mod metro_map;
mod metroline;
mod settings;
mod station;
mod undo;

pub use color::Rgb;
pub use document::{ElementRecord, MapDocument, MetrolineRecord, SegmentRecord, StationRecord};
pub use element::{ElementKind, ElementLayout, Elements};
pub use id::{MetrolineId, SegmentId, StationId};
pub use legend::{Legend, LegendEntry};
pub use metro_map::{
    Gesture, HitTarget, Interaction, KeyCommand, MetroMap, Metrolines, PointerEvent, StationEdit,
    Stations, Tool,
};
pub use metroline::{lock_direction, Metroline, Segment};
pub use settings::EditorSettings;
pub use station::{Orientation, Station, StationShape};
pub use undo::StateManager;
