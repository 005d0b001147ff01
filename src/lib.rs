#![allow(clippy::implicit_hasher)]
#![allow(unknown_lints)]

pub mod constants;
pub mod error;
pub mod events;
pub mod geometry;
pub mod logging;
pub mod models;
pub mod spatial_index;
pub mod storage;

pub use error::MapError;
pub use models::MetroMap;
