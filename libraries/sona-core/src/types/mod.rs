//! Domain types shared across Sona crates

mod context;
mod track;

pub use context::{ContextKind, QueueContext, TrackSource};
pub use track::Track;
