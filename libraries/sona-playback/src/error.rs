//! Error types for the playback engine
//!
//! Engine commands never return these to the caller. They travel between the
//! engine's internal steps and end up in a log line at the command boundary.

use sona_core::SonaError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A collaborator (catalog, sink factory, sink, store) failed
    #[error(transparent)]
    Collaborator(#[from] SonaError),

    /// The durability snapshot could not be encoded
    #[error("Snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
