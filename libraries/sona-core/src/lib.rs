//! Sona Core
//!
//! Platform-agnostic core types, collaborator traits, and error handling for Sona.
//!
//! This crate provides the foundational building blocks shared by the playback
//! engine, the storage backends and the Subsonic catalog client.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `QueueContext`, `TrackSource`
//! - **Collaborator Traits**: `Catalog`, `SinkFactory`, `AudioSink`, `KeyValueStore`
//! - **Error Handling**: Unified `SonaError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use sona_core::types::{ContextKind, QueueContext, Track};
//!
//! let track = Track::new("tr-1", "Intro", "Some Artist");
//! let context = QueueContext::new("Debut", ContextKind::Album, Some("al-7".to_string()));
//!
//! assert_eq!(track.id, "tr-1");
//! assert_eq!(context.label(), "Next in Debut");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SonaError};
pub use traits::{AudioSink, Catalog, KeyValueStore, SinkFactory, SinkOptions};
pub use types::{ContextKind, QueueContext, Track, TrackSource};
