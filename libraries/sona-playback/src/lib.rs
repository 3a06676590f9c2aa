//! Sona Playback
//!
//! Playback engine for a Subsonic streaming client.
//!
//! This crate provides:
//! - A dual queue: a FIFO priority ("play next") queue in front of a
//!   positional context queue whose cursor priority playback never moves
//! - A transport state machine (empty, loading, playing/paused, stopped)
//!   with at most one live audio sink at a time
//! - Progress polling with auto-advance and finished-track scrobbles
//! - Durable snapshots so playback resumes after a restart
//! - State subscriptions pushing a full snapshot on every change
//!
//! # Architecture
//!
//! `sona-playback` talks to the outside world only through the traits in
//! `sona-core`: a [`Catalog`](sona_core::Catalog) for stream URLs and
//! scrobbles, a [`SinkFactory`](sona_core::SinkFactory) for platform audio and
//! a [`KeyValueStore`](sona_core::KeyValueStore) for durability.
//!
//! # Example
//!
//! ```rust,no_run
//! use sona_core::{Catalog, KeyValueStore, SinkFactory, Track};
//! use sona_playback::{EngineConfig, PlaybackEngine, PlaybackOrigin};
//! use std::sync::Arc;
//!
//! async fn start(
//!     catalog: Arc<dyn Catalog>,
//!     sinks: Arc<dyn SinkFactory>,
//!     store: Arc<dyn KeyValueStore>,
//! ) {
//!     let engine = PlaybackEngine::new(catalog, sinks, store, EngineConfig::default());
//!     let mut updates = engine.subscribe();
//!
//!     if !engine.load_saved_state().await {
//!         let track = Track::new("tr-1", "Intro", "Some Artist");
//!         engine.play_track(track, None, 0, PlaybackOrigin::default()).await;
//!     }
//!
//!     while let Some(state) = updates.recv().await {
//!         println!("{} / {}", state.position_label(), state.duration_label());
//!     }
//! }
//! ```

#![forbid(unsafe_code)]

mod engine;
pub mod error;
pub mod events;
mod poller;
pub mod queue;
pub mod snapshot;
pub mod types;

pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::StateSubscription;
pub use queue::QueueModel;
pub use snapshot::DurabilitySnapshot;
pub use types::{format_time, EngineConfig, PlaybackOrigin, PlaybackState, PlayerStatus};
