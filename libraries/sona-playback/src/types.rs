//! Core types for playback management

use serde::{Deserialize, Serialize};
use sona_core::{QueueContext, Track, TrackSource};
use std::time::Duration;

/// Snapshot of the engine's observable state
///
/// Pushed to every subscriber after each mutation and every progress sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    /// Track loaded (or being loaded)
    pub current_track: Option<Track>,

    /// Whether the sink is producing audio
    pub is_playing: bool,

    /// Whether a sink is being created for `current_track`
    pub is_loading: bool,

    /// Playback position in milliseconds
    pub position_ms: u64,

    /// Track duration in milliseconds (0 until known)
    pub duration_ms: u64,

    /// Context queue
    pub playlist: Vec<Track>,

    /// Cursor into `playlist`
    pub current_index: usize,

    /// Priority queue, head first
    pub priority_queue: Vec<Track>,

    /// Where `playlist` came from
    pub queue_context: Option<QueueContext>,

    /// Which queue `current_track` was taken from
    pub current_track_source: TrackSource,

    /// Output volume (0.0 - 1.0)
    pub volume: f32,
}

impl PlaybackState {
    /// Coarse player status for display
    pub fn status(&self) -> PlayerStatus {
        match (&self.current_track, self.is_loading, self.is_playing) {
            (None, _, _) => PlayerStatus::Empty,
            (Some(_), true, _) => PlayerStatus::Loading,
            (Some(_), false, true) => PlayerStatus::Playing,
            (Some(_), false, false) if self.position_ms > 0 => PlayerStatus::Paused,
            (Some(_), false, false) => PlayerStatus::Stopped,
        }
    }

    /// Context tracks after the cursor
    pub fn upcoming(&self) -> &[Track] {
        self.playlist.get(self.current_index + 1..).unwrap_or(&[])
    }

    /// Whether `next` would play something
    pub fn has_next(&self) -> bool {
        !self.priority_queue.is_empty() || !self.upcoming().is_empty()
    }

    /// Whether `previous` would play something
    pub fn has_previous(&self) -> bool {
        self.current_index > 0 && !self.playlist.is_empty()
    }

    /// Position formatted as `M:SS`
    pub fn position_label(&self) -> String {
        format_time(self.position_ms)
    }

    /// Duration formatted as `M:SS`
    pub fn duration_label(&self) -> String {
        format_time(self.duration_ms)
    }
}

/// Coarse player status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Nothing loaded
    Empty,

    /// Creating a sink
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Loaded at position zero, not playing
    Stopped,
}

/// How a `play_track` call relates to the queues
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackOrigin {
    /// Started from a browsing context
    ///
    /// `Some` replaces the queue context, `None` keeps the current one.
    Context(Option<QueueContext>),

    /// Advanced from the priority queue; the context queue is untouched
    PriorityAdvance,
}

impl PlaybackOrigin {
    /// Context origin that replaces the queue context
    pub fn context(context: QueueContext) -> Self {
        Self::Context(Some(context))
    }
}

impl Default for PlaybackOrigin {
    fn default() -> Self {
        Self::Context(None)
    }
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Progress poll interval in milliseconds (default: 500)
    pub poll_interval_ms: u64,

    /// Persist the position every N progress samples (default: 10)
    pub persist_every_polls: u32,

    /// Pause between pausing and disposing an old sink (default: 50)
    pub teardown_grace_ms: u64,

    /// Initial volume, 0.0 - 1.0 (default: 1.0)
    pub volume: f32,

    /// Send now-playing and submission scrobbles (default: true)
    pub scrobble: bool,

    /// State channel capacity per subscriber (default: 64)
    pub event_capacity: usize,
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn teardown_grace(&self) -> Duration {
        Duration::from_millis(self.teardown_grace_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            persist_every_polls: 10,
            teardown_grace_ms: 50,
            volume: 1.0,
            scrobble: true,
            event_capacity: 64,
        }
    }
}

/// Format milliseconds as `M:SS`
///
/// Minutes are not wrapped into hours.
///
/// ```
/// use sona_playback::format_time;
///
/// assert_eq!(format_time(0), "0:00");
/// assert_eq!(format_time(65_000), "1:05");
/// ```
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
