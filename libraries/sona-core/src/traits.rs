/// Collaborator traits consumed by the playback engine
///
/// The engine never talks to the network, the platform audio stack or the
/// disk directly. Each of those is injected through one of these traits so
/// hosts (and tests) can provide their own implementations.
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Remote catalog/streaming service
///
/// Implemented by the Subsonic client. Only the two operations the playback
/// engine needs live here; browse queries are inherent methods of the client.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Build the stream URL for a track
    ///
    /// This is pure URL construction and performs no network I/O.
    fn stream_url(&self, track_id: &str) -> Result<String>;

    /// Report playback of a track
    ///
    /// `submission = false` is a "now playing" ping sent when playback starts,
    /// `submission = true` records a finished play.
    async fn scrobble(&self, track_id: &str, submission: bool) -> Result<()>;
}

/// Options used when creating an audio sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkOptions {
    /// Whether the sink loops the stream (the engine always passes `false`)
    pub looping: bool,

    /// Output volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            looping: false,
            volume: 1.0,
        }
    }
}

/// Creates platform audio sinks bound to a stream URL
#[async_trait]
pub trait SinkFactory: Send + Sync {
    /// Create and load a sink for `stream_url`
    ///
    /// The returned sink is loaded but not playing.
    ///
    /// # Errors
    /// Returns an error if the stream cannot be opened
    async fn create(&self, stream_url: &str, options: SinkOptions) -> Result<Arc<dyn AudioSink>>;
}

/// A loaded platform audio output for a single stream
///
/// Transport methods are async because platform players acknowledge them
/// asynchronously. The readable properties are sampled by the engine's
/// progress poller and must be cheap.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Start or resume output
    async fn play(&self) -> Result<()>;

    /// Pause output, keeping the position
    async fn pause(&self) -> Result<()>;

    /// Seek to a position from the start of the stream
    async fn seek_to(&self, position: Duration) -> Result<()>;

    /// Set output volume (0.0 - 1.0)
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Release the platform resources held by this sink
    ///
    /// The sink must not produce audio after this returns.
    async fn dispose(&self) -> Result<()>;

    /// Current playback position
    fn current_time(&self) -> Duration;

    /// Stream duration, `None` until the platform knows it
    fn duration(&self) -> Option<Duration>;

    /// Whether the sink is producing audio
    fn is_playing(&self) -> bool;
}

/// Durable string-keyed blob storage
///
/// Values are JSON documents produced by the caller. `multi_set` and
/// `multi_remove` must be atomic: after a crash either every entry of the
/// batch is visible or none is.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a single value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a single value
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Read several values as one consistent view, preserving the order of `keys`
    async fn multi_get(&self, keys: &[&str]) -> Result<Vec<(String, Option<String>)>>;

    /// Write several values in one atomic batch
    async fn multi_set(&self, entries: Vec<(String, String)>) -> Result<()>;

    /// Remove several keys in one atomic batch
    async fn multi_remove(&self, keys: &[&str]) -> Result<()>;
}
