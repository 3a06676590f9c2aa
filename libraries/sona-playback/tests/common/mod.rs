//! Shared test infrastructure for engine integration tests
//!
//! In-memory fakes for the catalog and the platform audio stack, plus a
//! harness wiring them into a `PlaybackEngine` over a `MemoryStore`.

#![allow(dead_code)]

use async_trait::async_trait;
use sona_core::{
    AudioSink, Catalog, KeyValueStore, Result, SinkFactory, SinkOptions, SonaError, Track,
};
use sona_playback::{EngineConfig, PlaybackEngine};
use sona_storage::MemoryStore;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const POLL_MS: u64 = 100;

// ============================================================================
// Catalog
// ============================================================================

#[derive(Default)]
pub struct FakeCatalog {
    scrobbles: Mutex<Vec<(String, bool)>>,
    fail_scrobbles: AtomicBool,
    unresolvable: Mutex<HashSet<String>>,
}

impl FakeCatalog {
    pub fn scrobbles(&self) -> Vec<(String, bool)> {
        self.scrobbles.lock().unwrap().clone()
    }

    pub fn fail_scrobbles(&self) {
        self.fail_scrobbles.store(true, Ordering::SeqCst);
    }

    pub fn make_unresolvable(&self, track_id: &str) {
        self.unresolvable.lock().unwrap().insert(track_id.to_string());
    }
}

pub fn stream_url_for(track_id: &str) -> String {
    format!("https://music.test/rest/stream?id={}", track_id)
}

#[async_trait]
impl Catalog for FakeCatalog {
    fn stream_url(&self, track_id: &str) -> Result<String> {
        if self.unresolvable.lock().unwrap().contains(track_id) {
            return Err(SonaError::catalog(format!("no stream for {}", track_id)));
        }
        Ok(stream_url_for(track_id))
    }

    async fn scrobble(&self, track_id: &str, submission: bool) -> Result<()> {
        self.scrobbles
            .lock()
            .unwrap()
            .push((track_id.to_string(), submission));
        if self.fail_scrobbles.load(Ordering::SeqCst) {
            return Err(SonaError::Network("scrobble endpoint down".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Audio sinks
// ============================================================================

pub struct FakeSink {
    pub url: String,
    pub created_volume: f32,
    playing: AtomicBool,
    disposed: AtomicBool,
    broken: AtomicBool,
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
    volume: Mutex<f32>,
    seeks: Mutex<Vec<u64>>,
}

impl FakeSink {
    fn new(url: &str, options: SinkOptions, duration_ms: u64) -> Self {
        Self {
            url: url.to_string(),
            created_volume: options.volume,
            playing: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            broken: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(duration_ms),
            volume: Mutex::new(options.volume),
            seeks: Mutex::new(Vec::new()),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms.load(Ordering::SeqCst)
    }

    pub fn set_position(&self, ms: u64) {
        self.position_ms.store(ms, Ordering::SeqCst);
    }

    /// Jump to the end of the stream
    pub fn finish(&self) {
        let duration = self.duration_ms.load(Ordering::SeqCst);
        self.position_ms.store(duration, Ordering::SeqCst);
    }

    /// Make every transport call fail from now on
    pub fn break_transport(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(SonaError::audio("sink already disposed"));
        }
        if self.broken.load(Ordering::SeqCst) {
            return Err(SonaError::audio("sink is broken"));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioSink for FakeSink {
    async fn play(&self) -> Result<()> {
        self.check()?;
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.check()?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn seek_to(&self, position: Duration) -> Result<()> {
        self.check()?;
        let ms = position.as_millis() as u64;
        self.position_ms.store(ms, Ordering::SeqCst);
        self.seeks.lock().unwrap().push(ms);
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.check()?;
        *self.volume.lock().unwrap() = volume;
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.playing.store(false, Ordering::SeqCst);
        self.disposed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn current_time(&self) -> Duration {
        Duration::from_millis(self.position_ms.load(Ordering::SeqCst))
    }

    fn duration(&self) -> Option<Duration> {
        match self.duration_ms.load(Ordering::SeqCst) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    fn is_playing(&self) -> bool {
        self.playing()
    }
}

pub struct FakeSinkFactory {
    created: Mutex<Vec<Arc<FakeSink>>>,
    failing: Mutex<HashSet<String>>,
    duration_ms: u64,
}

impl Default for FakeSinkFactory {
    fn default() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            duration_ms: 180_000,
        }
    }
}

impl FakeSinkFactory {
    /// Every sink ever created, oldest first
    pub fn created(&self) -> Vec<Arc<FakeSink>> {
        self.created.lock().unwrap().clone()
    }

    /// Sinks that have not been disposed
    pub fn live(&self) -> Vec<Arc<FakeSink>> {
        self.created()
            .into_iter()
            .filter(|sink| !sink.is_disposed())
            .collect()
    }

    pub fn last(&self) -> Arc<FakeSink> {
        self.created().last().cloned().expect("no sink created")
    }

    /// Fail sink creation for this track
    pub fn fail_for(&self, track_id: &str) {
        self.failing.lock().unwrap().insert(track_id.to_string());
    }

    pub fn heal(&self, track_id: &str) {
        self.failing.lock().unwrap().remove(track_id);
    }
}

#[async_trait]
impl SinkFactory for FakeSinkFactory {
    async fn create(&self, stream_url: &str, options: SinkOptions) -> Result<Arc<dyn AudioSink>> {
        // Let overlapping commands interleave
        tokio::task::yield_now().await;

        let failing = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|id| *stream_url == stream_url_for(id));
        if failing {
            return Err(SonaError::audio(format!("cannot open {}", stream_url)));
        }

        let sink = Arc::new(FakeSink::new(stream_url, options, self.duration_ms));
        self.created.lock().unwrap().push(Arc::clone(&sink));
        Ok(sink)
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub engine: PlaybackEngine,
    pub catalog: Arc<FakeCatalog>,
    pub sinks: Arc<FakeSinkFactory>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Fresh engine over an existing store (a simulated restart)
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self::with_config(store, test_config())
    }

    pub fn with_config(store: Arc<MemoryStore>, config: EngineConfig) -> Self {
        init_tracing();
        let catalog = Arc::new(FakeCatalog::default());
        let sinks = Arc::new(FakeSinkFactory::default());
        let engine = PlaybackEngine::new(
            Arc::clone(&catalog) as Arc<dyn Catalog>,
            Arc::clone(&sinks) as Arc<dyn SinkFactory>,
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            config,
        );

        Self {
            engine,
            catalog,
            sinks,
            store,
        }
    }

    pub async fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).await.unwrap()
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        poll_interval_ms: POLL_MS,
        persist_every_polls: 2,
        teardown_grace_ms: 10,
        ..EngineConfig::default()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn track(id: &str) -> Track {
    Track::new(id, format!("Track {}", id.to_uppercase()), "Test Artist")
        .with_album("Test Album")
        .with_duration_secs(180)
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn ids(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| t.id.clone()).collect()
}

pub fn current_id(engine: &PlaybackEngine) -> Option<String> {
    engine.current_state().current_track.map(|t| t.id)
}

/// Let pollers and spawned tasks run for `ms` of (paused) time
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
