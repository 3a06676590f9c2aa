//! Playback engine
//!
//! Owns the single authoritative playback state and the one live audio sink.
//!
//! # Concurrency
//!
//! Commands take `&self` and may overlap: a second `play_track` can start
//! while the first is still resolving its stream. Two mechanisms keep that
//! safe:
//! - Every sink-creating command takes a new *load generation*. A load only
//!   commits its sink if its generation is still current, otherwise it
//!   disposes the sink it created.
//! - Every state change that must be persisted takes a new *revision*.
//!   Writes carrying an older revision than the last one written are skipped.
//!
//! The state mutex is a `std::sync::Mutex` and is never held across `.await`.

use crate::error::Result;
use crate::events::StateSubscription;
use crate::poller::{self, PollerHandle};
use crate::queue::QueueModel;
use crate::snapshot::DurabilitySnapshot;
use crate::types::{EngineConfig, PlaybackOrigin, PlaybackState};
use sona_core::{
    AudioSink, Catalog, KeyValueStore, QueueContext, SinkFactory, SinkOptions, Track, TrackSource,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Playback engine
///
/// Cheap to clone; clones share the same state and sink.
///
/// Commands never fail from the caller's point of view. Collaborator errors
/// are logged and the engine degrades to a safe state (`is_loading = false`,
/// track and queues intact).
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    catalog: Arc<dyn Catalog>,
    sinks: Arc<dyn SinkFactory>,
    store: Arc<dyn KeyValueStore>,
    config: EngineConfig,
    state: Mutex<EngineState>,
    events: broadcast::Sender<PlaybackState>,
    /// Revision of the last snapshot written to the store
    persisted: tokio::sync::Mutex<u64>,
}

struct LoadedSink {
    sink: Arc<dyn AudioSink>,
    poller: PollerHandle,
    generation: u64,
}

struct EngineState {
    current_track: Option<Track>,
    queue: QueueModel,
    queue_context: Option<QueueContext>,
    track_source: TrackSource,
    is_playing: bool,
    is_loading: bool,
    /// Whether the pending load starts playing once its sink is ready
    play_on_load: bool,
    position_ms: u64,
    duration_ms: u64,
    volume: f32,
    sink: Option<LoadedSink>,
    generation: u64,
    revision: u64,
}

/// Durability snapshot tagged with the revision it was taken at
pub(crate) struct Checkpoint {
    revision: u64,
    snapshot: DurabilitySnapshot,
}

/// Result of applying one progress sample
pub(crate) enum Sample {
    Progress,
    Checkpoint(Checkpoint),
    Finished { track_id: String },
    Stale,
}

/// How a new track relates to the queues
enum Transition {
    /// New context queue; `None` keeps the current queue context
    Replace {
        queue: Vec<Track>,
        index: usize,
        context: Option<QueueContext>,
    },
    /// Move the context cursor
    Step(usize),
    /// Priority queue advance; the context queue is untouched
    Priority,
}

enum LoadOutcome {
    Committed,
    Superseded,
}

enum NextTrack {
    Priority(Track),
    Context(usize, Track),
    End,
}

impl EngineState {
    fn new(volume: f32) -> Self {
        Self {
            current_track: None,
            queue: QueueModel::new(),
            queue_context: None,
            track_source: TrackSource::Context,
            is_playing: false,
            is_loading: false,
            play_on_load: false,
            position_ms: 0,
            duration_ms: 0,
            volume,
            sink: None,
            generation: 0,
            revision: 0,
        }
    }

    fn view(&self) -> PlaybackState {
        PlaybackState {
            current_track: self.current_track.clone(),
            is_playing: self.is_playing,
            is_loading: self.is_loading,
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            playlist: self.queue.context().to_vec(),
            current_index: self.queue.current_index(),
            priority_queue: self.queue.priority().to_vec(),
            queue_context: self.queue_context.clone(),
            current_track_source: self.track_source,
            volume: self.volume,
        }
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.revision += 1;
        Checkpoint {
            revision: self.revision,
            snapshot: DurabilitySnapshot {
                current_track: self.current_track.clone(),
                playlist: self.queue.context().to_vec(),
                current_index: self.queue.current_index(),
                position_ms: self.position_ms,
                is_playing: self.is_playing,
                priority_queue: self.queue.priority().to_vec(),
                queue_context: self.queue_context.clone(),
                current_track_source: self.track_source,
            },
        }
    }

    /// Supersede any in-flight load
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Replace {
                queue,
                index,
                context,
            } => {
                self.queue.replace_context(queue, index);
                if context.is_some() {
                    self.queue_context = context;
                }
                self.track_source = TrackSource::Context;
            }
            Transition::Step(index) => {
                self.queue.set_current_index(index);
                self.track_source = TrackSource::Context;
            }
            Transition::Priority => {
                self.track_source = TrackSource::Priority;
            }
        }
    }

    fn restore(&mut self, snapshot: DurabilitySnapshot) {
        self.current_track = snapshot.current_track;
        self.queue
            .replace_context(snapshot.playlist, snapshot.current_index);
        self.queue.set_priority(snapshot.priority_queue);
        self.queue_context = snapshot.queue_context;
        self.track_source = snapshot.current_track_source;
        self.position_ms = snapshot.position_ms;
        self.duration_ms = 0;
        self.is_playing = false;
        self.is_loading = false;
    }

    /// Back to empty; volume and the generation/revision counters survive
    fn reset(&mut self) {
        self.current_track = None;
        self.queue.clear();
        self.queue_context = None;
        self.track_source = TrackSource::Context;
        self.is_playing = false;
        self.is_loading = false;
        self.play_on_load = false;
        self.position_ms = 0;
        self.duration_ms = 0;
    }

    /// Mark a load as pending
    fn begin_load(&mut self, position_ms: u64, play: bool) {
        self.is_loading = true;
        self.is_playing = false;
        self.play_on_load = play;
        self.position_ms = position_ms;
    }
}

impl PlaybackEngine {
    /// Create an engine over its collaborators
    ///
    /// Nothing is loaded until a command or [`load_saved_state`](Self::load_saved_state) runs.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        sinks: Arc<dyn SinkFactory>,
        store: Arc<dyn KeyValueStore>,
        config: EngineConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let volume = config.volume.clamp(0.0, 1.0);

        Self {
            inner: Arc::new(EngineInner {
                catalog,
                sinks,
                store,
                state: Mutex::new(EngineState::new(volume)),
                events,
                persisted: tokio::sync::Mutex::new(0),
                config,
            }),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Subscribe to state snapshots
    ///
    /// Only snapshots produced after this call are delivered; use
    /// [`current_state`](Self::current_state) for the present one.
    pub fn subscribe(&self) -> StateSubscription {
        StateSubscription::new(self.inner.events.subscribe())
    }

    /// Current state snapshot
    pub fn current_state(&self) -> PlaybackState {
        self.inner.lock().view()
    }

    /// Play `track` now
    ///
    /// With [`PlaybackOrigin::Context`], `queue` replaces the context queue
    /// with the cursor at `index` (or becomes `[track]` when `None`). With
    /// [`PlaybackOrigin::PriorityAdvance`] both are ignored and the context
    /// queue is left alone.
    pub async fn play_track(
        &self,
        track: Track,
        queue: Option<Vec<Track>>,
        index: usize,
        origin: PlaybackOrigin,
    ) {
        let transition = match origin {
            PlaybackOrigin::PriorityAdvance => Transition::Priority,
            PlaybackOrigin::Context(context) => {
                let (queue, index) = match queue {
                    Some(queue) => (queue, index),
                    None => (vec![track.clone()], 0),
                };
                Transition::Replace {
                    queue,
                    index,
                    context,
                }
            }
        };

        self.inner.start_track(track, transition).await;
    }

    /// Play `queue[index]` with `queue` as the new context queue
    ///
    /// Does nothing when `index` is out of range.
    pub async fn play_queue(&self, queue: Vec<Track>, index: usize, context: QueueContext) {
        let Some(track) = queue.get(index).cloned() else {
            debug!(index, len = queue.len(), "play_queue index out of range");
            return;
        };

        self.play_track(track, Some(queue), index, PlaybackOrigin::context(context))
            .await;
    }

    /// Pause if playing, play if paused
    ///
    /// While a track is loading this only flips whether it starts playing
    /// once ready. Without a live sink (failed or deferred load) the current
    /// track is reloaded at the last known position and started.
    pub async fn toggle_play_pause(&self) {
        self.inner.toggle_play_pause().await;
    }

    /// Advance: priority queue head first, then the next context track
    ///
    /// Stops at the end of the context queue; never wraps.
    pub async fn play_next(&self) {
        self.inner.play_next().await;
    }

    /// Step back in the context queue
    ///
    /// Does nothing at index 0. The priority queue has no history.
    pub async fn play_previous(&self) {
        self.inner.play_previous().await;
    }

    /// Seek the current track
    ///
    /// A seek issued while the track is loading becomes its start position.
    pub async fn seek_to(&self, position_ms: u64) {
        self.inner.seek_to(position_ms).await;
    }

    /// Tear down the sink and rewind to 0
    ///
    /// Track and queues are kept, so `toggle_play_pause` resumes from the start.
    pub async fn stop(&self) {
        self.inner.stop().await;
    }

    /// Set output volume (clamped to 0.0 - 1.0)
    pub async fn set_volume(&self, volume: f32) {
        self.inner.set_volume(volume).await;
    }

    /// Replace the priority queue
    pub async fn set_priority_queue(&self, tracks: Vec<Track>) {
        self.inner
            .mutate_queue(|queue| {
                queue.set_priority(tracks);
                true
            })
            .await;
    }

    /// Move a priority track; `to_index` is clamped
    pub async fn reorder_priority_queue(&self, from_index: usize, to_index: usize) {
        self.inner
            .mutate_queue(|queue| queue.reorder_priority(from_index, to_index))
            .await;
    }

    /// Remove one priority track
    pub async fn remove_priority_track(&self, index: usize) {
        self.inner
            .mutate_queue(|queue| queue.remove_priority(index).is_some())
            .await;
    }

    /// Insert into the priority queue (end by default)
    pub async fn insert_into_priority_queue(&self, track: Track, index: Option<usize>) {
        self.inner
            .mutate_queue(|queue| {
                queue.insert_priority(track, index);
                true
            })
            .await;
    }

    /// Reorder the upcoming context tracks
    ///
    /// Indices are relative to the tracks after the cursor.
    pub async fn reorder_context_queue(&self, from_index: usize, to_index: usize) {
        self.inner
            .mutate_queue(|queue| queue.reorder_upcoming(from_index, to_index))
            .await;
    }

    /// Promote an upcoming context track into the priority queue
    pub async fn move_context_track_to_priority(
        &self,
        relative_index: usize,
        priority_index: Option<usize>,
    ) {
        self.inner
            .mutate_queue(|queue| queue.move_upcoming_to_priority(relative_index, priority_index))
            .await;
    }

    /// Rehydrate from the store and reload the saved track
    ///
    /// The saved play flag is honoured: a track that was paused stays paused.
    /// Returns whether anything was restored.
    pub async fn load_saved_state(&self) -> bool {
        self.inner.load_saved_state().await
    }

    /// Forget everything: sink, queues and the stored snapshot
    pub async fn clear_saved_state(&self) {
        self.inner.clear_saved_state().await;
    }
}

impl EngineInner {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &EngineState) {
        // No receivers is not an error
        let _ = self.events.send(state.view());
    }

    /// Write a checkpoint unless a newer one already landed
    pub(crate) async fn persist(&self, checkpoint: Checkpoint) {
        let mut persisted = self.persisted.lock().await;
        if checkpoint.revision <= *persisted {
            debug!(revision = checkpoint.revision, "Skipping stale snapshot");
            return;
        }

        match checkpoint.snapshot.save(self.store.as_ref()).await {
            Ok(()) => *persisted = checkpoint.revision,
            Err(e) => warn!(error = %e, "Failed to persist playback state"),
        }
    }

    /// Take the live sink out of the state and release it
    ///
    /// Order: pause, cancel the poller, grace delay, dispose.
    async fn teardown(&self) {
        let loaded = self.lock().sink.take();
        if let Some(loaded) = loaded {
            self.release(loaded).await;
        }
    }

    async fn release(&self, loaded: LoadedSink) {
        debug!(generation = loaded.generation, "Releasing sink");
        if let Err(e) = loaded.sink.pause().await {
            debug!(error = %e, "Pause before dispose failed");
        }
        loaded.poller.cancel();
        tokio::time::sleep(self.config.teardown_grace()).await;
        if let Err(e) = loaded.sink.dispose().await {
            warn!(error = %e, "Failed to dispose sink");
        }
    }

    async fn discard(&self, sink: Arc<dyn AudioSink>) {
        if let Err(e) = sink.dispose().await {
            warn!(error = %e, "Failed to dispose superseded sink");
        }
    }

    #[instrument(skip_all, fields(track_id = %track.id))]
    async fn start_track(self: &Arc<Self>, track: Track, transition: Transition) {
        let generation = self.lock().next_generation();
        self.teardown().await;

        let checkpoint = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("Load superseded before it started");
                return;
            }
            state.apply(transition);
            state.current_track = Some(track.clone());
            state.begin_load(0, true);
            state.duration_ms = 0;
            self.publish(&state);
            state.checkpoint()
        };
        self.persist(checkpoint).await;

        match self.load_sink(&track, generation).await {
            Ok(LoadOutcome::Committed) => {
                info!("Playback started");
                if self.config.scrobble {
                    if let Err(e) = self.catalog.scrobble(&track.id, false).await {
                        warn!(error = %e, "Now-playing scrobble failed");
                    }
                }
            }
            Ok(LoadOutcome::Superseded) => debug!("Load superseded"),
            Err(e) => {
                warn!(error = %e, "Failed to start playback");
                self.abandon_load(generation).await;
            }
        }
    }

    /// Create, install and start (or not) a sink for `track`
    ///
    /// The start position and the play flag are read from the state when the
    /// sink is installed, so seeks and toggles issued during the load apply
    /// to it. The sink is committed only if `generation` is still current.
    async fn load_sink(self: &Arc<Self>, track: &Track, generation: u64) -> Result<LoadOutcome> {
        let url = self.catalog.stream_url(&track.id)?;
        let volume = self.lock().volume;
        let sink = self
            .sinks
            .create(
                &url,
                SinkOptions {
                    looping: false,
                    volume,
                },
            )
            .await?;

        let start_ms = {
            let mut state = self.lock();
            if state.generation == generation {
                let poller = poller::spawn(
                    Arc::downgrade(self),
                    Arc::clone(&sink),
                    generation,
                    self.config.poll_interval(),
                );
                state.sink = Some(LoadedSink {
                    sink: Arc::clone(&sink),
                    poller,
                    generation,
                });
                Some(state.position_ms)
            } else {
                None
            }
        };
        let Some(start_ms) = start_ms else {
            self.discard(sink).await;
            return Ok(LoadOutcome::Superseded);
        };

        if start_ms > 0 {
            sink.seek_to(Duration::from_millis(start_ms)).await?;
        }

        // Follow the play flag until it holds still across the commit
        let mut playing = false;
        loop {
            let wanted = {
                let state = self.lock();
                if state.generation != generation {
                    return Ok(LoadOutcome::Superseded);
                }
                state.play_on_load
            };
            if wanted != playing {
                if wanted {
                    sink.play().await?;
                } else {
                    sink.pause().await?;
                }
                playing = wanted;
            }

            let checkpoint = {
                let mut state = self.lock();
                if state.generation != generation {
                    return Ok(LoadOutcome::Superseded);
                }
                if state.play_on_load != playing {
                    continue;
                }
                state.is_loading = false;
                state.is_playing = playing;
                state.duration_ms = sink
                    .duration()
                    .or_else(|| track.duration())
                    .map_or(0, |d| d.as_millis() as u64);
                self.publish(&state);
                state.checkpoint()
            };
            self.persist(checkpoint).await;
            return Ok(LoadOutcome::Committed);
        }
    }

    /// Reset a failed load to a safe state
    ///
    /// Keeps the track and queues, drops any half-started sink.
    async fn abandon_load(&self, generation: u64) {
        let stale = {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            let owned = state
                .sink
                .as_ref()
                .is_some_and(|loaded| loaded.generation == generation);
            let stale = if owned { state.sink.take() } else { None };
            state.is_loading = false;
            state.is_playing = false;
            self.publish(&state);
            stale
        };
        if let Some(loaded) = stale {
            self.release(loaded).await;
        }
    }

    /// Recreate the sink for `track` at `position_ms`
    async fn initialize_track_for_playback(
        self: &Arc<Self>,
        track: Track,
        position_ms: u64,
        should_play: bool,
    ) {
        let generation = self.lock().next_generation();
        self.teardown().await;

        {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            state.begin_load(position_ms, should_play);
            self.publish(&state);
        }

        match self.load_sink(&track, generation).await {
            Ok(_) => {}
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Failed to initialize track");
                self.abandon_load(generation).await;
            }
        }
    }

    async fn toggle_play_pause(self: &Arc<Self>) {
        let (live, track, was_playing, position_ms) = {
            let mut state = self.lock();
            if state.is_loading {
                state.play_on_load = !state.play_on_load;
                debug!(play = state.play_on_load, "Toggled while loading");
                return;
            }
            let live = state
                .sink
                .as_ref()
                .map(|loaded| (Arc::clone(&loaded.sink), loaded.generation));
            (
                live,
                state.current_track.clone(),
                state.is_playing,
                state.position_ms,
            )
        };

        let Some((sink, generation)) = live else {
            if let Some(track) = track {
                debug!(track_id = %track.id, "No sink, reinitializing");
                self.initialize_track_for_playback(track, position_ms, true)
                    .await;
            }
            return;
        };

        let toggled = if was_playing {
            sink.pause().await
        } else {
            sink.play().await
        };

        match toggled {
            Ok(()) => {
                let checkpoint = {
                    let mut state = self.lock();
                    if state.generation != generation {
                        return;
                    }
                    state.is_playing = !was_playing;
                    self.publish(&state);
                    state.checkpoint()
                };
                self.persist(checkpoint).await;
            }
            Err(e) => {
                warn!(error = %e, "Toggle failed, reinitializing sink");
                if let Some(track) = track {
                    self.initialize_track_for_playback(track, position_ms, !was_playing)
                        .await;
                }
            }
        }
    }

    async fn play_next(self: &Arc<Self>) {
        let next = {
            let mut state = self.lock();
            if let Some(track) = state.queue.pop_priority() {
                NextTrack::Priority(track)
            } else if let Some(index) = state.queue.next_context_index() {
                match state.queue.context().get(index) {
                    Some(track) => NextTrack::Context(index, track.clone()),
                    None => NextTrack::End,
                }
            } else {
                NextTrack::End
            }
        };

        match next {
            NextTrack::Priority(track) => self.start_track(track, Transition::Priority).await,
            NextTrack::Context(index, track) => {
                self.start_track(track, Transition::Step(index)).await;
            }
            NextTrack::End => {
                debug!("End of queue");
                self.stop().await;
            }
        }
    }

    async fn play_previous(self: &Arc<Self>) {
        let previous = {
            let state = self.lock();
            state
                .queue
                .previous_context_index()
                .and_then(|index| state.queue.context().get(index).map(|t| (index, t.clone())))
        };

        if let Some((index, track)) = previous {
            self.start_track(track, Transition::Step(index)).await;
        }
    }

    async fn seek_to(self: &Arc<Self>, position_ms: u64) {
        let (live, track, is_playing) = {
            let state = self.lock();
            (
                state.sink.as_ref().map(|loaded| Arc::clone(&loaded.sink)),
                state.current_track.clone(),
                state.is_playing,
            )
        };

        if let Some(sink) = live {
            if let Err(e) = sink.seek_to(Duration::from_millis(position_ms)).await {
                warn!(error = %e, "Seek failed, reinitializing sink");
                if let Some(track) = track {
                    self.initialize_track_for_playback(track, position_ms, is_playing)
                        .await;
                }
                return;
            }
        }

        let mut state = self.lock();
        if state.current_track.is_some() {
            state.position_ms = position_ms;
            self.publish(&state);
        }
    }

    async fn stop(&self) {
        self.lock().next_generation();
        self.teardown().await;

        let checkpoint = {
            let mut state = self.lock();
            state.is_playing = false;
            state.is_loading = false;
            state.position_ms = 0;
            self.publish(&state);
            state.checkpoint()
        };
        self.persist(checkpoint).await;
    }

    async fn set_volume(&self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };

        let live = {
            let mut state = self.lock();
            state.volume = volume;
            self.publish(&state);
            state.sink.as_ref().map(|loaded| Arc::clone(&loaded.sink))
        };

        if let Some(sink) = live {
            if let Err(e) = sink.set_volume(volume).await {
                warn!(error = %e, "Failed to set sink volume");
            }
        }
    }

    /// Apply a queue mutation; persist and broadcast only if it changed something
    async fn mutate_queue(&self, mutation: impl FnOnce(&mut QueueModel) -> bool) {
        let checkpoint = {
            let mut state = self.lock();
            if !mutation(&mut state.queue) {
                debug!("Queue operation ignored");
                return;
            }
            self.publish(&state);
            state.checkpoint()
        };
        self.persist(checkpoint).await;
    }

    async fn load_saved_state(self: &Arc<Self>) -> bool {
        let snapshot = match DurabilitySnapshot::load(self.store.as_ref()).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No saved playback state");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read saved playback state");
                return false;
            }
        };

        let generation = self.lock().next_generation();
        self.teardown().await;

        let resume = snapshot
            .current_track
            .clone()
            .map(|track| (track, snapshot.position_ms, snapshot.is_playing));
        {
            let mut state = self.lock();
            if state.generation != generation {
                return true;
            }
            state.restore(snapshot);
            if let Some((_, position_ms, should_play)) = &resume {
                state.begin_load(*position_ms, *should_play);
            }
            self.publish(&state);
        }

        if let Some((track, position_ms, should_play)) = resume {
            info!(track_id = %track.id, position_ms, should_play, "Restoring saved track");
            if let Err(e) = self.load_sink(&track, generation).await {
                warn!(track_id = %track.id, error = %e, "Failed to restore saved track");
                self.abandon_load(generation).await;
            }
        }

        true
    }

    async fn clear_saved_state(&self) {
        self.lock().next_generation();
        self.teardown().await;

        let revision = {
            let mut state = self.lock();
            state.reset();
            state.revision += 1;
            self.publish(&state);
            state.revision
        };

        let mut persisted = self.persisted.lock().await;
        match DurabilitySnapshot::clear(self.store.as_ref()).await {
            Ok(()) => *persisted = revision,
            Err(e) => warn!(error = %e, "Failed to clear saved playback state"),
        }
    }

    /// Fold one progress sample into the state
    pub(crate) fn apply_sample(
        &self,
        generation: u64,
        sink: &dyn AudioSink,
        sample_count: u32,
    ) -> Sample {
        let position = sink.current_time();
        let duration = sink.duration();
        let playing = sink.is_playing();

        let mut state = self.lock();
        let live = state
            .sink
            .as_ref()
            .is_some_and(|loaded| loaded.generation == generation);
        if !live || state.generation != generation {
            return Sample::Stale;
        }

        state.position_ms = position.as_millis() as u64;
        if let Some(duration) = duration {
            state.duration_ms = duration.as_millis() as u64;
        }
        state.is_playing = playing;
        self.publish(&state);

        let finished = duration.is_some_and(|d| !d.is_zero() && position >= d);
        if finished {
            if let Some(track) = &state.current_track {
                return Sample::Finished {
                    track_id: track.id.clone(),
                };
            }
        }

        let every = self.config.persist_every_polls.max(1);
        if sample_count % every == 0 {
            Sample::Checkpoint(state.checkpoint())
        } else {
            Sample::Progress
        }
    }

    /// Scrobble the finished track and advance
    pub(crate) async fn handle_track_finished(self: Arc<Self>, generation: u64, track_id: String) {
        if self.config.scrobble {
            let catalog = Arc::clone(&self.catalog);
            tokio::spawn(async move {
                if let Err(e) = catalog.scrobble(&track_id, true).await {
                    warn!(track_id = %track_id, error = %e, "Submission scrobble failed");
                }
            });
        }

        if self.lock().generation != generation {
            debug!("Playback moved on before the finished track advanced");
            return;
        }
        self.play_next().await;
    }
}
