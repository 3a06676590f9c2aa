//! Progress poller
//!
//! One task per loaded sink. It samples the sink on a fixed interval, pushes
//! the position to subscribers, persists it every few samples and detects
//! the end of the track.

use crate::engine::{EngineInner, Sample};
use sona_core::AudioSink;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Owns a running poller task
///
/// The task is aborted on [`cancel`](Self::cancel) or when the handle drops,
/// so a poller never outlives the sink slot it was created for.
#[derive(Debug)]
pub(crate) struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub(crate) fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start polling `sink` on behalf of the load identified by `generation`
pub(crate) fn spawn(
    engine: Weak<EngineInner>,
    sink: Arc<dyn AudioSink>,
    generation: u64,
    interval: Duration,
) -> PollerHandle {
    let task = tokio::spawn(run(engine, sink, generation, interval));
    PollerHandle { task }
}

async fn run(
    engine: Weak<EngineInner>,
    sink: Arc<dyn AudioSink>,
    generation: u64,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    let mut samples: u32 = 0;
    loop {
        ticker.tick().await;

        let Some(engine) = engine.upgrade() else {
            trace!("Engine dropped, poller exiting");
            break;
        };

        samples = samples.wrapping_add(1);
        match engine.apply_sample(generation, sink.as_ref(), samples) {
            Sample::Progress => {}
            Sample::Checkpoint(checkpoint) => engine.persist(checkpoint).await,
            Sample::Finished { track_id } => {
                debug!(track_id = %track_id, "Track finished");
                // Advancing tears this poller down, so it runs on its own task
                tokio::spawn(async move {
                    engine.handle_track_finished(generation, track_id).await;
                });
                break;
            }
            Sample::Stale => {
                trace!(generation, "Poller outlived its sink");
                break;
            }
        }
    }
}
