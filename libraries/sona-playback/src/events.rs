//! State subscriptions
//!
//! Every engine mutation and progress sample pushes a full [`PlaybackState`]
//! to all subscribers. Dropping a [`StateSubscription`] unsubscribes it.

use crate::types::PlaybackState;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::debug;

/// Receiving end of the engine's state channel
///
/// A subscriber that falls behind skips the snapshots it missed; only the
/// most recent ones are kept.
#[derive(Debug)]
pub struct StateSubscription {
    rx: broadcast::Receiver<PlaybackState>,
}

impl StateSubscription {
    pub(crate) fn new(rx: broadcast::Receiver<PlaybackState>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot
    ///
    /// Returns `None` once the engine has been dropped.
    pub async fn recv(&mut self) -> Option<PlaybackState> {
        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "State subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next pending snapshot without waiting
    pub fn try_recv(&mut self) -> Option<PlaybackState> {
        loop {
            match self.rx.try_recv() {
                Ok(state) => return Some(state),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "State subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain pending snapshots, returning the newest
    pub fn latest(&mut self) -> Option<PlaybackState> {
        let mut latest = None;
        while let Some(state) = self.try_recv() {
            latest = Some(state);
        }
        latest
    }
}
