//! Durability snapshot
//!
//! The subset of engine state that survives a restart, stored as one JSON
//! document per key so older hosts can read individual fields.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sona_core::{KeyValueStore, QueueContext, Track, TrackSource};
use tracing::warn;

pub const KEY_CURRENT_TRACK: &str = "currentTrack";
pub const KEY_PLAYLIST: &str = "currentPlaylist";
pub const KEY_CURRENT_INDEX: &str = "currentIndex";
pub const KEY_POSITION: &str = "currentPosition";
pub const KEY_IS_PLAYING: &str = "isPlaying";
pub const KEY_PRIORITY_QUEUE: &str = "priorityQueue";
pub const KEY_QUEUE_CONTEXT: &str = "queueContext";
pub const KEY_TRACK_SOURCE: &str = "currentTrackSource";

/// Every key written by [`DurabilitySnapshot::save`]
pub const ALL_KEYS: [&str; 8] = [
    KEY_CURRENT_TRACK,
    KEY_PLAYLIST,
    KEY_CURRENT_INDEX,
    KEY_POSITION,
    KEY_IS_PLAYING,
    KEY_PRIORITY_QUEUE,
    KEY_QUEUE_CONTEXT,
    KEY_TRACK_SOURCE,
];

/// Persisted playback state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurabilitySnapshot {
    pub current_track: Option<Track>,
    pub playlist: Vec<Track>,
    pub current_index: usize,
    pub position_ms: u64,
    pub is_playing: bool,
    pub priority_queue: Vec<Track>,
    pub queue_context: Option<QueueContext>,
    pub current_track_source: TrackSource,
}

impl DurabilitySnapshot {
    /// Encode as store entries, one per key
    pub fn to_entries(&self) -> serde_json::Result<Vec<(String, String)>> {
        Ok(vec![
            entry(KEY_CURRENT_TRACK, &self.current_track)?,
            entry(KEY_PLAYLIST, &self.playlist)?,
            entry(KEY_CURRENT_INDEX, &self.current_index)?,
            entry(KEY_POSITION, &self.position_ms)?,
            entry(KEY_IS_PLAYING, &self.is_playing)?,
            entry(KEY_PRIORITY_QUEUE, &self.priority_queue)?,
            entry(KEY_QUEUE_CONTEXT, &self.queue_context)?,
            entry(KEY_TRACK_SOURCE, &self.current_track_source)?,
        ])
    }

    /// Decode from store entries
    ///
    /// Returns `None` when no key is present. A value that fails to decode
    /// falls back to its default so one bad field does not discard the rest.
    pub fn from_entries(entries: &[(String, Option<String>)]) -> Option<Self> {
        if entries.iter().all(|(_, value)| value.is_none()) {
            return None;
        }

        let lookup = |key: &str| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.as_deref())
        };

        let mut snapshot = Self {
            current_track: decode(KEY_CURRENT_TRACK, lookup(KEY_CURRENT_TRACK)),
            playlist: decode(KEY_PLAYLIST, lookup(KEY_PLAYLIST)),
            current_index: decode(KEY_CURRENT_INDEX, lookup(KEY_CURRENT_INDEX)),
            position_ms: decode(KEY_POSITION, lookup(KEY_POSITION)),
            is_playing: decode(KEY_IS_PLAYING, lookup(KEY_IS_PLAYING)),
            priority_queue: decode(KEY_PRIORITY_QUEUE, lookup(KEY_PRIORITY_QUEUE)),
            queue_context: decode(KEY_QUEUE_CONTEXT, lookup(KEY_QUEUE_CONTEXT)),
            current_track_source: decode(KEY_TRACK_SOURCE, lookup(KEY_TRACK_SOURCE)),
        };

        if snapshot.current_index >= snapshot.playlist.len() {
            snapshot.current_index = snapshot.playlist.len().saturating_sub(1);
        }

        Some(snapshot)
    }

    /// Read the snapshot from `store`
    pub async fn load(store: &dyn KeyValueStore) -> sona_core::Result<Option<Self>> {
        let entries = store.multi_get(&ALL_KEYS).await?;
        Ok(Self::from_entries(&entries))
    }

    /// Write the snapshot to `store` in one batch
    pub async fn save(&self, store: &dyn KeyValueStore) -> crate::Result<()> {
        let entries = self.to_entries()?;
        store.multi_set(entries).await?;
        Ok(())
    }

    /// Remove every snapshot key from `store`
    pub async fn clear(store: &dyn KeyValueStore) -> sona_core::Result<()> {
        store.multi_remove(&ALL_KEYS).await
    }
}

fn entry<T: Serialize>(key: &str, value: &T) -> serde_json::Result<(String, String)> {
    Ok((key.to_string(), serde_json::to_string(value)?))
}

fn decode<T: DeserializeOwned + Default>(key: &str, raw: Option<&str>) -> T {
    match raw.map(serde_json::from_str) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            warn!(key, error = %e, "Discarding unreadable saved value");
            T::default()
        }
        None => T::default(),
    }
}
