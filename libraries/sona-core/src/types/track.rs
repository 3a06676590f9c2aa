/// Track domain type
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A playable item supplied by the catalog
///
/// The playback engine never mutates tracks; it only stores, compares and
/// persists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    #[serde(default)]
    pub album: Option<String>,

    /// Track duration in seconds, as reported by the catalog
    #[serde(default)]
    pub duration_secs: Option<u32>,

    /// Opaque cover-art reference (resolved to a URL by the catalog client)
    #[serde(default)]
    pub cover_art: Option<String>,
}

impl Track {
    /// Create a track with minimal metadata
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_secs: None,
            cover_art: None,
        }
    }

    /// Set the album name
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the duration in seconds
    #[must_use]
    pub fn with_duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Set the cover-art reference
    #[must_use]
    pub fn with_cover_art(mut self, cover_art: impl Into<String>) -> Self {
        self.cover_art = Some(cover_art.into());
        self
    }

    /// Catalog duration as a `Duration`
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(|secs| Duration::from_secs(u64::from(secs)))
    }
}
