/// Queue origin types
use serde::{Deserialize, Serialize};

/// Kind of browsing context a context queue was started from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// Album track list
    Album,
    /// Artist top tracks or discography
    Artist,
    /// User or server playlist
    Playlist,
    /// Starred songs
    Liked,
    /// Search results
    Search,
    /// Anything else (single track, random mix)
    #[default]
    AdHoc,
}

impl ContextKind {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Playlist => "playlist",
            Self::Liked => "liked",
            Self::Search => "search",
            Self::AdHoc => "ad_hoc",
        }
    }
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the current context queue came from
///
/// Lets the UI label the upcoming list ("Next in <name>"). Priority-queue
/// playback never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueContext {
    /// Display name (album title, playlist name, search query...)
    pub name: String,

    /// Context type tag
    pub kind: ContextKind,

    /// Catalog id of the album/artist/playlist, if any
    #[serde(default)]
    pub id: Option<String>,
}

impl QueueContext {
    /// Create a new queue context
    pub fn new(name: impl Into<String>, kind: ContextKind, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            id,
        }
    }

    /// Label for the upcoming section of the queue
    pub fn label(&self) -> String {
        format!("Next in {}", self.name)
    }
}

/// Which queue produced the currently loaded track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    /// The positional context queue
    #[default]
    Context,
    /// The user's "play next" queue
    Priority,
}
