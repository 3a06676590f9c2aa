//! Subsonic response models
//!
//! Only the fields Sona reads are modelled; unknown fields are ignored.
//! Every list is optional on the wire (servers omit empty arrays).

use serde::{Deserialize, Serialize};
use sona_core::Track;

/// `subsonic-response` envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "subsonic-response")]
    pub response: ResponseBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseBody {
    pub status: String,
    pub error: Option<ApiError>,
    /// Endpoint-specific payload (`album`, `artists`, `searchResult3`...)
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// A song entry (`child` in the Subsonic schema)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub track: Option<u32>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub cover_art: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub bit_rate: Option<u32>,
    #[serde(default)]
    pub starred: Option<String>,
}

impl Child {
    /// Whether the song is starred by the current user
    pub fn is_starred(&self) -> bool {
        self.starred.is_some()
    }
}

impl From<Child> for Track {
    fn from(child: Child) -> Self {
        let artist = child
            .artist
            .unwrap_or_else(|| "Unknown Artist".to_string());
        let mut track = Track::new(child.id, child.title, artist);
        track.album = child.album;
        track.duration_secs = child.duration;
        track.cover_art = child.cover_art;
        track
    }
}

/// Convert a list of song entries into tracks
pub fn into_tracks(children: Vec<Child>) -> Vec<Track> {
    children.into_iter().map(Track::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_count: Option<u32>,
    #[serde(default)]
    pub cover_art: Option<String>,
    #[serde(default)]
    pub starred: Option<String>,
}

/// One letter bucket of `getArtists`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistIndex {
    pub name: String,
    #[serde(default)]
    pub artist: Vec<Artist>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct ArtistsContainer {
    #[serde(default)]
    pub index: Vec<ArtistIndex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistWithAlbums {
    #[serde(flatten)]
    pub artist: Artist,
    #[serde(default)]
    pub album: Vec<Album>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub song_count: Option<u32>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub cover_art: Option<String>,
    #[serde(default)]
    pub starred: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumWithSongs {
    #[serde(flatten)]
    pub album: Album,
    #[serde(default)]
    pub song: Vec<Child>,
}

impl AlbumWithSongs {
    /// Album songs as playable tracks, in album order
    pub fn tracks(&self) -> Vec<Track> {
        into_tracks(self.song.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct AlbumList {
    #[serde(default)]
    pub album: Vec<Album>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct SongList {
    #[serde(default)]
    pub song: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub song_count: Option<u32>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub cover_art: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct PlaylistsContainer {
    #[serde(default)]
    pub playlist: Vec<Playlist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistWithEntries {
    #[serde(flatten)]
    pub playlist: Playlist,
    #[serde(default)]
    pub entry: Vec<Child>,
}

impl PlaylistWithEntries {
    /// Playlist entries as playable tracks
    pub fn tracks(&self) -> Vec<Track> {
        into_tracks(self.entry.clone())
    }
}

/// `search3` results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub artist: Vec<Artist>,
    #[serde(default)]
    pub album: Vec<Album>,
    #[serde(default)]
    pub song: Vec<Child>,
}

/// `getStarred2` results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Starred {
    #[serde(default)]
    pub artist: Vec<Artist>,
    #[serde(default)]
    pub album: Vec<Album>,
    #[serde(default)]
    pub song: Vec<Child>,
}

/// Ordering for `getAlbumList2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlbumListType {
    Random,
    Newest,
    Highest,
    Frequent,
    Recent,
    #[default]
    AlphabeticalByName,
    AlphabeticalByArtist,
    Starred,
}

impl AlbumListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Newest => "newest",
            Self::Highest => "highest",
            Self::Frequent => "frequent",
            Self::Recent => "recent",
            Self::AlphabeticalByName => "alphabeticalByName",
            Self::AlphabeticalByArtist => "alphabeticalByArtist",
            Self::Starred => "starred",
        }
    }
}

/// Result limits for `search3`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCounts {
    pub artists: u32,
    pub albums: u32,
    pub songs: u32,
}

impl Default for SearchCounts {
    fn default() -> Self {
        Self {
            artists: 20,
            albums: 20,
            songs: 50,
        }
    }
}

/// Filters for `getRandomSongs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSongsQuery {
    pub size: u32,
    pub genre: Option<String>,
    pub from_year: Option<u32>,
    pub to_year: Option<u32>,
}

impl Default for RandomSongsQuery {
    fn default() -> Self {
        Self {
            size: 50,
            genre: None,
            from_year: None,
            to_year: None,
        }
    }
}

/// What `star`/`unstar` applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarTarget {
    Song(String),
    Album(String),
    Artist(String),
}

impl StarTarget {
    /// Query parameter carrying the id
    pub(crate) fn param(&self) -> (&'static str, &str) {
        match self {
            Self::Song(id) => ("id", id),
            Self::Album(id) => ("albumId", id),
            Self::Artist(id) => ("artistId", id),
        }
    }
}
