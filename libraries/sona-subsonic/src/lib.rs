//! Sona Subsonic Client
//!
//! Client for the Subsonic REST API (Navidrome, Airsonic, gonic and other
//! compatible servers), and the [`Catalog`](sona_core::Catalog)
//! implementation the playback engine resolves stream URLs and scrobbles
//! through.
//!
//! # Features
//!
//! - **Token auth**: salted MD5 tokens, password never sent in the clear
//! - **Browsing**: artists, albums, album lists, playlists, search, starred
//! - **Caching**: TTL-bounded LRU cache for browse responses
//! - **Settings**: `sona.toml` plus `SONA_` environment overrides
//!
//! # Example
//!
//! ```no_run
//! use sona_subsonic::{SearchCounts, SubsonicClient, SubsonicSettings};
//!
//! # async fn run() -> sona_subsonic::Result<()> {
//! let settings = SubsonicSettings::load()?;
//! let client = SubsonicClient::new(&settings)?;
//!
//! let results = client.search("blue", SearchCounts::default()).await?;
//! for song in &results.song {
//!     println!("{} ({})", song.title, client.stream_url_with_bitrate(&song.id, None)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
mod client;
mod error;
pub mod models;
mod settings;

pub use cache::ResponseCache;
pub use client::SubsonicClient;
pub use error::{Result, SubsonicError};
pub use models::{
    into_tracks, Album, AlbumListType, AlbumWithSongs, Artist, ArtistIndex, ArtistWithAlbums,
    Child, Playlist, PlaylistWithEntries, RandomSongsQuery, SearchCounts, SearchResult,
    StarTarget, Starred,
};
pub use settings::{CacheSettings, ClientSettings, ServerSettings, SubsonicSettings};
