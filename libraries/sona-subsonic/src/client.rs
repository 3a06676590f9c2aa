//! Subsonic REST client.

use crate::cache::ResponseCache;
use crate::error::{Result, SubsonicError};
use crate::models::{
    Album, AlbumList, AlbumListType, AlbumWithSongs, ArtistIndex, ArtistWithAlbums,
    ArtistsContainer, Child, Envelope, Playlist, PlaylistWithEntries, PlaylistsContainer,
    RandomSongsQuery, SearchCounts, SearchResult, SongList, StarTarget, Starred,
};
use crate::settings::SubsonicSettings;
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sona_core::Catalog;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

const SALT_LEN: usize = 12;
const STARRED_ENDPOINT: &str = "getStarred2";

/// Client for a Subsonic-compatible server (Navidrome, Airsonic, gonic...).
///
/// Authenticates every request with a salted MD5 token. Browse queries are
/// served from a short-lived response cache; mutations invalidate the
/// entries they affect.
///
/// # Example
///
/// ```no_run
/// use sona_subsonic::{SubsonicClient, SubsonicSettings};
///
/// # async fn run() -> sona_subsonic::Result<()> {
/// let settings = SubsonicSettings::new("https://music.example.com", "alice", "secret");
/// let client = SubsonicClient::new(&settings)?;
///
/// client.ping().await?;
/// let album = client.get_album("al-1").await?;
/// println!("{} has {} songs", album.album.name, album.song.len());
/// # Ok(())
/// # }
/// ```
pub struct SubsonicClient {
    http: Client,
    base_url: Url,
    username: String,
    salt: String,
    token: String,
    client_name: String,
    api_version: String,
    cache: Mutex<ResponseCache<String, Value>>,
}

impl SubsonicClient {
    /// Create a new client from validated settings.
    pub fn new(settings: &SubsonicSettings) -> Result<Self> {
        settings.validate()?;
        let base_url = rest_base_url(&settings.server.url)?;

        let http = Client::builder()
            .timeout(settings.timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Sona/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let salt = generate_salt();
        let token = auth_token(&settings.server.password, &salt);

        Ok(Self {
            http,
            base_url,
            username: settings.server.username.clone(),
            salt,
            token,
            client_name: settings.client.name.clone(),
            api_version: settings.client.api_version.clone(),
            cache: Mutex::new(ResponseCache::new(
                settings.cache.capacity,
                settings.cache_ttl(),
            )),
        })
    }

    /// REST endpoint root (always ends in `/rest/`).
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    // ===== URLs =====

    /// Authenticated URL for `endpoint` with extra query parameters.
    pub fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("u", &self.username)
                .append_pair("t", &self.token)
                .append_pair("s", &self.salt)
                .append_pair("v", &self.api_version)
                .append_pair("c", &self.client_name)
                .append_pair("f", "json");
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Stream URL for a song, optionally transcoded down to `max_bit_rate` kbps.
    pub fn stream_url_with_bitrate(&self, id: &str, max_bit_rate: Option<u32>) -> Result<String> {
        let mut params = vec![("id", id.to_string())];
        if let Some(rate) = max_bit_rate {
            params.push(("maxBitRate", rate.to_string()));
        }
        Ok(self.build_url("stream", &params)?.into())
    }

    /// Cover art URL scaled to `size` pixels.
    pub fn cover_art_url(&self, cover_art_id: &str, size: u32) -> Result<String> {
        let params = [("id", cover_art_id.to_string()), ("size", size.to_string())];
        Ok(self.build_url("getCoverArt", &params)?.into())
    }

    // ===== Queries =====

    /// Check connectivity and credentials.
    pub async fn ping(&self) -> Result<()> {
        self.request("ping", &[]).await?;
        debug!("Subsonic server reachable");
        Ok(())
    }

    /// All artists, grouped by index letter.
    pub async fn get_artists(&self) -> Result<Vec<ArtistIndex>> {
        let value = self.fetch("getArtists", &[], "artists", true).await?;
        let artists: ArtistsContainer = decode_or_default("getArtists", value)?;
        Ok(artists.index)
    }

    /// One artist with their albums.
    pub async fn get_artist(&self, id: &str) -> Result<ArtistWithAlbums> {
        let params = [("id", id.to_string())];
        let value = self.fetch("getArtist", &params, "artist", true).await?;
        decode_required("getArtist", value)
    }

    /// One album with its songs.
    pub async fn get_album(&self, id: &str) -> Result<AlbumWithSongs> {
        let params = [("id", id.to_string())];
        let value = self.fetch("getAlbum", &params, "album", true).await?;
        decode_required("getAlbum", value)
    }

    /// A page of albums in the given order.
    pub async fn get_album_list(
        &self,
        list_type: AlbumListType,
        size: u32,
        offset: u32,
    ) -> Result<Vec<Album>> {
        let mut params = vec![
            ("type", list_type.as_str().to_string()),
            ("size", size.to_string()),
        ];
        if offset > 0 {
            params.push(("offset", offset.to_string()));
        }
        // Random pages must not be served from cache
        let cacheable = list_type != AlbumListType::Random;
        let value = self
            .fetch("getAlbumList2", &params, "albumList2", cacheable)
            .await?;
        let list: AlbumList = decode_or_default("getAlbumList2", value)?;
        Ok(list.album)
    }

    /// Search artists, albums and songs.
    pub async fn search(&self, query: &str, counts: SearchCounts) -> Result<SearchResult> {
        let params = [
            ("query", query.to_string()),
            ("artistCount", counts.artists.to_string()),
            ("albumCount", counts.albums.to_string()),
            ("songCount", counts.songs.to_string()),
        ];
        let value = self
            .fetch("search3", &params, "searchResult3", true)
            .await?;
        decode_or_default("search3", value)
    }

    /// Random songs, optionally filtered. Never cached.
    pub async fn get_random_songs(&self, query: &RandomSongsQuery) -> Result<Vec<Child>> {
        let mut params = vec![("size", query.size.to_string())];
        if let Some(genre) = query.genre.as_deref().filter(|g| !g.is_empty()) {
            params.push(("genre", genre.to_string()));
        }
        if let Some(year) = query.from_year {
            params.push(("fromYear", year.to_string()));
        }
        if let Some(year) = query.to_year {
            params.push(("toYear", year.to_string()));
        }
        let value = self
            .fetch("getRandomSongs", &params, "randomSongs", false)
            .await?;
        let songs: SongList = decode_or_default("getRandomSongs", value)?;
        Ok(songs.song)
    }

    /// Playlists visible to the user.
    pub async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        let value = self.fetch("getPlaylists", &[], "playlists", true).await?;
        let playlists: PlaylistsContainer = decode_or_default("getPlaylists", value)?;
        Ok(playlists.playlist)
    }

    /// One playlist with its entries.
    pub async fn get_playlist(&self, id: &str) -> Result<PlaylistWithEntries> {
        let params = [("id", id.to_string())];
        let value = self.fetch("getPlaylist", &params, "playlist", true).await?;
        decode_required("getPlaylist", value)
    }

    /// Starred artists, albums and songs.
    pub async fn get_starred(&self) -> Result<Starred> {
        let value = self
            .fetch(STARRED_ENDPOINT, &[], "starred2", true)
            .await?;
        decode_or_default(STARRED_ENDPOINT, value)
    }

    // ===== Mutations =====

    /// Star a song, album or artist.
    pub async fn star(&self, target: &StarTarget) -> Result<()> {
        self.set_starred("star", target).await
    }

    /// Remove a star.
    pub async fn unstar(&self, target: &StarTarget) -> Result<()> {
        self.set_starred("unstar", target).await
    }

    async fn set_starred(&self, endpoint: &str, target: &StarTarget) -> Result<()> {
        let (key, id) = target.param();
        self.request(endpoint, &[(key, id.to_string())]).await?;
        let removed = self
            .lock_cache()
            .remove_where(|cached| cached.starts_with(STARRED_ENDPOINT));
        debug!(endpoint, id, removed, "Starred state changed");
        Ok(())
    }

    /// Report a song as now playing (`submission = false`) or played.
    pub async fn scrobble(&self, id: &str, submission: bool) -> Result<()> {
        let params = [
            ("id", id.to_string()),
            ("submission", submission.to_string()),
            ("time", chrono::Utc::now().timestamp_millis().to_string()),
        ];
        self.request("scrobble", &params).await?;
        trace!(id, submission, "Scrobbled");
        Ok(())
    }

    // ===== Cache =====

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Number of cached responses.
    pub fn cached_responses(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, ResponseCache<String, Value>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ===== Transport =====

    /// Fetch one payload field, through the cache when `cacheable`.
    async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        field: &str,
        cacheable: bool,
    ) -> Result<Value> {
        let key = cache_key(endpoint, params);
        if cacheable {
            let hit = self.lock_cache().get(&key);
            if let Some(value) = hit {
                trace!(endpoint, "Cache hit");
                return Ok(value);
            }
        }

        let mut payload = self.request(endpoint, params).await?;
        let value = payload.remove(field).unwrap_or(Value::Null);

        if cacheable && !value.is_null() {
            self.lock_cache().insert(key, value.clone());
        }
        Ok(value)
    }

    /// Perform a request and unwrap the `subsonic-response` envelope.
    async fn request(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Map<String, Value>> {
        let url = self.build_url(endpoint, params)?;
        debug!(endpoint, "Subsonic request");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), "Subsonic HTTP error");
            return Err(SubsonicError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope = response.json().await.map_err(|e| {
            SubsonicError::ParseError(format!("Failed to parse {} response: {}", endpoint, e))
        })?;
        let body = envelope.response;

        if body.status != "ok" {
            let (code, message) = body
                .error
                .map_or((0, "Unknown error".to_string()), |e| (e.code, e.message));
            warn!(endpoint, code, message = %message, "Subsonic API error");
            return Err(SubsonicError::Api { code, message });
        }

        Ok(body.payload)
    }
}

#[async_trait]
impl Catalog for SubsonicClient {
    fn stream_url(&self, track_id: &str) -> sona_core::Result<String> {
        Ok(self.stream_url_with_bitrate(track_id, None)?)
    }

    async fn scrobble(&self, track_id: &str, submission: bool) -> sona_core::Result<()> {
        Ok(SubsonicClient::scrobble(self, track_id, submission).await?)
    }
}

/// `<server>/rest/`, whether or not the configured URL already ends in `/rest`
fn rest_base_url(server: &str) -> Result<Url> {
    let trimmed = server.trim().trim_end_matches('/');
    let base = if trimmed.ends_with("/rest") {
        format!("{}/", trimmed)
    } else {
        format!("{}/rest/", trimmed)
    };
    Ok(Url::parse(&base)?)
}

fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

/// `md5(password + salt)` as lowercase hex
fn auth_token(password: &str, salt: &str) -> String {
    format!("{:x}", md5::compute(format!("{}{}", password, salt)))
}

fn cache_key(endpoint: &str, params: &[(&str, String)]) -> String {
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", endpoint, query.join("&"))
}

fn decode_required<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
    if value.is_null() {
        return Err(SubsonicError::ParseError(format!(
            "{} response has no payload",
            endpoint
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| SubsonicError::ParseError(format!("{}: {}", endpoint, e)))
}

fn decode_or_default<T: DeserializeOwned + Default>(endpoint: &str, value: Value) -> Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    decode_required(endpoint, value)
}
