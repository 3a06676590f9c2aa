//! Tests for the Subsonic client against a mock server.

use serde_json::{json, Value};
use sona_core::{Catalog, SonaError};
use sona_subsonic::{
    AlbumListType, RandomSongsQuery, SearchCounts, StarTarget, SubsonicClient, SubsonicError,
    SubsonicSettings,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(payload: Value) -> ResponseTemplate {
    let mut body = json!({ "status": "ok", "version": "1.16.1" });
    if let (Some(body), Value::Object(fields)) = (body.as_object_mut(), payload) {
        body.extend(fields);
    }
    ResponseTemplate::new(200).set_body_json(json!({ "subsonic-response": body }))
}

fn failed(code: i32, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "subsonic-response": {
            "status": "failed",
            "version": "1.16.1",
            "error": { "code": code, "message": message }
        }
    }))
}

fn client_for(server: &MockServer) -> SubsonicClient {
    SubsonicClient::new(&SubsonicSettings::new(server.uri(), "alice", "sesame")).unwrap()
}

// =============================================================================
// Client Creation Tests
// =============================================================================

mod client_creation {
    use super::*;

    #[test]
    fn test_valid_url() {
        let settings = SubsonicSettings::new("http://localhost:4533", "alice", "sesame");
        assert!(SubsonicClient::new(&settings).is_ok());
    }

    #[test]
    fn test_scheme_required() {
        let settings = SubsonicSettings::new("localhost:4533", "alice", "sesame");
        match SubsonicClient::new(&settings) {
            Err(SubsonicError::InvalidUrl(msg)) => assert!(msg.contains("http")),
            other => panic!("Expected InvalidUrl error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_cover_art_url() {
        let settings = SubsonicSettings::new("https://music.example.com", "alice", "sesame");
        let client = SubsonicClient::new(&settings).unwrap();
        let url = client.cover_art_url("al-1", 300).unwrap();

        assert!(url.starts_with("https://music.example.com/rest/getCoverArt?"));
        assert!(url.contains("id=al-1"));
        assert!(url.contains("size=300"));
    }
}

// =============================================================================
// Connection Tests
// =============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn test_ping_sends_auth_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ping"))
            .and(query_param("u", "alice"))
            .and(query_param("f", "json"))
            .and(query_param("v", "1.16.1"))
            .and(query_param("c", "Sona"))
            .respond_with(ok(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).ping().await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let query: Vec<(String, String)> =
            requests[0].url.query_pairs().into_owned().collect();
        let get = |key: &str| query.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
        let salt = get("s").unwrap();
        let token = get("t").unwrap();

        assert_eq!(token, format!("{:x}", md5::compute(format!("sesame{}", salt))));
        assert!(get("p").is_none(), "password must not be sent");
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/ping"))
            .respond_with(failed(40, "Wrong username or password"))
            .mount(&server)
            .await;

        let err = client_for(&server).ping().await.unwrap_err();
        assert!(err.is_auth_failure());
        assert!(err.to_string().contains("Wrong username"));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/ping"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        match client_for(&server).ping().await {
            Err(SubsonicError::ServerError { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("Expected ServerError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).ping().await.unwrap_err();
        assert!(matches!(err, SubsonicError::ParseError(_)));
    }
}

// =============================================================================
// Browsing Tests
// =============================================================================

mod browsing {
    use super::*;

    #[tokio::test]
    async fn test_get_album() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getAlbum"))
            .and(query_param("id", "al-1"))
            .respond_with(ok(json!({
                "album": {
                    "id": "al-1",
                    "name": "Kind of Blue",
                    "artist": "Miles Davis",
                    "songCount": 2,
                    "song": [
                        { "id": "s1", "title": "So What", "artist": "Miles Davis", "duration": 562 },
                        { "id": "s2", "title": "Freddie Freeloader", "duration": 589 }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let album = client_for(&server).get_album("al-1").await.unwrap();
        assert_eq!(album.album.name, "Kind of Blue");

        let tracks = album.tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "So What");
        assert_eq!(tracks[0].duration_secs, Some(562));
        assert_eq!(tracks[1].artist, "Unknown Artist");
    }

    #[tokio::test]
    async fn test_album_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getAlbum"))
            .respond_with(failed(70, "Album not found"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_album("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_artists() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getArtists"))
            .respond_with(ok(json!({
                "artists": {
                    "ignoredArticles": "The",
                    "index": [
                        { "name": "A", "artist": [{ "id": "ar-1", "name": "Air", "albumCount": 4 }] },
                        { "name": "B", "artist": [{ "id": "ar-2", "name": "Björk" }] }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let indexes = client_for(&server).get_artists().await.unwrap();
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].artist[0].album_count, Some(4));
        assert_eq!(indexes[1].artist[0].name, "Björk");
    }

    #[tokio::test]
    async fn test_empty_album_list() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getAlbumList2"))
            .and(query_param("type", "newest"))
            .and(query_param("size", "10"))
            .respond_with(ok(json!({ "albumList2": {} })))
            .mount(&server)
            .await;

        let albums = client_for(&server)
            .get_album_list(AlbumListType::Newest, 10, 0)
            .await
            .unwrap();
        assert!(albums.is_empty());
    }

    #[tokio::test]
    async fn test_search() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/search3"))
            .and(query_param("query", "blue"))
            .and(query_param("songCount", "50"))
            .respond_with(ok(json!({
                "searchResult3": {
                    "album": [{ "id": "al-1", "name": "Kind of Blue" }],
                    "song": [{ "id": "s9", "title": "Blue in Green" }]
                }
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .search("blue", SearchCounts::default())
            .await
            .unwrap();
        assert!(result.artist.is_empty());
        assert_eq!(result.album[0].id, "al-1");
        assert_eq!(result.song[0].title, "Blue in Green");
    }

    #[tokio::test]
    async fn test_playlist_entries() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getPlaylist"))
            .and(query_param("id", "pl-1"))
            .respond_with(ok(json!({
                "playlist": {
                    "id": "pl-1",
                    "name": "Late Night",
                    "entry": [{ "id": "s3", "title": "Night Owl" }]
                }
            })))
            .mount(&server)
            .await;

        let playlist = client_for(&server).get_playlist("pl-1").await.unwrap();
        assert_eq!(playlist.playlist.name, "Late Night");
        assert_eq!(playlist.tracks()[0].id, "s3");
    }

    #[tokio::test]
    async fn test_random_songs_filters() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getRandomSongs"))
            .and(query_param("size", "5"))
            .and(query_param("genre", "Jazz"))
            .and(query_param("fromYear", "1950"))
            .respond_with(ok(json!({ "randomSongs": { "song": [{ "id": "s1", "title": "T" }] } })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = RandomSongsQuery {
            size: 5,
            genre: Some("Jazz".into()),
            from_year: Some(1950),
            to_year: None,
        };

        // Never cached: both calls reach the server
        assert_eq!(client.get_random_songs(&query).await.unwrap().len(), 1);
        assert_eq!(client.get_random_songs(&query).await.unwrap().len(), 1);
    }
}

// =============================================================================
// Cache Tests
// =============================================================================

mod caching {
    use super::*;

    #[tokio::test]
    async fn test_repeated_query_hits_cache() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getPlaylists"))
            .respond_with(ok(json!({
                "playlists": { "playlist": [{ "id": "pl-1", "name": "Mix" }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_playlists().await.unwrap().len(), 1);
        assert_eq!(client.get_playlists().await.unwrap().len(), 1);
        assert_eq!(client.cached_responses(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_refetches() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getPlaylists"))
            .respond_with(ok(json!({ "playlists": {} })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.get_playlists().await.unwrap();
        client.clear_cache();
        assert_eq!(client.cached_responses(), 0);
        client.get_playlists().await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getAlbum"))
            .respond_with(failed(70, "Album not found"))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.get_album("x").await.is_err());
        assert!(client.get_album("x").await.is_err());
        assert_eq!(client.cached_responses(), 0);
    }

    #[tokio::test]
    async fn test_star_invalidates_starred() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/getStarred2"))
            .respond_with(ok(json!({ "starred2": { "song": [{ "id": "s1", "title": "T" }] } })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(path("/rest/star"))
            .and(query_param("albumId", "al-7"))
            .respond_with(ok(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let starred = client.get_starred().await.unwrap();
        assert_eq!(starred.song.len(), 1);
        client.get_starred().await.unwrap();

        client
            .star(&StarTarget::Album("al-7".into()))
            .await
            .unwrap();
        client.get_starred().await.unwrap();
    }
}

// =============================================================================
// Catalog Tests
// =============================================================================

mod catalog {
    use super::*;

    #[tokio::test]
    async fn test_scrobble_params() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/scrobble"))
            .and(query_param("id", "s1"))
            .and(query_param("submission", "false"))
            .respond_with(ok(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        Catalog::scrobble(&client, "s1", false).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let time: i64 = requests[0]
            .url
            .query_pairs()
            .find(|(k, _)| k == "time")
            .map(|(_, v)| v.parse().unwrap())
            .unwrap();
        assert!(time > 1_600_000_000_000, "time is in milliseconds");
    }

    #[tokio::test]
    async fn test_scrobble_failure_maps_to_catalog_error() {
        let server = MockServer::start().await;
        Mock::given(path("/rest/scrobble"))
            .respond_with(failed(0, "Scrobbling disabled"))
            .mount(&server)
            .await;

        let err = Catalog::scrobble(&client_for(&server), "s1", true)
            .await
            .unwrap_err();
        assert!(matches!(err, SonaError::Catalog(_)));
    }

    #[test]
    fn test_stream_url() {
        let settings = SubsonicSettings::new("https://music.example.com/", "alice", "sesame");
        let client = SubsonicClient::new(&settings).unwrap();
        let url = Catalog::stream_url(&client, "s1").unwrap();

        assert!(url.starts_with("https://music.example.com/rest/stream?"));
        assert!(url.contains("id=s1"));
        assert!(!url.contains("maxBitRate"));
    }
}
