/// Subsonic client configuration
use crate::error::{Result, SubsonicError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubsonicSettings {
    pub server: ServerSettings,

    #[serde(default)]
    pub client: ClientSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Server root, e.g. `https://music.example.com` (`/rest` is appended)
    pub url: String,

    pub username: String,

    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientSettings {
    #[serde(default = "default_client_name")]
    pub name: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl SubsonicSettings {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: ServerSettings {
                url: url.into(),
                username: username.into(),
                password: password.into(),
            },
            client: ClientSettings::default(),
            cache: CacheSettings::default(),
        }
    }

    /// Load from `sona.toml` (if present) and `SONA_` environment variables
    ///
    /// Nested keys use a double underscore: `SONA_SERVER__URL`,
    /// `SONA_CACHE__TTL_SECS`.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("sona.toml"))
    }

    /// Load from the given file (if present) and `SONA_` environment variables
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = config::Config::builder();

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SONA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the settings can produce a working client
    pub fn validate(&self) -> Result<()> {
        let url = self.server.url.trim();
        if url.is_empty() {
            return Err(SubsonicError::InvalidUrl("URL cannot be empty".into()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SubsonicError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        if self.server.username.is_empty() {
            return Err(SubsonicError::Config("username is required".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            name: default_client_name(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

fn default_client_name() -> String {
    "Sona".to_string()
}

fn default_api_version() -> String {
    "1.16.1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    256
}
