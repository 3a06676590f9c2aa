//! Error types for the Subsonic client.

use sona_core::SonaError;
use thiserror::Error;

/// Errors that can occur when talking to a Subsonic server.
#[derive(Error, Debug)]
pub enum SubsonicError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success HTTP status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Server answered with `status = "failed"`
    #[error("Subsonic error {code}: {message}")]
    Api { code: i32, message: String },

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Settings could not be loaded or are incomplete
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SubsonicError {
    /// Subsonic error code 70: the requested data was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { code: 70, .. })
    }

    /// Subsonic error codes 40/41: wrong credentials or token auth unsupported
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { code: 40 | 41, .. })
    }
}

impl From<config::ConfigError> for SubsonicError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<url::ParseError> for SubsonicError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<SubsonicError> for SonaError {
    fn from(e: SubsonicError) -> Self {
        match e {
            SubsonicError::Request(e) => SonaError::Network(e.to_string()),
            SubsonicError::InvalidUrl(msg) => SonaError::InvalidInput(msg),
            SubsonicError::Config(msg) => SonaError::Config(msg),
            other => SonaError::Catalog(other.to_string()),
        }
    }
}

/// Result type for Subsonic client operations.
pub type Result<T> = std::result::Result<T, SubsonicError>;
