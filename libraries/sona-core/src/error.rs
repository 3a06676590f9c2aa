/// Core error types for Sona
use thiserror::Error;

/// Result type alias using `SonaError`
pub type Result<T> = std::result::Result<T, SonaError>;

/// Core error type for Sona
///
/// Collaborators (catalog, sink, storage) report failures through this type so
/// the playback engine can treat them uniformly.
#[derive(Error, Debug)]
pub enum SonaError {
    /// Durable storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audio sink creation or transport errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// Catalog service errors (stream resolution, scrobbling, queries)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SonaError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
