//! Error types for the block icon renderer.
//!
//! Library errors are wrapped in [`Arc`] so that [`Error`] is `Clone`: a failed
//! single-flight task hands the same error to every caller waiting on it.

use std::sync::Arc;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for asset fetching, model resolution and rendering.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The version manifest could not be fetched and no cached copy exists.
    #[error("Version manifest unavailable: {0}")]
    ManifestUnavailable(String),

    /// The requested version id is not listed in the manifest.
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    /// A remote download failed and no cached copy exists.
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Unpacking the client archive failed and no previous bundle exists.
    #[error("Extraction failed for version {version}: {reason}")]
    ExtractionFailed { version: String, reason: String },

    /// A model could not be found in any pack root.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The resolved model has no elements to draw.
    #[error("Model has no renderable geometry: {0}")]
    NoRenderableGeometry(String),

    /// A texture file is missing. Renders degrade to a placeholder instead of raising this.
    #[error("Texture missing: {0}")]
    TextureMissing(String),

    /// The item identifier is empty or contains characters outside the resource location set.
    #[error("Invalid item id: {0:?}")]
    InvalidItemId(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(Arc<serde_json::Error>),

    /// Failed to decode or encode an image.
    #[error("Image error: {0}")]
    Image(Arc<image::ImageError>),

    /// Failed to read a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(Arc<zip::result::ZipError>),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(Arc<reqwest::Error>),

    /// A background task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(String),
}

impl Error {
    /// Whether this error means the item or model simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ModelNotFound(_) | Error::VersionNotFound(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(Arc::new(err))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(Arc::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(Arc::new(err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}
