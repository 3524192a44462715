//! Error types for PressPipe.
//!
//! Library crates use [`PressPipeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all PressPipe operations.
#[derive(Debug, thiserror::Error)]
pub enum PressPipeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The article file has no `---`-delimited front matter block.
    #[error("file '{path}' does not contain front matter delimited by '---' lines")]
    MissingFrontMatter { path: PathBuf },

    /// The front matter block failed to parse or was not a mapping.
    #[error("invalid front matter in '{path}': {message}")]
    InvalidFrontMatter { path: PathBuf, message: String },

    /// Slug derivation produced an empty string.
    #[error("slug cannot be derived from '{input}'")]
    EmptySlug { input: String },

    /// A featured-image reference could not be resolved to a local file.
    #[error("unable to locate media file '{reference}' relative to '{article}'")]
    MediaNotFound { reference: String, article: PathBuf },

    /// A remote document that should be updated carries no `id` field.
    #[error("existing document in '{collection}' for '{key}' is missing an 'id' field")]
    MissingIdentifier { collection: String, key: String },

    /// A category label was empty or not a string.
    #[error("invalid category label: {message}")]
    InvalidCategoryLabel { message: String },

    /// Authentication failure (login rejected, 401/403 from the store).
    #[error("auth error: {0}")]
    Auth(String),

    /// Transport-level HTTP failure (connection, timeout, 5xx).
    #[error("network error: {0}")]
    Network(String),

    /// The store rejected a request with a structured 4xx body.
    #[error("remote validation error (status {status}): {body}")]
    RemoteValidation { status: u16, body: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Generic parse error (patterns, metadata values, etc.).
    #[error("parse error: {message}")]
    Parse { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PressPipeError>;

impl PressPipeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
