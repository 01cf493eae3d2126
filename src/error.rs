//! Error types for ladder-view
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;
use std::sync::Arc;

/// Main error type for the crate
#[derive(Debug, Snafu)]
pub enum Error {
    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// IO error (config files, log directory)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// TOML serialization error
    #[snafu(display("TOML serialize error: {source}"))]
    TomlSe { source: toml::ser::Error },

    /// Transport-level HTTP failure (connect, timeout, body decode)
    #[snafu(display("HTTP error: {source}"))]
    Http { source: reqwest::Error },

    /// Server answered with a non-success status
    #[snafu(display("{method} {url} returned {status}"))]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// The fetch was aborted by an invalidation
    #[snafu(display("Request for page {page} was cancelled"))]
    Cancelled { page: u32 },

    /// The cache generation moved on before the result could be read
    #[snafu(display("Row cache invalidated (generation {expected} -> {current})"))]
    Invalidated { expected: u64, current: u64 },

    /// A spawned fetch task panicked
    #[snafu(display("Fetch task for page {page} failed: {message}"))]
    TaskFailed { page: u32, message: String },
}

impl Error {
    /// Whether the error comes from an invalidation rather than a real failure
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::Cancelled { .. } | Error::Invalidated { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(source: toml::ser::Error) -> Self {
        Error::TomlSe { source }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Error::Http { source }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error observed by every caller sharing one page fetch
pub type SharedError = Arc<Error>;
