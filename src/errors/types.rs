//! Error type definitions for the proxy
//!
//! A small hierarchy: layer-specific enums that convert into [`AppError`]
//! through `#[from]`, so `?` works across module boundaries.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The remote catalog could not be retrieved
    #[error("Fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// The update sequence exceeded its time budget
    #[error("Update timed out after {}s", .0.as_secs())]
    UpdateTimedOut(Duration),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Remote catalog fetch errors
///
/// None of these are retried by the fetcher; the next scheduled tick is the retry.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network failure or timeout while talking to the remote API
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote API answered with something other than 200
    #[error("API returned status {status}")]
    Status { status: u16 },

    /// The look-ahead window does not fit in a timestamp
    #[error("query window of {window_hours}h is out of range")]
    QueryWindow { window_hours: i64 },

    /// The response body is not a valid channel dataset
    #[error("failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Local cache store errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the cache file failed
    #[error("cache I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but does not contain a dataset
    #[error("cache file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single channel or programme that could not be rendered
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("channel '{channel}': {reason}")]
    Channel { channel: String, reason: String },

    #[error("programme #{index} of channel '{channel}': {reason}")]
    Programme {
        channel: String,
        index: usize,
        reason: String,
    },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl GenerationError {
    pub fn channel<C: Into<String>, R: Into<String>>(channel: C, reason: R) -> Self {
        Self::Channel {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    pub fn programme<C: Into<String>, R: Into<String>>(channel: C, index: usize, reason: R) -> Self {
        Self::Programme {
            channel: channel.into(),
            index,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_converts_into_app_error() {
        let err: AppError = FetchError::Status { status: 500 }.into();
        assert!(matches!(err, AppError::FetchFailed(FetchError::Status { status: 500 })));
        assert_eq!(err.to_string(), "Fetch failed: API returned status 500");
    }

    #[test]
    fn test_generation_error_messages() {
        let err = GenerationError::programme("news-now", 3, "start is after stop");
        assert_eq!(
            err.to_string(),
            "programme #3 of channel 'news-now': start is after stop"
        );
    }

    #[test]
    fn test_update_timeout_message() {
        let err = AppError::UpdateTimedOut(Duration::from_secs(300));
        assert_eq!(err.to_string(), "Update timed out after 300s");
    }
}
