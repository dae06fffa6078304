//! Centralized error handling for the proxy
//!
//! Errors are grouped by the layer that raises them:
//!
//! - **Fetch Errors**: remote catalog retrieval (network, status, payload)
//! - **Cache Errors**: the on-disk catalog cache
//! - **Generation Errors**: a single channel or programme that could not be rendered
//! - **Application Errors**: everything that can abort an update or a request
//!
//! Per-item generation errors are always recovered by the generators; only
//! [`AppError`] crosses the orchestrator boundary.
//!
//! # Usage
//!
//! ```rust
//! use pluto_iptv_proxy::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for remote fetch Results
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for cache Results
pub type CacheResult<T> = Result<T, CacheError>;
