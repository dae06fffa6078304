//! Shared helpers for timestamps, URLs and file output

pub mod fs;
pub mod time;
pub mod url;

pub use fs::atomic_write;
pub use url::UrlUtils;
