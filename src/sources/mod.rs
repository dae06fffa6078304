//! Channel catalog sources
//!
//! The update orchestrator only depends on [`CatalogSource`], so the remote
//! fetcher can be swapped for an in-memory source in tests.

use async_trait::async_trait;

use crate::errors::FetchResult;
use crate::models::Channel;

pub mod pluto;

pub use pluto::PlutoCatalogFetcher;

/// Anything that can produce the full channel dataset
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Retrieve the complete channel list, schedules included
    async fn fetch(&self) -> FetchResult<Vec<Channel>>;

    /// Short name used in log messages
    fn name(&self) -> &str {
        "catalog"
    }
}
