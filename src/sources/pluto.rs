//! Remote catalog fetcher
//!
//! Requests the channel listing for the window `[now, now + epg_hours]` and
//! keeps the raw response in the [`CacheStore`] so restarts inside the update
//! interval do not hit the network.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::CatalogSource;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::errors::{AppError, AppResult, FetchError, FetchResult};
use crate::models::Channel;
use crate::utils::time::format_query_bound;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct PlutoCatalogFetcher {
    client: Client,
    api_url: String,
    epg_window: chrono::Duration,
    cache: CacheStore,
}

impl PlutoCatalogFetcher {
    pub fn new(
        api_url: impl Into<String>,
        epg_window: chrono::Duration,
        fetch_timeout: std::time::Duration,
        cache: CacheStore,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            epg_window,
            cache,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let cache = CacheStore::new(&config.storage.cache_file, config.updates.interval());
        Self::new(
            config.source.api_url.clone(),
            config.updates.epg_window(),
            config.source.fetch_timeout(),
            cache,
        )
    }

    /// Catalog URL with percent-encoded `start` and `stop` bounds
    pub fn build_query_url(&self, now: DateTime<Utc>) -> FetchResult<String> {
        let end = now
            .checked_add_signed(self.epg_window)
            .ok_or(FetchError::QueryWindow {
                window_hours: self.epg_window.num_hours(),
            })?;
        let start = format_query_bound(&now);
        let stop = format_query_bound(&end);
        let separator = if self.api_url.contains('?') { '&' } else { '?' };

        Ok(format!(
            "{}{}start={}&stop={}",
            self.api_url,
            separator,
            urlencoding::encode(&start),
            urlencoding::encode(&stop)
        ))
    }

    async fn fetch_remote(&self) -> FetchResult<Vec<Channel>> {
        let url = self.build_query_url(Utc::now())?;
        info!("Fetching channel catalog from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Catalog API returned an unexpected status");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request { url, source })?;
        let channels: Vec<Channel> = serde_json::from_str(&body)?;
        debug!(bytes = body.len(), channels = channels.len(), "Catalog parsed");

        if let Err(e) = self.cache.write(&body).await {
            warn!("Failed to write catalog cache: {}", e);
        }

        Ok(channels)
    }
}

#[async_trait]
impl CatalogSource for PlutoCatalogFetcher {
    async fn fetch(&self) -> FetchResult<Vec<Channel>> {
        if let Some(record) = self.cache.read().await {
            info!(
                "Using cached catalog from {} ({} channels)",
                record.written_at.to_rfc3339(),
                record.channels.len()
            );
            return Ok(record.channels);
        }

        let channels = self.fetch_remote().await?;
        info!("Fetched {} channels from the catalog API", channels.len());
        Ok(channels)
    }

    fn name(&self) -> &str {
        "pluto"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fetcher(dir: &TempDir, api_url: &str) -> PlutoCatalogFetcher {
        PlutoCatalogFetcher::new(
            api_url,
            chrono::Duration::hours(24),
            Duration::from_secs(30),
            CacheStore::new(dir.path().join("cache.json"), Duration::from_secs(1800)),
        )
        .unwrap()
    }

    #[test]
    fn test_query_url_window() {
        let dir = TempDir::new().unwrap();
        let fetcher = fetcher(&dir, "http://api.pluto.tv/v2/channels");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 42, 0).unwrap();

        assert_eq!(
            fetcher.build_query_url(now).unwrap(),
            "http://api.pluto.tv/v2/channels?start=2024-05-01%2010%3A00%3A00.000%2B0000&stop=2024-05-02%2010%3A00%3A00.000%2B0000"
        );
    }

    #[test]
    fn test_query_url_appends_to_existing_query() {
        let dir = TempDir::new().unwrap();
        let fetcher = fetcher(&dir, "http://catalog.example/channels?region=us");
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        assert!(
            fetcher
                .build_query_url(now)
                .unwrap()
                .starts_with("http://catalog.example/channels?region=us&start=")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_window_fails_without_panicking() {
        let dir = TempDir::new().unwrap();
        let fetcher = PlutoCatalogFetcher::new(
            "http://127.0.0.1:9/channels",
            chrono::Duration::MAX,
            Duration::from_secs(30),
            CacheStore::new(dir.path().join("cache.json"), Duration::from_secs(1800)),
        )
        .unwrap();

        assert!(matches!(
            fetcher.build_query_url(Utc::now()),
            Err(FetchError::QueryWindow { .. })
        ));
        assert!(matches!(
            fetcher.fetch().await,
            Err(FetchError::QueryWindow { .. })
        ));
    }

    #[tokio::test]
    async fn test_fresh_cache_short_circuits_network() {
        let dir = TempDir::new().unwrap();
        // Unroutable URL: any network attempt would fail the fetch
        let fetcher = fetcher(&dir, "http://127.0.0.1:9/channels");
        fetcher
            .cache
            .write(r#"[{"slug":"cached","isStitched":true}]"#)
            .await
            .unwrap();

        let channels = fetcher.fetch().await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].slug(), Some("cached"));
    }
}
