//! Favorites filter
//!
//! A plain file of match terms restricting which channels are published.
//! Two formats are accepted:
//!
//! - a JSON array of strings (file starts with `[`)
//! - free text, one term per line or comma separated, `#` starting a comment line
//!
//! An absent or empty list publishes every channel.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::models::Channel;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesFilter {
    /// Lowercased match terms
    terms: Vec<String>,
}

impl FavoritesFilter {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|term| term.as_ref().trim().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    /// Load terms from `path`
    ///
    /// Never fails: a missing file means no filter, an unreadable or invalid
    /// one is logged and also means no filter.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(content) => match Self::parse(&content) {
                Ok(filter) => {
                    debug!(path = %path.display(), terms = filter.terms.len(), "Favorites loaded");
                    filter
                }
                Err(e) => {
                    warn!("Invalid favorites file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No favorites file, publishing all channels");
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read favorites file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse favorites file content
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            let terms: Vec<String> = serde_json::from_str(trimmed)?;
            return Ok(Self::new(terms));
        }

        Ok(Self::new(
            content
                .split(['\n', ','])
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether `channel` should be published
    ///
    /// A term matches when it equals the slug, either identifier or the name,
    /// or is contained in the slug or the name. Comparison ignores case.
    pub fn matches(&self, channel: &Channel) -> bool {
        if self.terms.is_empty() {
            return true;
        }

        let slug = channel.slug.as_deref().map(str::to_lowercase);
        let name = channel.name.as_deref().map(str::to_lowercase);
        let id = channel.id.as_deref().map(str::to_lowercase);
        let public_id = channel.public_id.as_deref().map(str::to_lowercase);

        self.terms.iter().any(|term| {
            let equals = |field: &Option<String>| field.as_deref() == Some(term.as_str());
            let contains = |field: &Option<String>| {
                field
                    .as_deref()
                    .is_some_and(|value| value.contains(term.as_str()))
            };

            equals(&slug)
                || equals(&id)
                || equals(&public_id)
                || equals(&name)
                || contains(&slug)
                || contains(&name)
        })
    }

    /// Keep only matching channels
    pub fn apply(&self, channels: Vec<Channel>) -> Vec<Channel> {
        if self.is_empty() {
            return channels;
        }
        channels
            .into_iter()
            .filter(|channel| self.matches(channel))
            .collect()
    }

    /// Log which terms are active
    pub fn log_summary(&self) {
        if self.is_empty() {
            return;
        }
        info!(
            "Favorites filter active with {} term(s): {}",
            self.terms.len(),
            self.terms.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn channel(slug: &str, name: &str) -> Channel {
        Channel {
            id: Some(format!("id-{slug}")),
            slug: Some(slug.to_string()),
            name: Some(name.to_string()),
            is_stitched: true,
            ..Channel::default()
        }
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = FavoritesFilter::default();
        assert!(filter.matches(&channel("sports-hub", "Sports Hub")));
        assert!(filter.matches(&Channel::default()));
    }

    #[test]
    fn test_substring_match_on_name() {
        let filter = FavoritesFilter::new(["news"]);
        assert!(filter.matches(&channel("evening", "Evening News")));
        assert!(!filter.matches(&channel("sports-hub", "Sports Hub")));
    }

    #[test]
    fn test_exact_match_on_identifier_ignores_case() {
        let filter = FavoritesFilter::new(["ID-SPORTS-HUB"]);
        assert!(filter.matches(&channel("sports-hub", "Sports Hub")));
        assert!(!filter.matches(&channel("news", "News")));
    }

    #[test]
    fn test_parse_text_format() {
        let filter = FavoritesFilter::parse(
            "# my channels\nnews-now, comedy\n\n  Crime Drama  \n#disabled\n",
        )
        .unwrap();
        assert_eq!(filter.terms(), ["news-now", "comedy", "crime drama"]);
    }

    #[test]
    fn test_parse_json_format() {
        let filter = FavoritesFilter::parse(r#"["News", " ", "Comedy Central"]"#).unwrap();
        assert_eq!(filter.terms(), ["news", "comedy central"]);
    }

    #[test]
    fn test_parse_invalid_json_is_an_error() {
        assert!(FavoritesFilter::parse("[\"unterminated").is_err());
    }

    #[tokio::test]
    async fn test_load_missing_or_invalid_file_yields_empty_filter() {
        let dir = TempDir::new().unwrap();
        assert!(FavoritesFilter::load(dir.path().join("absent")).await.is_empty());

        let bad = dir.path().join("bad");
        std::fs::write(&bad, "[1, 2").unwrap();
        assert!(FavoritesFilter::load(&bad).await.is_empty());
    }

    #[tokio::test]
    async fn test_load_and_apply() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pluto-favorites");
        std::fs::write(&path, "news\n").unwrap();

        let filter = FavoritesFilter::load(&path).await;
        let kept = filter.apply(vec![
            channel("evening", "Evening News"),
            channel("sports-hub", "Sports Hub"),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].slug(), Some("evening"));
    }
}
