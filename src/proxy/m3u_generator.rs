//! M3U8 playlist generation

use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::models::Channel;
use crate::utils::UrlUtils;

pub const M3U_HEADER: &str = "#EXTM3U\n";
const DEFAULT_GROUP: &str = "General";

/// Per-entry client identity appended to stream URLs
#[derive(Debug, Clone, PartialEq)]
pub struct ClientIdentity {
    pub device_id: Uuid,
    pub session_id: Uuid,
}

impl ClientIdentity {
    /// Time-based device id and random session id
    pub fn fresh() -> Self {
        Self {
            device_id: Uuid::now_v1(&rand::random::<[u8; 6]>()),
            session_id: Uuid::new_v4(),
        }
    }

    /// Query parameters overwritten on every stream URL
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("advertisingId", String::new()),
            ("appName", "web".to_string()),
            ("appVersion", "unknown".to_string()),
            ("appStoreUrl", String::new()),
            ("architecture", String::new()),
            ("buildVersion", String::new()),
            ("clientTime", "0".to_string()),
            ("deviceDNT", "0".to_string()),
            ("deviceId", self.device_id.to_string()),
            ("deviceMake", "Chrome".to_string()),
            ("deviceModel", "web".to_string()),
            ("deviceType", "web".to_string()),
            ("deviceVersion", "unknown".to_string()),
            ("includeExtendedEvents", "false".to_string()),
            ("sid", self.session_id.to_string()),
            ("userId", String::new()),
            ("serverSideAds", "true".to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistGenerator;

impl PlaylistGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Render the playlist for every streamable channel
    pub fn generate(&self, channels: &[Channel]) -> String {
        let mut playlist = String::from(M3U_HEADER);
        let mut written = 0usize;
        let mut skipped = 0usize;

        for channel in channels.iter().filter(|channel| channel.is_stitched) {
            match self.render_entry(channel, &ClientIdentity::fresh()) {
                Ok(entry) => {
                    playlist.push_str(&entry);
                    written += 1;
                }
                Err(e) => {
                    warn!("Skipping playlist entry: {}", e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            debug!("Playlist skipped {} malformed channel(s)", skipped);
        }
        info!("Generated M3U8 playlist with {} channels", written);
        playlist
    }

    /// One `#EXTINF` line, the stream URL and a blank separator line
    pub fn render_entry(
        &self,
        channel: &Channel,
        identity: &ClientIdentity,
    ) -> Result<String, GenerationError> {
        let label = channel.label();
        let slug = channel
            .slug()
            .ok_or_else(|| GenerationError::channel(label, "missing slug"))?;
        let name = channel
            .name()
            .ok_or_else(|| GenerationError::channel(label, "missing name"))?;
        let template = channel
            .stream_url_template()
            .ok_or_else(|| GenerationError::channel(label, "missing stream URL"))?;

        let stream_url = Self::stream_url(template, identity)
            .map_err(|e| GenerationError::channel(label, format!("invalid stream URL: {e}")))?;

        let mut extinf = format!("#EXTINF:0 tvg-id=\"{slug}\"");
        if let Some(logo) = channel.logo_url() {
            extinf.push_str(&format!(" tvg-logo=\"{logo}\""));
        }
        let group = channel
            .category
            .as_deref()
            .filter(|category| !category.is_empty())
            .unwrap_or(DEFAULT_GROUP);
        extinf.push_str(&format!(" group-title=\"{group}\", {name}\n"));

        Ok(format!("{extinf}{stream_url}\n\n"))
    }

    /// Apply the client identity parameters to a stream URL template
    pub fn stream_url(template: &str, identity: &ClientIdentity) -> Result<String, url::ParseError> {
        let mut url = Url::parse(template)?;
        UrlUtils::set_query_params(&mut url, &identity.query_params());
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Image, Stitched, StitchedUrl};

    fn stitched_channel(slug: &str, name: &str, url: &str) -> Channel {
        Channel {
            slug: Some(slug.to_string()),
            name: Some(name.to_string()),
            category: Some("News".to_string()),
            is_stitched: true,
            stitched: Some(Stitched {
                urls: vec![StitchedUrl {
                    url: url.to_string(),
                }],
            }),
            ..Channel::default()
        }
    }

    fn fixed_identity() -> ClientIdentity {
        ClientIdentity {
            device_id: Uuid::nil(),
            session_id: Uuid::from_u128(0x5e55_1011),
        }
    }

    #[test]
    fn test_header_only_when_nothing_qualifies() {
        let generator = PlaylistGenerator::new();
        assert_eq!(generator.generate(&[]), M3U_HEADER);

        let not_stitched = Channel {
            is_stitched: false,
            ..stitched_channel("a", "A", "https://stitch.example/a.m3u8")
        };
        assert_eq!(generator.generate(&[not_stitched]), M3U_HEADER);
    }

    #[test]
    fn test_entry_format() {
        let mut channel = stitched_channel("news-now", "News Now", "https://stitch.example/n.m3u8?terminate=false");
        channel.color_logo_png = Some(Image {
            path: Some("https://images.example/n.png".to_string()),
        });

        let entry = PlaylistGenerator::new()
            .render_entry(&channel, &fixed_identity())
            .unwrap();
        let mut lines = entry.lines();

        assert_eq!(
            lines.next(),
            Some(
                "#EXTINF:0 tvg-id=\"news-now\" tvg-logo=\"https://images.example/n.png\" group-title=\"News\", News Now"
            )
        );
        let url = Url::parse(lines.next().unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("terminate".to_string(), "false".to_string()));
        assert!(pairs.contains(&("deviceId".to_string(), Uuid::nil().to_string())));
        assert!(pairs.contains(&("sid".to_string(), Uuid::from_u128(0x5e55_1011).to_string())));
        assert!(pairs.contains(&("serverSideAds".to_string(), "true".to_string())));
        assert_eq!(lines.next(), Some(""));
        assert!(entry.ends_with("\n\n"));
    }

    #[test]
    fn test_missing_logo_and_category() {
        let mut channel = stitched_channel("plain", "Plain", "https://stitch.example/p.m3u8");
        channel.category = None;

        let entry = PlaylistGenerator::new()
            .render_entry(&channel, &fixed_identity())
            .unwrap();
        assert!(entry.starts_with("#EXTINF:0 tvg-id=\"plain\" group-title=\"General\", Plain\n"));
    }

    #[test]
    fn test_existing_identity_params_are_overwritten() {
        let url = PlaylistGenerator::stream_url(
            "https://stitch.example/s.m3u8?deviceId=stale&sid=old&sid=older",
            &fixed_identity(),
        )
        .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let sids: Vec<_> = parsed.query_pairs().filter(|(k, _)| k == "sid").collect();
        assert_eq!(sids.len(), 1);
        assert_eq!(sids[0].1, Uuid::from_u128(0x5e55_1011).to_string());
        assert!(url.starts_with("https://stitch.example/s.m3u8?deviceId=00000000-0000-0000-0000-000000000000&sid="));
    }

    #[test]
    fn test_malformed_channels_are_skipped() {
        let good = stitched_channel("good", "Good", "https://stitch.example/g.m3u8");
        let no_slug = Channel {
            slug: None,
            ..stitched_channel("x", "No Slug", "https://stitch.example/x.m3u8")
        };
        let bad_url = stitched_channel("bad", "Bad", "not a url");
        let no_url = Channel {
            stitched: None,
            ..stitched_channel("none", "None", "")
        };

        let playlist = PlaylistGenerator::new().generate(&[no_slug, good, bad_url, no_url]);
        assert!(playlist.starts_with(M3U_HEADER));
        assert_eq!(playlist.matches("#EXTINF").count(), 1);
        assert!(playlist.contains("tvg-id=\"good\""));
    }

    #[test]
    fn test_identity_is_fresh_per_entry() {
        let channels = vec![
            stitched_channel("a", "A", "https://stitch.example/a.m3u8"),
            stitched_channel("b", "B", "https://stitch.example/b.m3u8"),
        ];
        let playlist = PlaylistGenerator::new().generate(&channels);
        let sids: Vec<String> = playlist
            .lines()
            .filter(|line| line.starts_with("https://"))
            .filter_map(|line| {
                Url::parse(line)
                    .ok()?
                    .query_pairs()
                    .find(|(k, _)| k == "sid")
                    .map(|(_, v)| v.into_owned())
            })
            .collect();
        assert_eq!(sids.len(), 2);
        assert_ne!(sids[0], sids[1]);
    }
}
