//! XMLTV guide generation
//!
//! Written as text with `quick_xml::escape::escape` applied to every value,
//! in two passes: all `<channel>` nodes first, then all `<programme>` nodes.

use quick_xml::escape::escape;
use tracing::{info, warn};

use crate::config::GuideConfig;
use crate::config::defaults::DEFAULT_FALLBACK_TITLE;
use crate::errors::GenerationError;
use crate::models::{Channel, Programme};
use crate::utils::time::{format_xmltv, parse_timestamp};

#[derive(Debug, Clone)]
pub struct GuideGenerator {
    generator_name: String,
    language: String,
    fallback_title: String,
}

/// Slug and display name of a channel that made it into the guide
struct GuideChannel<'a> {
    slug: &'a str,
    channel: &'a Channel,
}

impl GuideGenerator {
    pub fn new(generator_name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            generator_name: generator_name.into(),
            language: language.into(),
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }

    /// Title for programmes without one
    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = title.into();
        self
    }

    pub fn from_config(config: &GuideConfig) -> Self {
        Self::new(config.generator_name.clone(), config.language.clone())
            .with_fallback_title(config.fallback_title.clone())
    }

    /// Render the XMLTV document for every streamable channel
    pub fn generate(&self, channels: &[Channel]) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<tv generator-info-name=\"{}\">\n",
            escape(self.generator_name.as_str())
        ));

        let mut listed = Vec::new();
        for channel in channels.iter().filter(|channel| channel.is_stitched) {
            match Self::channel_node(channel) {
                Ok((slug, node)) => {
                    xml.push_str(&node);
                    listed.push(GuideChannel { slug, channel });
                }
                Err(e) => warn!("Skipping guide channel: {}", e),
            }
        }

        let mut programme_count = 0usize;
        for entry in &listed {
            for (index, programme) in entry.channel.timelines.iter().enumerate() {
                match self.programme_node(entry.slug, entry.channel, index, programme) {
                    Ok(node) => {
                        xml.push_str(&node);
                        programme_count += 1;
                    }
                    Err(e) => warn!("Skipping programme: {}", e),
                }
            }
        }

        xml.push_str("</tv>\n");
        info!(
            "Generated EPG with {} channels and {} programmes",
            listed.len(),
            programme_count
        );
        xml
    }

    fn channel_node(channel: &Channel) -> Result<(&str, String), GenerationError> {
        let label = channel.label();
        let slug = channel
            .slug()
            .ok_or_else(|| GenerationError::channel(label, "missing slug"))?;
        let name = channel
            .name()
            .ok_or_else(|| GenerationError::channel(label, "missing name"))?;

        let mut node = format!("  <channel id=\"{}\">\n", escape(slug));
        node.push_str(&format!(
            "    <display-name>{}</display-name>\n",
            escape(name)
        ));
        if let Some(logo) = channel.logo_url() {
            node.push_str(&format!("    <icon src=\"{}\"/>\n", escape(logo)));
        }
        node.push_str("  </channel>\n");

        Ok((slug, node))
    }

    fn programme_node(
        &self,
        slug: &str,
        channel: &Channel,
        index: usize,
        programme: &Programme,
    ) -> Result<String, GenerationError> {
        let fail = |reason: &str| GenerationError::programme(channel.label(), index, reason);

        let start = programme
            .start
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or_else(|| fail("missing or invalid start time"))?;
        let stop = programme
            .stop
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or_else(|| fail("missing or invalid stop time"))?;
        if start >= stop {
            return Err(fail("start is not before stop"));
        }

        let lang = escape(self.language.as_str());
        let title = programme
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(self.fallback_title.as_str());

        let mut node = format!(
            "  <programme start=\"{}\" stop=\"{}\" channel=\"{}\">\n",
            format_xmltv(&start),
            format_xmltv(&stop),
            escape(slug)
        );
        node.push_str(&format!(
            "    <title lang=\"{lang}\">{}</title>\n",
            escape(title)
        ));
        node.push_str(&format!(
            "    <desc lang=\"{lang}\">{}</desc>\n",
            escape(programme.description().unwrap_or_default())
        ));
        if let Some(genre) = programme.genre() {
            node.push_str(&format!(
                "    <category lang=\"{lang}\">{}</category>\n",
                escape(genre)
            ));
        }
        if let Some(poster) = programme.poster_url() {
            node.push_str(&format!("    <icon src=\"{}\"/>\n", escape(poster)));
        }
        node.push_str("  </programme>\n");

        Ok(node)
    }
}

impl Default for GuideGenerator {
    fn default() -> Self {
        Self::from_config(&GuideConfig::default())
    }
}
