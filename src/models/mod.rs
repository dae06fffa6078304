//! Remote catalog payload types
//!
//! These mirror the upstream channel listing closely. Everything except
//! `isStitched` is optional so that a single malformed channel never fails
//! the whole dataset; the generators decide per channel what is required.

use serde::{Deserialize, Serialize};

/// A channel as returned by the catalog API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Internal identifier (`_id` upstream)
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Public identifier (`id` upstream)
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        rename = "colorLogoPNG",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub color_logo_png: Option<Image>,
    /// Only stitched channels carry a playable stream
    #[serde(rename = "isStitched", default)]
    pub is_stitched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stitched: Option<Stitched>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timelines: Vec<Programme>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stitched {
    #[serde(default)]
    pub urls: Vec<StitchedUrl>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StitchedUrl {
    #[serde(default)]
    pub url: String,
}

/// A scheduled airing on a channel timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Programme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<Episode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<Image>,
}

impl Channel {
    /// Logo URL, if the channel has a non-empty colour PNG logo
    pub fn logo_url(&self) -> Option<&str> {
        self.color_logo_png
            .as_ref()
            .and_then(|image| image.path.as_deref())
            .filter(|path| !path.is_empty())
    }

    /// First stitched stream URL, before client identity parameters are applied
    pub fn stream_url_template(&self) -> Option<&str> {
        self.stitched
            .as_ref()
            .and_then(|stitched| stitched.urls.first())
            .map(|entry| entry.url.as_str())
            .filter(|url| !url.is_empty())
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|slug| !slug.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Best available label for log messages
    pub fn label(&self) -> &str {
        self.slug()
            .or_else(|| self.name())
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }
}

impl Programme {
    pub fn description(&self) -> Option<&str> {
        self.episode.as_ref().and_then(|e| e.description.as_deref())
    }

    pub fn genre(&self) -> Option<&str> {
        self.episode
            .as_ref()
            .and_then(|e| e.genre.as_deref())
            .filter(|genre| !genre.is_empty())
    }

    pub fn poster_url(&self) -> Option<&str> {
        self.episode
            .as_ref()
            .and_then(|e| e.poster.as_ref())
            .and_then(|poster| poster.path.as_deref())
            .filter(|path| !path.is_empty())
    }
}
