//! Playlist ingestion.
//!
//! Reads the playlist document the signage server publishes for a screen:
//! an ordered `slides` array plus a `meta` settings record.

use crate::settings::Settings;
use crate::slide::{Slide, SlideKind};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

/// Slides and settings for one playback session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub meta: Settings,
}

impl Playlist {
    /// Parse a playlist document and normalise YouTube locators.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut playlist: Playlist =
            serde_json::from_str(json).context("Failed to parse playlist")?;
        for slide in playlist
            .slides
            .iter_mut()
            .filter(|s| s.kind == SlideKind::Youtube)
        {
            if let Some(src) = slide.src.as_mut() {
                *src = youtube_embed_url(src);
            }
        }
        Ok(playlist)
    }

    /// Load a playlist document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read playlist {:?}", path))?;
        let playlist = Self::from_json(&json)?;
        tracing::info!(
            "Loaded playlist {:?} with {} slides",
            path,
            playlist.slides.len()
        );
        Ok(playlist)
    }
}

fn embed(video_id: &str) -> String {
    format!(
        "https://www.youtube.com/embed/{}?autoplay=1&mute=1&controls=0&rel=0",
        urlencoding::encode(video_id)
    )
}

/// Turn `watch?v=`, `youtu.be/` and `/embed/` links into an embeddable,
/// autoplaying, muted URL. Anything else is returned as given.
pub fn youtube_embed_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let host = url.host_str().unwrap_or_default().to_lowercase();

    if host.ends_with("youtu.be") {
        let id = url.path().trim_matches('/');
        if !id.is_empty() {
            return embed(id);
        }
    } else if host.contains("youtube.com") {
        if url.path().starts_with("/watch") {
            if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
                if !id.is_empty() {
                    return embed(&id);
                }
            }
        }
        if url.path().starts_with("/embed/") {
            if let Some(id) = url.path_segments().and_then(|s| s.last()) {
                if !id.is_empty() {
                    return embed(id);
                }
            }
        }
    }

    raw.to_string()
}
