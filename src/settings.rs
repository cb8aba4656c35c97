//! Player settings and host configuration.
//!
//! [`Settings`] is the per-playlist record handed over together with the
//! slides. [`AppConfig`] is the process configuration, layered from an
//! optional TOML file and `SIGNAGE_*` environment variables.

use crate::kiosk::KioskProfile;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TITLE: &str = "Digital Signage";

/// Preloader asset as configured: `{type: image|video, src}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PreloaderConfig {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
}

/// Settings record accompanying a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSettings")]
pub struct Settings {
    pub title: String,
    pub auto_unmute: bool,
    pub preloader: Option<PreloaderConfig>,
    pub show_fullscreen_button: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            auto_unmute: false,
            preloader: None,
            show_fullscreen_button: true,
        }
    }
}

/// Wire shape; every field may be missing or null.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    title: Option<String>,
    auto_unmute: Option<bool>,
    preloader: Option<PreloaderConfig>,
    show_fullscreen_button: Option<bool>,
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        Self {
            title: raw
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            auto_unmute: raw.auto_unmute.unwrap_or(false),
            preloader: raw.preloader,
            // Only an explicit `false` hides the button.
            show_fullscreen_button: raw.show_fullscreen_button != Some(false),
        }
    }
}

/// Process configuration for the player binary.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Playlist document (JSON).
    pub playlist: PathBuf,
    /// Base used to resolve relative locators such as `/ds/a/4/content`.
    pub base_url: Option<String>,
    /// Where the preloader asset bytes are cached.
    pub cache_dir: PathBuf,
    pub probe_timeout_secs: u64,
    pub log_filter: String,
    #[serde(default)]
    pub kiosk: KioskProfile,
}

impl AppConfig {
    /// Load from the file named by `SIGNAGE_CONFIG` (default `signage.toml`).
    pub fn load() -> Result<Self> {
        let path = std::env::var("SIGNAGE_CONFIG").unwrap_or_else(|_| "signage.toml".into());
        Self::load_from(&path)
    }

    /// Load from `path` (optional) overlaid with `SIGNAGE_*` variables.
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("playlist", "playlist.json")?
            .set_default("cache_dir", "cache")?
            .set_default("probe_timeout_secs", 10)?
            .set_default("log_filter", "info")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SIGNAGE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let app_config: AppConfig = settings
            .try_deserialize()
            .context("Invalid player configuration")?;
        Ok(app_config)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}
