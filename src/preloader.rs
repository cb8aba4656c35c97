//! Preloader asset cache.
//!
//! Holds the single "loading" visual reused across every masked transition.
//! It is resolved once at startup and read-only afterwards.

use crate::settings::PreloaderConfig;
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloaderKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloaderAsset {
    pub kind: PreloaderKind,
    pub src: String,
}

impl PreloaderAsset {
    /// `None` when the config is absent, has no locator, or names a type
    /// other than `image` or `video`.
    pub fn from_config(config: Option<&PreloaderConfig>) -> Option<Self> {
        let config = config?;
        let src = config.src.as_deref().filter(|s| !s.is_empty())?;
        let kind = match config.kind.as_deref() {
            Some("image") => PreloaderKind::Image,
            Some("video") => PreloaderKind::Video,
            other => {
                tracing::warn!("Unsupported preloader type {:?}, preloader disabled", other);
                return None;
            }
        };
        Some(Self {
            kind,
            src: src.to_string(),
        })
    }
}

/// The session's preloader asset, if one was configured.
#[derive(Debug, Clone, Default)]
pub struct PreloaderCache {
    asset: Option<PreloaderAsset>,
}

impl PreloaderCache {
    /// Resolve the configured asset and ask the surface to start fetching it.
    /// Never waits for the fetch.
    pub fn preload<S: Surface + ?Sized>(config: Option<&PreloaderConfig>, surface: &mut S) -> Self {
        let Some(asset) = PreloaderAsset::from_config(config) else {
            tracing::info!("No preloader configured");
            return Self::default();
        };

        tracing::info!("Preloading {:?} preloader asset {}", asset.kind, asset.src);
        surface.preload(&asset);
        Self { asset: Some(asset) }
    }

    pub fn asset(&self) -> Option<&PreloaderAsset> {
        self.asset.as_ref()
    }
}
