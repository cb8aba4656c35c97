//! Preloader overlay controller.
//!
//! At most one overlay is mounted at a time. Showing always replaces the
//! previous one; hiding is idempotent.

use crate::preloader::{PreloaderAsset, PreloaderCache};
use crate::surface::Surface;

#[derive(Debug, Default)]
pub struct Overlay {
    asset: Option<PreloaderAsset>,
    mounted: bool,
}

impl Overlay {
    pub fn new(cache: &PreloaderCache) -> Self {
        Self {
            asset: cache.asset().cloned(),
            mounted: false,
        }
    }

    /// Mount a fresh overlay above the current content. No-op without a
    /// configured asset.
    pub fn show<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let Some(asset) = self.asset.as_ref() else {
            tracing::trace!("No preloader configured, nothing to show");
            return;
        };

        if self.mounted {
            surface.unmount_overlay();
        }
        tracing::debug!("Showing preloader");
        surface.mount_overlay(asset);
        self.mounted = true;
    }

    /// Unmount the overlay if one is mounted.
    pub fn hide<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.mounted {
            tracing::debug!("Hiding preloader");
            surface.unmount_overlay();
            self.mounted = false;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.mounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PreloaderConfig;
    use crate::testing::{Op, Recorder};

    fn image_overlay(recorder: &Recorder) -> Overlay {
        let config = PreloaderConfig {
            kind: Some("image".into()),
            src: Some("/loading.gif".into()),
        };
        let cache = PreloaderCache::preload(Some(&config), &mut recorder.surface());
        recorder.reset();
        Overlay::new(&cache)
    }

    #[test]
    fn hide_is_idempotent() {
        let recorder = Recorder::new();
        let mut surface = recorder.surface();
        let mut overlay = image_overlay(&recorder);

        overlay.hide(&mut surface);
        overlay.hide(&mut surface);
        assert!(!overlay.is_visible());
        assert!(recorder.ops().is_empty());

        overlay.show(&mut surface);
        overlay.hide(&mut surface);
        overlay.hide(&mut surface);
        assert!(!overlay.is_visible());
        assert_eq!(recorder.op_list().len(), 2);
    }

    #[test]
    fn show_replaces_the_previous_overlay() {
        let recorder = Recorder::new();
        let mut surface = recorder.surface();
        let mut overlay = image_overlay(&recorder);

        overlay.show(&mut surface);
        overlay.show(&mut surface);
        assert!(overlay.is_visible());

        let ops = recorder.op_list();
        assert!(matches!(ops[0], Op::ShowOverlay(_)));
        assert_eq!(ops[1], Op::HideOverlay);
        assert!(matches!(ops[2], Op::ShowOverlay(_)));
    }

    #[test]
    fn without_asset_show_does_nothing() {
        let recorder = Recorder::new();
        let mut surface = recorder.surface();
        let mut overlay = Overlay::new(&PreloaderCache::default());

        overlay.show(&mut surface);
        assert!(!overlay.is_visible());
        assert!(recorder.ops().is_empty());
    }
}
