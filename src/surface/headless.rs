//! Surface for unattended operation without a browser engine.
//!
//! Nothing is drawn. Every operation is logged, and mounted content is
//! probed over HTTP so the player still receives load, playing and error
//! signals.

use super::{Content, Notice, Signal, SlideListener, Surface, VideoContent};
use crate::cache::AssetCache;
use crate::error::MediaFailure;
use crate::fetch::Fetcher;
use crate::preloader::PreloaderAsset;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct HeadlessSurface {
    fetcher: Fetcher,
    cache: Arc<AssetCache>,
    /// Probe for the mounted content.
    probe: Option<JoinHandle<()>>,
    video: Option<SlideListener>,
    prompt: Option<SlideListener>,
}

impl HeadlessSurface {
    pub fn new(fetcher: Fetcher, cache: Arc<AssetCache>) -> Self {
        Self {
            fetcher,
            cache,
            probe: None,
            video: None,
            prompt: None,
        }
    }

    fn abort_probe(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.abort();
        }
    }
}

impl Surface for HeadlessSurface {
    fn set_title(&mut self, title: &str) {
        tracing::info!("Title: {}", title);
    }

    fn preload(&mut self, asset: &PreloaderAsset) {
        let fetcher = self.fetcher.clone();
        let cache = self.cache.clone();
        let src = asset.src.clone();
        tokio::spawn(async move {
            match cache.fetch(&fetcher, &src).await {
                Ok(path) => tracing::info!("Preloader asset ready at {:?}", path),
                Err(e) => tracing::warn!("Failed to preload {}: {:#}", src, e),
            }
        });
    }

    fn mount_overlay(&mut self, asset: &PreloaderAsset) {
        match self.cache.cached(&asset.src) {
            Some(path) => tracing::debug!("Overlay up ({:?}, cached at {:?})", asset.kind, path),
            None => tracing::debug!("Overlay up ({:?}, {})", asset.kind, asset.src),
        }
    }

    fn unmount_overlay(&mut self) {
        tracing::debug!("Overlay down");
    }

    fn clear(&mut self) {
        self.abort_probe();
        self.video = None;
        self.prompt = None;
        tracing::debug!("Content cleared");
    }

    fn mount(&mut self, content: &Content, listener: SlideListener) {
        self.abort_probe();
        let generation = listener.generation();
        let fetcher = self.fetcher.clone();

        match content {
            Content::Image { src } => {
                tracing::info!(generation, "Mount image {}", src);
                let src = src.clone();
                self.probe = Some(tokio::spawn(async move {
                    listener.emit(probe_image(&fetcher, &src).await);
                }));
            }
            Content::Video(video) => {
                tracing::info!(
                    generation,
                    "Mount video {} (type {}, muted {})",
                    video.src,
                    video.mime.unwrap_or("unknown"),
                    video.muted
                );
                self.video = Some(listener.clone());
                let video = video.clone();
                self.probe = Some(tokio::spawn(async move {
                    listener.emit(probe_video(&fetcher, &video).await);
                }));
            }
            Content::Frame { src } => {
                tracing::info!(generation, "Mount frame {}", src);
                let src = src.clone();
                self.probe = Some(tokio::spawn(async move {
                    match fetcher.get(&src).await {
                        Ok(_) => listener.emit(Signal::Loaded),
                        Err(e) => match e.downcast_ref::<reqwest::Error>() {
                            // Error pages still load in a frame.
                            Some(re) if re.is_status() => listener.emit(Signal::Loaded),
                            _ => tracing::warn!("Frame {} unreachable: {:#}", src, e),
                        },
                    }
                }));
            }
            Content::Markup { html } => {
                tracing::info!(generation, "Mount markup ({} bytes)", html.len());
            }
            Content::Notice(notice) => {
                tracing::info!(generation, "Mount notice: {}", notice.text);
            }
        }
    }

    fn append_notice(&mut self, notice: &Notice) {
        tracing::warn!("Notice ({:?}): {}", notice.kind, notice.text);
    }

    fn show_prompt(&mut self, notice: &Notice, listener: SlideListener) {
        tracing::info!(generation = listener.generation(), "Prompt: {}", notice.text);
        self.prompt = Some(listener);
    }

    fn remove_prompt(&mut self) {
        if self.prompt.take().is_some() {
            tracing::debug!("Prompt removed");
        }
    }

    fn resume_playback(&mut self, unmute: bool) {
        tracing::info!("Resuming playback (unmute {})", unmute);
        if let Some(video) = &self.video {
            video.emit(Signal::Playing);
        }
    }
}

async fn probe_image(fetcher: &Fetcher, src: &str) -> Signal {
    let bytes = match fetcher.bytes(src).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Image {} failed to load: {:#}", src, e);
            return Signal::LoadFailed;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(img) => {
            tracing::debug!("Image {} decoded ({}x{})", src, img.width(), img.height());
            Signal::Loaded
        }
        Err(e) => {
            tracing::warn!("Image {} failed to decode: {}", src, e);
            Signal::LoadFailed
        }
    }
}

async fn probe_video(fetcher: &Fetcher, video: &VideoContent) -> Signal {
    let response = match fetcher.get(&video.src).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Video {} failed to load: {:#}", video.src, e);
            return Signal::MediaFailed(media_failure(&e));
        }
    };

    let mut stream = response.bytes_stream();
    match stream.next().await {
        Some(Ok(chunk)) if !chunk.is_empty() => {
            tracing::debug!("Video {} started ({} bytes buffered)", video.src, chunk.len());
            Signal::Playing
        }
        Some(Err(e)) => {
            tracing::warn!("Video {} stream error: {}", video.src, e);
            Signal::MediaFailed(MediaFailure::Network)
        }
        _ => {
            tracing::warn!("Video {} has no data", video.src);
            Signal::MediaFailed(MediaFailure::Decode)
        }
    }
}

/// Classify a failed video request: error statuses mean the source is not
/// playable, timeouts abort the load, anything else is a network failure.
fn media_failure(err: &anyhow::Error) -> MediaFailure {
    match err.downcast_ref::<reqwest::Error>() {
        Some(e) if e.is_status() => MediaFailure::SourceNotSupported,
        Some(e) if e.is_timeout() => MediaFailure::Aborted,
        _ => MediaFailure::Network,
    }
}
