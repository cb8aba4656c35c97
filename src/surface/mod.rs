//! The display surface the player drives.
//!
//! A [`Surface`] owns the mounted nodes: one slide's content, at most one
//! preloader overlay, inline notices and the playback prompt. Load, playback
//! and error notifications flow back through the [`SlideListener`] handed
//! over at mount time, tagged with the generation of the slide that produced
//! them.

pub mod headless;

use crate::error::MediaFailure;
use crate::player::Command;
use crate::preloader::PreloaderAsset;
use tokio::sync::mpsc::UnboundedSender;

pub use headless::HeadlessSurface;

/// Completion and lifecycle notifications from mounted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Image decoded or frame document loaded.
    Loaded,
    /// Image failed to fetch or decode.
    LoadFailed,
    /// Video started playing.
    Playing,
    /// Video reached its natural end.
    Ended,
    /// Video failed to fetch or decode.
    MediaFailed(MediaFailure),
    /// Autoplay was refused by the runtime.
    PlaybackRejected,
    /// The viewer clicked the playback prompt.
    PromptActivated,
}

/// Posts [`Signal`]s for one slide back to the player.
#[derive(Debug, Clone)]
pub struct SlideListener {
    generation: u64,
    tx: UnboundedSender<Command>,
}

impl SlideListener {
    pub(crate) fn new(generation: u64, tx: UnboundedSender<Command>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, signal: Signal) {
        let command = Command::Signal {
            generation: self.generation,
            signal,
        };
        if self.tx.send(command).is_err() {
            tracing::trace!("Player gone, dropping {:?}", signal);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Hint,
}

/// A short text card shown over or instead of slide content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn hint(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Hint,
            text: text.into(),
        }
    }
}

/// Autoplaying, inline, non-looping video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoContent {
    pub src: String,
    /// Container hint for the source element.
    pub mime: Option<&'static str>,
    pub muted: bool,
}

/// What a slide mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Image { src: String },
    Video(VideoContent),
    /// Embedded document (YouTube, web page, calendar).
    Frame { src: String },
    /// Raw markup injected verbatim.
    Markup { html: String },
    Notice(Notice),
}

/// Operations the player needs from a display.
pub trait Surface {
    fn set_title(&mut self, title: &str);

    /// Start fetching the preloader asset without blocking. Images are simply
    /// requested; videos are built muted, looped and inline with one source
    /// and only their metadata is loaded.
    fn preload(&mut self, asset: &PreloaderAsset);

    /// Mount a freshly built instance of the preloader above all content.
    /// Video instances are restarted muted and autoplaying; a failed restart
    /// leaves a static frame.
    fn mount_overlay(&mut self, asset: &PreloaderAsset);

    fn unmount_overlay(&mut self);

    /// Remove all mounted content, notices and prompts. Leaves the overlay.
    fn clear(&mut self);

    fn mount(&mut self, content: &Content, listener: SlideListener);

    fn append_notice(&mut self, notice: &Notice);

    /// Show a clickable prompt; activation is reported as
    /// [`Signal::PromptActivated`].
    fn show_prompt(&mut self, notice: &Notice, listener: SlideListener);

    fn remove_prompt(&mut self);

    /// Retry playback of the mounted video, unmuting it first if asked.
    fn resume_playback(&mut self, unmute: bool);
}
