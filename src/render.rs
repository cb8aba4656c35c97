//! Slide renderer.
//!
//! [`plan`] turns a slide into what to mount, when to advance and when to
//! drop the preloader overlay. [`ActiveSlide::react`] turns the signals the
//! mounted content reports into [`Effect`]s for the playback loop. Neither
//! touches the surface or the clock, so the loop stays free of per-type
//! branching.

use crate::error::SlideError;
use crate::settings::Settings;
use crate::slide::{video_mime, youtube_autoplay_src, Slide, SlideKind};
use crate::surface::{Content, Notice, Signal, VideoContent};
use std::time::Duration;

/// Extra time granted past a video's duration before forcing an advance.
pub const VIDEO_FALLBACK_GRACE: Duration = Duration::from_millis(2000);
/// How long a video error stays on screen.
pub const MEDIA_ERROR_DWELL: Duration = Duration::from_millis(5000);
/// How long the unsupported-type card stays on screen.
pub const UNSUPPORTED_DWELL: Duration = Duration::from_millis(3000);
/// Settle time after a YouTube frame loads, before the overlay goes.
pub const YOUTUBE_SETTLE: Duration = Duration::from_millis(2000);
/// Settle time after any other frame loads.
pub const FRAME_SETTLE: Duration = Duration::from_millis(500);
/// The overlay over a frame is dropped after this even if `load` never fires.
pub const OVERLAY_FALLBACK: Duration = Duration::from_millis(8000);

pub const PLAYBACK_PROMPT: &str = "Click to start video playback";

/// When the playback loop moves past a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceCondition {
    After(Duration),
    /// On the media `Ended` signal, or after the fallback delay.
    EndedOr(Duration),
}

impl AdvanceCondition {
    /// Delay for the advance timer armed at mount time.
    pub fn timer(&self) -> Duration {
        match self {
            AdvanceCondition::After(delay) | AdvanceCondition::EndedOr(delay) => *delay,
        }
    }
}

/// When the preloader overlay goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayHide {
    /// The slide is not masked at all.
    NotMasked,
    /// On the first `Playing` signal.
    OnPlaying,
    /// `settle` after `Loaded`, and in any case after `fallback`.
    OnLoad { settle: Duration, fallback: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub content: Content,
    pub advance: AdvanceCondition,
    pub overlay_hide: OverlayHide,
}

impl RenderPlan {
    pub fn is_masked(&self) -> bool {
        self.overlay_hide != OverlayHide::NotMasked
    }
}

/// Decide how `slide` is shown.
pub fn plan(slide: &Slide, settings: &Settings) -> RenderPlan {
    let duration = slide.duration.max(Duration::from_secs(1));

    match &slide.kind {
        SlideKind::Image => RenderPlan {
            content: Content::Image {
                src: slide.src().to_string(),
            },
            advance: AdvanceCondition::After(duration),
            overlay_hide: OverlayHide::NotMasked,
        },
        SlideKind::Video | SlideKind::VideoUrl => RenderPlan {
            content: Content::Video(VideoContent {
                src: slide.src().to_string(),
                mime: video_mime(&slide.name),
                muted: !settings.auto_unmute,
            }),
            advance: AdvanceCondition::EndedOr(duration + VIDEO_FALLBACK_GRACE),
            overlay_hide: OverlayHide::OnPlaying,
        },
        SlideKind::Youtube | SlideKind::Webpage | SlideKind::Calendar => {
            let (src, settle) = if slide.kind == SlideKind::Youtube {
                (
                    youtube_autoplay_src(slide.src(), settings.auto_unmute),
                    YOUTUBE_SETTLE,
                )
            } else {
                (slide.src().to_string(), FRAME_SETTLE)
            };
            RenderPlan {
                content: Content::Frame { src },
                advance: AdvanceCondition::After(duration),
                overlay_hide: OverlayHide::OnLoad {
                    settle,
                    fallback: OVERLAY_FALLBACK,
                },
            }
        }
        SlideKind::Qweb => RenderPlan {
            content: Content::Markup {
                html: slide.html.clone().unwrap_or_default(),
            },
            advance: AdvanceCondition::After(duration),
            overlay_hide: OverlayHide::NotMasked,
        },
        SlideKind::Unknown(kind) => RenderPlan {
            content: Content::Notice(Notice::error(
                SlideError::UnsupportedSlideType(kind.clone()).to_string(),
            )),
            advance: AdvanceCondition::After(UNSUPPORTED_DWELL),
            overlay_hide: OverlayHide::NotMasked,
        },
    }
}

/// Something the playback loop must do in response to a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    HideOverlay,
    AdvanceNow,
    /// Replace the pending advance timer.
    ScheduleAdvance(Duration),
    ScheduleOverlayHide(Duration),
    AppendNotice(Notice),
    /// Best-effort diagnostic fetch of a locator.
    Probe(String),
    ShowPrompt(Notice),
    RemovePrompt,
    ResumePlayback { unmute: bool },
}

/// Per-slide reaction state for the slide currently on screen.
#[derive(Debug, Clone)]
pub struct ActiveSlide {
    pub generation: u64,
    slide: Slide,
    overlay_hide: OverlayHide,
    auto_unmute: bool,
    playing: bool,
    prompt_visible: bool,
    failed: bool,
}

impl ActiveSlide {
    pub fn new(generation: u64, slide: Slide, plan: &RenderPlan, settings: &Settings) -> Self {
        Self {
            generation,
            slide,
            overlay_hide: plan.overlay_hide,
            auto_unmute: settings.auto_unmute,
            playing: false,
            prompt_visible: false,
            failed: false,
        }
    }

    pub fn react(&mut self, signal: Signal) -> Vec<Effect> {
        match &self.slide.kind {
            SlideKind::Image => self.react_image(signal),
            SlideKind::Video | SlideKind::VideoUrl => self.react_video(signal),
            SlideKind::Youtube | SlideKind::Webpage | SlideKind::Calendar => self.react_frame(signal),
            _ => {
                tracing::trace!("Ignoring {:?} for {} slide", signal, self.slide.kind);
                Vec::new()
            }
        }
    }

    fn react_image(&mut self, signal: Signal) -> Vec<Effect> {
        match signal {
            Signal::Loaded => {
                tracing::debug!("Image loaded successfully: {}", self.slide.src());
                Vec::new()
            }
            Signal::LoadFailed => {
                let err = SlideError::ImageLoad {
                    name: self.slide.name.clone(),
                    src: self.slide.src().to_string(),
                };
                tracing::error!("{}", err);
                // The advance timer armed at mount time stays as it is.
                vec![
                    Effect::AppendNotice(Notice::error(err.to_string())),
                    Effect::Probe(self.slide.src().to_string()),
                ]
            }
            other => {
                tracing::trace!("Ignoring {:?} for image slide", other);
                Vec::new()
            }
        }
    }

    fn react_video(&mut self, signal: Signal) -> Vec<Effect> {
        if self.failed {
            tracing::debug!("Video already failed, ignoring {:?}", signal);
            return Vec::new();
        }

        match signal {
            Signal::Playing => {
                let mut effects = Vec::new();
                if !self.playing {
                    tracing::info!("Video is now playing: {}", self.slide.src());
                    self.playing = true;
                    if self.overlay_hide == OverlayHide::OnPlaying {
                        effects.push(Effect::HideOverlay);
                    }
                }
                if self.prompt_visible {
                    self.prompt_visible = false;
                    effects.push(Effect::RemovePrompt);
                }
                effects
            }
            Signal::Ended => {
                tracing::debug!("Video ended: {}", self.slide.src());
                vec![Effect::AdvanceNow]
            }
            Signal::MediaFailed(failure) => {
                self.failed = true;
                let err = SlideError::MediaPlayback {
                    failure,
                    src: self.slide.src().to_string(),
                };
                tracing::error!("{}", err);
                let mut effects = vec![Effect::HideOverlay];
                if self.prompt_visible {
                    self.prompt_visible = false;
                    effects.push(Effect::RemovePrompt);
                }
                effects.extend([
                    Effect::AppendNotice(Notice::error(err.to_string())),
                    Effect::Probe(self.slide.src().to_string()),
                    Effect::ScheduleAdvance(MEDIA_ERROR_DWELL),
                ]);
                effects
            }
            Signal::PlaybackRejected => {
                tracing::warn!("{}: {}", SlideError::PlaybackRejected, self.slide.src());
                if self.prompt_visible {
                    return Vec::new();
                }
                self.prompt_visible = true;
                vec![Effect::ShowPrompt(Notice::hint(PLAYBACK_PROMPT))]
            }
            Signal::PromptActivated => {
                if !self.prompt_visible {
                    return Vec::new();
                }
                vec![Effect::ResumePlayback {
                    unmute: !self.auto_unmute,
                }]
            }
            Signal::Loaded | Signal::LoadFailed => Vec::new(),
        }
    }

    fn react_frame(&mut self, signal: Signal) -> Vec<Effect> {
        match (signal, self.overlay_hide) {
            (Signal::Loaded, OverlayHide::OnLoad { settle, .. }) => {
                tracing::debug!("Frame loaded: {}", self.slide.src());
                vec![Effect::ScheduleOverlayHide(settle)]
            }
            (other, _) => {
                tracing::trace!("Ignoring {:?} for frame slide", other);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaFailure;

    fn active(slide: Slide, settings: &Settings) -> ActiveSlide {
        let plan = plan(&slide, settings);
        ActiveSlide::new(1, slide, &plan, settings)
    }

    #[test]
    fn masking_follows_slide_kind() {
        let settings = Settings::default();
        for kind in ["image", "video", "video_url", "youtube", "webpage", "calendar", "qweb", "foo"] {
            let kind = SlideKind::parse(kind);
            let slide = Slide::new(kind.clone(), "http://x/", 5);
            assert_eq!(plan(&slide, &settings).is_masked(), kind.is_masked(), "{}", kind);
        }
    }

    #[test]
    fn image_plan_uses_duration() {
        let slide = Slide::new(SlideKind::Image, "/a.png", 7);
        let plan = plan(&slide, &Settings::default());
        assert_eq!(plan.content, Content::Image { src: "/a.png".into() });
        assert_eq!(plan.advance, AdvanceCondition::After(Duration::from_secs(7)));
        assert_eq!(plan.overlay_hide, OverlayHide::NotMasked);
    }

    #[test]
    fn video_plan_has_fallback_and_mime() {
        let slide = Slide::new(SlideKind::Video, "/ds/a/9/content", 3).with_name("intro.mov");
        let muted = plan(&slide, &Settings::default());
        assert_eq!(
            muted.content,
            Content::Video(VideoContent {
                src: "/ds/a/9/content".into(),
                mime: Some("video/quicktime"),
                muted: true,
            })
        );
        assert_eq!(muted.advance, AdvanceCondition::EndedOr(Duration::from_secs(5)));
        assert_eq!(muted.overlay_hide, OverlayHide::OnPlaying);

        let settings = Settings {
            auto_unmute: true,
            ..Settings::default()
        };
        let loud = plan(&slide, &settings);
        assert!(matches!(loud.content, Content::Video(VideoContent { muted: false, .. })));
    }

    #[test]
    fn frame_plans_settle_differently() {
        let settings = Settings::default();
        let yt = Slide::new(SlideKind::Youtube, "https://www.youtube.com/embed/abc", 20);
        let plan_yt = plan(&yt, &settings);
        assert_eq!(
            plan_yt.content,
            Content::Frame {
                src: "https://www.youtube.com/embed/abc?autoplay=1&mute=1".into()
            }
        );
        assert_eq!(
            plan_yt.overlay_hide,
            OverlayHide::OnLoad {
                settle: YOUTUBE_SETTLE,
                fallback: OVERLAY_FALLBACK
            }
        );

        let cal = Slide::new(SlideKind::Calendar, "https://cal.example/embed", 20);
        let plan_cal = plan(&cal, &settings);
        assert_eq!(plan_cal.content, Content::Frame { src: "https://cal.example/embed".into() });
        assert_eq!(
            plan_cal.overlay_hide,
            OverlayHide::OnLoad {
                settle: FRAME_SETTLE,
                fallback: OVERLAY_FALLBACK
            }
        );
    }

    #[test]
    fn qweb_and_unknown_plans() {
        let settings = Settings::default();
        let mut qweb = Slide::new(SlideKind::Qweb, "", 4);
        qweb.html = Some("<h1>Menu</h1>".into());
        assert_eq!(
            plan(&qweb, &settings).content,
            Content::Markup { html: "<h1>Menu</h1>".into() }
        );

        let unknown = Slide::new(SlideKind::Unknown("foo".into()), "x", 60);
        let plan = plan(&unknown, &settings);
        assert_eq!(
            plan.content,
            Content::Notice(Notice::error("Unsupported slide type: foo"))
        );
        assert_eq!(plan.advance, AdvanceCondition::After(UNSUPPORTED_DWELL));
    }

    #[test]
    fn image_failure_reports_and_probes_without_touching_the_timer() {
        let slide = Slide::new(SlideKind::Image, "http://x/missing.png", 4).with_name("Lobby");
        let mut active = active(slide, &Settings::default());
        assert!(active.react(Signal::Loaded).is_empty());
        assert_eq!(
            active.react(Signal::LoadFailed),
            vec![
                Effect::AppendNotice(Notice::error(
                    "Image Error: Failed to load Lobby. URL: http://x/missing.png"
                )),
                Effect::Probe("http://x/missing.png".into()),
            ]
        );
    }

    #[test]
    fn video_playing_hides_overlay_once() {
        let slide = Slide::new(SlideKind::VideoUrl, "http://cdn/a.mp4", 10);
        let mut active = active(slide, &Settings::default());
        assert_eq!(active.react(Signal::Playing), vec![Effect::HideOverlay]);
        assert!(active.react(Signal::Playing).is_empty());
        assert_eq!(active.react(Signal::Ended), vec![Effect::AdvanceNow]);
    }

    #[test]
    fn video_failure_holds_error_and_ignores_later_signals() {
        let slide = Slide::new(SlideKind::Video, "http://cdn/a.mp4", 10);
        let mut active = active(slide, &Settings::default());
        assert_eq!(
            active.react(Signal::MediaFailed(MediaFailure::Decode)),
            vec![
                Effect::HideOverlay,
                Effect::AppendNotice(Notice::error(
                    "Video Error: MEDIA_ERR_DECODE - Video decode error. URL: http://cdn/a.mp4"
                )),
                Effect::Probe("http://cdn/a.mp4".into()),
                Effect::ScheduleAdvance(MEDIA_ERROR_DWELL),
            ]
        );
        assert!(active.react(Signal::Ended).is_empty());
        assert!(active.react(Signal::MediaFailed(MediaFailure::Network)).is_empty());
    }

    #[test]
    fn rejected_autoplay_prompts_then_retries() {
        let slide = Slide::new(SlideKind::Video, "http://cdn/a.mp4", 10);
        let mut active = active(slide.clone(), &Settings::default());

        assert!(active.react(Signal::PromptActivated).is_empty());
        assert_eq!(
            active.react(Signal::PlaybackRejected),
            vec![Effect::ShowPrompt(Notice::hint(PLAYBACK_PROMPT))]
        );
        assert!(active.react(Signal::PlaybackRejected).is_empty());
        assert_eq!(
            active.react(Signal::PromptActivated),
            vec![Effect::ResumePlayback { unmute: true }]
        );
        assert_eq!(
            active.react(Signal::Playing),
            vec![Effect::HideOverlay, Effect::RemovePrompt]
        );

        let settings = Settings {
            auto_unmute: true,
            ..Settings::default()
        };
        let mut loud = ActiveSlide::new(2, slide.clone(), &plan(&slide, &settings), &settings);
        loud.react(Signal::PlaybackRejected);
        assert_eq!(
            loud.react(Signal::PromptActivated),
            vec![Effect::ResumePlayback { unmute: false }]
        );
    }

    #[test]
    fn frame_load_schedules_settled_hide() {
        let slide = Slide::new(SlideKind::Webpage, "https://example.com", 30);
        let mut active = active(slide, &Settings::default());
        assert_eq!(
            active.react(Signal::Loaded),
            vec![Effect::ScheduleOverlayHide(FRAME_SETTLE)]
        );
        assert!(active.react(Signal::Ended).is_empty());
    }
}
