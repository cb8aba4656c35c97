//! Playback loop.
//!
//! Owns the current index, the single advance timer and the command channel.
//! Every timer, hide timer and content signal carries the generation of the
//! slide that produced it; anything from an earlier slide is dropped.

use crate::fetch::Prober;
use crate::overlay::Overlay;
use crate::playlist::Playlist;
use crate::preloader::PreloaderCache;
use crate::render::{self, ActiveSlide, Effect, OverlayHide};
use crate::settings::Settings;
use crate::slide::Slide;
use crate::surface::{Notice, Signal, SlideListener, Surface};
use crate::timer::{spawn_after, TimerSlot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub const NO_SLIDES: &str = "No slides in playlist";

/// Messages consumed by the playback loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Advance { generation: u64 },
    HideOverlay { generation: u64 },
    Signal { generation: u64, signal: Signal },
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing shown yet.
    Idle,
    Showing(usize),
    /// The playlist is empty. Terminal.
    Empty,
}

/// Control handle for a running [`Player`].
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PlaybackState>,
}

impl PlayerHandle {
    /// Ask the loop to stop. Pending timers are cancelled and content cleared.
    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }

    /// Latest state published by the loop.
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }
}

pub struct Player<S> {
    slides: Vec<Slide>,
    settings: Settings,
    surface: S,
    prober: Arc<dyn Prober>,
    overlay: Overlay,
    state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
    generation: u64,
    advance_timer: TimerSlot,
    /// Overlay-hide timers of the current slide.
    slide_timers: Vec<JoinHandle<()>>,
    active: Option<ActiveSlide>,
    tx: mpsc::UnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl<S: Surface + Send + 'static> Player<S> {
    pub fn new(playlist: Playlist, surface: S, prober: Arc<dyn Prober>) -> (Self, PlayerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PlaybackState::Idle);
        let handle = PlayerHandle {
            tx: tx.clone(),
            state: state_rx,
        };
        let player = Self {
            slides: playlist.slides,
            settings: playlist.meta,
            surface,
            prober,
            overlay: Overlay::default(),
            state: PlaybackState::Idle,
            state_tx,
            generation: 0,
            advance_timer: TimerSlot::new(),
            slide_timers: Vec::new(),
            active: None,
            tx,
            rx,
        };
        (player, handle)
    }

    /// Preload, show the first slide, then process commands until stopped.
    pub async fn run(mut self) {
        self.surface.set_title(&self.settings.title);
        let cache = PreloaderCache::preload(self.settings.preloader.as_ref(), &mut self.surface);
        self.overlay = Overlay::new(&cache);

        tracing::info!("Starting slideshow with {} slides", self.slides.len());
        self.advance();

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Stop => break,
                Command::Advance { generation } => {
                    if self.is_current(generation) {
                        self.advance();
                    } else {
                        tracing::debug!(generation, "Dropping stale advance");
                    }
                }
                Command::HideOverlay { generation } => {
                    if self.is_current(generation) {
                        self.overlay.hide(&mut self.surface);
                    } else {
                        tracing::debug!(generation, "Dropping stale overlay hide");
                    }
                }
                Command::Signal { generation, signal } => self.on_signal(generation, signal),
            }
        }

        tracing::info!("Slideshow stopped");
        self.clear_content();
        self.overlay.hide(&mut self.surface);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    /// Move to the next slide, wrapping at the end.
    fn advance(&mut self) {
        let len = self.slides.len();
        let index = match self.state {
            PlaybackState::Empty => return,
            _ if len == 0 => {
                tracing::info!("No slides to display");
                self.set_state(PlaybackState::Empty);
                self.surface.append_notice(&Notice::error(NO_SLIDES));
                return;
            }
            PlaybackState::Idle => 0,
            PlaybackState::Showing(index) => (index + 1) % len,
        };

        tracing::info!("Moving to slide {} of {}", index, len);
        self.set_state(PlaybackState::Showing(index));
        self.render(index);
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    fn render(&mut self, index: usize) {
        let slide = self.slides[index].clone();
        let plan = render::plan(&slide, &self.settings);

        // Cover the outgoing frame before it is torn down.
        if plan.is_masked() {
            self.overlay.show(&mut self.surface);
        } else {
            self.overlay.hide(&mut self.surface);
        }

        self.clear_content();
        self.generation += 1;
        let generation = self.generation;
        tracing::info!(
            generation,
            index,
            kind = %slide.kind,
            name = %slide.name,
            "Rendering slide"
        );

        self.surface
            .mount(&plan.content, SlideListener::new(generation, self.tx.clone()));
        self.active = Some(ActiveSlide::new(generation, slide, &plan, &self.settings));
        self.schedule_advance(plan.advance.timer());

        if let OverlayHide::OnLoad { fallback, .. } = plan.overlay_hide {
            self.schedule_overlay_hide(fallback);
        }
    }

    /// Replace the pending advance with one firing after `delay`.
    fn schedule_advance(&mut self, delay: Duration) {
        let generation = self.generation;
        tracing::debug!(generation, "Next advance in {:?}", delay);
        self.advance_timer
            .arm(delay, self.tx.clone(), Command::Advance { generation });
    }

    fn schedule_overlay_hide(&mut self, delay: Duration) {
        let generation = self.generation;
        self.slide_timers.push(spawn_after(
            delay,
            self.tx.clone(),
            Command::HideOverlay { generation },
        ));
    }

    /// Cancel the current slide's timers and remove its content.
    fn clear_content(&mut self) {
        self.advance_timer.cancel();
        for timer in self.slide_timers.drain(..) {
            timer.abort();
        }
        self.active = None;
        self.surface.clear();
    }

    fn on_signal(&mut self, generation: u64, signal: Signal) {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.generation == generation)
        else {
            tracing::debug!(generation, "Dropping stale {:?}", signal);
            return;
        };

        for effect in active.react(signal) {
            if effect == Effect::AdvanceNow {
                self.advance();
                return;
            }
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::HideOverlay => self.overlay.hide(&mut self.surface),
            Effect::AdvanceNow => self.advance(),
            Effect::ScheduleAdvance(delay) => self.schedule_advance(delay),
            Effect::ScheduleOverlayHide(delay) => self.schedule_overlay_hide(delay),
            Effect::AppendNotice(notice) => self.surface.append_notice(&notice),
            Effect::Probe(src) => self.prober.probe(&src),
            Effect::ShowPrompt(notice) => {
                let listener = SlideListener::new(self.generation, self.tx.clone());
                self.surface.show_prompt(&notice, listener);
            }
            Effect::RemovePrompt => self.surface.remove_prompt(),
            Effect::ResumePlayback { unmute } => self.surface.resume_playback(unmute),
        }
    }
}
