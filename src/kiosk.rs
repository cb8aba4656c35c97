//! Fullscreen button and kiosk detection.
//!
//! The button is visible while the viewer is active and fades out 5 s after
//! the last pointer or touch activity. Two seconds after start, devices that
//! look like kiosks get a prominent button that stays up until the next
//! activity.

use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

pub const AUTO_HIDE_DELAY: Duration = Duration::from_millis(5000);
pub const KIOSK_CHECK_DELAY: Duration = Duration::from_millis(2000);

/// What the host knows about the display it runs on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KioskProfile {
    pub user_agent: String,
    pub inner_height: u32,
    pub screen_height: u32,
    /// Already fullscreen.
    pub fullscreen: bool,
}

impl Default for KioskProfile {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            inner_height: 1080,
            screen_height: 1080,
            fullscreen: false,
        }
    }
}

impl KioskProfile {
    /// Android or TV user agents, or a viewport noticeably shorter than the
    /// screen (an address bar is showing).
    pub fn is_kiosk_candidate(&self) -> bool {
        let android = self.user_agent.contains("Android");
        let tv = self.user_agent.contains("TV") || self.user_agent.contains("SmartTV");
        let has_address_bar = f64::from(self.inner_height) < f64::from(self.screen_height) * 0.9;
        android || tv || has_address_bar
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Pointer movement or touch anywhere on the page.
    Activity,
    Clicked,
}

/// The on-screen fullscreen button.
pub trait FullscreenButton: Send {
    fn set_visible(&mut self, visible: bool);
    fn set_auto_hidden(&mut self, hidden: bool);
    fn set_prominent(&mut self, prominent: bool);
    fn request_fullscreen(&mut self);
}

pub struct FullscreenController<B> {
    button: B,
    show: bool,
    profile: KioskProfile,
    events: mpsc::UnboundedReceiver<ButtonEvent>,
}

impl<B: FullscreenButton> FullscreenController<B> {
    pub fn new(
        button: B,
        show: bool,
        profile: KioskProfile,
        events: mpsc::UnboundedReceiver<ButtonEvent>,
    ) -> Self {
        Self {
            button,
            show,
            profile,
            events,
        }
    }

    /// Drive the button until the event channel closes.
    pub async fn run(self) {
        let Self {
            mut button,
            show,
            profile,
            mut events,
        } = self;

        if !show {
            tracing::info!("Fullscreen button hidden by configuration");
            button.set_visible(false);
            return;
        }

        button.set_visible(true);
        let mut auto_hidden = false;
        let mut hide_at = Some(Instant::now() + AUTO_HIDE_DELAY);
        let mut kiosk_check = Some(Instant::now() + KIOSK_CHECK_DELAY);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    None => break,
                    Some(ButtonEvent::Clicked) => {
                        tracing::info!("Fullscreen requested");
                        button.request_fullscreen();
                    }
                    Some(ButtonEvent::Activity) => {
                        if auto_hidden {
                            button.set_auto_hidden(false);
                            auto_hidden = false;
                        }
                        hide_at = Some(Instant::now() + AUTO_HIDE_DELAY);
                    }
                },
                _ = sleep_until_opt(hide_at) => {
                    hide_at = None;
                    button.set_auto_hidden(true);
                    auto_hidden = true;
                }
                _ = sleep_until_opt(kiosk_check) => {
                    kiosk_check = None;
                    tracing::info!(
                        user_agent = %profile.user_agent,
                        inner_height = profile.inner_height,
                        screen_height = profile.screen_height,
                        "Auto-fullscreen check"
                    );
                    if profile.is_kiosk_candidate() && !profile.fullscreen {
                        tracing::info!("Showing fullscreen prompt for kiosk device");
                        hide_at = None;
                        button.set_prominent(true);
                        if auto_hidden {
                            button.set_auto_hidden(false);
                            auto_hidden = false;
                        }
                    }
                }
            }
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Button stand-in for headless hosts: logs state changes.
#[derive(Debug, Default)]
pub struct LoggingButton;

impl FullscreenButton for LoggingButton {
    fn set_visible(&mut self, visible: bool) {
        tracing::debug!("Fullscreen button visible: {}", visible);
    }

    fn set_auto_hidden(&mut self, hidden: bool) {
        tracing::debug!("Fullscreen button auto-hidden: {}", hidden);
    }

    fn set_prominent(&mut self, prominent: bool) {
        tracing::debug!("Fullscreen button prominent: {}", prominent);
    }

    fn request_fullscreen(&mut self) {
        tracing::info!("Fullscreen not available on this host");
    }
}
