//! Kiosk signage player.
//!
//! Plays a playlist of image, video, embedded-page and markup slides in a
//! loop, covering slow transitions with a preloader overlay.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod kiosk;
pub mod overlay;
pub mod player;
pub mod playlist;
pub mod preloader;
pub mod render;
pub mod settings;
pub mod slide;
pub mod surface;
pub mod timer;

#[cfg(test)]
mod testing;
