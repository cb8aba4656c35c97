//! Slide-local failure taxonomy.
//!
//! None of these ever leave the renderer: each one is turned into an inline
//! notice (its `Display` text) and a scheduled advance, so a single bad slide
//! never halts the show.

use std::error::Error as StdError;
use std::fmt;

/// Classification of a media element failure, named after the media error
/// codes reported by playback engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFailure {
    Aborted,
    Network,
    Decode,
    SourceNotSupported,
}

impl fmt::Display for MediaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFailure::Aborted => write!(f, "MEDIA_ERR_ABORTED - Video loading aborted"),
            MediaFailure::Network => write!(f, "MEDIA_ERR_NETWORK - Network error loading video"),
            MediaFailure::Decode => write!(f, "MEDIA_ERR_DECODE - Video decode error"),
            MediaFailure::SourceNotSupported => write!(
                f,
                "MEDIA_ERR_SRC_NOT_SUPPORTED - Video format not supported or file not found"
            ),
        }
    }
}

/// Errors raised while showing a single slide.
///
/// The `Display` output is the exact text of the inline error notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideError {
    /// An image failed to fetch or decode.
    ImageLoad { name: String, src: String },
    /// A video failed to fetch or decode.
    MediaPlayback { failure: MediaFailure, src: String },
    /// The slide type is not one the renderer knows.
    UnsupportedSlideType(String),
    /// Autoplay was refused by the runtime; recoverable with a user gesture.
    PlaybackRejected,
}

impl fmt::Display for SlideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlideError::ImageLoad { name, src } => {
                write!(f, "Image Error: Failed to load {}. URL: {}", name, src)
            }
            SlideError::MediaPlayback { failure, src } => {
                write!(f, "Video Error: {}. URL: {}", failure, src)
            }
            SlideError::UnsupportedSlideType(kind) => write!(f, "Unsupported slide type: {}", kind),
            SlideError::PlaybackRejected => write!(f, "Playback rejected by autoplay policy"),
        }
    }
}

impl StdError for SlideError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_failures_use_engine_error_names() {
        assert_eq!(
            MediaFailure::Aborted.to_string(),
            "MEDIA_ERR_ABORTED - Video loading aborted"
        );
        assert_eq!(
            MediaFailure::Network.to_string(),
            "MEDIA_ERR_NETWORK - Network error loading video"
        );
        assert!(MediaFailure::SourceNotSupported
            .to_string()
            .starts_with("MEDIA_ERR_SRC_NOT_SUPPORTED"));
    }

    #[test]
    fn notice_text_carries_name_and_locator() {
        let err = SlideError::ImageLoad {
            name: "Lobby".into(),
            src: "/ds/a/4/content".into(),
        };
        assert_eq!(
            err.to_string(),
            "Image Error: Failed to load Lobby. URL: /ds/a/4/content"
        );

        let err = SlideError::MediaPlayback {
            failure: MediaFailure::Decode,
            src: "http://cdn/x.mp4".into(),
        };
        assert_eq!(
            err.to_string(),
            "Video Error: MEDIA_ERR_DECODE - Video decode error. URL: http://cdn/x.mp4"
        );
    }

    #[test]
    fn unsupported_type_names_the_type() {
        let err = SlideError::UnsupportedSlideType("foo".into());
        assert_eq!(err.to_string(), "Unsupported slide type: foo");
    }
}
