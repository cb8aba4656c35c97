//! Slide descriptors as delivered by the playlist.
//!
//! Slides are immutable once loaded. Deserialization is lenient: unknown
//! types become [`SlideKind::Unknown`] and unusable durations fall back to
//! [`DEFAULT_DURATION_SECS`].

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Display time used when a slide carries no usable duration.
pub const DEFAULT_DURATION_SECS: u64 = 10;

/// The closed set of slide types, plus a fallback for anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideKind {
    Image,
    Video,
    VideoUrl,
    Youtube,
    Webpage,
    Calendar,
    Qweb,
    Unknown(String),
}

impl SlideKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "image" => SlideKind::Image,
            "video" => SlideKind::Video,
            "video_url" => SlideKind::VideoUrl,
            "youtube" => SlideKind::Youtube,
            "webpage" => SlideKind::Webpage,
            "calendar" => SlideKind::Calendar,
            "qweb" => SlideKind::Qweb,
            other => SlideKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SlideKind::Image => "image",
            SlideKind::Video => "video",
            SlideKind::VideoUrl => "video_url",
            SlideKind::Youtube => "youtube",
            SlideKind::Webpage => "webpage",
            SlideKind::Calendar => "calendar",
            SlideKind::Qweb => "qweb",
            SlideKind::Unknown(other) => other,
        }
    }

    /// Whether loading this kind of slide is hidden behind the preloader overlay.
    pub fn is_masked(&self) -> bool {
        matches!(
            self,
            SlideKind::Video
                | SlideKind::VideoUrl
                | SlideKind::Youtube
                | SlideKind::Webpage
                | SlideKind::Calendar
        )
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One playlist entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSlide")]
pub struct Slide {
    pub kind: SlideKind,
    pub src: Option<String>,
    pub name: String,
    pub duration: Duration,
    pub html: Option<String>,
}

impl Slide {
    pub fn new(kind: SlideKind, src: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            kind,
            src: Some(src.into()),
            name: String::new(),
            duration: Duration::from_secs(duration_secs.max(1)),
            html: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Resource locator, empty when the descriptor carried none.
    pub fn src(&self) -> &str {
        self.src.as_deref().unwrap_or("")
    }
}

/// Wire shape of a slide before normalisation.
#[derive(Debug, Deserialize)]
struct RawSlide {
    #[serde(rename = "type", default)]
    kind: String,
    src: Option<String>,
    #[serde(default)]
    name: Option<String>,
    duration: Option<Value>,
    html: Option<String>,
}

impl From<RawSlide> for Slide {
    fn from(raw: RawSlide) -> Self {
        Self {
            kind: SlideKind::parse(&raw.kind),
            src: raw.src,
            name: raw.name.unwrap_or_default(),
            duration: coerce_duration(raw.duration.as_ref()),
            html: raw.html,
        }
    }
}

/// Best-effort duration parsing: integer part of a number or of a numeric
/// string prefix. Anything non-positive or unparsable is the default.
pub fn coerce_duration(value: Option<&Value>) -> Duration {
    let secs = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => leading_integer(s),
        _ => None,
    };

    match secs {
        Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
        _ => Duration::from_secs(DEFAULT_DURATION_SECS),
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// MIME hint for a video source, guessed from the slide's file name.
pub fn video_mime(name: &str) -> Option<&'static str> {
    let lname = name.to_lowercase();
    if lname.ends_with(".mp4") || lname.ends_with(".m4v") {
        Some("video/mp4")
    } else if lname.ends_with(".mov") {
        Some("video/quicktime")
    } else if lname.ends_with(".webm") {
        Some("video/webm")
    } else {
        None
    }
}

/// Force `autoplay=1` and a `mute` flag matching the unmute setting onto a
/// YouTube embed URL. Other locators are returned unchanged.
pub fn youtube_autoplay_src(src: &str, auto_unmute: bool) -> String {
    if !src.contains("youtube.com/embed/") {
        return src.to_string();
    }

    let mut url = match Url::parse(src) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Unparsable YouTube locator {}: {}", src, e);
            return src.to_string();
        }
    };

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    set_query_param(&mut pairs, "autoplay", "1");
    set_query_param(&mut pairs, "mute", if auto_unmute { "0" } else { "1" });
    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    url.to_string()
}

/// Replace the first occurrence of `key` in place, drop later duplicates,
/// append when absent.
fn set_query_param(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    let mut seen = false;
    pairs.retain_mut(|(k, v)| {
        if k != key {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        *v = value.to_string();
        true
    });
    if !seen {
        pairs.push((key.to_string(), value.to_string()));
    }
}
