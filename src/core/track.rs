//! Playable items.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A resolved playable unit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Track {
    /// Source identifier (video id for search results, file unique id for Telegram files).
    pub id: String,

    pub title: String,

    /// Human readable duration, e.g. "3:45" or "Live".
    pub duration: String,

    pub duration_sec: u64,

    pub url: String,

    pub is_live: bool,

    /// Whether the item carries its own video stream (Telegram video files).
    pub video: bool,

    /// Local media file, populated on first playback.
    pub file_path: Option<PathBuf>,

    /// Mention of the user who requested the track.
    pub user: Option<String>,

    /// Status message driving this request.
    pub message_id: Option<i32>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration_sec: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration: format_duration(duration_sec),
            duration_sec,
            url: String::new(),
            is_live: false,
            video: false,
            file_path: None,
            user: None,
            message_id: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn live(mut self) -> Self {
        self.is_live = true;
        self.duration = "Live".to_string();
        self
    }

    /// True when the track must be rejected under the given ceiling.
    /// Live streams are unbounded.
    pub fn exceeds_limit(&self, limit_secs: u64) -> bool {
        !self.is_live && self.duration_sec > limit_secs
    }
}

/// Format seconds as `m:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(225), "3:45");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
    }

    #[test]
    fn test_limit_ignores_live_streams() {
        let long = Track::new("a", "Long mix", 7200);
        assert!(long.exceeds_limit(3600));
        assert!(!long.exceeds_limit(7200));

        let live = Track::new("b", "Radio", 999_999).live();
        assert!(!live.exceeds_limit(60));
        assert_eq!(live.duration, "Live");
    }
}
