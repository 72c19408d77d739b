//! Voice-call playback.

pub mod command;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Track;

pub use command::CommandPlayer;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("No player command configured")]
    NotConfigured,

    #[error("Track has no local media file")]
    NoMedia,

    #[error("Failed to start streamer: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{0}")]
    Stream(String),
}

/// How a playback failure is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackFailure {
    /// The upstream site flagged the request as automated.
    BotDetected,
    Other,
}

impl PlaybackFailure {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("bot") || lower.contains("sign in") {
            PlaybackFailure::BotDetected
        } else {
            PlaybackFailure::Other
        }
    }
}

/// Streaming collaborator.
#[async_trait]
pub trait Player: Send + Sync {
    /// Start streaming `track` into the voice chat of `destination`.
    async fn play_media(
        &self,
        destination: i64,
        track: &Track,
        video: bool,
    ) -> Result<(), PlaybackError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bot_detection() {
        assert_eq!(
            PlaybackFailure::classify("ERROR: Sign in to confirm you're not a bot"),
            PlaybackFailure::BotDetected
        );
        assert_eq!(
            PlaybackFailure::classify("please SIGN IN first"),
            PlaybackFailure::BotDetected
        );
        assert_eq!(
            PlaybackFailure::classify("ffmpeg exited with code 1"),
            PlaybackFailure::Other
        );
    }
}
