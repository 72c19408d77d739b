//! Media search and download.

pub mod ytdlp;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Track;

pub use ytdlp::YtDlp;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("yt-dlp is not installed or not executable: {0}")]
    NotInstalled(String),

    #[error("yt-dlp failed: {0}")]
    Process(String),

    #[error("Unexpected yt-dlp output: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;

/// Search/download collaborator.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Resolve a search query or URL to a single track.
    /// `status_id` is the status message that will track this request.
    async fn search(&self, query: &str, status_id: i32, video: bool) -> Result<Option<Track>>;

    /// Resolve at most `limit` tracks of a playlist URL, each owned by `requester`.
    async fn playlist(
        &self,
        limit: usize,
        requester: &str,
        url: &str,
        video: bool,
    ) -> Result<Vec<Track>>;

    /// Fetch a track to local storage and return its path.
    async fn download(&self, id: &str, video: bool, is_live: bool) -> Result<Option<PathBuf>>;
}
