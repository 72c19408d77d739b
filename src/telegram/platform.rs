//! The narrow slice of the messaging platform the handlers talk to.
//!
//! Production code uses [`super::adapter::TelegramPlatform`]; tests substitute
//! an in-memory implementation.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::ChannelRef;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Flood control: retry after {0:?}")]
    RetryAfter(Duration),

    #[error("Message no longer exists or cannot be edited")]
    MessageGone,

    #[error("Chat not found")]
    ChatNotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Telegram API error: {0}")]
    Api(String),
}

impl PlatformError {
    /// Short name of the failure, shown to users in rejection messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformError::RetryAfter(_) => "RetryAfter",
            PlatformError::MessageGone => "MessageGone",
            PlatformError::ChatNotFound => "ChatNotFound",
            PlatformError::Forbidden(_) => "Forbidden",
            PlatformError::Network(_) => "Network",
            PlatformError::Api(_) => "ApiError",
        }
    }
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// A message the bot sent and may edit later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// What the handlers need to know about a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInfo {
    pub id: i64,
    pub title: String,
    pub kind: ChatKind,
    /// Discussion group of a channel, or channel linked to a supergroup.
    pub linked_chat_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatUser {
    pub id: u64,
    pub username: Option<String>,
}

/// A playable file attached to a Telegram message.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramMedia {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_name: Option<String>,
    pub title: String,
    pub duration_sec: u64,
    pub video: bool,
    pub size: u32,
}

/// Messaging platform collaborator.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send an HTML message.
    async fn send_text(&self, chat_id: i64, text: &str) -> PlatformResult<SentMessage>;

    /// Replace the text of a message the bot sent.
    async fn edit_text(&self, message: &SentMessage, text: &str) -> PlatformResult<()>;

    async fn get_chat(&self, chat: &ChannelRef) -> PlatformResult<ChatInfo>;

    /// Owner among the chat's administrators, if visible to the bot.
    async fn chat_owner(&self, chat_id: i64) -> PlatformResult<Option<ChatUser>>;

    /// Whether `user_id` is an administrator or the owner of `chat_id`.
    async fn is_admin(&self, chat_id: i64, user_id: u64) -> PlatformResult<bool>;

    /// Fetch an attached file to local storage.
    async fn download_media(&self, media: &TelegramMedia) -> PlatformResult<PathBuf>;
}
