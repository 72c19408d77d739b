//! [`ChatPlatform`] backed by a teloxide [`Bot`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{Chat, ChatId, ChatMemberKind, MessageId, ParseMode, Recipient, UserId};
use teloxide::{ApiError, RequestError};

use super::platform::{
    ChatInfo, ChatKind, ChatPlatform, ChatUser, PlatformError, PlatformResult, SentMessage,
    TelegramMedia,
};
use crate::core::ChannelRef;

pub struct TelegramPlatform {
    bot: Bot,
    token: String,
    downloads_dir: PathBuf,
}

impl TelegramPlatform {
    pub fn new(bot: Bot, token: impl Into<String>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            bot,
            token: token.into(),
            downloads_dir: downloads_dir.into(),
        }
    }
}

/// Map a teloxide failure onto the handler-facing error set.
pub fn map_request_error(err: RequestError) -> PlatformError {
    match err {
        RequestError::RetryAfter(secs) => {
            PlatformError::RetryAfter(Duration::from_secs(secs.duration().as_secs().max(1)))
        }
        RequestError::Network(e) => PlatformError::Network(e.to_string()),
        RequestError::Io(e) => PlatformError::Network(e.to_string()),
        RequestError::Api(api) => map_api_error(api),
        other => PlatformError::Api(other.to_string()),
    }
}

fn map_api_error(api: ApiError) -> PlatformError {
    match api {
        ApiError::MessageToEditNotFound
        | ApiError::MessageCantBeEdited
        | ApiError::MessageIdInvalid => PlatformError::MessageGone,
        ApiError::ChatNotFound | ApiError::UserNotFound => PlatformError::ChatNotFound,
        ApiError::BotBlocked
        | ApiError::BotKicked
        | ApiError::BotKickedFromSupergroup
        | ApiError::NotEnoughRightsToPostMessages => PlatformError::Forbidden(api.to_string()),
        other => PlatformError::Api(other.to_string()),
    }
}

fn chat_info(chat: &Chat) -> ChatInfo {
    let kind = if chat.is_channel() {
        ChatKind::Channel
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Private
    };
    ChatInfo {
        id: chat.id.0,
        title: chat.title().unwrap_or_default().to_string(),
        kind,
        linked_chat_id: chat.linked_chat_id(),
    }
}

fn recipient(chat: &ChannelRef) -> Recipient {
    match chat {
        ChannelRef::Id(id) => Recipient::Id(ChatId(*id)),
        ChannelRef::Username(name) => Recipient::ChannelUsername(name.clone()),
    }
}

/// Playable file attached to `msg`, if any.
pub fn extract_media(msg: &Message) -> Option<TelegramMedia> {
    if let Some(audio) = msg.audio() {
        let title = audio
            .title
            .clone()
            .or_else(|| audio.file_name.clone())
            .unwrap_or_else(|| "Telegram audio".to_string());
        return Some(TelegramMedia {
            file_id: audio.file.id.clone(),
            file_unique_id: audio.file.unique_id.clone(),
            file_name: audio.file_name.clone(),
            title,
            duration_sec: u64::from(audio.duration.seconds()),
            video: false,
            size: audio.file.size,
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(TelegramMedia {
            file_id: voice.file.id.clone(),
            file_unique_id: voice.file.unique_id.clone(),
            file_name: None,
            title: "Voice message".to_string(),
            duration_sec: u64::from(voice.duration.seconds()),
            video: false,
            size: voice.file.size,
        });
    }
    if let Some(video) = msg.video() {
        return Some(TelegramMedia {
            file_id: video.file.id.clone(),
            file_unique_id: video.file.unique_id.clone(),
            file_name: video.file_name.clone(),
            title: video
                .file_name
                .clone()
                .unwrap_or_else(|| "Telegram video".to_string()),
            duration_sec: u64::from(video.duration.seconds()),
            video: true,
            size: video.file.size,
        });
    }
    if let Some(note) = msg.video_note() {
        return Some(TelegramMedia {
            file_id: note.file.id.clone(),
            file_unique_id: note.file.unique_id.clone(),
            file_name: None,
            title: "Video note".to_string(),
            duration_sec: u64::from(note.duration.seconds()),
            video: true,
            size: note.file.size,
        });
    }
    if let Some(doc) = msg.document() {
        let mime = doc.mime_type.as_ref().map(|m| m.type_().as_str().to_string());
        let video = match mime.as_deref() {
            Some("video") => true,
            Some("audio") => false,
            _ => return None,
        };
        return Some(TelegramMedia {
            file_id: doc.file.id.clone(),
            file_unique_id: doc.file.unique_id.clone(),
            file_name: doc.file_name.clone(),
            title: doc
                .file_name
                .clone()
                .unwrap_or_else(|| "Telegram file".to_string()),
            duration_sec: 0,
            video,
            size: doc.file.size,
        });
    }
    None
}

fn local_file_name(media: &TelegramMedia) -> String {
    let ext = media
        .file_name
        .as_deref()
        .and_then(|n| Path::new(n).extension().and_then(|e| e.to_str()))
        .unwrap_or(if media.video { "mp4" } else { "ogg" });
    format!("telegram_{}.{}", ulid::Ulid::new(), ext)
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn send_text(&self, chat_id: i64, text: &str) -> PlatformResult<SentMessage> {
        let msg = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(map_request_error)?;
        Ok(SentMessage {
            chat_id,
            message_id: msg.id.0,
        })
    }

    async fn edit_text(&self, message: &SentMessage, text: &str) -> PlatformResult<()> {
        match self
            .bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(map_request_error(e)),
        }
    }

    async fn get_chat(&self, chat: &ChannelRef) -> PlatformResult<ChatInfo> {
        let chat = self
            .bot
            .get_chat(recipient(chat))
            .await
            .map_err(map_request_error)?;
        Ok(chat_info(&chat))
    }

    async fn chat_owner(&self, chat_id: i64) -> PlatformResult<Option<ChatUser>> {
        let admins = self
            .bot
            .get_chat_administrators(ChatId(chat_id))
            .await
            .map_err(map_request_error)?;
        Ok(admins
            .into_iter()
            .find(|m| matches!(m.kind, ChatMemberKind::Owner(_)))
            .map(|m| ChatUser {
                id: m.user.id.0,
                username: m.user.username,
            }))
    }

    async fn is_admin(&self, chat_id: i64, user_id: u64) -> PlatformResult<bool> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id))
            .await
            .map_err(map_request_error)?;
        Ok(matches!(
            member.kind,
            ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_)
        ))
    }

    async fn download_media(&self, media: &TelegramMedia) -> PlatformResult<PathBuf> {
        let get_file_url = format!(
            "https://api.telegram.org/bot{}/getFile?file_id={}",
            self.token, media.file_id
        );
        let resp = reqwest::get(get_file_url)
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| PlatformError::Api(e.to_string()))?;
        let file_path = value
            .get("result")
            .and_then(|r| r.get("file_path"))
            .and_then(|p| p.as_str())
            .ok_or_else(|| PlatformError::Api("getFile returned no file_path".to_string()))?;

        let download_url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.token, file_path
        );
        let bytes = reqwest::get(download_url)
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        tokio::fs::create_dir_all(&self.downloads_dir)
            .await
            .map_err(|e| PlatformError::Api(e.to_string()))?;
        let path = self.downloads_dir.join(local_file_name(media));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PlatformError::Api(e.to_string()))?;
        tracing::debug!("Downloaded {} to {}", media.file_unique_id, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_are_classified() {
        assert_eq!(
            map_request_error(RequestError::Api(ApiError::MessageToEditNotFound)),
            PlatformError::MessageGone
        );
        assert_eq!(
            map_request_error(RequestError::Api(ApiError::ChatNotFound)),
            PlatformError::ChatNotFound
        );
        assert!(matches!(
            map_request_error(RequestError::Api(ApiError::BotKicked)),
            PlatformError::Forbidden(_)
        ));
    }

    #[test]
    fn test_channel_refs_become_recipients() {
        assert_eq!(
            recipient(&ChannelRef::Id(-1001)),
            Recipient::Id(ChatId(-1001))
        );
        assert_eq!(
            recipient(&ChannelRef::Username("@tunes".into())),
            Recipient::ChannelUsername("@tunes".into())
        );
    }

    #[test]
    fn test_local_file_name_keeps_extension() {
        let media = TelegramMedia {
            file_id: "f".into(),
            file_unique_id: "u".into(),
            file_name: Some("song.flac".into()),
            title: "song.flac".into(),
            duration_sec: 10,
            video: false,
            size: 1,
        };
        let name = local_file_name(&media);
        assert!(name.starts_with("telegram_"));
        assert!(name.ends_with(".flac"));

        let video = TelegramMedia {
            file_name: None,
            video: true,
            ..media
        };
        assert!(local_file_name(&video).ends_with(".mp4"));
    }
}
