//! Sending and editing status messages without letting platform hiccups escape.
//!
//! Flood control is waited out once and the call retried once; a message that
//! disappeared in the meantime is ignored.

use super::platform::{ChatPlatform, PlatformError, SentMessage};

/// Edit `message`, returning whether the edit landed.
pub async fn safe_edit(platform: &dyn ChatPlatform, message: &SentMessage, text: &str) -> bool {
    match platform.edit_text(message, text).await {
        Ok(()) => true,
        Err(PlatformError::RetryAfter(wait)) => {
            tracing::debug!("Edit of {} rate limited, waiting {:?}", message.message_id, wait);
            tokio::time::sleep(wait).await;
            match platform.edit_text(message, text).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!("Edit retry of {} failed: {}", message.message_id, e);
                    false
                }
            }
        }
        Err(PlatformError::MessageGone) => false,
        Err(e) => {
            tracing::warn!("Failed to edit message {}: {}", message.message_id, e);
            false
        }
    }
}

/// Send a message, retrying once after flood control.
pub async fn safe_send(platform: &dyn ChatPlatform, chat_id: i64, text: &str) -> Option<SentMessage> {
    match platform.send_text(chat_id, text).await {
        Ok(sent) => Some(sent),
        Err(PlatformError::RetryAfter(wait)) => {
            tokio::time::sleep(wait).await;
            match platform.send_text(chat_id, text).await {
                Ok(sent) => Some(sent),
                Err(e) => {
                    tracing::warn!("Send to {} failed after retry: {}", chat_id, e);
                    None
                }
            }
        }
        Err(e) => {
            tracing::warn!("Send to {} failed: {}", chat_id, e);
            None
        }
    }
}
