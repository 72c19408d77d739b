//! Chat command handlers.
//!
//! Handlers only talk to collaborator traits, never to teloxide directly, so
//! the router in [`crate::telegram::client`] and the tests can drive them the
//! same way.

pub mod channelplay;
pub mod play;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use crate::config::Settings;
use crate::core::{ParsedCommand, TrackQueue};
use crate::media::MediaSource;
use crate::player::Player;
use crate::storage::SettingsStore;
use crate::telegram::platform::{ChatPlatform, TelegramMedia};

pub use channelplay::{handle_channelplay, ChannelPlayOutcome};
pub use play::{handle_play, PlayOutcome};

/// Collaborators shared by every handler invocation.
pub struct AppContext {
    pub settings: Settings,
    pub platform: Arc<dyn ChatPlatform>,
    pub queue: Arc<TrackQueue>,
    pub player: Arc<dyn Player>,
    pub media: Arc<dyn MediaSource>,
    pub store: Arc<dyn SettingsStore>,
}

/// The user who issued a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSender {
    pub id: u64,
    /// HTML mention of the user.
    pub mention: String,
}

/// One incoming command, stripped down to what the handlers read.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub chat_id: i64,
    pub chat_title: String,
    pub sender: CommandSender,
    pub command: ParsedCommand,
    /// Playable file on the message this command replies to.
    pub reply_media: Option<TelegramMedia>,
}
