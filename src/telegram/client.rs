//! Telegram bot client - polling loop and command routing.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{BotCommand, User};
use teloxide::utils::html::escape;

use crate::config::Settings;
use crate::core::{parse_command, TrackQueue, PLAY_COMMANDS};
use crate::error::{Error, Result};
use crate::handlers::{handle_channelplay, handle_play, AppContext, CommandContext, CommandSender};
use crate::media::YtDlp;
use crate::player::CommandPlayer;
use crate::storage::SqliteStore;

use super::adapter::{extract_media, TelegramPlatform};
use super::edit::safe_send;
use super::texts;

/// Wire the collaborators together for one bot process.
pub fn build_context(settings: Settings, bot: Bot, token: &str) -> Result<AppContext> {
    let downloads_dir = settings.downloads_dir()?;
    std::fs::create_dir_all(&downloads_dir)?;

    let store = Arc::new(SqliteStore::open(&settings.database_path()?)?);
    let queue = Arc::new(TrackQueue::new());
    let media = Arc::new(
        YtDlp::new(settings.ytdlp_path.clone(), downloads_dir.clone())
            .with_cookies(settings.cookies_path.clone()),
    );
    let player = Arc::new(CommandPlayer::new(
        settings.player_command.clone(),
        queue.clone(),
        store.clone(),
        media.clone(),
    ));
    if settings.player_command.is_none() {
        tracing::warn!("No player_command configured; playback requests will fail");
    }

    Ok(AppContext {
        platform: Arc::new(TelegramPlatform::new(bot, token, downloads_dir)),
        settings,
        queue,
        player,
        media,
        store,
    })
}

/// Run the bot until interrupted.
pub async fn run_bot(settings: Settings, token: Option<String>) -> Result<()> {
    tracing::info!("Starting Telegram bot...");

    let token = token
        .or_else(|| settings.bot_token.clone())
        .ok_or_else(|| Error::Telegram("No bot token configured".to_string()))?;

    let bot = Bot::new(token.clone());
    let app = Arc::new(build_context(settings, bot.clone(), &token)?);

    if let Err(e) = bot
        .set_my_commands(vec![
            BotCommand::new("play", "Play audio in the voice chat"),
            BotCommand::new("vplay", "Play video in the voice chat"),
            BotCommand::new("playforce", "Skip the queue and play now"),
            BotCommand::new("cplay", "Play in the bound channel"),
            BotCommand::new("cplayforce", "Force play in the bound channel"),
            BotCommand::new("channelplay", "Configure channel play"),
            BotCommand::new("help", "Show help"),
        ])
        .await
    {
        tracing::warn!("Failed to set commands: {}", e);
    }

    tracing::info!("Telegram bot commands set");

    teloxide::repl(bot, move |msg: Message| {
        let app = Arc::clone(&app);
        async move {
            handle_message(&app, msg).await;
            respond(())
        }
    })
    .await;

    Ok(())
}

fn mention(user: &User) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user.id.0,
        escape(&user.full_name())
    )
}

/// Route one incoming message to its handler.
async fn handle_message(app: &AppContext, msg: Message) {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        return;
    };
    let Some(command) = parse_command(text) else {
        return;
    };
    let chat_id = msg.chat.id.0;
    let platform = app.platform.as_ref();

    if command.name == "start" || command.name == "help" {
        let _ = safe_send(platform, chat_id, texts::HELP).await;
        return;
    }

    let Some(user) = msg.from.as_ref() else {
        return;
    };
    if app.settings.is_blacklisted(user.id.0) {
        tracing::debug!("Ignoring /{} from blacklisted user {}", command.name, user.id.0);
        return;
    }

    let is_play = PLAY_COMMANDS.contains(&command.name.as_str());
    if !is_play && command.name != "channelplay" {
        return;
    }
    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        let _ = safe_send(platform, chat_id, texts::GROUPS_ONLY).await;
        return;
    }

    let ctx = CommandContext {
        chat_id,
        chat_title: msg.chat.title().unwrap_or_default().to_string(),
        sender: CommandSender {
            id: user.id.0,
            mention: mention(user),
        },
        command,
        reply_media: msg.reply_to_message().and_then(extract_media),
    };

    if is_play {
        handle_play(app, &ctx).await;
    } else {
        handle_channelplay(app, &ctx).await;
    }
}
