//! `/play`, `/vplay`, `/playforce`, `/cplay` and `/cplayforce`.

use crate::core::{ChannelRef, PlaybackRequest, Track};
use crate::player::PlaybackFailure;
use crate::telegram::edit::{safe_edit, safe_send};
use crate::telegram::platform::{SentMessage, TelegramMedia};
use crate::telegram::texts;

use super::{AppContext, CommandContext};

/// What a play command ended in.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Something is already playing; the track waits at `position`.
    Queued { destination: i64, position: usize },
    /// Playback of the track started.
    Started { destination: i64 },
    Rejected(Rejection),
    /// The initial status message could not be sent.
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NotPrivileged,
    ChannelPlayDisabled,
    ChannelUnavailable,
    Storage,
    NothingToPlay,
    NotFound,
    PlaylistFailed,
    PlaylistEmpty,
    TooLong,
    DownloadFailed,
    PlaybackFailed(PlaybackFailure),
}

/// Handle one play-family command end to end.
pub async fn handle_play(app: &AppContext, ctx: &CommandContext) -> PlayOutcome {
    let request = PlaybackRequest::from_command(&ctx.command);
    let platform = app.platform.as_ref();
    tracing::info!(
        "/{} from {} in {}: {:?}",
        request.command,
        ctx.sender.id,
        ctx.chat_id,
        request.query
    );

    if request.video && !app.settings.is_sudoer(ctx.sender.id) {
        let _ = safe_send(platform, ctx.chat_id, texts::VPLAY_SUDO_ONLY).await;
        return PlayOutcome::Rejected(Rejection::NotPrivileged);
    }

    let destination = if request.channel {
        match channel_destination(app, ctx).await {
            Ok(id) => id,
            Err(rejection) => return PlayOutcome::Rejected(rejection),
        }
    } else {
        ctx.chat_id
    };

    let Some(status) = safe_send(platform, ctx.chat_id, texts::SEARCHING).await else {
        return PlayOutcome::Aborted;
    };

    let (mut track, rest) = match resolve(app, ctx, &request, &status).await {
        Ok(resolved) => resolved,
        Err(rejection) => return PlayOutcome::Rejected(rejection),
    };

    if track.exceeds_limit(app.settings.duration_limit_secs) {
        safe_edit(
            platform,
            &status,
            &texts::duration_limit(app.settings.duration_limit_secs),
        )
        .await;
        return PlayOutcome::Rejected(Rejection::TooLong);
    }

    play_log(app, ctx, &track).await;

    track.user = Some(ctx.sender.mention.clone());
    // Head replaced by a force play; it goes back if the forced track never starts.
    let mut displaced = None;
    if request.force {
        displaced = app.queue.force_add(destination, track.clone()).await;
    } else {
        let position = app.queue.add(destination, track.clone()).await;
        if app.store.get_call(destination).await {
            safe_edit(
                platform,
                &status,
                &texts::queued(position, &track, &ctx.sender.mention),
            )
            .await;
            enqueue_rest(app, ctx, destination, rest).await;
            return PlayOutcome::Queued {
                destination,
                position,
            };
        }
    }

    if track.file_path.is_none() {
        let path = match app
            .media
            .download(&track.id, request.video, track.is_live)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Download of '{}' failed: {}", track.id, e);
                None
            }
        };
        match path {
            Some(path) => {
                track.file_path = Some(path);
                app.queue.update_current(destination, track.clone()).await;
            }
            None => {
                drop_failed(app, destination, &track, displaced).await;
                safe_edit(platform, &status, &texts::download_failed(&app.settings.support_chat))
                    .await;
                return PlayOutcome::Rejected(Rejection::DownloadFailed);
            }
        }
    }

    let video = track.video || request.video;
    if let Err(e) = app.player.play_media(destination, &track, video).await {
        let message = e.to_string();
        tracing::warn!("Playback of '{}' in {} failed: {}", track.title, destination, message);
        drop_failed(app, destination, &track, displaced).await;
        let failure = PlaybackFailure::classify(&message);
        let text = match failure {
            PlaybackFailure::BotDetected => texts::bot_detected(&app.settings.support_chat),
            PlaybackFailure::Other => texts::playback_failed(&message, &app.settings.support_chat),
        };
        safe_edit(platform, &status, &text).await;
        return PlayOutcome::Rejected(Rejection::PlaybackFailed(failure));
    }

    safe_edit(platform, &status, &texts::now_playing(&track)).await;
    enqueue_rest(app, ctx, destination, rest).await;
    PlayOutcome::Started { destination }
}

/// Take a track that could not start back out of the queue.
async fn drop_failed(app: &AppContext, destination: i64, track: &Track, displaced: Option<Track>) {
    match displaced {
        Some(previous) => {
            tracing::debug!("Restoring '{}' in {}", previous.title, destination);
            app.queue.restore_head(destination, &track.id, previous).await;
        }
        None => {
            app.queue.remove(destination, &track.id).await;
        }
    }
}

/// Channel bound to this group, checked to still be reachable.
async fn channel_destination(app: &AppContext, ctx: &CommandContext) -> Result<i64, Rejection> {
    let platform = app.platform.as_ref();
    let channel_id = match app.store.get_cmode(ctx.chat_id).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            let _ = safe_send(platform, ctx.chat_id, texts::CHANNEL_PLAY_DISABLED).await;
            return Err(Rejection::ChannelPlayDisabled);
        }
        Err(e) => {
            tracing::error!("Failed to read channel play binding: {}", e);
            let _ = safe_send(platform, ctx.chat_id, &texts::storage_failed()).await;
            return Err(Rejection::Storage);
        }
    };

    match platform.get_chat(&ChannelRef::Id(channel_id)).await {
        Ok(_) => Ok(channel_id),
        Err(e) => {
            tracing::warn!("Bound channel {} unreachable: {}", channel_id, e);
            if let Err(e) = app.store.set_cmode(ctx.chat_id, None).await {
                tracing::error!("Failed to clear channel play binding: {}", e);
            }
            let _ = safe_send(platform, ctx.chat_id, texts::CHANNEL_UNREACHABLE).await;
            Err(Rejection::ChannelUnavailable)
        }
    }
}

/// Resolve the request into a head track plus any further playlist tracks.
///
/// Precedence: replied-to file, then URL, then free text.
async fn resolve(
    app: &AppContext,
    ctx: &CommandContext,
    request: &PlaybackRequest,
    status: &SentMessage,
) -> Result<(Track, Vec<Track>), Rejection> {
    let platform = app.platform.as_ref();

    if let Some(media) = &ctx.reply_media {
        safe_edit(platform, status, texts::DOWNLOADING).await;
        return match platform.download_media(media).await {
            Ok(path) => {
                let mut track = track_from_media(media);
                track.file_path = Some(path);
                track.message_id = Some(status.message_id);
                Ok((track, Vec::new()))
            }
            Err(e) => {
                tracing::warn!("Telegram file download failed: {}", e);
                safe_edit(
                    platform,
                    status,
                    &texts::telegram_download_failed(&app.settings.support_chat),
                )
                .await;
                Err(Rejection::DownloadFailed)
            }
        };
    }

    if let Some(url) = &request.url {
        if url.contains("playlist") {
            safe_edit(platform, status, texts::PLAYLIST_FETCH).await;
            let mut tracks = match app
                .media
                .playlist(
                    app.settings.playlist_limit,
                    &ctx.sender.mention,
                    url,
                    request.video,
                )
                .await
            {
                Ok(tracks) => tracks,
                Err(e) => {
                    tracing::warn!("Playlist fetch of {} failed: {}", url, e);
                    safe_edit(platform, status, texts::PLAYLIST_FETCH_FAILED).await;
                    return Err(Rejection::PlaylistFailed);
                }
            };
            if tracks.is_empty() {
                safe_edit(platform, status, texts::PLAYLIST_EMPTY).await;
                return Err(Rejection::PlaylistEmpty);
            }
            let mut head = tracks.remove(0);
            head.message_id = Some(status.message_id);
            return Ok((head, tracks));
        }
        return search(app, url, request.video, status).await.map(|t| (t, Vec::new()));
    }

    if let Some(query) = &request.query {
        return search(app, query, request.video, status).await.map(|t| (t, Vec::new()));
    }

    safe_edit(platform, status, texts::PLAY_USAGE).await;
    Err(Rejection::NothingToPlay)
}

async fn search(
    app: &AppContext,
    query: &str,
    video: bool,
    status: &SentMessage,
) -> Result<Track, Rejection> {
    let found = match app.media.search(query, status.message_id, video).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Search for '{}' failed: {}", query, e);
            None
        }
    };
    match found {
        Some(track) => Ok(track),
        None => {
            safe_edit(
                app.platform.as_ref(),
                status,
                &texts::not_found(&app.settings.support_chat),
            )
            .await;
            Err(Rejection::NotFound)
        }
    }
}

fn track_from_media(media: &TelegramMedia) -> Track {
    let mut track = Track::new(media.file_unique_id.clone(), media.title.clone(), media.duration_sec);
    track.video = media.video;
    track
}

/// Append the remaining playlist tracks and post their positions to the group.
async fn enqueue_rest(app: &AppContext, ctx: &CommandContext, destination: i64, rest: Vec<Track>) {
    if rest.is_empty() {
        return;
    }
    let count = rest.len();
    let mut entries = Vec::with_capacity(count);
    for track in rest {
        let title = track.title.clone();
        let position = app.queue.add(destination, track).await;
        entries.push((position, title));
    }
    let text = format!(
        "{}{}",
        texts::playlist_queued(count),
        texts::playlist_listing(&entries)
    );
    let _ = safe_send(app.platform.as_ref(), ctx.chat_id, &text).await;
}

async fn play_log(app: &AppContext, ctx: &CommandContext, track: &Track) {
    let Some(log_chat) = app.settings.log_chat_id else {
        return;
    };
    match app.store.is_logger().await {
        Ok(true) => {}
        Ok(false) => return,
        Err(e) => {
            tracing::warn!("Failed to read logger flag: {}", e);
            return;
        }
    }
    let text = texts::play_log(&ctx.sender.mention, &ctx.chat_title, ctx.chat_id, track);
    if let Err(e) = app.platform.send_text(log_chat, &text).await {
        tracing::warn!("Failed to send play log: {}", e);
    }
}
