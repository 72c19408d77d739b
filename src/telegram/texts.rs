//! User-facing reply texts (HTML parse mode).

use teloxide::utils::html::escape;

use crate::core::Track;

pub const HELP: &str = "<b>Commands</b>\n\n\
/play &lt;query|url&gt; - play audio in this group's voice chat\n\
/vplay &lt;query|url&gt; - play video (sudo users only)\n\
/playforce &lt;query|url&gt; - skip the queue and play now\n\
/cplay, /cplayforce - play in the bound channel\n\
/channelplay linked|disable|&lt;channel&gt; - configure channel play\n\n\
Reply to an audio or video file with /play to play it.";

pub const PLAY_USAGE: &str = "Usage: <code>/play &lt;song name or link&gt;</code>\nor reply to an audio/video file with /play.";

pub const GROUPS_ONLY: &str = "❌ Playback commands only work in groups.";

pub const SEARCHING: &str = "🔎 Searching...";

pub const VPLAY_SUDO_ONLY: &str = "❌ Video playback is restricted to sudo users.";

pub const CHANNEL_PLAY_DISABLED: &str = "❌ <b>Channel play is not enabled.</b>\n\n\
<b>Enable it for the linked channel:</b>\n<code>/channelplay linked</code>\n\n\
<b>Enable it for any channel:</b>\n<code>/channelplay [channel_id]</code>";

pub const CHANNEL_UNREACHABLE: &str = "❌ <b>Could not reach the channel.</b>\n\n\
Make sure I am an admin there and set channel play up again.";

pub const DOWNLOADING: &str = "📥 Downloading...";

pub const PLAYLIST_FETCH: &str = "📂 Fetching playlist...";

pub const PLAYLIST_FETCH_FAILED: &str = "<blockquote>❌ Could not fetch the playlist.\n\n\
Playlist support is limited right now. Try playing the songs one by one.</blockquote>";

pub const PLAYLIST_EMPTY: &str = "❌ The playlist is empty or private.";

pub const ONLY_ADMINS: &str = "❌ Only admins can use this command.";

pub const CHANNEL_PLAY_OFF: &str = "✅ Channel play disabled.";

pub const NO_LINKED_CHANNEL: &str = "❌ This chat has no linked channel.";

pub const ONLY_CHANNELS: &str = "❌ Only channels are supported.";

pub const INVITE_LINK_UNSUPPORTED: &str = "❌ Invite links can't be resolved.\n\n\
Send the channel id (<code>-100…</code>) or its <code>@username</code> instead.";

pub const OWNER_NOT_FOUND: &str = "❌ Could not find the channel owner.\n\n\
Make sure I can see the channel's administrators.";

/// Upper bound on the playlist listing body, before the closing tag.
pub const PLAYLIST_LISTING_MAX: usize = 1948;

pub fn not_found(support_chat: &str) -> String {
    format!(
        "❌ Nothing found for that request.\n\nIf this keeps happening, ask in {}.",
        escape(support_chat)
    )
}

pub fn duration_limit(limit_secs: u64) -> String {
    format!(
        "❌ Tracks longer than {} minutes cannot be played.",
        limit_secs / 60
    )
}

pub fn queued(position: usize, track: &Track, requester: &str) -> String {
    format!(
        "➕ <b>Queued at position #{}</b>\n\n<a href=\"{}\">{}</a>\nDuration: {}\nRequested by: {}",
        position,
        escape(&track.url),
        escape(&track.title),
        escape(&track.duration),
        requester
    )
}

pub fn now_playing(track: &Track) -> String {
    let title = if track.url.is_empty() {
        escape(&track.title)
    } else {
        format!("<a href=\"{}\">{}</a>", escape(&track.url), escape(&track.title))
    };
    format!(
        "▶️ <b>Now playing</b>\n\n{}\nDuration: {}\nRequested by: {}",
        title,
        escape(&track.duration),
        track.user.as_deref().unwrap_or("unknown")
    )
}

pub fn playlist_queued(count: usize) -> String {
    format!("📃 <b>{} more tracks added to the queue:</b>\n", count)
}

/// Listing of bulk-queued tracks with their queue positions.
pub fn playlist_listing(entries: &[(usize, String)]) -> String {
    let mut body = String::from("<blockquote expandable>");
    let mut len = body.chars().count();
    // Whole lines only, so no tag or entity is ever cut.
    for (position, title) in entries {
        let line = format!("<b>{}.</b> {}\n", position, escape(title));
        let line_len = line.chars().count();
        if len + line_len > PLAYLIST_LISTING_MAX {
            break;
        }
        body.push_str(&line);
        len += line_len;
    }
    body.push_str("</blockquote>");
    body
}

pub fn download_failed(support_chat: &str) -> String {
    format!(
        "❌ <b>Could not download the media.</b>\n\n\
<b>Possible reasons:</b>\n\
• the site flagged the bot (refresh the cookies)\n\
• the video is region locked or private\n\
• the content is age restricted (needs cookies)\n\n\
<b>Support:</b> {}",
        escape(support_chat)
    )
}

pub fn telegram_download_failed(support_chat: &str) -> String {
    format!(
        "❌ Could not download the replied file.\n\n<b>Support:</b> {}",
        escape(support_chat)
    )
}

pub fn bot_detected(support_chat: &str) -> String {
    format!(
        "❌ <b>Bot detection was triggered.</b>\n\n\
<b>What to do:</b>\n\
• refresh the cookies file configured for yt-dlp\n\
• wait a few minutes before trying again\n\n\
<b>Support:</b> {}",
        escape(support_chat)
    )
}

pub fn playback_failed(error: &str, support_chat: &str) -> String {
    format!(
        "❌ <b>Playback error:</b>\n{}\n\n<b>Support:</b> {}",
        escape(error),
        escape(support_chat)
    )
}

pub fn play_log(requester: &str, group: &str, group_id: i64, track: &Track) -> String {
    format!(
        "🎵 <b>Play log</b>\n\nGroup: {} (<code>{}</code>)\nUser: {}\nTitle: {}\nDuration: {}",
        escape(group),
        group_id,
        requester,
        escape(&track.title),
        escape(&track.duration)
    )
}

pub fn channel_play_usage(group_title: &str) -> String {
    format!(
        "<b>Channel play settings for {}</b>\n\n\
Enable for the linked channel:\n<code>/channelplay linked</code>\n\n\
Enable for any channel:\n<code>/channelplay [channel_id]</code>\n\n\
Disable channel play:\n<code>/channelplay disable</code>",
        escape(group_title)
    )
}

pub fn channel_play_on(title: &str, channel_id: i64) -> String {
    format!(
        "✅ Channel play enabled: {}\nChannel id: <code>{}</code>",
        escape(title),
        channel_id
    )
}

pub fn channel_lookup_failed(kind: &str) -> String {
    format!(
        "❌ Could not get the channel.\n\nError: <code>{}</code>\n\n\
Make sure the bot was added to the channel as an admin.\n\n\
For numeric ids use the full id with the <code>-100</code> prefix, e.g. \
<code>/channelplay -1001234567890</code>",
        kind
    )
}

pub fn admins_lookup_failed(kind: &str) -> String {
    format!(
        "❌ Could not get the channel admins.\n\nError: <code>{}</code>\n\n\
Make sure the bot is an admin in the channel.",
        kind
    )
}

pub fn member_lookup_failed(kind: &str) -> String {
    format!("❌ Could not check your admin rights.\n\nError: <code>{}</code>", kind)
}

pub fn not_channel_owner(channel_title: &str, owner_username: Option<&str>) -> String {
    format!(
        "❌ You must be the owner of {} to bind it to this group.\n\n\
Channel owner: @{}\n\n\
Alternatively link the group's own channel with <code>/channelplay linked</code>.",
        escape(channel_title),
        escape(owner_username.unwrap_or("unknown"))
    )
}

pub fn storage_failed() -> String {
    "❌ Could not save the setting, please try again.".to_string()
}
