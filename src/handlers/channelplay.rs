//! `/channelplay {linked|disable|<channel>}`: bind a group's playback to a channel.

use crate::core::ChannelRef;
use crate::telegram::edit::safe_send;
use crate::telegram::platform::ChatKind;
use crate::telegram::texts;

use super::{AppContext, CommandContext};

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelPlayOutcome {
    /// The group now plays into this channel.
    Bound(i64),
    Disabled,
    /// No argument; usage was shown.
    Usage,
    Rejected(ChannelPlayRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelPlayRejection {
    NotAdmin,
    MemberLookupFailed(&'static str),
    NoLinkedChannel,
    LookupFailed(&'static str),
    InviteLink,
    NotAChannel,
    AdminsLookupFailed(&'static str),
    OwnerNotFound,
    NotOwner,
    Storage,
}

pub async fn handle_channelplay(app: &AppContext, ctx: &CommandContext) -> ChannelPlayOutcome {
    let outcome = configure(app, ctx).await;
    tracing::info!(
        "/channelplay '{}' from {} in {}: {:?}",
        ctx.command.args,
        ctx.sender.id,
        ctx.chat_id,
        outcome
    );
    outcome
}

async fn configure(app: &AppContext, ctx: &CommandContext) -> ChannelPlayOutcome {
    use ChannelPlayOutcome::Rejected;
    use ChannelPlayRejection as R;

    let platform = app.platform.as_ref();

    match platform.is_admin(ctx.chat_id, ctx.sender.id).await {
        Ok(true) => {}
        Ok(false) => {
            reply(app, ctx, texts::ONLY_ADMINS.to_string()).await;
            return Rejected(R::NotAdmin);
        }
        Err(e) => {
            reply(app, ctx, texts::member_lookup_failed(e.kind())).await;
            return Rejected(R::MemberLookupFailed(e.kind()));
        }
    }

    let arg = ctx.command.args.trim();
    if arg.is_empty() {
        reply(app, ctx, texts::channel_play_usage(&ctx.chat_title)).await;
        return ChannelPlayOutcome::Usage;
    }

    if arg.eq_ignore_ascii_case("disable") {
        if let Err(e) = app.store.set_cmode(ctx.chat_id, None).await {
            tracing::error!("Failed to clear channel play binding: {}", e);
            reply(app, ctx, texts::storage_failed()).await;
            return Rejected(R::Storage);
        }
        reply(app, ctx, texts::CHANNEL_PLAY_OFF.to_string()).await;
        return ChannelPlayOutcome::Disabled;
    }

    if arg.eq_ignore_ascii_case("linked") {
        let group = match platform.get_chat(&ChannelRef::Id(ctx.chat_id)).await {
            Ok(group) => group,
            Err(e) => {
                reply(app, ctx, texts::channel_lookup_failed(e.kind())).await;
                return Rejected(R::LookupFailed(e.kind()));
            }
        };
        let Some(channel_id) = group.linked_chat_id else {
            reply(app, ctx, texts::NO_LINKED_CHANNEL.to_string()).await;
            return Rejected(R::NoLinkedChannel);
        };
        let title = match platform.get_chat(&ChannelRef::Id(channel_id)).await {
            Ok(channel) => channel.title,
            Err(e) => {
                tracing::debug!("Linked channel {} title unavailable: {}", channel_id, e);
                channel_id.to_string()
            }
        };
        return bind(app, ctx, channel_id, &title).await;
    }

    if ChannelRef::is_invite_link(arg) {
        reply(app, ctx, texts::INVITE_LINK_UNSUPPORTED.to_string()).await;
        return Rejected(R::InviteLink);
    }
    let channel = match platform.get_chat(&ChannelRef::parse(arg)).await {
        Ok(channel) => channel,
        Err(e) => {
            reply(app, ctx, texts::channel_lookup_failed(e.kind())).await;
            return Rejected(R::LookupFailed(e.kind()));
        }
    };
    if channel.kind != ChatKind::Channel {
        reply(app, ctx, texts::ONLY_CHANNELS.to_string()).await;
        return Rejected(R::NotAChannel);
    }

    let owner = match platform.chat_owner(channel.id).await {
        Ok(Some(owner)) => owner,
        Ok(None) => {
            reply(app, ctx, texts::OWNER_NOT_FOUND.to_string()).await;
            return Rejected(R::OwnerNotFound);
        }
        Err(e) => {
            reply(app, ctx, texts::admins_lookup_failed(e.kind())).await;
            return Rejected(R::AdminsLookupFailed(e.kind()));
        }
    };
    if owner.id != ctx.sender.id {
        let text = texts::not_channel_owner(&channel.title, owner.username.as_deref());
        reply(app, ctx, text).await;
        return Rejected(R::NotOwner);
    }

    bind(app, ctx, channel.id, &channel.title).await
}

async fn reply(app: &AppContext, ctx: &CommandContext, text: String) {
    let _ = safe_send(app.platform.as_ref(), ctx.chat_id, &text).await;
}

async fn bind(app: &AppContext, ctx: &CommandContext, channel_id: i64, title: &str) -> ChannelPlayOutcome {
    if let Err(e) = app.store.set_cmode(ctx.chat_id, Some(channel_id)).await {
        tracing::error!("Failed to store channel play binding: {}", e);
        reply(app, ctx, texts::storage_failed()).await;
        return ChannelPlayOutcome::Rejected(ChannelPlayRejection::Storage);
    }
    reply(app, ctx, texts::channel_play_on(title, channel_id)).await;
    ChannelPlayOutcome::Bound(channel_id)
}
