// Discord events for the blacklist - translate them and hand them to the core.

use super::gateway::AdminRoles;
use crate::core::blacklist::{
    IncomingMessage, Member, MemberStatus, MembershipUpdate, ModerationOutcome, Sender,
};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Build the core's view of a guild message.
///
/// Returns `None` for direct messages and for messages written by bots.
pub fn incoming_message(msg: &serenity::Message) -> Option<IncomingMessage> {
    let guild_id = msg.guild_id?;

    let sender = if msg.webhook_id.is_some() {
        Sender::AnonymousChannel
    } else if msg.author.bot {
        return None;
    } else {
        Sender::User {
            user_id: msg.author.id.get(),
            mention: format!("<@{}>", msg.author.id.get()),
        }
    };

    // Attachment descriptions play the role of captions
    let caption = msg
        .attachments
        .iter()
        .find_map(|attachment| attachment.description.clone());

    Some(IncomingMessage {
        chat_id: guild_id.get(),
        channel_id: msg.channel_id.get(),
        message_id: msg.id.get(),
        sender,
        text: Some(msg.content.clone()),
        caption,
    })
}

pub async fn handle_message(data: &Data, msg: &serenity::Message) -> Result<(), Error> {
    let Some(message) = incoming_message(msg) else {
        return Ok(());
    };

    let outcome = data.blacklist.handle_message(&message).await?;
    if let ModerationOutcome::Ignored(reason) = outcome {
        tracing::trace!(chat_id = message.chat_id, reason = ?reason, "Message not moderated");
    }
    Ok(())
}

pub async fn handle_member_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::Member>,
    event: &serenity::GuildMemberUpdateEvent,
) -> Result<(), Error> {
    let roles = AdminRoles::fetch(ctx, event.guild_id).await?;
    let user_id = event.user.id.get();

    let update = MembershipUpdate {
        chat_id: event.guild_id.get(),
        old_status: old.map(|member| roles.status_of(user_id, &member.roles)),
        new_member: Member::new(user_id, roles.status_of(user_id, &event.roles)),
    };

    data.blacklist.handle_membership_update(&update).await?;
    Ok(())
}

/// A member who left (or was removed) is no admin any more.
pub async fn handle_member_removal(
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<(), Error> {
    let update = MembershipUpdate {
        chat_id: guild_id.get(),
        old_status: None,
        new_member: Member::new(user.id.get(), MemberStatus::Other),
    };

    data.blacklist.handle_membership_update(&update).await?;
    Ok(())
}
