// Discord implementations of the blacklist's platform ports.
//
// A chat is a guild. The guild owner is the creator, and anyone holding a role
// with the ADMINISTRATOR permission is an administrator.

use crate::core::blacklist::{
    AuditLog, ChatGateway, GatewayError, IncomingMessage, Member, MemberStatus, Restriction,
    Sender,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use std::sync::Arc;

/// Longest timeout Discord accepts, minus a minute of clock slack.
const MAX_TIMEOUT_SECS: i64 = 28 * 24 * 60 * 60 - 60;

/// Page size for member listing.
const MEMBER_PAGE: u64 = 1000;

/// Ban reasons. The kick reason marks bans that are lifted after the window.
const BAN_REASON: &str = "Blacklisted word";
const KICK_REASON: &str = "Blacklisted word (kick)";

/// Only a ban we placed for a kick is lifted; a moderator may have replaced it.
fn is_kick_ban(reason: Option<&str>) -> bool {
    reason == Some(KICK_REASON)
}

/// Lift a kick's ban once its window is over.
async fn lift_kick(http: &serenity::Http, guild_id: serenity::GuildId, user_id: serenity::UserId) {
    let ban = match guild_id.get_ban(http, user_id).await {
        Ok(ban) => ban,
        Err(e) => {
            tracing::warn!(
                guild_id = guild_id.get(),
                user_id = user_id.get(),
                "Failed to look up blacklist kick: {}",
                e
            );
            return;
        }
    };

    match ban {
        Some(ban) if is_kick_ban(ban.reason.as_deref()) => {
            if let Err(e) = guild_id.unban(http, user_id).await {
                tracing::warn!(
                    guild_id = guild_id.get(),
                    user_id = user_id.get(),
                    "Failed to lift blacklist kick: {}",
                    e
                );
            }
        }
        Some(_) => tracing::info!(
            guild_id = guild_id.get(),
            user_id = user_id.get(),
            "Kick ban was replaced, leaving it in place"
        ),
        None => {}
    }
}

/// Map a serenity failure onto the core's error classes.
pub fn map_error(e: ::serenity::Error) -> GatewayError {
    let status = match &e {
        ::serenity::Error::Http(http) => http.status_code().map(|code| code.as_u16()),
        _ => None,
    };

    match status {
        Some(403) => GatewayError::Forbidden(e.to_string()),
        Some(404) => GatewayError::NotFound(e.to_string()),
        Some(_) => GatewayError::Http(e.to_string()),
        None => GatewayError::Other(e.to_string()),
    }
}

/// Who counts as an admin in one guild.
#[derive(Debug, Clone)]
pub struct AdminRoles {
    owner_id: u64,
    admin_roles: HashSet<u64>,
    /// @everyone carries ADMINISTRATOR, so every member is an admin
    everyone_is_admin: bool,
}

impl AdminRoles {
    pub fn new(owner_id: u64, guild_id: u64, admin_roles: HashSet<u64>) -> Self {
        // The @everyone role shares the guild's id
        let everyone_is_admin = admin_roles.contains(&guild_id);
        Self {
            owner_id,
            admin_roles,
            everyone_is_admin,
        }
    }

    pub fn from_partial_guild(guild: &serenity::PartialGuild) -> Self {
        Self::new(
            guild.owner_id.get(),
            guild.id.get(),
            guild
                .roles
                .values()
                .filter(|role| role.permissions.administrator())
                .map(|role| role.id.get())
                .collect(),
        )
    }

    /// Read the guild from the cache, falling back to the API.
    pub async fn fetch(
        ctx: &serenity::Context,
        guild_id: serenity::GuildId,
    ) -> Result<Self, GatewayError> {
        let cached = ctx.cache.guild(guild_id).map(|guild| {
            Self::new(
                guild.owner_id.get(),
                guild.id.get(),
                guild
                    .roles
                    .values()
                    .filter(|role| role.permissions.administrator())
                    .map(|role| role.id.get())
                    .collect(),
            )
        });

        match cached {
            Some(roles) => Ok(roles),
            None => {
                let guild = guild_id
                    .to_partial_guild(&ctx.http)
                    .await
                    .map_err(map_error)?;
                Ok(Self::from_partial_guild(&guild))
            }
        }
    }

    pub fn status_of(&self, user_id: u64, roles: &[serenity::RoleId]) -> MemberStatus {
        if user_id == self.owner_id {
            MemberStatus::Creator
        } else if self.everyone_is_admin
            || roles.iter().any(|role| self.admin_roles.contains(&role.get()))
        {
            MemberStatus::Administrator
        } else {
            MemberStatus::Other
        }
    }
}

pub struct DiscordGateway {
    http: Arc<serenity::Http>,
}

impl DiscordGateway {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatGateway for DiscordGateway {
    async fn restrict_member(
        &self,
        chat_id: u64,
        user_id: u64,
        restriction: Restriction,
    ) -> Result<(), GatewayError> {
        let guild_id = serenity::GuildId::new(chat_id);
        let user_id = serenity::UserId::new(user_id);

        match restriction {
            // Banned for the window, then let back in
            Restriction::Remove {
                until: Some(window),
            } => {
                guild_id
                    .ban_with_reason(&self.http, user_id, 0, KICK_REASON)
                    .await
                    .map_err(map_error)?;

                let http = Arc::clone(&self.http);
                tokio::spawn(async move {
                    tokio::time::sleep(window).await;
                    lift_kick(&http, guild_id, user_id).await;
                });
                Ok(())
            }
            Restriction::Remove { until: None } => guild_id
                .ban_with_reason(&self.http, user_id, 0, BAN_REASON)
                .await
                .map_err(map_error),
            Restriction::Silence => {
                let until = serenity::Timestamp::from_unix_timestamp(
                    chrono::Utc::now().timestamp() + MAX_TIMEOUT_SECS,
                )
                .map_err(|e| GatewayError::Other(e.to_string()))?;

                guild_id
                    .edit_member(
                        &self.http,
                        user_id,
                        serenity::EditMember::new().disable_communication_until_datetime(until),
                    )
                    .await
                    .map(|_| ())
                    .map_err(map_error)
            }
        }
    }

    async fn chat_admins(&self, chat_id: u64) -> Result<Vec<Member>, GatewayError> {
        let guild_id = serenity::GuildId::new(chat_id);
        let guild = guild_id
            .to_partial_guild(&self.http)
            .await
            .map_err(map_error)?;
        let roles = AdminRoles::from_partial_guild(&guild);

        let mut admins = vec![Member::new(guild.owner_id.get(), MemberStatus::Creator)];
        let mut after = None;
        loop {
            let page = self
                .http
                .get_guild_members(guild_id, Some(MEMBER_PAGE), after)
                .await
                .map_err(map_error)?;

            for member in &page {
                let user_id = member.user.id.get();
                if roles.status_of(user_id, &member.roles) == MemberStatus::Administrator {
                    admins.push(Member::new(user_id, MemberStatus::Administrator));
                }
            }

            if (page.len() as u64) < MEMBER_PAGE {
                break;
            }
            after = page.last().map(|member| member.user.id.get());
        }

        Ok(admins)
    }

    async fn delete_message(&self, message: &IncomingMessage) -> Result<bool, GatewayError> {
        let result = serenity::ChannelId::new(message.channel_id)
            .delete_message(&self.http, serenity::MessageId::new(message.message_id))
            .await
            .map_err(map_error);

        match result {
            Ok(()) => Ok(true),
            // Someone else got there first
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn send_alert(&self, message: &IncomingMessage, text: &str) -> Result<(), GatewayError> {
        serenity::ChannelId::new(message.channel_id)
            .say(&self.http, text)
            .await
            .map(|_| ())
            .map_err(map_error)
    }
}

/// The log channel blacklist activity is reported to.
pub struct AuditChannel {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl AuditChannel {
    pub fn new(http: Arc<serenity::Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: serenity::ChannelId::new(channel_id),
        }
    }
}

#[async_trait]
impl AuditLog for AuditChannel {
    async fn forward(&self, message: &IncomingMessage) -> Result<(), GatewayError> {
        let author = match &message.sender {
            Sender::User { mention, .. } => mention.clone(),
            _ => "Unknown".to_string(),
        };
        let content = message.content().unwrap_or_default();
        let mut description: String = content.chars().take(4000).collect();
        if description.len() < content.len() {
            description.push_str("...");
        }

        let embed = serenity::CreateEmbed::new()
            .title("🚫 Blacklisted Message")
            .description(description)
            .color(0xFF0000)
            .field("Author", author, true)
            .field("Channel", format!("<#{}>", message.channel_id), true)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Message ID: {}",
                message.message_id
            )))
            .timestamp(serenity::Timestamp::now());

        self.channel_id
            .send_message(&self.http, serenity::CreateMessage::new().embed(embed))
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn log(&self, text: &str) -> Result<(), GatewayError> {
        self.channel_id
            .say(&self.http, text)
            .await
            .map(|_| ())
            .map_err(map_error)
    }
}
