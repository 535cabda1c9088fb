// Slash commands for managing a server's blacklist.
//
// Thin layer: pull the ids out of the context, call the core, format the reply.

use crate::core::blacklist::{normalize_word, BlacklistError};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Longest word list shown in a single embed.
const LIST_LIMIT: usize = 4000;

/// Blacklisted word management.
///
/// Messages containing a blacklisted word are deleted, and the configured
/// action is applied to their author.
#[poise::command(
    slash_command,
    subcommands("add", "remove", "list", "mode", "alerts"),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn blacklist(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - subcommands do the work
    Ok(())
}

/// Blacklist a word in this server.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Word to blacklist"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();

    match ctx.data().blacklist.words().add_word(guild_id, &word).await {
        Ok(true) => {
            ctx.say(format!("✅ `{}` has been blacklisted.", display_word(&word)))
                .await?;
        }
        Ok(false) => {
            ctx.say(format!("`{}` is already blacklisted.", display_word(&word)))
                .await?;
        }
        Err(BlacklistError::EmptyWord) => {
            ctx.say("❌ Please provide a word to blacklist.").await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Remove a word from this server's blacklist.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Word to remove"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();

    match ctx.data().blacklist.words().remove_word(guild_id, &word).await {
        Ok(()) => {
            ctx.say(format!(
                "✅ `{}` has been removed from the blacklist.",
                display_word(&word)
            ))
            .await?;
        }
        Err(BlacklistError::NotFound(word)) => {
            ctx.say(format!("❌ `{}` is not blacklisted.", word)).await?;
        }
        Err(BlacklistError::EmptyWord) => {
            ctx.say("❌ Please provide a word to remove.").await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Show every blacklisted word of this server.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();

    let words = ctx.data().blacklist.words().list_words(guild_id).await?;
    if words.is_empty() {
        ctx.say("No words are blacklisted in this server.").await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title("🚫 Blacklisted Words")
        .description(format_word_list(&words, LIST_LIMIT))
        .color(0xFF0000)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "{} word{}",
            words.len(),
            if words.len() == 1 { "" } else { "s" }
        )));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Show or set what happens to users who trigger the blacklist.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn mode(
    ctx: Context<'_>,
    #[description = "0 = delete only, 1 = kick, 2 = ban, 3 = mute"] value: Option<i64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();
    let settings = ctx.data().blacklist.settings();

    let Some(value) = value else {
        let mode = settings.get_mode(guild_id).await?.unwrap_or_default();
        ctx.say(format!("Blacklist mode: **{}**", mode.describe()))
            .await?;
        return Ok(());
    };

    match settings.set_mode(guild_id, value).await {
        Ok(mode) => {
            ctx.say(format!("✅ Blacklist mode set to **{}**.", mode.describe()))
                .await?;
        }
        Err(BlacklistError::InvalidMode(code)) => {
            ctx.say(format!(
                "❌ `{}` is not a valid mode. Use 0 (delete only), 1 (kick), 2 (ban) or 3 (mute).",
                code
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Show or toggle the alerts posted when someone triggers the blacklist.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn alerts(
    ctx: Context<'_>,
    #[description = "Post an alert in the channel"] enabled: Option<bool>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();
    let settings = ctx.data().blacklist.settings();

    match enabled {
        Some(enabled) => {
            settings.set_alerts(guild_id, enabled).await?;
            ctx.say(format!("✅ Blacklist alerts {}.", on_off(enabled)))
                .await?;
        }
        None => {
            let enabled = settings.get_alerts(guild_id).await?;
            ctx.say(format!("Blacklist alerts are {}.", on_off(enabled)))
                .await?;
        }
    }
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "**enabled**"
    } else {
        "**disabled**"
    }
}

/// The word as it is stored, or the raw input if it cannot be normalized.
fn display_word(word: &str) -> String {
    normalize_word(word).unwrap_or_else(|_| word.to_string())
}

/// Render words as inline code, cut off with a count once `limit` is reached.
fn format_word_list(words: &[String], limit: usize) -> String {
    let mut out = String::new();
    for (shown, word) in words.iter().enumerate() {
        let item = format!("`{}`", word);
        let separator = if out.is_empty() { "" } else { ", " };
        if out.len() + separator.len() + item.len() > limit {
            out.push_str(&format!("\n... and {} more", words.len() - shown));
            break;
        }
        out.push_str(separator);
        out.push_str(&item);
    }
    out
}
