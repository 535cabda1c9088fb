// This is the entry point of the blacklist bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases)
// - `discord/` = Discord-specific adapters (commands, events, platform calls)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::blacklist::ModerationPipeline;
use crate::discord::blacklist::events as blacklist_events;
use crate::discord::{AuditChannel, Data, DiscordGateway, Error};
use crate::infra::blacklist::SqliteBlacklistStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const DEFAULT_DB_PATH: &str = "data/blacklist.db";

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = blacklist_events::handle_message(data, new_message).await {
                tracing::error!(
                    message_id = new_message.id.get(),
                    "Error moderating message: {}",
                    e
                );
            }
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            new: _,
            event,
        } => {
            if let Err(e) =
                blacklist_events::handle_member_update(ctx, data, old_if_available.as_ref(), event)
                    .await
            {
                tracing::error!(guild_id = event.guild_id.get(), "Error syncing admin roster: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            if let Err(e) = blacklist_events::handle_member_removal(data, *guild_id, user).await {
                tracing::error!(guild_id = guild_id.get(), "Error syncing admin roster: {}", e);
            }
        }

        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Every forwarded message and audit entry goes to this channel
    let log_channel_id: u64 = std::env::var("BLACKLIST_LOG_CHANNEL_ID")
        .expect("Missing BLACKLIST_LOG_CHANNEL_ID environment variable!")
        .parse()
        .expect("BLACKLIST_LOG_CHANNEL_ID must be a channel id");

    let db_path =
        std::env::var("BLACKLIST_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    let prewarm_admins = std::env::var("BLACKLIST_PREWARM_ADMINS")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(true);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The store is ready before we connect; the Discord adapters need the
    // client's HTTP handle, so the pipeline is wired in `setup`.

    let store = Arc::new(
        SqliteBlacklistStore::new(&db_path)
            .await
            .expect("Failed to initialize blacklist store"),
    );

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS; // Admin roster updates

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::blacklist::commands::blacklist()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                let gateway = Arc::new(DiscordGateway::new(ctx.http.clone()));
                let audit = Arc::new(AuditChannel::new(ctx.http.clone(), log_channel_id));
                let pipeline = Arc::new(ModerationPipeline::new(store, gateway, audit));

                // Moderation starts only once every filtered chat is known
                let chats = pipeline.start(prewarm_admins).await?;
                tracing::info!(chats, prewarm_admins, "Blacklist ready");

                Ok(Data {
                    blacklist: pipeline,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
