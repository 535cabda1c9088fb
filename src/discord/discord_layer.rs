// Discord layer - commands, event handlers and platform adapters.

#[path = "blacklist/mod.rs"]
pub mod blacklist;

pub use blacklist::{AuditChannel, DiscordGateway};

use crate::core::blacklist::ModerationPipeline;
use crate::infra::blacklist::SqliteBlacklistStore;
use std::sync::Arc;

/// The blacklist pipeline as wired for production.
pub type BlacklistPipeline = ModerationPipeline<SqliteBlacklistStore, DiscordGateway, AuditChannel>;

/// Shared data available to all commands and event handlers.
pub struct Data {
    pub blacklist: Arc<BlacklistPipeline>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
