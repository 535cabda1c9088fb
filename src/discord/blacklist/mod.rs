// Discord side of the blacklist: slash commands, event translation and the
// platform adapters the core moderates through.

pub mod commands;
pub mod events;
pub mod gateway;

pub use gateway::{AuditChannel, DiscordGateway};
