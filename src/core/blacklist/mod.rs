// Core blacklist module - word filtering and moderation of chat messages.

pub mod action_dispatcher;
pub mod admin_cache;
pub mod alert_dedup;
pub mod blacklist_models;
pub mod blacklist_store;
pub mod chat_locks;
pub mod chat_settings;
pub mod gateway;
pub mod matcher;
pub mod moderation_pipeline;
pub mod word_list;

#[cfg(test)]
pub mod test_support;

pub use blacklist_models::*;
pub use blacklist_store::*;
pub use gateway::{AuditLog, ChatGateway, GatewayError};
pub use moderation_pipeline::ModerationPipeline;
pub use word_list::normalize_word;
