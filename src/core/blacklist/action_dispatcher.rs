// Action dispatcher - turns a chat's moderation mode into a restriction.

use super::blacklist_models::BlacklistMode;
use super::blacklist_store::{BlacklistError, BlacklistStore};
use super::chat_settings::ChatSettings;
use super::gateway::{ChatGateway, GatewayError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Store(#[from] BlacklistError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl DispatchError {
    /// Short name of the failure class, used in audit entries.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Store(_) => "StorageError",
            DispatchError::Gateway(e) => e.kind(),
        }
    }
}

pub struct ActionDispatcher<S: BlacklistStore, G: ChatGateway> {
    settings: Arc<ChatSettings<S>>,
    gateway: Arc<G>,
}

impl<S: BlacklistStore, G: ChatGateway> ActionDispatcher<S, G> {
    pub fn new(settings: Arc<ChatSettings<S>>, gateway: Arc<G>) -> Self {
        Self { settings, gateway }
    }

    /// Apply the chat's configured action to a user.
    ///
    /// Returns the action label, empty when the chat only deletes messages.
    /// Failures are returned, never retried.
    pub async fn apply(&self, chat_id: u64, user_id: u64) -> Result<String, DispatchError> {
        let mode = self.settings.get_mode(chat_id).await?.unwrap_or_default();
        self.apply_mode(chat_id, user_id, mode).await
    }

    /// Apply a specific mode to a user.
    pub async fn apply_mode(
        &self,
        chat_id: u64,
        user_id: u64,
        mode: BlacklistMode,
    ) -> Result<String, DispatchError> {
        let Some(restriction) = mode.restriction() else {
            return Ok(String::new());
        };

        self.gateway
            .restrict_member(chat_id, user_id, restriction)
            .await?;

        tracing::info!(chat_id, user_id, action = mode.action_label(), "Blacklist action applied");
        Ok(mode.action_label().to_string())
    }
}
