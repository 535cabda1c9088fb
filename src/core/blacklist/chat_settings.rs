// Chat settings service - the moderation mode and alert toggle of each chat.
//
// Settings are created lazily on the first write. A chat without a record
// behaves as mode `Delete` with alerts enabled.

use super::blacklist_models::BlacklistMode;
use super::blacklist_store::{BlacklistError, BlacklistStore, SettingsPatch};
use super::chat_locks::ChatLocks;
use std::sync::Arc;

pub struct ChatSettings<S: BlacklistStore> {
    store: Arc<S>,
    /// Alert toggles already read or written, so the message path skips the store.
    /// The chat's guard is held across the store call that fills it.
    alerts_cache: ChatLocks<Option<bool>>,
}

impl<S: BlacklistStore> ChatSettings<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            alerts_cache: ChatLocks::new(),
        }
    }

    /// Set the moderation mode from its numeric code.
    ///
    /// Codes outside the known modes are rejected and nothing is written.
    pub async fn set_mode(&self, chat_id: u64, code: i64) -> Result<BlacklistMode, BlacklistError> {
        let mode = BlacklistMode::from_code(code).ok_or(BlacklistError::InvalidMode(code))?;
        self.store
            .save_settings(chat_id, SettingsPatch::action(mode.code()))
            .await?;
        tracing::info!(chat_id, mode = %mode, "Blacklist mode updated");
        Ok(mode)
    }

    /// The configured mode, or `None` if it was never set.
    pub async fn get_mode(&self, chat_id: u64) -> Result<Option<BlacklistMode>, BlacklistError> {
        Ok(self
            .store
            .find_settings(chat_id)
            .await?
            .and_then(|record| record.action)
            .map(BlacklistMode::from_stored))
    }

    pub async fn set_alerts(&self, chat_id: u64, enabled: bool) -> Result<(), BlacklistError> {
        let mut cached = self.alerts_cache.lock(chat_id).await;
        self.store
            .save_settings(chat_id, SettingsPatch::alerts(enabled))
            .await?;
        *cached = Some(enabled);
        tracing::info!(chat_id, enabled, "Blacklist alerts updated");
        Ok(())
    }

    /// Whether visible alerts are posted in this chat. Defaults to `true`.
    pub async fn get_alerts(&self, chat_id: u64) -> Result<bool, BlacklistError> {
        let mut cached = self.alerts_cache.lock(chat_id).await;
        if let Some(enabled) = *cached {
            return Ok(enabled);
        }

        let enabled = self
            .store
            .find_settings(chat_id)
            .await?
            .and_then(|record| record.alerts)
            .unwrap_or(true);
        *cached = Some(enabled);
        Ok(enabled)
    }
}
