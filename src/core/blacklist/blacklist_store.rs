// Persistence port for the blacklist.
//
// Word lists and chat settings live in one document collection. Word-list
// records are keyed by the chat id, settings records by `SETTINGS_<chat_id>`.

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BlacklistError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Word is not blacklisted: {0}")]
    NotFound(String),

    #[error("Invalid blacklist mode: {0}")]
    InvalidMode(i64),

    #[error("Blacklisted word cannot be empty")]
    EmptyWord,
}

// ============================================================================
// RECORDS
// ============================================================================

/// Key of a document in the blacklist collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Words(u64),
    Settings(u64),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Words(chat_id) => write!(f, "{}", chat_id),
            RecordKey::Settings(chat_id) => write!(f, "SETTINGS_{}", chat_id),
        }
    }
}

/// `{chat_id, words}` - the ordered word list of one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordsRecord {
    pub chat_id: u64,
    pub words: Vec<String>,
}

/// `{action, alerts}` - either field may be missing on a partial record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsRecord {
    pub action: Option<i64>,
    pub alerts: Option<bool>,
}

/// Fields to overwrite on a settings upsert. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub action: Option<i64>,
    pub alerts: Option<bool>,
}

impl SettingsPatch {
    pub fn action(action: i64) -> Self {
        Self {
            action: Some(action),
            alerts: None,
        }
    }

    pub fn alerts(alerts: bool) -> Self {
        Self {
            action: None,
            alerts: Some(alerts),
        }
    }

    /// Merge this patch over an existing record.
    #[cfg(test)]
    pub fn apply_to(&self, record: &mut SettingsRecord) {
        if let Some(action) = self.action {
            record.action = Some(action);
        }
        if let Some(alerts) = self.alerts {
            record.alerts = Some(alerts);
        }
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting blacklists and per-chat settings.
///
/// Every write is an upsert keyed by chat.
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    /// Find the word-list record of a chat.
    async fn find_words(&self, chat_id: u64) -> Result<Option<WordsRecord>, BlacklistError>;

    /// Replace a chat's word list, creating the record if needed.
    async fn save_words(&self, chat_id: u64, words: &[String]) -> Result<(), BlacklistError>;

    /// Find the settings record of a chat.
    async fn find_settings(&self, chat_id: u64) -> Result<Option<SettingsRecord>, BlacklistError>;

    /// Upsert the settings record, overwriting only the patched fields.
    async fn save_settings(&self, chat_id: u64, patch: SettingsPatch)
        -> Result<(), BlacklistError>;

    /// Every chat that has a word-list record.
    async fn chat_ids(&self) -> Result<Vec<u64>, BlacklistError>;
}
