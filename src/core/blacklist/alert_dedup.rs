// Alert deduplication - one remembered violation per chat.
//
// When the same user trips the same word twice in a row in a chat, the second
// alert and audit entry are skipped. Only the most recent handled violation is
// kept; it is a single slot, not a history.

use super::chat_locks::ChatLocks;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey {
    pub user_id: u64,
    pub word: String,
}

pub struct AlertDeduper {
    slots: ChatLocks<Option<DedupKey>>,
}

/// Exclusive access to one chat's slot.
///
/// Hold it from the suppression check until the violation is remembered so
/// two messages of the same chat cannot both pass the check.
pub struct AlertSlot {
    slot: OwnedMutexGuard<Option<DedupKey>>,
}

impl AlertSlot {
    /// True iff the remembered violation is exactly this user and word.
    pub fn should_suppress(&self, user_id: u64, word: &str) -> bool {
        matches!(&*self.slot, Some(last) if last.user_id == user_id && last.word == word)
    }

    /// Overwrite the slot with this violation.
    pub fn remember(&mut self, user_id: u64, word: &str) {
        *self.slot = Some(DedupKey {
            user_id,
            word: word.to_string(),
        });
    }
}

impl AlertDeduper {
    pub fn new() -> Self {
        Self {
            slots: ChatLocks::new(),
        }
    }

    /// Lock a chat's slot for a check-then-remember sequence.
    pub async fn slot(&self, chat_id: u64) -> AlertSlot {
        AlertSlot {
            slot: self.slots.lock(chat_id).await,
        }
    }
}

impl Default for AlertDeduper {
    fn default() -> Self {
        Self::new()
    }
}
