// Word list service - the per-chat set of blacklisted words.
//
// Words are normalized (trimmed, lower-cased) before they are stored or
// compared, kept unique per chat, and kept in insertion order because the
// order decides which word is reported when several match.

use super::blacklist_store::{BlacklistError, BlacklistStore};
use super::chat_locks::ChatLocks;
use super::gateway::AuditLog;
use dashmap::DashSet;
use std::collections::HashSet;
use std::sync::Arc;

/// Trim and lower-case a word. Blank input is rejected.
pub fn normalize_word(word: &str) -> Result<String, BlacklistError> {
    let word = word.trim().to_lowercase();
    if word.is_empty() {
        return Err(BlacklistError::EmptyWord);
    }
    Ok(word)
}

pub struct WordList<S: BlacklistStore, A: AuditLog> {
    store: Arc<S>,
    audit: Arc<A>,
    /// Chats that have a word-list record; only these are filtered.
    active_chats: DashSet<u64>,
    /// Serializes list edits per chat so concurrent adds are not lost.
    edit_locks: ChatLocks<()>,
}

impl<S: BlacklistStore, A: AuditLog> WordList<S, A> {
    pub fn new(store: Arc<S>, audit: Arc<A>) -> Self {
        Self {
            store,
            audit,
            active_chats: DashSet::new(),
            edit_locks: ChatLocks::new(),
        }
    }

    /// Blacklist a word in a chat.
    ///
    /// Returns `true` if the word was added, `false` if it was already there.
    pub async fn add_word(&self, chat_id: u64, word: &str) -> Result<bool, BlacklistError> {
        let word = normalize_word(word)?;
        let _guard = self.edit_locks.lock(chat_id).await;

        let mut words = self
            .store
            .find_words(chat_id)
            .await?
            .map(|record| record.words)
            .unwrap_or_default();

        if words.contains(&word) {
            self.active_chats.insert(chat_id);
            return Ok(false);
        }

        words.push(word.clone());
        self.store.save_words(chat_id, &words).await?;
        self.active_chats.insert(chat_id);

        tracing::info!(chat_id, word = %word, "Blacklisted word added");
        self.audit_trail(&format!("`{}` added in `{}`", word, chat_id))
            .await;

        Ok(true)
    }

    /// Remove a word from a chat's blacklist.
    pub async fn remove_word(&self, chat_id: u64, word: &str) -> Result<(), BlacklistError> {
        let word = normalize_word(word)?;
        let _guard = self.edit_locks.lock(chat_id).await;

        let mut words = match self.store.find_words(chat_id).await? {
            Some(record) => record.words,
            None => return Err(BlacklistError::NotFound(word)),
        };

        let position = words
            .iter()
            .position(|w| *w == word)
            .ok_or_else(|| BlacklistError::NotFound(word.clone()))?;
        words.remove(position);

        self.store.save_words(chat_id, &words).await?;

        tracing::info!(chat_id, word = %word, "Blacklisted word removed");
        self.audit_trail(&format!("`{}` removed in `{}`", word, chat_id))
            .await;

        Ok(())
    }

    /// All blacklisted words of a chat, in the order they were added.
    pub async fn list_words(&self, chat_id: u64) -> Result<Vec<String>, BlacklistError> {
        Ok(self
            .store
            .find_words(chat_id)
            .await?
            .map(|record| record.words)
            .unwrap_or_default())
    }

    /// Bulk-load every chat that has a blacklist. Called once at startup.
    pub async fn load_all_chats(&self) -> Result<HashSet<u64>, BlacklistError> {
        let chats: HashSet<u64> = self.store.chat_ids().await?.into_iter().collect();
        for chat_id in &chats {
            self.active_chats.insert(*chat_id);
        }
        tracing::info!(chats = chats.len(), "Loaded blacklisted chats");
        Ok(chats)
    }

    /// Whether messages in this chat are filtered at all.
    pub fn is_active(&self, chat_id: u64) -> bool {
        self.active_chats.contains(&chat_id)
    }

    async fn audit_trail(&self, text: &str) {
        if let Err(e) = self.audit.log(text).await {
            tracing::warn!("Failed to write blacklist change to audit log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blacklist::test_support::RecordingAudit;
    use crate::infra::blacklist::InMemoryBlacklistStore;

    fn word_list() -> (
        WordList<InMemoryBlacklistStore, RecordingAudit>,
        Arc<InMemoryBlacklistStore>,
        Arc<RecordingAudit>,
    ) {
        let store = Arc::new(InMemoryBlacklistStore::new());
        let audit = Arc::new(RecordingAudit::new());
        (
            WordList::new(Arc::clone(&store), Arc::clone(&audit)),
            store,
            audit,
        )
    }

    #[tokio::test]
    async fn test_add_is_idempotent_after_normalization() {
        let (words, _, _) = word_list();

        assert!(words.add_word(1, "BAD ").await.unwrap());
        assert!(!words.add_word(1, "bad").await.unwrap());
        assert!(!words.add_word(1, " Bad").await.unwrap());

        assert_eq!(words.list_words(1).await.unwrap(), vec!["bad".to_string()]);
    }

    #[tokio::test]
    async fn test_insertion_order_is_preserved() {
        let (words, _, _) = word_list();

        words.add_word(1, "spam").await.unwrap();
        words.add_word(1, "scam").await.unwrap();
        words.add_word(1, "ham").await.unwrap();

        assert_eq!(
            words.list_words(1).await.unwrap(),
            vec!["spam".to_string(), "scam".to_string(), "ham".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_missing_word_is_not_found() {
        let (words, _, _) = word_list();
        words.add_word(1, "bad").await.unwrap();

        let result = words.remove_word(1, "ghost").await;
        assert!(matches!(result, Err(BlacklistError::NotFound(w)) if w == "ghost"));
        assert_eq!(words.list_words(1).await.unwrap(), vec!["bad".to_string()]);

        // A chat without any record behaves the same way
        let result = words.remove_word(2, "bad").await;
        assert!(matches!(result, Err(BlacklistError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_normalizes_input() {
        let (words, _, _) = word_list();
        words.add_word(1, "bad").await.unwrap();
        words.add_word(1, "worse").await.unwrap();

        words.remove_word(1, "  BAD").await.unwrap();

        assert_eq!(words.list_words(1).await.unwrap(), vec!["worse".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_word_is_rejected() {
        let (words, _, _) = word_list();
        assert!(matches!(
            words.add_word(1, "   ").await,
            Err(BlacklistError::EmptyWord)
        ));
        assert!(!words.is_active(1));
    }

    #[tokio::test]
    async fn test_list_of_unknown_chat_is_empty() {
        let (words, _, _) = word_list();
        assert!(words.list_words(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_all_chats_seeds_active_set() {
        let (words, store, _) = word_list();
        store.save_words(10, &["a".to_string()]).await.unwrap();
        store.save_words(20, &[]).await.unwrap();

        let chats = words.load_all_chats().await.unwrap();

        assert_eq!(chats, HashSet::from([10, 20]));
        assert!(words.is_active(10));
        assert!(words.is_active(20));
        assert!(!words.is_active(30));
    }

    #[tokio::test]
    async fn test_changes_are_written_to_audit_log() {
        let (words, _, audit) = word_list();

        words.add_word(5, "bad").await.unwrap();
        words.add_word(5, "bad").await.unwrap();
        words.remove_word(5, "bad").await.unwrap();

        assert_eq!(
            audit.entries(),
            vec![
                "`bad` added in `5`".to_string(),
                "`bad` removed in `5`".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (words, store, _) = word_list();
        store.fail_next_call();

        let result = words.add_word(1, "bad").await;
        assert!(matches!(result, Err(BlacklistError::StorageError(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_keep_every_word() {
        let (words, _, _) = word_list();
        let words = Arc::new(words);

        let mut tasks = Vec::new();
        for i in 0..20 {
            let words = Arc::clone(&words);
            tasks.push(tokio::spawn(async move {
                words.add_word(1, &format!("word{}", i)).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(words.list_words(1).await.unwrap().len(), 20);
    }
}
