// In-memory BlacklistStore used by the core tests.
//
// Documents are kept under their rendered record key, the same way the
// SQLite store keys its rows.

use crate::core::blacklist::{
    BlacklistError, BlacklistStore, RecordKey, SettingsPatch, SettingsRecord, WordsRecord,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Debug)]
enum Document {
    Words(WordsRecord),
    Settings(SettingsRecord),
}

pub struct InMemoryBlacklistStore {
    documents: DashMap<String, Document>,
    fail_next: AtomicBool,
}

impl InMemoryBlacklistStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Make the next store call fail with a storage error.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), BlacklistError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BlacklistError::StorageError(
                "injected storage failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryBlacklistStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlacklistStore for InMemoryBlacklistStore {
    async fn find_words(&self, chat_id: u64) -> Result<Option<WordsRecord>, BlacklistError> {
        self.check()?;
        Ok(self
            .documents
            .get(&RecordKey::Words(chat_id).to_string())
            .and_then(|doc| match doc.value() {
                Document::Words(record) => Some(record.clone()),
                Document::Settings(_) => None,
            }))
    }

    async fn save_words(&self, chat_id: u64, words: &[String]) -> Result<(), BlacklistError> {
        self.check()?;
        self.documents.insert(
            RecordKey::Words(chat_id).to_string(),
            Document::Words(WordsRecord {
                chat_id,
                words: words.to_vec(),
            }),
        );
        Ok(())
    }

    async fn find_settings(&self, chat_id: u64) -> Result<Option<SettingsRecord>, BlacklistError> {
        self.check()?;
        Ok(self
            .documents
            .get(&RecordKey::Settings(chat_id).to_string())
            .and_then(|doc| match doc.value() {
                Document::Settings(record) => Some(record.clone()),
                Document::Words(_) => None,
            }))
    }

    async fn save_settings(
        &self,
        chat_id: u64,
        patch: SettingsPatch,
    ) -> Result<(), BlacklistError> {
        self.check()?;
        let mut entry = self
            .documents
            .entry(RecordKey::Settings(chat_id).to_string())
            .or_insert_with(|| Document::Settings(SettingsRecord::default()));
        // Settings keys never hold a word list
        if let Document::Settings(record) = entry.value_mut() {
            patch.apply_to(record);
        }
        Ok(())
    }

    async fn chat_ids(&self) -> Result<Vec<u64>, BlacklistError> {
        self.check()?;
        Ok(self
            .documents
            .iter()
            .filter_map(|doc| match doc.value() {
                Document::Words(record) => Some(record.chat_id),
                Document::Settings(_) => None,
            })
            .collect())
    }
}
