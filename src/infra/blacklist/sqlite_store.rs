// SQLite-backed blacklist store.
//
// One table holds both kinds of documents:
// - word lists, keyed by the chat id, with `words` as a JSON array
// - settings, keyed by `SETTINGS_<chat_id>`, with `action` and `alerts`

use crate::core::blacklist::{
    BlacklistError, BlacklistStore, RecordKey, SettingsPatch, SettingsRecord, WordsRecord,
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteBlacklistStore {
    pool: Pool<Sqlite>,
}

fn storage_error(e: impl std::fmt::Display) -> BlacklistError {
    BlacklistError::StorageError(e.to_string())
}

impl SqliteBlacklistStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !in_memory && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        // Every connection to :memory: would open its own empty database
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&conn_str)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(database = %database_url, "Blacklist store ready");
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blacklist_documents (
                key TEXT PRIMARY KEY,
                chat_id INTEGER NOT NULL,
                words TEXT,
                action INTEGER,
                alerts BOOLEAN
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl BlacklistStore for SqliteBlacklistStore {
    async fn find_words(&self, chat_id: u64) -> Result<Option<WordsRecord>, BlacklistError> {
        let row = sqlx::query("SELECT words FROM blacklist_documents WHERE key = ?")
            .bind(RecordKey::Words(chat_id).to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let words_json: Option<String> = row.try_get("words").map_err(storage_error)?;
        let words = match words_json {
            Some(json) => serde_json::from_str(&json).map_err(storage_error)?,
            None => Vec::new(),
        };

        Ok(Some(WordsRecord { chat_id, words }))
    }

    async fn save_words(&self, chat_id: u64, words: &[String]) -> Result<(), BlacklistError> {
        let words_json = serde_json::to_string(words).map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO blacklist_documents (key, chat_id, words)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                words = excluded.words
            "#,
        )
        .bind(RecordKey::Words(chat_id).to_string())
        .bind(chat_id as i64)
        .bind(words_json)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn find_settings(&self, chat_id: u64) -> Result<Option<SettingsRecord>, BlacklistError> {
        let row = sqlx::query("SELECT action, alerts FROM blacklist_documents WHERE key = ?")
            .bind(RecordKey::Settings(chat_id).to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(|row| {
            Ok(SettingsRecord {
                action: row.try_get("action").map_err(storage_error)?,
                alerts: row.try_get("alerts").map_err(storage_error)?,
            })
        })
        .transpose()
    }

    async fn save_settings(
        &self,
        chat_id: u64,
        patch: SettingsPatch,
    ) -> Result<(), BlacklistError> {
        // A NULL in the patch keeps whatever is stored
        sqlx::query(
            r#"
            INSERT INTO blacklist_documents (key, chat_id, action, alerts)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                action = COALESCE(excluded.action, action),
                alerts = COALESCE(excluded.alerts, alerts)
            "#,
        )
        .bind(RecordKey::Settings(chat_id).to_string())
        .bind(chat_id as i64)
        .bind(patch.action)
        .bind(patch.alerts)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn chat_ids(&self) -> Result<Vec<u64>, BlacklistError> {
        let mut rows =
            sqlx::query("SELECT chat_id FROM blacklist_documents WHERE words IS NOT NULL")
                .fetch(&self.pool);

        let mut chat_ids = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(storage_error)? {
            let chat_id: i64 = row.try_get("chat_id").map_err(storage_error)?;
            chat_ids.push(chat_id as u64);
        }
        Ok(chat_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_store() -> (SqliteBlacklistStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("blacklist.db");
        let store = SqliteBlacklistStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_creates_missing_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("blacklist.db");

        SqliteBlacklistStore::new(path.to_str().unwrap())
            .await
            .unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_words_round_trip_in_order() {
        let (store, _dir) = temp_store().await;
        assert_eq!(store.find_words(1).await.unwrap(), None);

        let words = vec!["spam".to_string(), "scam".to_string()];
        store.save_words(1, &words).await.unwrap();
        assert_eq!(
            store.find_words(1).await.unwrap(),
            Some(WordsRecord { chat_id: 1, words })
        );

        store.save_words(1, &["ham".to_string()]).await.unwrap();
        assert_eq!(
            store.find_words(1).await.unwrap().unwrap().words,
            vec!["ham".to_string()]
        );
    }

    #[tokio::test]
    async fn test_settings_patches_merge() {
        let (store, _dir) = temp_store().await;
        assert_eq!(store.find_settings(1).await.unwrap(), None);

        store.save_settings(1, SettingsPatch::action(2)).await.unwrap();
        assert_eq!(
            store.find_settings(1).await.unwrap(),
            Some(SettingsRecord {
                action: Some(2),
                alerts: None
            })
        );

        store.save_settings(1, SettingsPatch::alerts(false)).await.unwrap();
        store.save_settings(1, SettingsPatch::action(3)).await.unwrap();
        assert_eq!(
            store.find_settings(1).await.unwrap(),
            Some(SettingsRecord {
                action: Some(3),
                alerts: Some(false)
            })
        );
    }

    #[tokio::test]
    async fn test_chat_ids_skip_settings_records() {
        let (store, _dir) = temp_store().await;
        store.save_words(10, &["a".to_string()]).await.unwrap();
        store.save_words(20, &[]).await.unwrap();
        store.save_settings(30, SettingsPatch::alerts(true)).await.unwrap();

        let mut chats = store.chat_ids().await.unwrap();
        chats.sort_unstable();
        assert_eq!(chats, vec![10, 20]);

        // Settings of a chat with words do not make it appear twice
        store.save_settings(10, SettingsPatch::action(1)).await.unwrap();
        assert_eq!(store.chat_ids().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteBlacklistStore::new(path).await.unwrap();
            store.save_words(5, &["bad".to_string()]).await.unwrap();
            store.save_settings(5, SettingsPatch::action(1)).await.unwrap();
        }

        let store = SqliteBlacklistStore::new(path).await.unwrap();
        assert_eq!(store.chat_ids().await.unwrap(), vec![5]);
        assert_eq!(
            store.find_settings(5).await.unwrap().unwrap().action,
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let store = SqliteBlacklistStore::new("sqlite::memory:").await.unwrap();
        store.save_words(1, &["bad".to_string()]).await.unwrap();
        assert_eq!(store.chat_ids().await.unwrap(), vec![1]);
    }
}
