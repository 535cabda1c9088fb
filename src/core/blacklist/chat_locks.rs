// Per-chat async locks.
//
// Caches shared between message and membership handlers keep their per-chat
// state behind one of these, so every read-modify-write on a chat runs alone
// while other chats proceed in parallel.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct ChatLocks<T> {
    slots: DashMap<u64, Arc<Mutex<T>>>,
}

impl<T: Default> ChatLocks<T> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Lock the state of one chat, creating it on first use.
    ///
    /// The map shard is only held long enough to clone the slot, never across
    /// the await on the chat's own mutex.
    pub async fn lock(&self, chat_id: u64) -> OwnedMutexGuard<T> {
        let slot = self
            .slots
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(T::default())))
            .clone();
        slot.lock_owned().await
    }
}

impl<T: Default> Default for ChatLocks<T> {
    fn default() -> Self {
        Self::new()
    }
}
