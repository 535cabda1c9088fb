// Admin cache - the in-memory admin roster of every chat we moderate.
//
// A chat's roster is fetched from the platform on first use (or at startup)
// and afterwards kept up to date from membership events. Loading and applying
// events take the same per-chat lock, so a burst of cold lookups triggers one
// fetch and no event is applied to a half-loaded roster.

use super::blacklist_models::{Member, MembershipUpdate};
use super::chat_locks::ChatLocks;
use super::gateway::{ChatGateway, GatewayError};
use std::sync::Arc;

/// What a membership update did to the cached roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    /// User became an admin
    Added,
    /// Admin was demoted or left
    Removed,
    /// Admin record replaced (e.g. new permissions)
    Replaced,
    Unchanged,
}

pub struct AdminCache<G: ChatGateway> {
    gateway: Arc<G>,
    /// `None` until the chat's roster has been fetched.
    rosters: ChatLocks<Option<Vec<Member>>>,
}

impl<G: ChatGateway> AdminCache<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            rosters: ChatLocks::new(),
        }
    }

    /// Find a user in a chat's admin roster, loading the roster if needed.
    pub async fn lookup(&self, chat_id: u64, user_id: u64) -> Result<Option<Member>, GatewayError> {
        let mut roster = self.rosters.lock(chat_id).await;
        let admins = self.ensure_loaded(chat_id, &mut roster).await?;
        Ok(admins.iter().find(|m| m.user_id == user_id).cloned())
    }

    /// Snapshot of a chat's admin roster, loading it if needed.
    #[cfg(test)]
    pub async fn roster(&self, chat_id: u64) -> Result<Vec<Member>, GatewayError> {
        let mut roster = self.rosters.lock(chat_id).await;
        Ok(self.ensure_loaded(chat_id, &mut roster).await?.clone())
    }

    /// Apply a membership change to the cached roster.
    ///
    /// The last update seen for a user decides whether they are in the roster.
    pub async fn apply_update(&self, update: &MembershipUpdate) -> Result<RosterChange, GatewayError> {
        let chat_id = update.chat_id;
        let member = &update.new_member;

        let mut roster = self.rosters.lock(chat_id).await;
        let admins = self.ensure_loaded(chat_id, &mut roster).await?;

        let change = match admins.iter().position(|m| m.user_id == member.user_id) {
            None if member.status.is_admin() => {
                admins.push(member.clone());
                RosterChange::Added
            }
            None => RosterChange::Unchanged,
            Some(index) if member.status.is_admin() => {
                admins[index] = member.clone();
                RosterChange::Replaced
            }
            Some(index) => {
                admins.remove(index);
                RosterChange::Removed
            }
        };

        if change != RosterChange::Unchanged {
            tracing::debug!(
                chat_id,
                user_id = member.user_id,
                old_status = ?update.old_status,
                new_status = ?member.status,
                change = ?change,
                "Admin roster updated"
            );
        }

        Ok(change)
    }

    /// Load the rosters of the given chats up front.
    ///
    /// A chat that fails to load stays cold and is retried on first use.
    /// Returns how many chats were loaded.
    pub async fn warm(&self, chat_ids: impl IntoIterator<Item = u64>) -> usize {
        let mut loaded = 0;
        for chat_id in chat_ids {
            let mut roster = self.rosters.lock(chat_id).await;
            match self.ensure_loaded(chat_id, &mut roster).await {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!(chat_id, "Failed to pre-load admin roster: {}", e),
            }
        }
        tracing::info!(chats = loaded, "Admin rosters pre-loaded");
        loaded
    }

    async fn ensure_loaded<'r>(
        &self,
        chat_id: u64,
        roster: &'r mut Option<Vec<Member>>,
    ) -> Result<&'r mut Vec<Member>, GatewayError> {
        if roster.is_none() {
            let admins = self.gateway.chat_admins(chat_id).await?;
            tracing::debug!(chat_id, admins = admins.len(), "Loaded admin roster");
            *roster = Some(admins);
        }
        Ok(roster.get_or_insert_with(Vec::new))
    }
}
