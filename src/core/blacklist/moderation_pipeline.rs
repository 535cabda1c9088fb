// Moderation pipeline - runs every incoming message through the blacklist.
//
// Order of work for a message:
// 1. skip chats without a blacklist, anonymous senders and admins
// 2. look for a blacklisted word
// 3. forward the message to the audit channel, delete it, apply the chat's action
// 4. alert in the chat and write an audit entry, unless it's a repeat
//
// Deletion and the action are best-effort. Their failures are logged and the
// pipeline carries on with whatever went through.

use super::action_dispatcher::ActionDispatcher;
use super::admin_cache::{AdminCache, RosterChange};
use super::alert_dedup::AlertDeduper;
use super::blacklist_models::{
    IgnoreReason, IncomingMessage, MembershipUpdate, ModerationOutcome, Sender,
};
use super::blacklist_store::{BlacklistError, BlacklistStore};
use super::chat_settings::ChatSettings;
use super::gateway::{AuditLog, ChatGateway, GatewayError};
use super::matcher;
use super::word_list::WordList;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Failed to read blacklist: {0}")]
    Store(#[from] BlacklistError),

    #[error("Failed to load admin roster: {0}")]
    AdminRoster(#[from] GatewayError),
}

pub struct ModerationPipeline<S: BlacklistStore, G: ChatGateway, A: AuditLog> {
    words: Arc<WordList<S, A>>,
    settings: Arc<ChatSettings<S>>,
    admins: AdminCache<G>,
    dispatcher: ActionDispatcher<S, G>,
    deduper: AlertDeduper,
    gateway: Arc<G>,
    audit: Arc<A>,
}

impl<S: BlacklistStore, G: ChatGateway, A: AuditLog> ModerationPipeline<S, G, A> {
    pub fn new(store: Arc<S>, gateway: Arc<G>, audit: Arc<A>) -> Self {
        let words = Arc::new(WordList::new(Arc::clone(&store), Arc::clone(&audit)));
        let settings = Arc::new(ChatSettings::new(store));

        Self {
            words,
            admins: AdminCache::new(Arc::clone(&gateway)),
            dispatcher: ActionDispatcher::new(Arc::clone(&settings), Arc::clone(&gateway)),
            settings,
            deduper: AlertDeduper::new(),
            gateway,
            audit,
        }
    }

    pub fn words(&self) -> &WordList<S, A> {
        &self.words
    }

    pub fn settings(&self) -> &ChatSettings<S> {
        &self.settings
    }

    /// Load every chat with a blacklist and optionally pre-load their admin rosters.
    ///
    /// Run this before live events are handled. Without the pre-load, rosters
    /// are fetched on first use instead.
    pub async fn start(&self, warm_admins: bool) -> Result<usize, BlacklistError> {
        let chats = self.words.load_all_chats().await?;
        if warm_admins {
            self.admins.warm(chats.iter().copied()).await;
        }
        Ok(chats.len())
    }

    /// Keep the admin roster in sync with a membership change.
    ///
    /// Chats without a blacklist are skipped; their roster is loaded on first use.
    pub async fn handle_membership_update(
        &self,
        update: &MembershipUpdate,
    ) -> Result<RosterChange, GatewayError> {
        if !self.words.is_active(update.chat_id) {
            return Ok(RosterChange::Unchanged);
        }
        self.admins.apply_update(update).await
    }

    /// Check one message against its chat's blacklist and enforce it.
    pub async fn handle_message(
        &self,
        message: &IncomingMessage,
    ) -> Result<ModerationOutcome, ModerationError> {
        let chat_id = message.chat_id;

        if !self.words.is_active(chat_id) {
            return Ok(ModerationOutcome::Ignored(IgnoreReason::ChatNotFiltered));
        }

        let (user_id, mention) = match &message.sender {
            Sender::User { user_id, mention } => (*user_id, mention.as_str()),
            Sender::AnonymousChannel | Sender::Unknown => {
                return Ok(ModerationOutcome::Ignored(IgnoreReason::AnonymousSender))
            }
        };

        if self.admins.lookup(chat_id, user_id).await?.is_some() {
            return Ok(ModerationOutcome::Ignored(IgnoreReason::Admin));
        }

        let Some(content) = message.content() else {
            return Ok(ModerationOutcome::Ignored(IgnoreReason::NoMatch));
        };
        let words = self.words.list_words(chat_id).await?;
        let Some(word) = matcher::search(&words, content).map(str::to_string) else {
            return Ok(ModerationOutcome::Ignored(IgnoreReason::NoMatch));
        };

        tracing::debug!(chat_id, user_id, word = %word, "Blacklisted word matched");

        if let Err(e) = self.audit.forward(message).await {
            tracing::warn!(chat_id, "Failed to forward blacklisted message: {}", e);
        }

        let deleted = match self.gateway.delete_message(message).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(chat_id, message_id = message.message_id, "Failed to delete message: {}", e);
                false
            }
        };

        let action = match self.dispatcher.apply(chat_id, user_id).await {
            Ok(label) => label,
            Err(e) => {
                tracing::error!(chat_id, user_id, "Blacklist action failed: {}", e);
                self.audit_line(&format!("Unhandled Error {}: `{}`", e.kind(), e))
                    .await;
                String::new()
            }
        };

        if !deleted && action.is_empty() {
            return Ok(ModerationOutcome::Ignored(IgnoreReason::NothingEnforced));
        }

        // Held until the violation is remembered
        let mut slot = self.deduper.slot(chat_id).await;
        if slot.should_suppress(user_id, &word) {
            tracing::debug!(chat_id, user_id, word = %word, "Repeated violation, alert suppressed");
            return Ok(ModerationOutcome::Suppressed { word });
        }

        let action_suffix = if action.is_empty() {
            String::new()
        } else {
            format!("\nAction: {}", action)
        };

        if self.alerts_enabled(chat_id).await {
            let alert = if deleted {
                format!(
                    "{} has triggered a blacklisted word. Their message was deleted.{}",
                    mention, action_suffix
                )
            } else {
                format!("{} has triggered a blacklisted word.{}", mention, action_suffix)
            };
            if let Err(e) = self.gateway.send_alert(message, &alert).await {
                tracing::warn!(chat_id, "Failed to post blacklist alert: {}", e);
            }
        }

        self.audit_line(&format!("{} triggered `{}`{}", mention, word, action_suffix))
            .await;
        slot.remember(user_id, &word);

        tracing::info!(
            chat_id,
            user_id,
            word = %word,
            deleted,
            action = %action,
            "Blacklist violation handled"
        );

        Ok(ModerationOutcome::Handled {
            word,
            deleted,
            action,
        })
    }

    async fn alerts_enabled(&self, chat_id: u64) -> bool {
        match self.settings.get_alerts(chat_id).await {
            Ok(enabled) => enabled,
            Err(e) => {
                tracing::warn!(chat_id, "Failed to read alert setting, assuming enabled: {}", e);
                true
            }
        }
    }

    async fn audit_line(&self, text: &str) {
        if let Err(e) = self.audit.log(text).await {
            tracing::warn!("Failed to write audit entry: {}", e);
        }
    }
}
