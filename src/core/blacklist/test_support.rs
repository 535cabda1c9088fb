// In-memory fakes of the platform ports, shared by the blacklist tests.

use super::blacklist_models::{IncomingMessage, Member, Restriction};
use super::gateway::{AuditLog, ChatGateway, GatewayError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records every platform call and lets a test make them fail.
#[derive(Default)]
pub struct FakeGateway {
    admins: Mutex<HashMap<u64, Vec<Member>>>,
    restrictions: Mutex<Vec<(u64, u64, Restriction)>>,
    deleted: Mutex<Vec<u64>>,
    alerts: Mutex<Vec<(u64, String)>>,
    roster_fetches: AtomicUsize,
    fail_rosters: AtomicBool,
    fail_restrictions: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_admins(&self, chat_id: u64, admins: Vec<Member>) {
        self.admins.lock().unwrap().insert(chat_id, admins);
    }

    pub fn roster_fetches(&self) -> usize {
        self.roster_fetches.load(Ordering::SeqCst)
    }

    pub fn restrictions(&self) -> Vec<(u64, u64, Restriction)> {
        self.restrictions.lock().unwrap().clone()
    }

    /// Ids of the deleted messages, in order.
    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }

    /// `(message_id, text)` of every alert posted.
    pub fn alerts(&self) -> Vec<(u64, String)> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn fail_roster_fetches(&self, fail: bool) {
        self.fail_rosters.store(fail, Ordering::SeqCst);
    }

    pub fn fail_restrictions(&self, fail: bool) {
        self.fail_restrictions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    async fn restrict_member(
        &self,
        chat_id: u64,
        user_id: u64,
        restriction: Restriction,
    ) -> Result<(), GatewayError> {
        if self.fail_restrictions.load(Ordering::SeqCst) {
            return Err(GatewayError::Forbidden("BAN_MEMBERS".to_string()));
        }
        self.restrictions
            .lock()
            .unwrap()
            .push((chat_id, user_id, restriction));
        Ok(())
    }

    async fn chat_admins(&self, chat_id: u64) -> Result<Vec<Member>, GatewayError> {
        self.roster_fetches.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to interleave
        tokio::task::yield_now().await;
        if self.fail_rosters.load(Ordering::SeqCst) {
            return Err(GatewayError::Http("roster unavailable".to_string()));
        }
        Ok(self
            .admins
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_message(&self, message: &IncomingMessage) -> Result<bool, GatewayError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(GatewayError::Forbidden("MANAGE_MESSAGES".to_string()));
        }
        self.deleted.lock().unwrap().push(message.message_id);
        Ok(true)
    }

    async fn send_alert(&self, message: &IncomingMessage, text: &str) -> Result<(), GatewayError> {
        self.alerts
            .lock()
            .unwrap()
            .push((message.message_id, text.to_string()));
        Ok(())
    }
}

/// Collects audit-channel traffic.
#[derive(Default)]
pub struct RecordingAudit {
    forwarded: Mutex<Vec<u64>>,
    entries: Mutex<Vec<String>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the forwarded messages, in order.
    pub fn forwarded(&self) -> Vec<u64> {
        self.forwarded.lock().unwrap().clone()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.forwarded.lock().unwrap().clear();
        self.entries.lock().unwrap().clear();
    }
}

#[async_trait]
impl AuditLog for RecordingAudit {
    async fn forward(&self, message: &IncomingMessage) -> Result<(), GatewayError> {
        self.forwarded.lock().unwrap().push(message.message_id);
        Ok(())
    }

    async fn log(&self, text: &str) -> Result<(), GatewayError> {
        self.entries.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
