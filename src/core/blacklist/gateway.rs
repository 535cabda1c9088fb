// Ports to the messaging platform.
//
// The core never talks to Discord directly. It asks a `ChatGateway` to act on
// chats and an `AuditLog` to record what happened in the log channel.

use super::blacklist_models::{IncomingMessage, Member, Restriction};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The bot lacks the permission to do this
    #[error("Missing permissions: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Short name of the failure class, used in audit entries.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Forbidden(_) => "Forbidden",
            GatewayError::NotFound(_) => "NotFound",
            GatewayError::Http(_) => "Http",
            GatewayError::Other(_) => "Other",
        }
    }
}

/// Operations moderation needs from the messaging platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Restrict a member of a chat.
    async fn restrict_member(
        &self,
        chat_id: u64,
        user_id: u64,
        restriction: Restriction,
    ) -> Result<(), GatewayError>;

    /// Fetch the full admin roster (creator and administrators) of a chat.
    async fn chat_admins(&self, chat_id: u64) -> Result<Vec<Member>, GatewayError>;

    /// Delete a message. Returns whether the platform reported it deleted.
    async fn delete_message(&self, message: &IncomingMessage) -> Result<bool, GatewayError>;

    /// Post a visible message in the chat the message came from.
    async fn send_alert(&self, message: &IncomingMessage, text: &str) -> Result<(), GatewayError>;
}

/// The audit channel moderation activity is reported to.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Copy the original message into the audit channel.
    async fn forward(&self, message: &IncomingMessage) -> Result<(), GatewayError>;

    /// Write a line to the audit channel.
    async fn log(&self, text: &str) -> Result<(), GatewayError>;
}
