// Blacklist domain models - data structures for the word filter.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts its own message and member types into these.

use std::time::Duration;

/// How long a "kick" keeps the user out before they may return.
pub const KICK_WINDOW: Duration = Duration::from_secs(60);

/// What happens to the sender when one of their messages trips the blacklist.
///
/// The numeric values are the ones persisted in the settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlacklistMode {
    /// Delete the message only
    #[default]
    Delete,
    /// Remove the user for a short window
    Kick,
    /// Remove the user permanently
    Ban,
    /// Take away the user's right to send messages
    Mute,
}

impl BlacklistMode {
    /// Parse a mode as typed by a moderator. Unknown values are rejected.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(BlacklistMode::Delete),
            1 => Some(BlacklistMode::Kick),
            2 => Some(BlacklistMode::Ban),
            3 => Some(BlacklistMode::Mute),
            _ => None,
        }
    }

    /// Resolve a value read back from storage.
    ///
    /// Records written before modes were validated may hold anything, so
    /// unmapped values fall back to `Delete` instead of failing the read.
    pub fn from_stored(code: i64) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            tracing::warn!(code, "Unknown stored blacklist mode, treating as delete-only");
            BlacklistMode::Delete
        })
    }

    pub fn code(&self) -> i64 {
        match self {
            BlacklistMode::Delete => 0,
            BlacklistMode::Kick => 1,
            BlacklistMode::Ban => 2,
            BlacklistMode::Mute => 3,
        }
    }

    /// The restriction this mode applies, if any.
    pub fn restriction(&self) -> Option<Restriction> {
        match self {
            BlacklistMode::Delete => None,
            BlacklistMode::Kick => Some(Restriction::Remove {
                until: Some(KICK_WINDOW),
            }),
            BlacklistMode::Ban => Some(Restriction::Remove { until: None }),
            BlacklistMode::Mute => Some(Restriction::Silence),
        }
    }

    /// Label used in alerts and audit entries. Empty for delete-only.
    pub fn action_label(&self) -> &'static str {
        match self {
            BlacklistMode::Delete => "",
            BlacklistMode::Kick => "User Kicked",
            BlacklistMode::Ban => "User Banned",
            BlacklistMode::Mute => "User Muted",
        }
    }

    /// Human readable description for the command layer.
    pub fn describe(&self) -> &'static str {
        match self {
            BlacklistMode::Delete => "Deleting Messages",
            BlacklistMode::Kick => "Kicking Users",
            BlacklistMode::Ban => "Banning Users",
            BlacklistMode::Mute => "Muting Users",
        }
    }
}

impl std::fmt::Display for BlacklistMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A restriction placed on a chat member through the messaging platform.
///
/// "Kick" is modelled as a time-boxed removal: the user is removed and may
/// come back once the window has passed. It is not an instantaneous kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restriction {
    /// Remove the member. `None` means permanently.
    Remove { until: Option<Duration> },
    /// Keep the member but revoke send permissions indefinitely.
    Silence,
}

/// Membership status as reported by the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Other,
}

impl MemberStatus {
    /// Admin-type members are exempt from the blacklist.
    pub fn is_admin(&self) -> bool {
        matches!(self, MemberStatus::Creator | MemberStatus::Administrator)
    }
}

/// One entry of a chat's admin roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: u64,
    pub status: MemberStatus,
}

impl Member {
    pub fn new(user_id: u64, status: MemberStatus) -> Self {
        Self { user_id, status }
    }
}

/// A notification that a user's status in a chat changed.
#[derive(Debug, Clone)]
pub struct MembershipUpdate {
    pub chat_id: u64,
    pub old_status: Option<MemberStatus>,
    pub new_member: Member,
}

/// Who sent a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    /// A regular user, with a mention string usable in alerts
    User { user_id: u64, mention: String },
    /// Posted on behalf of a channel or webhook rather than a person
    AnonymousChannel,
    /// The platform could not tell us who sent it
    #[allow(dead_code)] // Discord always names the author
    Unknown,
}

/// An incoming chat message, reduced to what moderation needs.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub sender: Sender,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl IncomingMessage {
    /// The text to scan: the message text, or the caption when there is no text.
    pub fn content(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.caption.as_deref().filter(|c| !c.is_empty()))
    }
}

/// Why the pipeline left a message alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    ChatNotFiltered,
    AnonymousSender,
    Admin,
    NoMatch,
    /// A word matched but neither deletion nor the punitive action went through
    NothingEnforced,
}

/// Terminal state of the moderation pipeline for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    Ignored(IgnoreReason),
    /// Enforcement ran, but the alert and audit entry were skipped as a repeat
    Suppressed { word: String },
    Handled {
        word: String,
        deleted: bool,
        action: String,
    },
}
