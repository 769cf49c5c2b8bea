//! Session state — per-user conversation history and the single pending action.
//!
//! Sessions are keyed by user identity (the customer's email), created lazily
//! on first contact and kept for the lifetime of the store. The history is a
//! bounded window of rendered turns; the pending action is a single slot.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::InventoryItem;
use crate::error::SessionError;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Customer,
    Agent,
}

/// One rendered line of conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn customer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Customer,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// An action proposed to the customer and awaiting a yes/no answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposedAction {
    /// Buy one unit of a catalogue item at the quoted price.
    Purchase { product: InventoryItem },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub action: ProposedAction,
    pub created_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn purchase(product: InventoryItem) -> Self {
        Self {
            action: ProposedAction::Purchase { product },
            created_at: Utc::now(),
        }
    }

    /// Whether the action is older than `ttl` at `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > ttl
    }
}

/// Conversation state for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: String,

    /// Store version this snapshot was read at (0 = never stored).
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub history: VecDeque<Turn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingAction>,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            version: 0,
            history: VecDeque::new(),
            pending: None,
        }
    }

    /// Append a turn, dropping the oldest turns beyond `limit`.
    pub fn push_turn(&mut self, turn: Turn, limit: usize) {
        self.history.push_back(turn);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }

    /// Store a pending action, silently replacing any previous one.
    pub fn set_pending(&mut self, action: PendingAction) -> Option<PendingAction> {
        self.pending.replace(action)
    }

    pub fn clear_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending action if it is older than `ttl`. Returns whether one was dropped.
    pub fn expire_pending(&mut self, ttl: Duration, now: DateTime<Utc>) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.is_expired(ttl, now)) {
            self.pending = None;
            return true;
        }
        false
    }}

/// Storage for sessions.
///
/// `compare_and_swap` is the write path used by the chat pipeline, so a
/// shared or distributed store can detect lost updates. Callers still
/// serialize work per user; see `concierge_session::SessionLocks`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    async fn get(&self, user: &str) -> Result<Option<Session>, SessionError>;

    /// Unconditional write. Returns the new version.
    async fn put(&self, session: Session) -> Result<u64, SessionError>;

    /// Write only if the stored version still equals `session.version`
    /// (0 when absent). Returns the new version.
    async fn compare_and_swap(&self, session: Session) -> Result<u64, SessionError>;

    /// Fetch the user's session or a fresh, unsaved one.
    async fn load_or_new(&self, user: &str) -> Result<Session, SessionError> {
        Ok(self.get(user).await?.unwrap_or_else(|| Session::new(user)))
    }
}
