//! Message types for queue operations including core domain identifiers.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Unique identifier for messages within the queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Generate new random message ID
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4();
        Self(id.to_string())
    }

    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        // Identifiers travel as a single URL path segment
        if s.contains('/') || s.chars().any(char::is_control) {
            return Err(ValidationError::InvalidFormat {
                field: "message_id".to_string(),
                message: format!("{:?} contains '/' or control characters", s),
            });
        }

        Ok(Self(s.to_string()))
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Whether a message can currently be handed to a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseState {
    /// Visible to `receive_batch`
    Available,
    /// Claimed by a consumer until acknowledged or the lease expires
    Leased,
}

impl LeaseState {
    pub fn is_leased(&self) -> bool {
        matches!(self, Self::Leased)
    }
}

/// A message held by the queue.
///
/// `id`, `body` and `payload` never change after creation; only `lease_state`
/// moves, and only through the store's transition operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub body: String,
    pub payload: Option<serde_json::Value>,
    pub lease_state: LeaseState,
    pub enqueued_at: Timestamp,
}

impl Message {
    pub(crate) fn new(id: MessageId, body: String, payload: Option<serde_json::Value>) -> Self {
        Self {
            id,
            body,
            payload,
            lease_state: LeaseState::Available,
            enqueued_at: Timestamp::now(),
        }
    }

    /// Check if the message can be handed to a consumer
    pub fn is_available(&self) -> bool {
        self.lease_state == LeaseState::Available
    }
}

/// Point-in-time counts of the messages held by a queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub available: usize,
    pub leased: usize,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
