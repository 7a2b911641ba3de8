//! Request and response types for the API.

use lease_queue_core::{Message, MessageId, QueueStats, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /messages`
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Message text; required
    pub message: Option<String>,

    /// Opaque auxiliary data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Query string of `GET /messages`
#[derive(Debug, Deserialize)]
pub struct ReceiveParams {
    /// Maximum number of messages to lease, kept raw so it can be validated.
    /// Must be a number of at least 1; fractional values are rounded down.
    pub qty: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Identifier of a created or acknowledged message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageIdResponse {
    pub id: MessageId,
}

/// A message handed to a consumer
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveredMessage {
    pub id: MessageId,
    pub message: String,
    pub payload: Option<serde_json::Value>,
}

impl From<Message> for DeliveredMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            message: message.body,
            payload: message.payload,
        }
    }
}

/// Leased batch returned by `GET /messages`
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiveResponse {
    pub messages: Vec<DeliveredMessage>,
}

/// Queue statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total: usize,
    pub available: usize,
    pub leased: usize,
}

impl From<QueueStats> for StatsResponse {
    fn from(stats: QueueStats) -> Self {
        Self {
            total: stats.total,
            available: stats.available,
            leased: stats.leased,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: Timestamp,
    pub version: String,
    pub lease_duration_ms: u64,
}

/// Error body returned for every rejected request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}
