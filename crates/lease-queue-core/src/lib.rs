//! # Lease Queue Core
//!
//! In-process message queue with lease-based, at-least-once delivery.
//!
//! Producers submit messages; consumers lease a batch of available messages
//! and must acknowledge each one before its lease expires, otherwise the
//! message becomes available again and is redelivered.
//!
//! ## Module Organization
//!
//! - [`error`] - Error taxonomy for queue operations
//! - [`message`] - Message model and identifiers
//! - [`config`] - Queue configuration
//! - [`store`] - Insertion-ordered in-memory message store
//! - [`scheduler`] - Per-message lease expiry timers
//! - [`service`] - Dispatch service enforcing the lease lifecycle
//!
//! ## Usage
//!
//! ```rust
//! use lease_queue_core::{MessageQueue, QueueConfig, QueueService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), lease_queue_core::QueueError> {
//! let service = QueueService::from_config(&QueueConfig::default());
//!
//! let id = service.submit("hello".to_string(), None).await?;
//! let batch = service.receive_batch(Some(10)).await?;
//! assert_eq!(batch[0].id, id);
//!
//! service.acknowledge(&id).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod message;
pub mod scheduler;
pub mod service;
pub mod store;

pub use config::{QueueConfig, DEFAULT_LEASE_DURATION_MS, LEASE_DURATION_ENV};
pub use error::{ConfigurationError, ErrorKind, QueueError, ValidationError};
pub use message::{LeaseState, Message, MessageId, QueueStats, Timestamp};
pub use scheduler::{Expiry, LeaseScheduler};
pub use service::{MessageQueue, QueueService};
pub use store::MessageStore;

/// Standard result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
