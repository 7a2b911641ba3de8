//! Lease-based dispatch service.
//!
//! [`QueueService`] enforces the message lifecycle on top of a
//! [`MessageStore`] and a [`LeaseScheduler`]:
//!
//! ```text
//! submit ──► Available ──receive_batch──► Leased ──acknowledge──► deleted
//!                ▲                          │
//!                └──────lease expiry────────┘
//! ```
//!
//! Every read-then-write sequence (list-then-lease, get-check-delete,
//! get-check-revert) runs under the service's dispatch lock. Lock order is
//! always dispatch lock first, then the store or scheduler lock; neither of
//! those calls back into the service while holding its own lock.

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::message::{Message, MessageId, QueueStats};
use crate::scheduler::{Expiry, LeaseScheduler};
use crate::store::MessageStore;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

/// Consumer- and producer-facing queue operations
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Store a new message and return its identifier
    async fn submit(
        &self,
        body: String,
        payload: Option<serde_json::Value>,
    ) -> Result<MessageId, QueueError>;

    /// Lease up to `quantity` available messages in insertion order.
    ///
    /// `None` or a non-positive quantity leases every available message.
    async fn receive_batch(&self, quantity: Option<i64>) -> Result<Vec<Message>, QueueError>;

    /// Confirm processing of a leased message, removing it permanently
    async fn acknowledge(&self, id: &MessageId) -> Result<MessageId, QueueError>;

    /// Current message counts
    async fn stats(&self) -> Result<QueueStats, QueueError>;
}

// ============================================================================
// QueueService
// ============================================================================

/// Orchestrates the message store and lease scheduler
pub struct QueueService {
    store: Arc<MessageStore>,
    scheduler: Arc<LeaseScheduler>,
    dispatch: Arc<Mutex<()>>,
    lease_duration: Duration,
}

impl QueueService {
    /// Create a service over the given store and scheduler
    pub fn new(
        store: Arc<MessageStore>,
        scheduler: Arc<LeaseScheduler>,
        lease_duration: Duration,
    ) -> Self {
        Self {
            store,
            scheduler,
            dispatch: Arc::new(Mutex::new(())),
            lease_duration,
        }
    }

    /// Create a service with a fresh store and scheduler
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(
            Arc::new(MessageStore::new()),
            Arc::new(LeaseScheduler::new()),
            config.lease_duration(),
        )
    }

    /// Lease duration applied to every granted lease
    pub fn lease_duration(&self) -> Duration {
        self.lease_duration
    }

    fn lock_dispatch(&self) -> Result<MutexGuard<'_, ()>, QueueError> {
        self.dispatch
            .lock()
            .map_err(|_| QueueError::storage_fault("dispatch lock poisoned"))
    }

    /// Arm the expiry timer for a freshly leased message
    fn arm_lease(&self, id: &MessageId) -> Result<(), QueueError> {
        let store = Arc::clone(&self.store);
        let dispatch = Arc::clone(&self.dispatch);

        self.scheduler
            .arm(id.clone(), self.lease_duration, move |expiry| {
                Self::handle_expiry(&store, &dispatch, expiry)
            })
    }

    /// Lease each selected message in order and arm its expiry timer.
    ///
    /// Must be called with the dispatch lock held. Messages that disappeared
    /// since `selected` was listed are skipped.
    fn lease_selected(&self, selected: Vec<Message>) -> Result<Vec<Message>, QueueError> {
        let mut delivered = Vec::with_capacity(selected.len());
        for candidate in selected {
            let leased = match self.store.mark_leased(&candidate.id) {
                Ok(message) => message,
                Err(QueueError::NotFound { .. }) => {
                    warn!(message_id = %candidate.id, "Message vanished before it could be leased; skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Err(e) = self.arm_lease(&leased.id) {
                // A leased message without a timer would never be redelivered
                self.store.mark_available(&leased.id)?;
                error!(message_id = %leased.id, error = %e, "Failed to arm lease timer");
                return Err(e);
            }

            delivered.push(leased);
        }

        Ok(delivered)
    }

    /// Revert an expired lease so the message can be redelivered
    fn handle_expiry(store: &MessageStore, dispatch: &Mutex<()>, expiry: Expiry) {
        let Ok(_guard) = dispatch.lock() else {
            error!(message_id = %expiry.id(), "Dispatch lock poisoned; dropping lease expiry");
            return;
        };

        if !expiry.claim() {
            debug!(message_id = %expiry.id(), "Lease expiry superseded by acknowledgement");
            return;
        }

        let id = expiry.id();
        match store.get(id) {
            Ok(Some(message)) if message.lease_state.is_leased() => {
                match store.mark_available(id) {
                    Ok(()) => info!(message_id = %id, "Lease expired; message available for redelivery"),
                    Err(e) => error!(message_id = %id, error = %e, "Failed to revert expired lease"),
                }
            }
            Ok(Some(_)) => {
                debug!(message_id = %id, "Lease expired for a message that is already available");
            }
            Ok(None) => {
                debug!(message_id = %id, "Lease expired after message was removed");
            }
            Err(e) => {
                error!(message_id = %id, error = %e, "Failed to read message on lease expiry");
            }
        }
    }
}

#[async_trait]
impl MessageQueue for QueueService {
    #[instrument(skip(self, body, payload), fields(body_len = body.len()))]
    async fn submit(
        &self,
        body: String,
        payload: Option<serde_json::Value>,
    ) -> Result<MessageId, QueueError> {
        if body.trim().is_empty() {
            return Err(QueueError::InvalidArgument {
                field: "message".to_string(),
                message: "message body must not be empty".to_string(),
            });
        }

        let message = self.store.create(body, payload)?;

        info!(message_id = %message.id, "Message submitted");
        Ok(message.id)
    }

    #[instrument(skip(self))]
    async fn receive_batch(&self, quantity: Option<i64>) -> Result<Vec<Message>, QueueError> {
        let _guard = self.lock_dispatch()?;

        let mut selected = self.store.list_available()?;
        if let Some(limit) = quantity.filter(|q| *q > 0) {
            selected.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        let delivered = self.lease_selected(selected)?;

        info!(
            delivered = delivered.len(),
            lease_ms = self.lease_duration.as_millis() as u64,
            "Leased messages"
        );
        Ok(delivered)
    }

    #[instrument(skip(self), fields(message_id = %id))]
    async fn acknowledge(&self, id: &MessageId) -> Result<MessageId, QueueError> {
        let _guard = self.lock_dispatch()?;

        let message = self.store.get(id)?.ok_or_else(|| QueueError::NotFound {
            id: id.to_string(),
        })?;

        if !message.lease_state.is_leased() {
            warn!("Rejected acknowledgement of a message that is not leased");
            return Err(QueueError::LeaseExpiredOrInvalid { id: id.to_string() });
        }

        self.scheduler.cancel(id);
        self.store.delete(id)?;

        info!("Message acknowledged");
        Ok(id.clone())
    }

    async fn stats(&self) -> Result<QueueStats, QueueError> {
        self.store.counts()
    }
}
