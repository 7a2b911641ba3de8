//! Lease expiry timers.
//!
//! [`LeaseScheduler`] owns at most one pending expiry timer per message
//! identifier. It holds no message data, only the timer handles.
//!
//! ## Cancellation and firing
//!
//! When a timer elapses the scheduler hands the callback an [`Expiry`]. The
//! expiry has no effect until the callback [`claim`](Expiry::claim)s it, and a
//! claim succeeds only if the arming it belongs to is still registered. Claims
//! and [`cancel`](LeaseScheduler::cancel) both go through the timer table
//! lock, so they are mutually exclusive per identifier:
//!
//! - cancel first: the entry is gone and every later claim fails
//! - claim first: the entry is removed and cancel becomes a no-op
//!
//! Each arming carries a generation number, so a timer that was replaced by a
//! newer arming for the same identifier can never claim the newer entry.

use crate::error::QueueError;
use crate::message::MessageId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;

type TimerTable = HashMap<MessageId, ArmedTimer>;

/// A pending timer for one arming
struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

// Entries are inserted or removed whole, so a panic elsewhere while the lock
// was held cannot leave the table half-updated.
fn lock_table(table: &Mutex<TimerTable>) -> MutexGuard<'_, TimerTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Expiry
// ============================================================================

/// An elapsed lease timer, handed to the expiry callback
#[derive(Debug)]
pub struct Expiry {
    id: MessageId,
    generation: u64,
    timers: Weak<Mutex<TimerTable>>,
}

impl Expiry {
    /// Identifier of the message whose lease elapsed
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Take ownership of the expiry.
    ///
    /// Returns `true` exactly once per arming, and only if the arming was
    /// neither cancelled nor replaced. Callers apply the expiry's effects only
    /// after a successful claim.
    pub fn claim(&self) -> bool {
        let Some(timers) = self.timers.upgrade() else {
            return false;
        };
        let mut table = lock_table(&timers);

        match table.get(&self.id) {
            Some(armed) if armed.generation == self.generation => {
                table.remove(&self.id);
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// LeaseScheduler
// ============================================================================

/// One-shot expiry timers keyed by message identifier
pub struct LeaseScheduler {
    timers: Arc<Mutex<TimerTable>>,
    next_generation: AtomicU64,
}

impl LeaseScheduler {
    /// Create a scheduler with no armed timers
    pub fn new() -> Self {
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Schedule `on_expire` to run once after `duration`.
    ///
    /// An existing timer for `id` is replaced and will never fire. Must be
    /// called from within a Tokio runtime; otherwise a
    /// [`QueueError::StorageFault`] is returned and nothing is armed.
    pub fn arm<F>(&self, id: MessageId, duration: Duration, on_expire: F) -> Result<(), QueueError>
    where
        F: FnOnce(Expiry) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            QueueError::storage_fault(format!("no runtime available for lease timer: {}", e))
        })?;

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let expiry = Expiry {
            id: id.clone(),
            generation,
            timers: Arc::downgrade(&self.timers),
        };

        // Held across spawn so the timer cannot try to claim before its entry exists
        let mut table = lock_table(&self.timers);

        let handle = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            on_expire(expiry);
        });

        if let Some(replaced) = table.insert(id.clone(), ArmedTimer { generation, handle }) {
            replaced.handle.abort();
            warn!(message_id = %id, "Replaced an already armed lease timer");
        }

        debug!(
            message_id = %id,
            generation,
            duration_ms = duration.as_millis() as u64,
            "Armed lease timer"
        );
        Ok(())
    }

    /// Cancel the timer for `id`.
    ///
    /// Returns whether a timer was armed. Once this returns, no expiry for the
    /// cancelled arming can be claimed.
    pub fn cancel(&self, id: &MessageId) -> bool {
        let removed = lock_table(&self.timers).remove(id);

        match removed {
            Some(armed) => {
                armed.handle.abort();
                debug!(message_id = %id, generation = armed.generation, "Cancelled lease timer");
                true
            }
            None => false,
        }
    }

    /// Check whether a timer is currently armed for `id`
    pub fn is_armed(&self, id: &MessageId) -> bool {
        lock_table(&self.timers).contains_key(id)
    }

    /// Number of armed timers
    pub fn armed_count(&self) -> usize {
        lock_table(&self.timers).len()
    }
}

impl Default for LeaseScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LeaseScheduler {
    fn drop(&mut self) {
        for (_, armed) in lock_table(&self.timers).drain() {
            armed.handle.abort();
        }
    }
}
