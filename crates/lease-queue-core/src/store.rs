//! In-memory message store.
//!
//! The store is the authoritative record of every live message and its lease
//! state. It knows nothing about timers; the dispatch service decides when a
//! transition happens and the store only applies it.
//!
//! All operations are synchronous and take the store's internal lock for the
//! duration of a single call. Compound read-then-write sequences are
//! serialised one level up, in [`QueueService`](crate::service::QueueService).

use crate::error::QueueError;
use crate::message::{LeaseState, Message, MessageId, QueueStats};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// A message together with its position in insertion order
struct StoredMessage {
    sequence: u64,
    message: Message,
}

/// State guarded by the store lock
#[derive(Default)]
struct StoreState {
    messages: HashMap<MessageId, StoredMessage>,
    /// Insertion order; keys are assigned from `next_sequence` and never reused
    order: BTreeMap<u64, MessageId>,
    next_sequence: u64,
}

impl StoreState {
    fn get_mut(&mut self, id: &MessageId) -> Result<&mut Message, QueueError> {
        self.messages
            .get_mut(id)
            .map(|stored| &mut stored.message)
            .ok_or_else(|| QueueError::NotFound {
                id: id.to_string(),
            })
    }
}

// ============================================================================
// MessageStore
// ============================================================================

/// Thread-safe, insertion-ordered store of live messages
#[derive(Default)]
pub struct MessageStore {
    state: RwLock<StoreState>,
}

impl MessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, QueueError> {
        self.state
            .read()
            .map_err(|_| QueueError::storage_fault("message store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, QueueError> {
        self.state
            .write()
            .map_err(|_| QueueError::storage_fault("message store lock poisoned"))
    }

    /// Store a new available message under a freshly generated identifier
    pub fn create(
        &self,
        body: String,
        payload: Option<serde_json::Value>,
    ) -> Result<Message, QueueError> {
        self.insert(Message::new(MessageId::new(), body, payload))
    }

    fn insert(&self, message: Message) -> Result<Message, QueueError> {
        let mut state = self.write()?;

        if state.messages.contains_key(&message.id) {
            return Err(QueueError::storage_fault(format!(
                "identifier collision for message {}",
                message.id
            )));
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.order.insert(sequence, message.id.clone());
        state.messages.insert(
            message.id.clone(),
            StoredMessage {
                sequence,
                message: message.clone(),
            },
        );

        debug!(message_id = %message.id, sequence, "Stored message");
        Ok(message)
    }

    /// Snapshot of every available message in insertion order
    pub fn list_available(&self) -> Result<Vec<Message>, QueueError> {
        let state = self.read()?;

        Ok(state
            .order
            .values()
            .filter_map(|id| state.messages.get(id))
            .map(|stored| &stored.message)
            .filter(|message| message.is_available())
            .cloned()
            .collect())
    }

    /// Look up a message by identifier
    pub fn get(&self, id: &MessageId) -> Result<Option<Message>, QueueError> {
        let state = self.read()?;
        Ok(state.messages.get(id).map(|stored| stored.message.clone()))
    }

    /// Transition a message to [`LeaseState::Leased`]
    pub fn mark_leased(&self, id: &MessageId) -> Result<Message, QueueError> {
        let mut state = self.write()?;
        let message = state.get_mut(id)?;
        message.lease_state = LeaseState::Leased;

        debug!(message_id = %id, "Marked message leased");
        Ok(message.clone())
    }

    /// Transition a message back to [`LeaseState::Available`].
    ///
    /// A message deleted in the meantime stays deleted: a missing identifier
    /// is a no-op, not an error.
    pub fn mark_available(&self, id: &MessageId) -> Result<(), QueueError> {
        let mut state = self.write()?;

        if let Some(stored) = state.messages.get_mut(id) {
            stored.message.lease_state = LeaseState::Available;
            debug!(message_id = %id, "Marked message available");
        }

        Ok(())
    }

    /// Remove a message permanently
    pub fn delete(&self, id: &MessageId) -> Result<(), QueueError> {
        let mut state = self.write()?;

        let stored = state.messages.remove(id).ok_or_else(|| QueueError::NotFound {
            id: id.to_string(),
        })?;
        state.order.remove(&stored.sequence);

        debug!(message_id = %id, "Deleted message");
        Ok(())
    }

    /// Number of live messages
    pub fn len(&self) -> Result<usize, QueueError> {
        Ok(self.read()?.messages.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }

    /// Count messages by lease state
    pub fn counts(&self) -> Result<QueueStats, QueueError> {
        let state = self.read()?;
        let leased = state
            .messages
            .values()
            .filter(|stored| stored.message.lease_state.is_leased())
            .count();

        Ok(QueueStats {
            total: state.messages.len(),
            available: state.messages.len() - leased,
            leased,
        })
    }
}
