//! Per-conversation turn serialization.
//!
//! Two concurrent turns on the same conversation could both read the same
//! history and double-append, skewing the dialogue context. Each turn
//! therefore holds its conversation's lock from before the history read
//! until after the final commit. Different conversations proceed in
//! parallel; the discipline is "at most one in-flight turn per
//! conversation", not global locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::ConversationId;

/// Registry of per-conversation turn locks.
#[derive(Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the turn lock for a conversation, waiting if another turn
    /// is in flight.
    ///
    /// The returned guard is owned, so it can cross an await boundary and
    /// travel into the task that finishes the turn.
    pub async fn acquire(&self, id: ConversationId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("lock registry poisoned");
            // Drop entries no turn is holding or waiting on, so the
            // registry does not grow with every conversation ever seen.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of conversations currently tracked.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}
