// libs/appointment-cell/src/services/locks.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SchedulingError;

/// Per-slot exclusive access with a bounded wait.
pub struct SlotLockTable {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    timeout: Duration,
}

/// Held for the duration of one booking or release attempt.
#[derive(Debug)]
pub struct SlotGuard {
    slot_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

impl SlotGuard {
    pub fn slot_id(&self) -> Uuid {
        self.slot_id
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        debug!("Released exclusive access to slot {}", self.slot_id);
    }
}

impl SlotLockTable {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn acquire(&self, slot_id: Uuid) -> Result<SlotGuard, SchedulingError> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(slot_id).or_default())
        };

        match timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!("Acquired exclusive access to slot {}", slot_id);
                Ok(SlotGuard { slot_id, _guard: guard })
            }
            Err(_) => {
                let waited_ms = self.timeout.as_millis() as u64;
                warn!("Timed out after {} ms waiting for slot {}", waited_ms, slot_id);
                Err(SchedulingError::Timeout { slot_id, waited_ms })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn second_holder_times_out() {
        let table = SlotLockTable::new(Duration::from_millis(20));
        let slot_id = Uuid::new_v4();

        let held = table.acquire(slot_id).await.unwrap();
        assert_eq!(held.slot_id(), slot_id);
        assert_matches!(
            table.acquire(slot_id).await,
            Err(SchedulingError::Timeout { slot_id: timed_out, waited_ms: 20 }) if timed_out == slot_id
        );

        drop(held);
        assert!(table.acquire(slot_id).await.is_ok());
    }

    #[tokio::test]
    async fn distinct_slots_do_not_contend() {
        let table = SlotLockTable::new(Duration::from_millis(20));
        let _first = table.acquire(Uuid::new_v4()).await.unwrap();
        assert!(table.acquire(Uuid::new_v4()).await.is_ok());
    }
}
