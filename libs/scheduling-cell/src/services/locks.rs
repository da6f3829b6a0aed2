// libs/scheduling-cell/src/services/locks.rs
//
// Per-key pessimistic locking for mutating scheduling operations. A caller
// acquires every key it will touch in one all-or-nothing attempt, which makes
// ordering irrelevant and deadlock impossible. Acquisition is bounded: after
// the configured attempts the caller gets Busy instead of waiting forever.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{SchedulingError, SlotKey};

pub fn slot_lock_key(key: &SlotKey) -> String {
    format!("slot_{}", key)
}

pub fn patient_lock_key(patient_id: Uuid, date: NaiveDate, time: NaiveTime) -> String {
    format!("patient_{}_{}_{}", patient_id, date, time)
}

pub struct SlotLockManager {
    held: Arc<Mutex<HashSet<String>>>,
    max_attempts: u32,
    retry_delay_ms: u64,
}

impl SlotLockManager {
    pub fn new(max_attempts: u32, retry_delay_ms: u64) -> Self {
        Self {
            held: Arc::new(Mutex::new(HashSet::new())),
            max_attempts: max_attempts.max(1),
            retry_delay_ms,
        }
    }

    /// Acquire every key or none, retrying with linear backoff up to the
    /// attempt bound. The guard releases all keys when dropped, so an aborted
    /// request cannot strand a lock.
    pub async fn acquire(&self, keys: Vec<String>) -> Result<KeyLockGuard, SchedulingError> {
        let mut keys = keys;
        keys.sort();
        keys.dedup();

        for attempt in 1..=self.max_attempts {
            if self.try_acquire(&keys) {
                debug!("acquired scheduling locks {:?} on attempt {}", keys, attempt);
                return Ok(KeyLockGuard {
                    held: Arc::clone(&self.held),
                    keys,
                });
            }

            if attempt < self.max_attempts {
                sleep(Duration::from_millis(self.retry_delay_ms * attempt as u64)).await;
            }
        }

        warn!(
            "scheduling lock contention on {:?} exceeded {} attempts",
            keys, self.max_attempts
        );
        Err(SchedulingError::Busy)
    }

    fn try_acquire(&self, keys: &[String]) -> bool {
        let mut held = self.held.lock().unwrap();
        if keys.iter().any(|key| held.contains(key)) {
            return false;
        }
        for key in keys {
            held.insert(key.clone());
        }
        true
    }
}

pub struct KeyLockGuard {
    held: Arc<Mutex<HashSet<String>>>,
    keys: Vec<String>,
}

impl Drop for KeyLockGuard {
    fn drop(&mut self) {
        let mut held = self.held.lock().unwrap();
        for key in &self.keys {
            held.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_manager() -> SlotLockManager {
        SlotLockManager::new(2, 1)
    }

    #[tokio::test]
    async fn acquire_is_all_or_nothing() {
        let locks = lock_manager();
        let held = locks
            .acquire(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        // "b" is taken, so "b"+"c" must fail without stranding "c".
        let contended = locks
            .acquire(vec!["b".to_string(), "c".to_string()])
            .await;
        assert!(matches!(contended, Err(SchedulingError::Busy)));

        drop(held);
        locks
            .acquire(vec!["b".to_string(), "c".to_string()])
            .await
            .expect("keys released on drop");
    }

    #[tokio::test]
    async fn duplicate_keys_collapse() {
        let locks = lock_manager();
        let guard = locks
            .acquire(vec!["x".to_string(), "x".to_string()])
            .await
            .unwrap();
        drop(guard);
        locks.acquire(vec!["x".to_string()]).await.unwrap();
    }
}
