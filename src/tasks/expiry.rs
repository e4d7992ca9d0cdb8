//! TTL Expiry Timers
//!
//! One-shot tokio tasks that delete a key once its TTL has elapsed, and the
//! per-key registry used to cancel them.

use std::collections::HashMap;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::cache::CacheState;

// == Pending Expiry ==
/// A timer armed for one key.
#[derive(Debug)]
struct PendingExpiry {
    /// Identifies this arming among all timers ever armed by the cache
    id: u64,
    /// When the timer fires
    deadline: Instant,
    /// Handle used to cancel the sleeping task
    handle: AbortHandle,
}

// == Expiry Timers ==
/// Registry of armed expiry timers, at most one per key.
#[derive(Debug, Default)]
pub struct ExpiryTimers {
    pending: HashMap<String, PendingExpiry>,
    next_id: u64,
}

// == Runtime Handle ==
/// Returns the Tokio runtime that expiry timers are spawned on.
///
/// # Panics
/// Panics if called outside of a Tokio runtime context.
pub fn runtime_handle() -> Handle {
    match Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => panic!(
            "tree_cache::TreeCache requires a Tokio runtime to expire entries. \
             Call set() with a TTL (or on a cache with a default TTL) from within \
             a #[tokio::main] or #[tokio::test] context."
        ),
    }
}

impl ExpiryTimers {
    // == Arm ==
    /// Spawns a timer on `runtime` that expires `key` after `ttl`, replacing
    /// any timer already armed for it.
    ///
    /// The timer holds a weak reference to the cache state, so it never keeps
    /// a dropped cache alive.
    pub fn arm(
        &mut self,
        runtime: &Handle,
        state: Weak<Mutex<CacheState>>,
        key: &str,
        ttl: Duration,
    ) {
        self.cancel(key);

        self.next_id += 1;
        let id = self.next_id;
        // Callers cap ttl at MAX_TTL_SECONDS, so this cannot overflow
        let deadline = Instant::now() + ttl;
        let timer_key = key.to_string();

        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(state) = state.upgrade() {
                state.lock().expire(&timer_key, id);
            }
        });

        self.pending.insert(
            key.to_string(),
            PendingExpiry {
                id,
                deadline,
                handle: task.abort_handle(),
            },
        );
    }

    // == Cancel ==
    /// Cancels the timer armed for `key`.
    ///
    /// Returns true if one was pending.
    pub fn cancel(&mut self, key: &str) -> bool {
        match self.pending.remove(key) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    // == Claim ==
    /// Unregisters a firing timer.
    ///
    /// Returns false when `id` is no longer the timer armed for `key`, i.e.
    /// it was cancelled or replaced after it woke up, and must not act.
    pub fn claim(&mut self, key: &str, id: u64) -> bool {
        match self.pending.get(key) {
            Some(pending) if pending.id == id => {
                self.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    // == Remaining ==
    /// Returns the time left before the timer for `key` fires.
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        self.pending
            .get(key)
            .map(|pending| pending.deadline.saturating_duration_since(Instant::now()))
    }

    // == Keys ==
    /// Iterates over the keys that have an armed timer.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.pending.keys()
    }

    // == Length ==
    /// Returns the number of armed timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    // == Clear ==
    /// Cancels every armed timer.
    pub fn clear(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }
}

impl Drop for ExpiryTimers {
    fn drop(&mut self) {
        self.clear();
    }
}
