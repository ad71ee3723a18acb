use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::warn;
use rand::Rng;

use super::{Permissions, TransactionId};
use crate::common::{PageId, EXCLUSIVE_LOCK_TIMEOUT_MS, SHARED_LOCK_TIMEOUT_MS};
use crate::error::{DbError, DbResult};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl From<Permissions> for LockMode {
    fn from(perm: Permissions) -> Self {
        match perm {
            Permissions::ReadOnly => LockMode::Shared,
            Permissions::ReadWrite => LockMode::Exclusive,
        }
    }
}

#[derive(Debug)]
enum LockState {
    Unlocked,
    Shared(HashSet<TransactionId>),
    Exclusive(TransactionId),
}

impl LockState {
    /// Tries to move the state machine forward for a request. Returns
    /// true if the lock is now held by the requesting transaction in a
    /// mode at least as strong as the requested one.
    fn try_grant(&mut self, tid: TransactionId, mode: LockMode) -> bool {
        match (&mut *self, mode) {
            (LockState::Unlocked, LockMode::Shared) => {
                *self = LockState::Shared(HashSet::from([tid]));
                true
            }
            (LockState::Unlocked, LockMode::Exclusive) => {
                *self = LockState::Exclusive(tid);
                true
            }
            (LockState::Shared(holders), LockMode::Shared) => {
                holders.insert(tid);
                true
            }
            (LockState::Shared(holders), LockMode::Exclusive) => {
                // upgrade is only possible for the sole shared holder
                if holders.len() == 1 && holders.contains(&tid) {
                    *self = LockState::Exclusive(tid);
                    true
                } else {
                    false
                }
            }
            // re-entry by the exclusive holder is a no-op in either mode
            (LockState::Exclusive(owner), _) => *owner == tid,
        }
    }

    fn is_held_by(&self, tid: TransactionId) -> bool {
        match self {
            LockState::Unlocked => false,
            LockState::Shared(holders) => holders.contains(&tid),
            LockState::Exclusive(owner) => *owner == tid,
        }
    }
}

struct PageLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl PageLock {
    fn new() -> Self {
        Self {
            state: Mutex::new(LockState::Unlocked),
            released: Condvar::new(),
        }
    }
}

/// Per-page shared/exclusive lock table implementing strict two-phase
/// locking with timeout-based deadlock avoidance: a request that cannot
/// be granted waits on the page's condition variable until a randomized
/// deadline, after which the requesting transaction gives up.
pub struct LockManager {
    lock_table: DashMap<PageId, Arc<PageLock>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            lock_table: DashMap::new(),
        }
    }

    fn lock_for(&self, pid: PageId) -> Arc<PageLock> {
        self.lock_table
            .entry(pid)
            .or_insert_with(|| Arc::new(PageLock::new()))
            .clone()
    }

    /// Acquires (or re-enters) the lock on a page, blocking until the
    /// randomized deadline. Fails with `TransactionAborted` when the
    /// deadline passes; the caller is expected to tear the transaction
    /// down.
    pub fn acquire(&self, tid: TransactionId, pid: PageId, mode: LockMode) -> DbResult<()> {
        let lock = self.lock_for(pid);
        let timeout_ms = match mode {
            LockMode::Shared => rand::thread_rng().gen_range(SHARED_LOCK_TIMEOUT_MS),
            LockMode::Exclusive => rand::thread_rng().gen_range(EXCLUSIVE_LOCK_TIMEOUT_MS),
        };
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        let mut state = lock.state.lock().unwrap();
        loop {
            if state.try_grant(tid, mode) {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "transaction {} timed out after {}ms waiting for a {:?} lock on page {:?}",
                    tid, timeout_ms, mode, pid
                );
                return Err(DbError::TransactionAborted(tid));
            }
            let (guard, _) = lock
                .released
                .wait_timeout(state, deadline - now)
                .unwrap();
            state = guard;
        }
    }

    /// Releases the page lock held by the transaction, if any, and wakes
    /// up waiting requests.
    pub fn release(&self, tid: TransactionId, pid: PageId) {
        let lock = match self.lock_table.get(&pid) {
            Some(lock) => lock.clone(),
            None => return,
        };
        let mut state = lock.state.lock().unwrap();
        match &mut *state {
            LockState::Shared(holders) => {
                holders.remove(&tid);
                if holders.is_empty() {
                    *state = LockState::Unlocked;
                }
            }
            LockState::Exclusive(owner) if *owner == tid => {
                *state = LockState::Unlocked;
            }
            _ => return,
        }
        drop(state);
        lock.released.notify_all();
    }

    /// Releases every lock held by the transaction.
    pub fn release_all(&self, tid: TransactionId) {
        let pids: Vec<PageId> = self
            .lock_table
            .iter()
            .map(|entry| *entry.key())
            .collect();
        for pid in pids {
            self.release(tid, pid);
        }
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        match self.lock_table.get(&pid) {
            Some(lock) => lock.state.lock().unwrap().is_held_by(tid),
            None => false,
        }
    }

    /// Drops all lock state for a page. Used when the page itself is
    /// discarded from the buffer pool.
    pub fn discard(&self, pid: PageId) {
        if let Some((_, lock)) = self.lock_table.remove(&pid) {
            lock.released.notify_all();
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
