use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod lock_manager;

/// An opaque, monotonically increasing transaction identifier. Holds no
/// resources itself; locks and dirty pages are keyed by it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

static NEXT_TID: AtomicU64 = AtomicU64::new(0);

impl TransactionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_TID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Requested access level when fetching a page through the buffer pool.
/// Read-only access maps to a shared lock, read-write to an exclusive
/// lock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}
