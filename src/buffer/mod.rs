use std::sync::{Arc, RwLock};

use crate::storage::heap::page::HeapPage;

pub mod buffer_pool;

pub use buffer_pool::BufferPool;

/// A page as handed out by the buffer pool. The pool and every
/// transaction share the same instance, so mutations through one handle
/// are visible to all.
pub type PageRef = Arc<RwLock<HeapPage>>;
