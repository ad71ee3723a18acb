use std::sync::{Arc, Mutex, RwLock};

use log::debug;
use lru::LruCache;

use super::PageRef;
use crate::catalog::Catalog;
use crate::common::{PageId, TableId, DEFAULT_PAGES};
use crate::concurrency::lock_manager::{LockManager, LockMode};
use crate::concurrency::{Permissions, TransactionId};
use crate::error::{DbError, DbResult};
use crate::tuple::Tuple;

/// A bounded cache of heap pages shared by all transactions.
///
/// The pool is also the locking boundary: fetching a page acquires a
/// per-page lock matching the requested permission, held until the
/// transaction completes (strict two-phase locking). Replacement is LRU
/// over the clean resident pages; dirty pages are pinned in memory until
/// their transaction commits (NO-STEAL) and a committing transaction's
/// dirty pages are all written out (FORCE), so no undo or redo log is
/// needed.
pub struct BufferPool {
    capacity: usize,
    catalog: Arc<Catalog>,
    lock_manager: LockManager,
    /// access-ordered page cache, most recently used first; capacity is
    /// enforced by hand so that the cache never drops a page on its own
    pages: Mutex<LruCache<PageId, PageRef>>,
}

impl BufferPool {
    pub fn new(catalog: Arc<Catalog>, capacity: usize) -> Self {
        Self {
            capacity,
            catalog,
            lock_manager: LockManager::new(),
            pages: Mutex::new(LruCache::unbounded()),
        }
    }

    pub fn with_default_capacity(catalog: Arc<Catalog>) -> Self {
        Self::new(catalog, DEFAULT_PAGES)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Fetches a page, locking it for the transaction first: a shared
    /// lock for read-only access, an exclusive lock for read-write. On a
    /// cache miss the page is read from its heap file, evicting the
    /// least recently used clean page if the pool is full.
    ///
    /// If the lock cannot be acquired before the randomized deadline,
    /// the requesting transaction is aborted (its dirty pages are
    /// discarded and its locks released) and `TransactionAborted` is
    /// returned.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> DbResult<PageRef> {
        if let Err(e) = self.lock_manager.acquire(tid, pid, perm.into()) {
            self.transaction_complete(tid, false)?;
            return Err(e);
        }

        if let Some(page) = self.pages.lock().unwrap().get(&pid) {
            return Ok(page.clone());
        }

        // miss: read from disk while holding no pool-level mutex
        let file = self.catalog.get_table(pid.0)?;
        let page = Arc::new(RwLock::new(file.read_page(pid)?));
        debug!("loaded page {:?} into the buffer pool", pid);

        let mut pages = self.pages.lock().unwrap();
        if let Some(existing) = pages.get(&pid) {
            // another transaction loaded the page while we were reading
            return Ok(existing.clone());
        }
        if pages.len() >= self.capacity {
            Self::evict(&mut pages)?;
        }
        pages.put(pid, page.clone());
        Ok(page)
    }

    /// Scans from the cold end of the access order for the first clean
    /// page and drops it. Dirty pages are never evicted; if every
    /// resident page is dirty the pool is out of space.
    fn evict(pages: &mut LruCache<PageId, PageRef>) -> DbResult<()> {
        let victim = pages
            .iter()
            .rev()
            .find(|(_, page)| page.read().unwrap().is_dirty().is_none())
            .map(|(pid, _)| *pid);
        match victim {
            Some(pid) => {
                debug!("evicting page {:?}", pid);
                pages.pop(&pid);
                Ok(())
            }
            None => Err(DbError::NoSpace),
        }
    }

    /// Inserts a tuple into the table through its heap file, then marks
    /// every modified page dirty with the owning transaction and
    /// re-admits it at the head of the access order.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> DbResult<()> {
        let file = self.catalog.get_table(table_id)?;
        if !file.schema().matches(tuple) {
            return Err(DbError::SchemaMismatch);
        }
        let dirtied = file.insert_tuple(tid, tuple, self)?;
        self.admit_dirty(tid, dirtied)
    }

    /// Deletes the tuple from the page named by its record id.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<()> {
        let (pid, _) = tuple.record_id().ok_or(DbError::TupleNotFound)?;
        let file = self.catalog.get_table(pid.0)?;
        let dirtied = file.delete_tuple(tid, tuple, self)?;
        self.admit_dirty(tid, dirtied)
    }

    fn admit_dirty(&self, tid: TransactionId, dirtied: Vec<PageRef>) -> DbResult<()> {
        for page in dirtied {
            let pid = {
                let mut guard = page.write().unwrap();
                guard.mark_dirty(Some(tid));
                guard.pid()
            };
            // the heap file fetched the page read-write, so this re-entry
            // cannot block
            self.lock_manager.acquire(tid, pid, LockMode::Exclusive)?;

            let mut pages = self.pages.lock().unwrap();
            if pages.peek(&pid).is_none() && pages.len() >= self.capacity {
                Self::evict(&mut pages)?;
            }
            pages.put(pid, page.clone());
        }
        Ok(())
    }

    /// Commits or aborts a transaction. Commit writes the transaction's
    /// dirty pages out and clears their dirty flag; abort drops them
    /// from the pool so the on-disk versions stay authoritative. Either
    /// way every lock held by the transaction is released afterwards.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        if commit {
            self.flush_pages(tid)?;
        } else {
            let dirty: Vec<PageId> = {
                let pages = self.pages.lock().unwrap();
                pages
                    .iter()
                    .filter(|(_, page)| page.read().unwrap().is_dirty() == Some(tid))
                    .map(|(pid, _)| *pid)
                    .collect()
            };
            for pid in dirty {
                debug!("dropping aborted page {:?}", pid);
                self.discard_page(pid);
            }
        }
        self.lock_manager.release_all(tid);
        Ok(())
    }

    /// Writes every page dirtied by the transaction back to disk and
    /// clears the dirty flags.
    pub fn flush_pages(&self, tid: TransactionId) -> DbResult<()> {
        for page in self.resident_pages() {
            let is_mine = page.read().unwrap().is_dirty() == Some(tid);
            if is_mine {
                self.flush_page(&page)?;
                page.write().unwrap().mark_dirty(None);
            }
        }
        Ok(())
    }

    /// Writes every resident page to disk, dirty or not. A testing aid;
    /// unsafe in combination with NO-STEAL because it persists
    /// uncommitted data.
    pub fn flush_all_pages(&self) -> DbResult<()> {
        for page in self.resident_pages() {
            self.flush_page(&page)?;
        }
        Ok(())
    }

    fn resident_pages(&self) -> Vec<PageRef> {
        let pages = self.pages.lock().unwrap();
        pages.iter().map(|(_, page)| page.clone()).collect()
    }

    fn flush_page(&self, page: &PageRef) -> DbResult<()> {
        let guard = page.read().unwrap();
        let file = self.catalog.get_table(guard.pid().0)?;
        debug!("flushing page {:?}", guard.pid());
        file.write_page(&guard)
    }

    /// Drops a page from the pool without flushing it, along with its
    /// lock state. Used by the abort path; also the hook recovery or
    /// index code would use to invalidate a cached page.
    pub fn discard_page(&self, pid: PageId) {
        self.pages.lock().unwrap().pop(&pid);
        self.lock_manager.discard(pid);
    }

    /// Force-releases a single page lock without completing the
    /// transaction. Breaks two-phase locking; meant for tests and
    /// manual deadlock recovery.
    pub fn unsafe_release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release(tid, pid);
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds_lock(tid, pid)
    }
}
