use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io;
use std::os::unix::prelude::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;

use crate::buffer::{BufferPool, PageRef};
use crate::catalog::schema::Schema;
use crate::common::{page_size, PageId, PageNo, TableId};
use crate::concurrency::{Permissions, TransactionId};
use crate::error::{DbError, DbResult};
use crate::tuple::Tuple;

use super::page::HeapPage;

/// A heap file stores the tuples of one table as an unordered sequence
/// of fixed-size pages in a single backing file. Page `n` occupies bytes
/// `[n * page_size, (n + 1) * page_size)`; the file length is always a
/// multiple of the page size.
///
/// All tuple-level access goes through the buffer pool, which handles
/// caching and locking. The file itself only reads and writes whole
/// pages.
pub struct HeapFile {
    id: TableId,
    path: PathBuf,
    file: File,
    schema: Schema,
    /// serializes growing the file so that two inserters cannot fetch
    /// each other's freshly appended page
    extend_lock: Mutex<()>,
}

/// Derives a stable table id from the canonical path of the backing
/// file.
fn table_id_for(path: &Path) -> TableId {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish() as TableId
}

impl HeapFile {
    /// Opens (or creates) the backing file. The length of an existing
    /// file must be a multiple of the page size.
    pub fn open(path: impl Into<PathBuf>, schema: Schema) -> DbResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let path = path.canonicalize()?;

        let size = file.metadata()?.len();
        if size % page_size() as u64 != 0 {
            return Err(DbError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "heap file {} has length {} which is not a multiple of the page size {}",
                    path.display(),
                    size,
                    page_size()
                ),
            )));
        }

        Ok(Self {
            id: table_id_for(&path),
            path,
            file,
            schema,
            extend_lock: Mutex::new(()),
        })
    }

    /// The stable table id of this file, derived from its path.
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of pages currently in the file.
    pub fn num_pages(&self) -> DbResult<usize> {
        let size = self.file.metadata()?.len();
        Ok((size / page_size() as u64) as usize)
    }

    /// Reads a page straight from disk, bypassing the buffer pool.
    pub fn read_page(&self, pid: PageId) -> DbResult<HeapPage> {
        let offset = pid.1 as u64 * page_size() as u64;
        let size = self.file.metadata()?.len();
        if offset + page_size() as u64 > size {
            return Err(DbError::invalid_page(pid));
        }

        let mut data = vec![0u8; page_size()];
        self.file.read_exact_at(&mut data, offset).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                DbError::invalid_page(pid)
            } else {
                DbError::Io(e)
            }
        })?;
        HeapPage::new(pid, data, self.schema.clone())
    }

    /// Writes a page image back to its offset and syncs the file.
    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let offset = page.pid().1 as u64 * page_size() as u64;
        self.file.write_all_at(page.page_data(), offset)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Appends an all-zero page and returns its page number.
    fn append_empty_page(&self) -> DbResult<PageNo> {
        let _guard = self.extend_lock.lock().unwrap();
        let page_no = self.num_pages()? as PageNo;
        let offset = page_no as u64 * page_size() as u64;
        self.file
            .write_all_at(&HeapPage::create_empty_page_data(), offset)?;
        self.file.sync_all()?;
        debug!("extended table {} to {} pages", self.id, page_no + 1);
        Ok(page_no)
    }

    /// Inserts a tuple into the first page with a free slot, appending a
    /// new page when every existing page is full. Probed pages are
    /// fetched with read-write permission, so their locks are held until
    /// the transaction completes. Returns the pages that were modified.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        tuple: &mut Tuple,
        pool: &BufferPool,
    ) -> DbResult<Vec<PageRef>> {
        let mut page_no = 0;
        while (page_no as usize) < self.num_pages()? {
            let page = pool.get_page(tid, (self.id, page_no), Permissions::ReadWrite)?;
            let mut guard = page.write().unwrap();
            if guard.num_empty_slots() > 0 {
                guard.insert_tuple(tuple)?;
                drop(guard);
                return Ok(vec![page]);
            }
            drop(guard);
            page_no += 1;
        }

        let page_no = self.append_empty_page()?;
        let page = pool.get_page(tid, (self.id, page_no), Permissions::ReadWrite)?;
        let mut guard = page.write().unwrap();
        guard.insert_tuple(tuple)?;
        drop(guard);
        Ok(vec![page])
    }

    /// Deletes a tuple from the page its record id names. Returns the
    /// modified page.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        tuple: &Tuple,
        pool: &BufferPool,
    ) -> DbResult<Vec<PageRef>> {
        let (pid, _) = tuple.record_id().ok_or(DbError::TupleNotFound)?;
        let page = pool.get_page(tid, pid, Permissions::ReadWrite)?;
        page.write().unwrap().delete_tuple(tuple)?;
        Ok(vec![page])
    }

    /// A restartable scan over every tuple of the table, page by page,
    /// fetching each page with read-only permission through the buffer
    /// pool.
    pub fn iter<'a>(&'a self, tid: TransactionId, pool: &'a BufferPool) -> HeapFileIterator<'a> {
        HeapFileIterator {
            file: self,
            pool,
            tid,
            next_page_no: 0,
            current: Vec::new().into_iter(),
        }
    }
}

pub struct HeapFileIterator<'a> {
    file: &'a HeapFile,
    pool: &'a BufferPool,
    tid: TransactionId,
    next_page_no: PageNo,
    current: std::vec::IntoIter<Tuple>,
}

impl<'a> HeapFileIterator<'a> {
    /// Restarts the scan from page 0.
    pub fn rewind(&mut self) {
        self.next_page_no = 0;
        self.current = Vec::new().into_iter();
    }

    fn fetch_next_tuple(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            if let Some(tuple) = self.current.next() {
                return Ok(Some(tuple));
            }
            if self.next_page_no as usize >= self.file.num_pages()? {
                return Ok(None);
            }
            let pid = (self.file.id(), self.next_page_no);
            let page = self.pool.get_page(self.tid, pid, Permissions::ReadOnly)?;
            self.current = page
                .read()
                .unwrap()
                .iter()
                .collect::<Vec<_>>()
                .into_iter();
            self.next_page_no += 1;
        }
    }
}

impl<'a> Iterator for HeapFileIterator<'a> {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        self.fetch_next_tuple().transpose()
    }
}
