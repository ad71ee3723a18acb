use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type TableId = u32;
pub type PageNo = u32;
pub type PageId = (TableId, PageNo);

pub type Slot = u16;
pub type RecordId = (PageId, Slot);

pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default buffer pool capacity, in pages.
pub const DEFAULT_PAGES: usize = 50;

/// Number of buckets used for the per-column histograms.
pub const NUM_HIST_BINS: usize = 100;

/// Unit cost of reading a single page during a sequential scan.
pub const IO_COST_PER_PAGE: u64 = 1000;

/// Timeout ranges (in milliseconds) drawn for blocking lock requests.
/// The ranges differ between the two modes so that two symmetric
/// contenders do not retry in lockstep forever.
pub const SHARED_LOCK_TIMEOUT_MS: Range<u64> = 33..366;
pub const EXCLUSIVE_LOCK_TIMEOUT_MS: Range<u64> = 444..544;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Bytes per page, including the header. Process-wide; every heap file
/// shares it, and changing it invalidates existing files.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

/// Overrides the page size. Only meant for tests.
pub fn set_page_size(size: usize) {
    PAGE_SIZE.store(size, Ordering::Relaxed);
}

/// Restores the default page size. Only meant for tests.
pub fn reset_page_size() {
    PAGE_SIZE.store(DEFAULT_PAGE_SIZE, Ordering::Relaxed);
}
