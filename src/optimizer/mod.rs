use std::collections::HashMap;

use log::info;

use crate::buffer::BufferPool;
use crate::catalog::schema::{Schema, TypeId};
use crate::common::{PageNo, TableId, IO_COST_PER_PAGE, NUM_HIST_BINS};
use crate::concurrency::{Permissions, TransactionId};
use crate::error::DbResult;
use crate::executors::Op;
use crate::tuple::value::Value;

use self::histogram::{IntHistogram, StringHistogram};

pub mod histogram;

/// Per-table statistics: one histogram per column plus tuple and page
/// counts, built by scanning the table twice through the buffer pool
/// with read-only permission. The first pass finds the integer column
/// ranges and the tuple count, the second populates the histograms.
pub struct TableStats {
    int_histograms: HashMap<usize, IntHistogram>,
    string_histograms: HashMap<usize, StringHistogram>,
    total_tuples: u64,
    page_count: usize,
    io_cost_per_page: u64,
}

impl TableStats {
    pub fn new(pool: &BufferPool, table_id: TableId, io_cost_per_page: u64) -> DbResult<Self> {
        let file = pool.catalog().get_table(table_id)?;
        let schema: Schema = file.schema().clone();
        let page_count = file.num_pages()?;
        let tid = TransactionId::new();

        let mut mins: HashMap<usize, i32> = HashMap::new();
        let mut maxs: HashMap<usize, i32> = HashMap::new();
        let mut total_tuples = 0u64;

        for page_no in 0..page_count {
            let page = pool.get_page(tid, (table_id, page_no as PageNo), Permissions::ReadOnly)?;
            for tuple in page.read().unwrap().iter() {
                total_tuples += 1;
                for (col, value) in tuple.values().iter().enumerate() {
                    if let Value::Integer(v) = value {
                        mins.entry(col)
                            .and_modify(|min| *min = (*min).min(*v))
                            .or_insert(*v);
                        maxs.entry(col)
                            .and_modify(|max| *max = (*max).max(*v))
                            .or_insert(*v);
                    }
                }
            }
        }

        let mut int_histograms = HashMap::new();
        let mut string_histograms = HashMap::new();
        for (col, column) in schema.columns().iter().enumerate() {
            match column.type_id() {
                TypeId::Integer => {
                    let min = mins.get(&col).copied().unwrap_or(0);
                    let max = maxs.get(&col).copied().unwrap_or(0);
                    int_histograms.insert(col, IntHistogram::new(NUM_HIST_BINS, min, max));
                }
                TypeId::Text => {
                    string_histograms.insert(col, StringHistogram::new(NUM_HIST_BINS));
                }
            }
        }

        for page_no in 0..page_count {
            let page = pool.get_page(tid, (table_id, page_no as PageNo), Permissions::ReadOnly)?;
            for tuple in page.read().unwrap().iter() {
                for (col, value) in tuple.values().iter().enumerate() {
                    match value {
                        Value::Integer(v) => {
                            if let Some(histogram) = int_histograms.get_mut(&col) {
                                histogram.add_value(*v);
                            }
                        }
                        Value::String(s) => {
                            if let Some(histogram) = string_histograms.get_mut(&col) {
                                histogram.add_value(s);
                            }
                        }
                    }
                }
            }
        }

        // the scan only read; completing it releases the shared locks
        pool.transaction_complete(tid, true)?;

        Ok(Self {
            int_histograms,
            string_histograms,
            total_tuples,
            page_count,
            io_cost_per_page,
        })
    }

    /// Cost of a full sequential scan. The factor of two is a fixed
    /// convention of the cost model.
    pub fn estimate_scan_cost(&self) -> f64 {
        2.0 * self.page_count as f64 * self.io_cost_per_page as f64
    }

    /// Number of tuples a scan with the given predicate selectivity is
    /// expected to produce.
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> u64 {
        (self.total_tuples as f64 * selectivity) as u64
    }

    /// Estimated selectivity of `column op constant`, dispatching on the
    /// constant's type.
    pub fn estimate_selectivity(&self, column: usize, op: Op, constant: &Value) -> f64 {
        match constant {
            Value::Integer(v) => self
                .int_histograms
                .get(&column)
                .map_or(1.0, |histogram| histogram.estimate_selectivity(op, *v)),
            Value::String(s) => self
                .string_histograms
                .get(&column)
                .map_or(1.0, |histogram| histogram.estimate_selectivity(op, s)),
        }
    }

    pub fn total_tuples(&self) -> u64 {
        self.total_tuples
    }
}

/// Builds statistics for every table in the catalog, keyed by table
/// name. Meant to run once at startup, before queries are planned.
pub fn compute_statistics(pool: &BufferPool) -> DbResult<HashMap<String, TableStats>> {
    info!("computing table statistics");
    let mut stats = HashMap::new();
    for table_id in pool.catalog().table_ids() {
        let name = pool.catalog().get_table_name(table_id)?;
        stats.insert(name, TableStats::new(pool, table_id, IO_COST_PER_PAGE)?);
    }
    info!("table statistics complete");
    Ok(stats)
}
