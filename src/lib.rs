//! A teaching-grade relational storage engine: tables live in paged
//! heap files on disk, transactions read and write tuples through a
//! shared locking buffer pool, a small family of pull-based operators
//! composes over the tuples, and equi-width histograms estimate
//! predicate selectivity for cost-based planning.

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod concurrency;
pub mod database;
pub mod error;
pub mod executors;
pub mod optimizer;
pub mod storage;
pub mod tuple;

pub use database::Database;
pub use error::{DbError, DbResult};
