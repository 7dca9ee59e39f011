//! Lifetime-safe handle bridge over a transactional RocksDB instance.
//!
//! A [`DatabaseHandle`] owns the engine, its column families and the host's
//! comparators. Everything else is borrowed from it:
//!
//! ```text
//! DatabaseHandle ─┬─→ SnapshotGuard<'db>      (released on drop)
//!                 ├─→ TransactionHandle<'db>  (commit | rollback)
//!                 └─→ BulkLoadWriter<'db>     (put* → finish → ingest)
//! ```
//!
//! so the borrow checker guarantees no borrower outlives the database.
//! Failures come back as [`Status`] values, never as panics.

pub mod column_family;
pub mod comparator;
pub mod db;
pub mod import_export;
pub mod iterator;
pub mod transaction;
pub mod util;

pub use column_family::{
    ColumnFamilyHandle, ColumnFamilySpec, ComparatorSlot, DEFAULT_COLUMN_FAMILY_NAME,
};
pub use comparator::{ComparatorAdapter, CompareFn};
pub use db::{DatabaseHandle, DbOptions, LiveResources};
pub use import_export::{BulkLoadWriter, IngestOptions};
pub use iterator::{KeyValue, RangeIter};
pub use transaction::{SnapshotGuard, TransactionHandle, TransactionOptions, TransactionState};
pub use util::{Code, Result, Slice, Status};
