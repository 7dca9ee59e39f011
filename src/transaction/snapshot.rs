use rocksdb::SnapshotWithThreadMode;

use crate::{
    db::{DatabaseHandle, Engine, LedgerToken, ResourceKind},
    iterator::{RangeIter, bounded_read_options, forward_from},
    util::{Result, Slice},
};

/// Point-in-time read view of the database
///
/// The engine snapshot is released exactly once, when the guard is dropped.
/// The guard borrows the [`DatabaseHandle`] it came from, so it cannot
/// outlive it:
///
/// ```compile_fail
/// use kvbridge::{DatabaseHandle, DbOptions};
///
/// let db = DatabaseHandle::open_default(&DbOptions::new("/tmp/kvbridge-doc")).unwrap();
/// let snapshot = db.snapshot();
/// drop(db); // error: `db` is still borrowed by `snapshot`
/// let _ = snapshot.get("k".into(), 0);
/// ```
pub struct SnapshotGuard<'db> {
    db: &'db DatabaseHandle,
    snapshot: SnapshotWithThreadMode<'db, Engine>,
    _token: LedgerToken<'db>,
}

impl<'db> SnapshotGuard<'db> {
    pub(crate) fn acquire(db: &'db DatabaseHandle) -> Self {
        let _token = db.ledger().acquire(ResourceKind::Snapshot);
        SnapshotGuard {
            db,
            snapshot: db.engine().snapshot(),
            _token,
        }
    }

    /// Read `key` as of the snapshot.
    pub fn get(&self, key: Slice<'_>, cf_index: usize) -> Result<Option<Vec<u8>>> {
        let cf = self.db.cf(cf_index)?;
        Ok(self.snapshot.get_cf(cf, key)?)
    }

    /// Scan `[start, end)` as of the snapshot.
    pub fn scan(&self, start: Slice<'_>, end: Slice<'_>, cf_index: usize) -> Result<RangeIter<'_>> {
        let cf = self.db.cf(cf_index)?;
        if self.db.column_families().is_empty_range(cf_index, &start, &end)? {
            return Ok(RangeIter::empty());
        }
        let iter =
            self.snapshot
                .iterator_cf_opt(cf, bounded_read_options(&start, &end), forward_from(&start));
        Ok(RangeIter::new(iter))
    }

    /// Give the view back to the engine now instead of at scope exit.
    pub fn release(self) {}
}
