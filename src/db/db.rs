use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use rocksdb::{ColumnFamily, WriteOptions};
use tracing::{debug, info, warn};

use crate::{
    column_family::{ColumnFamilyHandle, ColumnFamilySet},
    comparator::{ComparatorAdapter, CompareFn},
    db::{DbOptions, LiveResources, ResourceLedger},
    import_export::{BulkLoadWriter, IngestOptions},
    iterator::{RangeIter, bounded_read_options, forward_from},
    transaction::{SnapshotGuard, TransactionHandle, TransactionOptions},
    util::{Result, Slice, Status},
};

/// The engine instance behind a [`DatabaseHandle`]
pub(crate) type Engine = rocksdb::OptimisticTransactionDB;

/// An open database and everything it owns
///
/// The handle owns the engine instance, its column families (addressed by
/// index, see [`DbOptions::column_families`]) and up to two comparator
/// adapters. Snapshots, transactions and bulk-load writers borrow the handle
/// and therefore cannot outlive it; teardown happens once, on drop, in this
/// order:
///
/// 1. column families and the engine instance are closed
/// 2. the comparator adapters are released
/// 3. with `destroy_on_exit`, the database directory is deleted
///
/// The handle is `Sync`: several threads may read, write, scan and begin
/// transactions on it at once. The borrowed components are meant for one
/// owner at a time.
///
/// ```compile_fail
/// use kvbridge::{DatabaseHandle, DbOptions};
///
/// let writer = {
///     let db = DatabaseHandle::open_default(&DbOptions::new("/tmp/kvbridge-doc")).unwrap();
///     db.bulk_load_writer(std::path::Path::new("/tmp/x.sst"), 0).unwrap()
/// }; // error: `db` does not live long enough
/// ```
pub struct DatabaseHandle {
    // Fields drop in declaration order. The engine goes first; it calls back
    // into the comparators until it is closed.
    engine: Engine,
    column_families: ColumnFamilySet,
    primary: Option<Arc<ComparatorAdapter>>,
    secondary: Option<Arc<ComparatorAdapter>>,
    ledger: ResourceLedger,
    ingest_options: IngestOptions,
    // Last, so the directory is only removed once everything is closed.
    teardown: DestroyOnExit,
}

/// Deletes the database directory on drop when `enabled`.
struct DestroyOnExit {
    path: PathBuf,
    enabled: bool,
}

impl Drop for DestroyOnExit {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        match rocksdb::DB::destroy(&rocksdb::Options::default(), &self.path) {
            Ok(()) => info!(path = %self.path.display(), "database destroyed on exit"),
            Err(e) => warn!(path = %self.path.display(), "destroy on exit failed: {e}"),
        }
    }
}

impl DatabaseHandle {
    /// Open a database.
    ///
    /// With `comparator_enabled` the column families are ordered by the host
    /// callbacks (see [`ComparatorSlot`](crate::ComparatorSlot)); the
    /// comparator names are taken from `options` and must match the names the
    /// database was created with. Without it every column family is
    /// bytewise and the callbacks are ignored.
    ///
    /// On failure no handle is returned and everything built so far is
    /// released.
    pub fn open(
        options: &DbOptions,
        comparator_enabled: bool,
        primary_cmp: Option<CompareFn>,
        secondary_cmp: Option<CompareFn>,
    ) -> Result<Self> {
        options.validate()?;

        let (primary, secondary) = if comparator_enabled {
            let primary_cmp = primary_cmp.ok_or_else(|| {
                Status::invalid_argument("custom comparator enabled without a primary comparator")
            })?;
            let primary = ComparatorAdapter::new(
                options.primary_comparator_name.as_str(),
                options.comparator_different_bytes_can_be_equal,
                primary_cmp,
            )?;
            let secondary = secondary_cmp
                .map(|cmp| {
                    ComparatorAdapter::new(
                        options.secondary_comparator_name.as_str(),
                        options.comparator_different_bytes_can_be_equal,
                        cmp,
                    )
                })
                .transpose()?;
            (Some(Arc::new(primary)), secondary.map(Arc::new))
        } else {
            (None, None)
        };

        let column_families = ColumnFamilySet::new(
            options,
            primary.as_ref(),
            secondary.as_ref(),
            comparator_enabled,
        )?;

        let engine = Engine::open_cf_descriptors(
            &options.engine_options(),
            &options.path,
            column_families.descriptors(),
        )?;

        info!(
            path = %options.path,
            column_families = column_families.len(),
            custom_comparator = comparator_enabled,
            "database opened"
        );

        Ok(DatabaseHandle {
            teardown: DestroyOnExit {
                path: engine.path().to_path_buf(),
                enabled: options.destroy_on_exit,
            },
            engine,
            column_families,
            primary,
            secondary,
            ledger: ResourceLedger::default(),
            ingest_options: IngestOptions {
                move_files: options.move_files_on_ingest,
            },
        })
    }

    /// Open with bytewise ordering in every column family.
    pub fn open_default(options: &DbOptions) -> Result<Self> {
        Self::open(options, false, None, None)
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    pub(crate) fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub(crate) fn column_families(&self) -> &ColumnFamilySet {
        &self.column_families
    }

    /// Resolve a column family index to the engine's column family.
    ///
    /// Every operation goes through here, so a comparator that has panicked
    /// stops the database from being used further.
    pub(crate) fn cf(&self, index: usize) -> Result<&ColumnFamily> {
        self.check_comparators()?;
        let handle = self.column_families.handle(index)?;
        self.engine.cf_handle(&handle.name).ok_or_else(|| {
            Status::corruption(format!(
                "column family {:?} is not open in the engine",
                handle.name
            ))
        })
    }

    /// Fail with `Corruption` if a comparator callback has panicked.
    pub fn check_comparators(&self) -> Result<()> {
        for adapter in [&self.primary, &self.secondary].into_iter().flatten() {
            adapter.check()?;
        }
        Ok(())
    }

    pub fn get_path(&self) -> &Path {
        &self.teardown.path
    }

    pub fn column_family_count(&self) -> usize {
        self.column_families.len()
    }

    pub fn column_family(&self, index: usize) -> Result<&ColumnFamilyHandle> {
        self.column_families.handle(index)
    }

    pub fn column_family_name(&self, index: usize) -> Result<&str> {
        Ok(self.column_families.handle(index)?.name())
    }

    pub fn column_family_handles(&self) -> &[ColumnFamilyHandle] {
        self.column_families.handles()
    }

    pub fn primary_comparator(&self) -> Option<&ComparatorAdapter> {
        self.primary.as_deref()
    }

    pub fn secondary_comparator(&self) -> Option<&ComparatorAdapter> {
        self.secondary.as_deref()
    }

    /// Snapshots, transactions and bulk-load writers currently alive.
    pub fn live_resources(&self) -> LiveResources {
        self.ledger.live()
    }

    pub fn snapshot(&self) -> SnapshotGuard<'_> {
        SnapshotGuard::acquire(self)
    }

    pub fn begin_transaction(&self) -> TransactionHandle<'_> {
        self.begin_transaction_with(&TransactionOptions::default())
    }

    pub fn begin_transaction_with(&self, options: &TransactionOptions) -> TransactionHandle<'_> {
        TransactionHandle::begin(self, options)
    }

    /// Latest committed value of `key`.
    pub fn get(&self, key: Slice<'_>, cf_index: usize) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_index)?;
        Ok(self.engine.get_cf(cf, key)?)
    }

    /// Scan `[start, end)` in the column family's key order.
    pub fn scan(&self, start: Slice<'_>, end: Slice<'_>, cf_index: usize) -> Result<RangeIter<'_>> {
        let cf = self.cf(cf_index)?;
        if self.column_families.is_empty_range(cf_index, &start, &end)? {
            return Ok(RangeIter::empty());
        }
        let iter =
            self.engine
                .iterator_cf_opt(cf, bounded_read_options(&start, &end), forward_from(&start));
        Ok(RangeIter::new(iter))
    }

    /// Delete every key in `[start, end)`.
    ///
    /// The delete is one write straight to the base database, outside
    /// transaction conflict tracking. Callers must not run overlapping range
    /// deletes or transactions touching the range concurrently; the engine
    /// does not serialize them.
    pub fn delete_range(&self, start: Slice<'_>, end: Slice<'_>, cf_index: usize) -> Result<()> {
        let cf = self.cf(cf_index)?;
        if self.column_families.is_empty_range(cf_index, &start, &end)? {
            return Ok(());
        }
        debug!(cf_index, start = %start, end = %end, "delete range");
        self.engine
            .delete_range_cf_opt(cf, start, end, &WriteOptions::default())?;
        Ok(())
    }

    /// Compact the key range `[start, end)`. Blocks until done.
    ///
    /// The engine's manual compaction call reports no status, so only
    /// column family and comparator failures come back as errors. A failure
    /// inside the engine's compaction is not visible to the caller.
    pub fn compact_range(&self, start: Slice<'_>, end: Slice<'_>, cf_index: usize) -> Result<()> {
        let cf = self.cf(cf_index)?;
        if self.column_families.is_empty_range(cf_index, &start, &end)? {
            return Ok(());
        }
        debug!(cf_index, start = %start, end = %end, "compact range");
        self.engine.compact_range_cf(cf, Some(start), Some(end));
        Ok(())
    }

    /// Flush the column family's memtable to disk.
    pub fn flush(&self, cf_index: usize) -> Result<()> {
        let cf = self.cf(cf_index)?;
        Ok(self.engine.flush_cf(cf)?)
    }

    /// Start writing an SST file at `path` for column family `cf_index`.
    pub fn bulk_load_writer(&self, path: &Path, cf_index: usize) -> Result<BulkLoadWriter<'_>> {
        BulkLoadWriter::open(self, path, cf_index)
    }

    /// Atomically add a finished bulk-load file to column family `cf_index`.
    ///
    /// Safe alongside reads. Concurrent ingests into overlapping key ranges
    /// of the same column family must be serialized by the caller.
    pub fn ingest(&self, path: &Path, cf_index: usize) -> Result<()> {
        let options = self.ingest_options.clone();
        self.ingest_with(path, cf_index, &options)
    }

    pub fn ingest_with(&self, path: &Path, cf_index: usize, options: &IngestOptions) -> Result<()> {
        let cf = self.cf(cf_index)?;
        if !path.is_file() {
            return Err(Status::not_found(format!(
                "bulk-load file {} does not exist",
                path.display()
            )));
        }
        self.engine
            .ingest_external_file_cf_opts(cf, &options.to_engine(), vec![path])?;
        info!(path = %path.display(), cf_index, "bulk-load file ingested");
        Ok(())
    }
}

impl Drop for DatabaseHandle {
    fn drop(&mut self) {
        let live = self.ledger.live();
        if !live.is_empty() {
            warn!(
                path = %self.teardown.path.display(),
                snapshots = live.snapshots,
                transactions = live.transactions,
                bulk_load_writers = live.bulk_load_writers,
                "closing database with leaked resources"
            );
        }
        debug!(path = %self.teardown.path.display(), "closing database");
    }
}
