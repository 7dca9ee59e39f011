use rocksdb::{OptimisticTransactionOptions, Transaction, WriteOptions};
use tracing::{debug, warn};

use crate::{
    db::{DatabaseHandle, Engine, LedgerToken, ResourceKind},
    iterator::{RangeIter, bounded_read_options, forward_from},
    util::{Result, Slice, Status},
};

/// Options for beginning a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Pin a snapshot at begin, so conflict detection covers every key
    /// written by others after the transaction started
    pub set_snapshot: bool,
    /// Sync the write-ahead log on commit
    pub sync: bool,
}

/// Lifecycle of a [`TransactionHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    RolledBack,
}

/// One engine transaction, addressed by column family index
///
/// Writes are staged inside the transaction and become visible to others
/// only on [`commit`](Self::commit). Reads see the transaction's own staged
/// writes first, then the database. Conflicts with concurrent writers are
/// detected at commit time (optimistic concurrency control); a failed commit
/// leaves the transaction rolled back.
///
/// Commit and rollback are terminal. Every call after either one fails with
/// `InvalidArgument`. Dropping an open transaction rolls it back.
///
/// The handle borrows the database it came from:
///
/// ```compile_fail
/// use kvbridge::{DatabaseHandle, DbOptions};
///
/// let db = DatabaseHandle::open_default(&DbOptions::new("/tmp/kvbridge-doc")).unwrap();
/// let mut txn = db.begin_transaction();
/// drop(db); // error: `db` is still borrowed by `txn`
/// txn.commit().unwrap();
/// ```
pub struct TransactionHandle<'db> {
    db: &'db DatabaseHandle,
    txn: Option<Transaction<'db, Engine>>,
    state: TransactionState,
    _token: LedgerToken<'db>,
}

impl<'db> TransactionHandle<'db> {
    pub(crate) fn begin(db: &'db DatabaseHandle, options: &TransactionOptions) -> Self {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(options.sync);
        let mut txn_opts = OptimisticTransactionOptions::new();
        txn_opts.set_snapshot(options.set_snapshot);

        let _token = db.ledger().acquire(ResourceKind::Transaction);
        TransactionHandle {
            db,
            txn: Some(db.engine().transaction_opt(&write_opts, &txn_opts)),
            state: TransactionState::Open,
            _token,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn open_txn(&self) -> Result<&Transaction<'db, Engine>> {
        match (&self.txn, self.state) {
            (Some(txn), TransactionState::Open) => Ok(txn),
            (_, TransactionState::Committed) => {
                Err(Status::invalid_argument("transaction already committed"))
            },
            _ => Err(Status::invalid_argument("transaction already rolled back")),
        }
    }

    /// Read `key`, seeing this transaction's staged writes.
    pub fn get(&self, key: Slice<'_>, cf_index: usize) -> Result<Option<Vec<u8>>> {
        let txn = self.open_txn()?;
        let cf = self.db.cf(cf_index)?;
        Ok(txn.get_cf(cf, key)?)
    }

    /// Read `key` and track it, so the commit fails if someone else writes
    /// it first.
    pub fn get_for_update(
        &self,
        key: Slice<'_>,
        cf_index: usize,
        exclusive: bool,
    ) -> Result<Option<Vec<u8>>> {
        let txn = self.open_txn()?;
        let cf = self.db.cf(cf_index)?;
        Ok(txn.get_for_update_cf(cf, key, exclusive)?)
    }

    pub fn exists(&self, key: Slice<'_>, cf_index: usize) -> Result<bool> {
        Ok(self.get(key, cf_index)?.is_some())
    }

    pub fn put(&mut self, key: Slice<'_>, value: Slice<'_>, cf_index: usize) -> Result<()> {
        let txn = self.open_txn()?;
        let cf = self.db.cf(cf_index)?;
        Ok(txn.put_cf(cf, key, value)?)
    }

    pub fn delete(&mut self, key: Slice<'_>, cf_index: usize) -> Result<()> {
        let txn = self.open_txn()?;
        let cf = self.db.cf(cf_index)?;
        Ok(txn.delete_cf(cf, key)?)
    }

    /// Scan `[start, end)`, merging staged writes over the database.
    pub fn scan(&self, start: Slice<'_>, end: Slice<'_>, cf_index: usize) -> Result<RangeIter<'_>> {
        let txn = self.open_txn()?;
        let cf = self.db.cf(cf_index)?;
        if self.db.column_families().is_empty_range(cf_index, &start, &end)? {
            return Ok(RangeIter::empty());
        }
        let iter = txn.iterator_cf_opt(cf, bounded_read_options(&start, &end), forward_from(&start));
        Ok(RangeIter::new(iter))
    }

    /// Atomically apply every staged write.
    ///
    /// On failure (typically `Busy` for a write conflict) nothing is applied
    /// and the transaction ends rolled back.
    pub fn commit(&mut self) -> Result<()> {
        self.open_txn()?;
        let Some(txn) = self.txn.take() else {
            return Err(Status::invalid_argument("transaction already rolled back"));
        };
        match txn.commit() {
            Ok(()) => {
                self.state = TransactionState::Committed;
                Ok(())
            },
            Err(e) => {
                self.state = TransactionState::RolledBack;
                let status = Status::from(e);
                debug!("transaction commit failed, rolled back: {status}");
                Err(status)
            },
        }
    }

    /// Discard every staged write.
    pub fn rollback(&mut self) -> Result<()> {
        self.open_txn()?;
        self.state = TransactionState::RolledBack;
        match self.txn.take() {
            Some(txn) => Ok(txn.rollback()?),
            None => Ok(()),
        }
    }
}

impl Drop for TransactionHandle<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            debug!("transaction dropped while open, rolling back");
            if let Err(e) = txn.rollback() {
                warn!("rollback of dropped transaction failed: {e}");
            }
        }
    }
}
