use std::sync::atomic::{AtomicUsize, Ordering};

/// Kinds of resources that borrow the database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Snapshot,
    Transaction,
    BulkLoadWriter,
}

/// Count of borrowers currently alive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveResources {
    pub snapshots: usize,
    pub transactions: usize,
    pub bulk_load_writers: usize,
}

impl LiveResources {
    pub fn is_empty(&self) -> bool {
        self.snapshots == 0 && self.transactions == 0 && self.bulk_load_writers == 0
    }
}

/// Tracks every snapshot, transaction and bulk-load writer handed out by a
/// database. Each one holds a [`LedgerToken`] whose drop is the single
/// release; a non-zero count at teardown means a guard was leaked.
#[derive(Debug, Default)]
pub(crate) struct ResourceLedger {
    snapshots: AtomicUsize,
    transactions: AtomicUsize,
    bulk_load_writers: AtomicUsize,
}

impl ResourceLedger {
    fn counter(&self, kind: ResourceKind) -> &AtomicUsize {
        match kind {
            ResourceKind::Snapshot => &self.snapshots,
            ResourceKind::Transaction => &self.transactions,
            ResourceKind::BulkLoadWriter => &self.bulk_load_writers,
        }
    }

    pub(crate) fn acquire(&self, kind: ResourceKind) -> LedgerToken<'_> {
        self.counter(kind).fetch_add(1, Ordering::AcqRel);
        LedgerToken { ledger: self, kind }
    }

    pub(crate) fn live(&self) -> LiveResources {
        LiveResources {
            snapshots: self.snapshots.load(Ordering::Acquire),
            transactions: self.transactions.load(Ordering::Acquire),
            bulk_load_writers: self.bulk_load_writers.load(Ordering::Acquire),
        }
    }
}

/// Proof of one acquisition; releases it on drop.
#[derive(Debug)]
pub(crate) struct LedgerToken<'a> {
    ledger: &'a ResourceLedger,
    kind: ResourceKind,
}

impl Drop for LedgerToken<'_> {
    fn drop(&mut self) {
        self.ledger.counter(self.kind).fetch_sub(1, Ordering::AcqRel);
    }
}
