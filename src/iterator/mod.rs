/// Range iteration
///
/// Every scan in the crate covers a half-open range `[start, end)` in the
/// column family's own key order. The bounds are pushed down to the engine
/// (`iterate_lower_bound` / `iterate_upper_bound`), so the engine stops at
/// `end` itself and the comparator decides what "before `end`" means.
///
/// ```text
/// DatabaseHandle::scan ─┐
/// SnapshotGuard::scan  ─┼─→ RangeIter ─→ engine iterator (bounded)
/// TransactionHandle::scan┘
/// ```
use rocksdb::{Direction, IteratorMode, ReadOptions};

use crate::util::{Result, Status};

/// Key/value pair produced by a scan
pub type KeyValue = (Box<[u8]>, Box<[u8]>);

type EngineItem = std::result::Result<KeyValue, rocksdb::Error>;

/// Iterator over `[start, end)` of one column family.
///
/// Yields entries in comparator order. An engine error is yielded once and
/// ends the iteration.
pub struct RangeIter<'a> {
    inner: Option<Box<dyn Iterator<Item = EngineItem> + 'a>>,
}

impl<'a> RangeIter<'a> {
    pub(crate) fn new(inner: impl Iterator<Item = EngineItem> + 'a) -> Self {
        RangeIter {
            inner: Some(Box::new(inner)),
        }
    }

    /// Iterator over an empty range
    pub(crate) fn empty() -> Self {
        RangeIter { inner: None }
    }

    /// Drain the iterator, keeping only the keys.
    pub fn keys(self) -> Result<Vec<Vec<u8>>> {
        self.map(|kv| kv.map(|(k, _)| k.into_vec())).collect()
    }
}

impl Iterator for RangeIter<'_> {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;
        match inner.next() {
            Some(Ok(kv)) => Some(Ok(kv)),
            Some(Err(e)) => {
                self.inner = None;
                Some(Err(Status::from(e)))
            },
            None => {
                self.inner = None;
                None
            },
        }
    }
}

/// Read options bounding an engine iterator to `[start, end)`.
pub(crate) fn bounded_read_options(start: &[u8], end: &[u8]) -> ReadOptions {
    let mut opts = ReadOptions::default();
    // A prefix extractor must not restrict a range scan to one prefix.
    opts.set_total_order_seek(true);
    opts.set_iterate_lower_bound(start.to_vec());
    opts.set_iterate_upper_bound(end.to_vec());
    opts
}

/// Seek position for a bounded forward scan.
pub(crate) fn forward_from(start: &[u8]) -> IteratorMode<'_> {
    IteratorMode::From(start, Direction::Forward)
}
