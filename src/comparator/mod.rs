/// Host-supplied key ordering
///
/// A [`ComparatorAdapter`] wraps the host's ordering callback so the engine
/// can call it from any of its threads (foreground writes, flush, background
/// compaction). The adapter is immutable once built:
///
/// - `name` is persisted by the engine; reopening a database under a
///   different name is rejected at open time.
/// - `can_different_bytes_be_equal` records whether two distinct byte strings
///   may compare `Equal`.
/// - Separator and successor shortening are no-ops, so the callback is the
///   only ordering logic the engine ever sees.
///
/// A panic in the callback is caught here and never unwinds into the engine.
/// The first panic message is kept and the owning database reports it as
/// `Corruption` on its next operation.
use std::{
    cmp::Ordering,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
};

use parking_lot::Mutex;
use tracing::warn;

use crate::util::{Result, Status};

/// Ordering callback supplied by the host.
///
/// Must be total over all byte strings (including the empty one), free of side
/// effects, and callable concurrently from several threads.
#[derive(Clone)]
pub struct CompareFn(Arc<dyn Fn(&[u8], &[u8]) -> Ordering + Send + Sync>);

impl CompareFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[u8], &[u8]) -> Ordering + Send + Sync + 'static,
    {
        CompareFn(Arc::new(f))
    }

    /// Plain lexicographic byte order.
    pub fn bytewise() -> Self {
        CompareFn::new(|a, b| a.cmp(b))
    }

    /// Convert a C-style `-1/0/1` comparison into an ordering callback.
    pub fn from_signed<F>(f: F) -> Self
    where
        F: Fn(&[u8], &[u8]) -> i8 + Send + Sync + 'static,
    {
        CompareFn::new(move |a, b| f(a, b).cmp(&0))
    }

    fn call(&self, a: &[u8], b: &[u8]) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for CompareFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompareFn(..)")
    }
}

pub struct ComparatorAdapter {
    name: String,
    can_different_bytes_be_equal: bool,
    compare_fn: CompareFn,
    failed: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl ComparatorAdapter {
    pub fn new(
        name: impl Into<String>,
        can_different_bytes_be_equal: bool,
        compare_fn: CompareFn,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Status::invalid_argument("comparator name must not be empty"));
        }
        if name.contains('\0') {
            return Err(Status::invalid_argument(format!(
                "comparator name {name:?} contains a NUL byte"
            )));
        }

        Ok(ComparatorAdapter {
            name,
            can_different_bytes_be_equal,
            compare_fn,
            failed: AtomicBool::new(false),
            failure: Mutex::new(None),
        })
    }

    pub fn bytewise(name: impl Into<String>) -> Result<Self> {
        Self::new(name, false, CompareFn::bytewise())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_different_bytes_be_equal(&self) -> bool {
        self.can_different_bytes_be_equal
    }

    /// Order `a` against `b` with the host callback.
    ///
    /// If the callback panics the pair is reported `Equal` and the adapter
    /// is marked failed.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match panic::catch_unwind(AssertUnwindSafe(|| self.compare_fn.call(a, b))) {
            Ok(ordering) => ordering,
            Err(payload) => {
                self.record_failure(panic_message(payload.as_ref()));
                Ordering::Equal
            },
        }
    }

    /// Key shortening hook. Keys are never shortened.
    pub fn find_shortest_separator(&self, _start: &mut Vec<u8>, _limit: &[u8]) {}

    /// Key shortening hook. Keys are never shortened.
    pub fn find_short_successor(&self, _key: &mut Vec<u8>) {}

    pub fn has_failed(&self) -> bool {
        self.failed.load(AtomicOrdering::Acquire)
    }

    /// First panic raised by the callback, if any.
    pub fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    /// Fail with `Corruption` if the callback has ever panicked.
    pub fn check(&self) -> Result<()> {
        if !self.has_failed() {
            return Ok(());
        }
        let msg = self.failure().unwrap_or_default();
        Err(Status::corruption(format!(
            "comparator {} panicked, ordering can no longer be trusted: {msg}",
            self.name
        )))
    }

    /// Register this adapter as the comparator of `opts`.
    pub(crate) fn install(self: &Arc<Self>, opts: &mut rocksdb::Options) {
        let adapter = Arc::clone(self);
        opts.set_comparator(
            self.name.as_str(),
            Box::new(move |a: &[u8], b: &[u8]| adapter.compare(a, b)),
        );
    }

    fn record_failure(&self, msg: String) {
        let mut failure = self.failure.lock();
        if failure.is_none() {
            warn!(comparator = %self.name, "comparator callback panicked: {msg}");
            *failure = Some(msg);
        }
        self.failed.store(true, AtomicOrdering::Release);
    }
}

impl fmt::Debug for ComparatorAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorAdapter")
            .field("name", &self.name)
            .field("can_different_bytes_be_equal", &self.can_different_bytes_be_equal)
            .field("failed", &self.has_failed())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
