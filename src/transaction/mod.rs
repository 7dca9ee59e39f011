mod snapshot;
#[allow(clippy::module_inception)]
mod transaction;

pub use snapshot::SnapshotGuard;
pub use transaction::{TransactionHandle, TransactionOptions, TransactionState};
