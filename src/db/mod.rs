#[allow(clippy::module_inception)]
mod db;
mod ledger;
mod options;

pub use db::DatabaseHandle;
pub(crate) use db::Engine;
pub use ledger::LiveResources;
pub(crate) use ledger::{LedgerToken, ResourceKind, ResourceLedger};
pub use options::DbOptions;
