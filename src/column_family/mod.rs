/// Column Family module
///
/// Column families are independently ordered keyspaces inside one database.
/// They are declared once, at open time, as an ordered list; the position in
/// that list is the column family's index and every later operation names a
/// column family by that index.
///
/// ```text
/// DatabaseHandle
///  ├─→ [0] "default"  (primary comparator)
///  ├─→ [1] "index"    (secondary comparator)
///  └─→ [2] "meta"     (bytewise)
/// ```
///
/// The engine-side column family objects are owned by the database handle
/// and released together with it; nothing else can drop them.
pub mod column_family_descriptor;
pub mod column_family_handle;
mod column_family_set;

pub use column_family_descriptor::{ColumnFamilySpec, ComparatorSlot};
pub use column_family_handle::ColumnFamilyHandle;
pub(crate) use column_family_set::ColumnFamilySet;

/// Default column family name
pub const DEFAULT_COLUMN_FAMILY_NAME: &str = "default";
