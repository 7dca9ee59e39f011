/// Handle to a Column Family
///
/// A lightweight, index-addressed reference to one of the column families
/// opened with the database. The index is the position of the column family
/// in [`DbOptions::column_families`](crate::DbOptions) and never changes while
/// the database is open.
///
/// # Lifetime
///
/// The engine-side column family is owned by the
/// [`DatabaseHandle`](crate::DatabaseHandle) and released only when the
/// handle is torn down. A `ColumnFamilyHandle` carries no engine pointer, so
/// holding one past teardown is harmless; resolving it goes through the
/// database again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnFamilyHandle {
    /// Position in the open-time column family list
    pub(crate) index: usize,

    /// Name of the column family
    pub(crate) name: String,
}

impl ColumnFamilyHandle {
    pub(crate) fn new(index: usize, name: String) -> Self {
        ColumnFamilyHandle { index, name }
    }

    /// Get the column family index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the column family name
    pub fn name(&self) -> &str {
        &self.name
    }
}
