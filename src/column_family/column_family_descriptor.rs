use serde::{Deserialize, Serialize};

/// Which ordering a column family is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorSlot {
    /// The primary host comparator (bytewise when custom comparators are off)
    #[default]
    Primary,
    /// The secondary host comparator (bytewise when custom comparators are off)
    Secondary,
    /// Always the engine's built-in bytewise order
    Bytewise,
}

/// Descriptor for a column family opened with the database
///
/// # Example
///
/// ```
/// use kvbridge::{ColumnFamilySpec, ComparatorSlot, DbOptions};
///
/// let options = DbOptions {
///     column_families: vec![
///         ColumnFamilySpec::new("default", ComparatorSlot::Primary),
///         ColumnFamilySpec::new("index", ComparatorSlot::Secondary),
///         ColumnFamilySpec::new("meta", ComparatorSlot::Bytewise),
///     ],
///     ..DbOptions::new("/tmp/mydb")
/// };
/// assert_eq!(options.column_families[1].name, "index");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFamilySpec {
    /// Name of the column family
    pub name: String,

    /// Ordering used for keys in this column family
    #[serde(default)]
    pub comparator: ComparatorSlot,
}

impl ColumnFamilySpec {
    pub fn new<S: Into<String>>(name: S, comparator: ComparatorSlot) -> Self {
        ColumnFamilySpec {
            name: name.into(),
            comparator,
        }
    }
}
