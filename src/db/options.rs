use std::sync::Arc;

use rocksdb::{BlockBasedOptions, SliceTransform};
use serde::{Deserialize, Serialize};

use crate::{
    column_family::{ColumnFamilySpec, ComparatorSlot, DEFAULT_COLUMN_FAMILY_NAME},
    comparator::ComparatorAdapter,
    util::{Result, Status},
};

/// Options for opening a [`DatabaseHandle`](crate::DatabaseHandle)
///
/// Every field has a default, so hosts that pass options as JSON only need
/// to name what they change:
///
/// ```
/// use kvbridge::DbOptions;
///
/// let opts = DbOptions::from_json(r#"{ "path": "/tmp/db", "destroy_on_exit": true }"#).unwrap();
/// assert!(opts.destroy_on_exit);
/// assert!(opts.create_if_missing);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbOptions {
    /// Database directory
    pub path: String,
    pub create_if_missing: bool,
    pub paranoid_checks: bool,
    /// Delete the database directory when the handle is torn down
    pub destroy_on_exit: bool,
    /// Background thread count (0 = engine default)
    pub increase_parallelism: i32,
    /// Memtable memory budget for level-style compaction (0 = engine default)
    pub optimize_level_style_compaction: usize,
    /// Tune the engine for bulk loading (disables automatic compaction)
    pub prepare_for_bulk_load: bool,
    /// Bits per key for bloom filters (None = no bloom filter)
    pub bloom_filter_bits_per_key: Option<f64>,
    /// Fixed-length prefix extractor (None = no prefix extractor)
    pub fixed_prefix_length: Option<usize>,
    /// Persisted name of the primary comparator
    pub primary_comparator_name: String,
    /// Persisted name of the secondary comparator
    pub secondary_comparator_name: String,
    pub comparator_different_bytes_can_be_equal: bool,
    /// Column families in index order
    pub column_families: Vec<ColumnFamilySpec>,
    /// Move (rather than copy) files into the database on ingestion
    pub move_files_on_ingest: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        DbOptions {
            path: String::new(),
            create_if_missing: true,
            paranoid_checks: false,
            destroy_on_exit: false,
            increase_parallelism: 0,
            optimize_level_style_compaction: 0,
            prepare_for_bulk_load: false,
            bloom_filter_bits_per_key: Some(10.0), // ~1% false positive rate
            fixed_prefix_length: None,
            primary_comparator_name: "kvbridge.primary".to_string(),
            secondary_comparator_name: "kvbridge.secondary".to_string(),
            comparator_different_bytes_can_be_equal: false,
            column_families: vec![ColumnFamilySpec::new(
                DEFAULT_COLUMN_FAMILY_NAME,
                ComparatorSlot::Primary,
            )],
            move_files_on_ingest: false,
        }
    }
}

impl DbOptions {
    pub fn new(path: impl Into<String>) -> Self {
        DbOptions {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Append a column family; its index is the current count.
    pub fn with_column_family(mut self, name: impl Into<String>, slot: ComparatorSlot) -> Self {
        self.column_families.push(ColumnFamilySpec::new(name, slot));
        self
    }

    /// Checks that do not need the engine. Column family specs are checked
    /// when the column family set is built.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(Status::invalid_argument("database path must not be empty"));
        }
        if self.increase_parallelism < 0 {
            return Err(Status::invalid_argument(format!(
                "increase_parallelism must not be negative, got {}",
                self.increase_parallelism
            )));
        }
        if let Some(bits) = self.bloom_filter_bits_per_key {
            if !(bits > 0.0 && bits.is_finite()) {
                return Err(Status::invalid_argument(format!(
                    "bloom_filter_bits_per_key must be positive, got {bits}"
                )));
            }
        }
        if self.fixed_prefix_length == Some(0) {
            return Err(Status::invalid_argument("fixed_prefix_length must be positive"));
        }
        Ok(())
    }

    /// Database-wide engine options.
    pub(crate) fn engine_options(&self) -> rocksdb::Options {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(self.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_paranoid_checks(self.paranoid_checks);
        if self.increase_parallelism > 0 {
            opts.increase_parallelism(self.increase_parallelism);
        }
        if self.optimize_level_style_compaction > 0 {
            opts.optimize_level_style_compaction(self.optimize_level_style_compaction);
        }
        if self.prepare_for_bulk_load {
            opts.prepare_for_bulk_load();
        }
        opts
    }

    /// Bloom filter bits for a column family ordered by `comparator`.
    ///
    /// Bloom filters hash raw key bytes. A comparator that can call two
    /// different byte strings equal would have the filter reject keys it
    /// considers present, so such column families get no filter.
    pub(crate) fn bloom_filter_bits(
        &self,
        comparator: Option<&Arc<ComparatorAdapter>>,
    ) -> Option<f64> {
        match comparator {
            Some(cmp) if cmp.can_different_bytes_be_equal() => None,
            _ => self.bloom_filter_bits_per_key,
        }
    }

    /// Engine options for one column family, ordered by `comparator` when
    /// given and bytewise otherwise.
    pub(crate) fn column_family_options(
        &self,
        comparator: Option<&Arc<ComparatorAdapter>>,
    ) -> rocksdb::Options {
        let mut opts = rocksdb::Options::default();
        if self.optimize_level_style_compaction > 0 {
            opts.optimize_level_style_compaction(self.optimize_level_style_compaction);
        }
        if self.prepare_for_bulk_load {
            opts.prepare_for_bulk_load();
        }
        if let Some(bits) = self.bloom_filter_bits(comparator) {
            let mut table = BlockBasedOptions::default();
            table.set_bloom_filter(bits, false);
            opts.set_block_based_table_factory(&table);
        }
        if let Some(len) = self.fixed_prefix_length {
            opts.set_prefix_extractor(SliceTransform::create_fixed_prefix(len));
        }
        if let Some(comparator) = comparator {
            comparator.install(&mut opts);
        }
        opts
    }
}
