use std::{cmp::Ordering, collections::HashSet, sync::Arc};

use rocksdb::ColumnFamilyDescriptor;

use crate::{
    column_family::{
        ColumnFamilyHandle, ColumnFamilySpec, ComparatorSlot, DEFAULT_COLUMN_FAMILY_NAME,
    },
    comparator::ComparatorAdapter,
    db::DbOptions,
    util::{Result, Status},
};

/// Index-addressed table of the column families opened with a database
///
/// The set is fixed at open time. For every index it keeps the handle, the
/// engine options the column family was opened with (bulk-load writers must
/// reuse them so their files sort the same way) and the ordering used to
/// decide whether a range is empty.
pub(crate) struct ColumnFamilySet {
    handles: Vec<ColumnFamilyHandle>,
    options: Vec<rocksdb::Options>,
    orderings: Vec<Option<Arc<ComparatorAdapter>>>,
    /// Options for "default" when the caller did not list it
    implicit_default: Option<rocksdb::Options>,
}

impl ColumnFamilySet {
    pub(crate) fn new(
        db_options: &DbOptions,
        primary: Option<&Arc<ComparatorAdapter>>,
        secondary: Option<&Arc<ComparatorAdapter>>,
        comparator_enabled: bool,
    ) -> Result<Self> {
        let specs = &db_options.column_families;
        if specs.is_empty() {
            return Err(Status::invalid_argument("at least one column family is required"));
        }

        let mut seen = HashSet::new();
        let mut handles = Vec::with_capacity(specs.len());
        let mut options = Vec::with_capacity(specs.len());
        let mut orderings = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(Status::invalid_argument(format!(
                    "column family #{index} has an empty name"
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(Status::invalid_argument(format!(
                    "column family {:?} listed twice",
                    spec.name
                )));
            }

            let ordering = Self::resolve_slot(spec, primary, secondary, comparator_enabled)?;
            options.push(db_options.column_family_options(ordering.as_ref()));
            orderings.push(ordering);
            handles.push(ColumnFamilyHandle::new(index, spec.name.clone()));
        }

        let implicit_default = if seen.contains(DEFAULT_COLUMN_FAMILY_NAME) {
            None
        } else {
            Some(db_options.column_family_options(None))
        };

        Ok(ColumnFamilySet {
            handles,
            options,
            orderings,
            implicit_default,
        })
    }

    fn resolve_slot(
        spec: &ColumnFamilySpec,
        primary: Option<&Arc<ComparatorAdapter>>,
        secondary: Option<&Arc<ComparatorAdapter>>,
        comparator_enabled: bool,
    ) -> Result<Option<Arc<ComparatorAdapter>>> {
        if !comparator_enabled {
            return Ok(None);
        }
        let adapter = match spec.comparator {
            ComparatorSlot::Bytewise => return Ok(None),
            ComparatorSlot::Primary => primary,
            ComparatorSlot::Secondary => secondary,
        };
        adapter.cloned().map(Some).ok_or_else(|| {
            Status::invalid_argument(format!(
                "column family {:?} requests the {:?} comparator, which was not supplied",
                spec.name, spec.comparator
            ))
        })
    }

    /// Engine descriptors in index order, plus "default" if it was not listed
    pub(crate) fn descriptors(&self) -> Vec<ColumnFamilyDescriptor> {
        let mut descriptors: Vec<_> = self
            .handles
            .iter()
            .zip(&self.options)
            .map(|(handle, opts)| ColumnFamilyDescriptor::new(handle.name.clone(), opts.clone()))
            .collect();
        if let Some(opts) = &self.implicit_default {
            descriptors.push(ColumnFamilyDescriptor::new(
                DEFAULT_COLUMN_FAMILY_NAME,
                opts.clone(),
            ));
        }
        descriptors
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    pub(crate) fn handles(&self) -> &[ColumnFamilyHandle] {
        &self.handles
    }

    pub(crate) fn handle(&self, index: usize) -> Result<&ColumnFamilyHandle> {
        self.handles.get(index).ok_or_else(|| {
            Status::invalid_argument(format!(
                "column family index {index} out of range ({} open)",
                self.handles.len()
            ))
        })
    }

    pub(crate) fn options(&self, index: usize) -> Result<&rocksdb::Options> {
        self.handle(index)?;
        Ok(&self.options[index])
    }

    /// Order two keys the way column family `index` does.
    ///
    /// Fails with `Corruption` if the comparator has panicked, including
    /// during this very call.
    pub(crate) fn compare(&self, index: usize, a: &[u8], b: &[u8]) -> Result<Ordering> {
        self.handle(index)?;
        match &self.orderings[index] {
            Some(adapter) => {
                let ordering = adapter.compare(a, b);
                adapter.check()?;
                Ok(ordering)
            },
            None => Ok(a.cmp(b)),
        }
    }

    /// True if `[start, end)` holds no key in column family `index`.
    pub(crate) fn is_empty_range(&self, index: usize, start: &[u8], end: &[u8]) -> Result<bool> {
        Ok(self.compare(index, start, end)? != Ordering::Less)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::CompareFn;

    fn reverse() -> Arc<ComparatorAdapter> {
        Arc::new(ComparatorAdapter::new("reverse", false, CompareFn::new(|a, b| b.cmp(a))).unwrap())
    }

    fn options_with(specs: Vec<ColumnFamilySpec>) -> DbOptions {
        DbOptions {
            column_families: specs,
            ..DbOptions::new("unused")
        }
    }

    #[test]
    fn test_index_addressing() {
        let opts = options_with(vec![
            ColumnFamilySpec::new("default", ComparatorSlot::Primary),
            ColumnFamilySpec::new("users", ComparatorSlot::Bytewise),
        ]);
        let set = ColumnFamilySet::new(&opts, None, None, false).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.handle(1).unwrap().name(), "users");
        assert_eq!(set.handle(1).unwrap().index(), 1);
        assert!(set.handle(2).unwrap_err().is_invalid_argument());
        assert!(set.implicit_default.is_none());
        assert_eq!(set.descriptors().len(), 2);
    }

    #[test]
    fn test_implicit_default() {
        let opts = options_with(vec![ColumnFamilySpec::new("data", ComparatorSlot::Bytewise)]);
        let set = ColumnFamilySet::new(&opts, None, None, false).unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.implicit_default.is_some());
        assert_eq!(set.descriptors().len(), 2);
    }

    #[test]
    fn test_rejects_bad_specs() {
        let empty = options_with(vec![]);
        assert!(ColumnFamilySet::new(&empty, None, None, false).is_err());

        let duplicate = options_with(vec![
            ColumnFamilySpec::new("a", ComparatorSlot::Primary),
            ColumnFamilySpec::new("a", ComparatorSlot::Primary),
        ]);
        assert!(ColumnFamilySet::new(&duplicate, None, None, false).is_err());

        let unnamed = options_with(vec![ColumnFamilySpec::new("", ComparatorSlot::Primary)]);
        assert!(ColumnFamilySet::new(&unnamed, None, None, false).is_err());
    }

    #[test]
    fn test_missing_secondary_comparator() {
        let opts = options_with(vec![
            ColumnFamilySpec::new("default", ComparatorSlot::Primary),
            ColumnFamilySpec::new("index", ComparatorSlot::Secondary),
        ]);
        let primary = reverse();
        let err = ColumnFamilySet::new(&opts, Some(&primary), None, true).err().unwrap();
        assert!(err.is_invalid_argument());

        // Without custom comparators every slot falls back to bytewise.
        assert!(ColumnFamilySet::new(&opts, None, None, false).is_ok());
    }

    #[test]
    fn test_empty_range_follows_ordering() {
        let opts = options_with(vec![
            ColumnFamilySpec::new("default", ComparatorSlot::Primary),
            ColumnFamilySpec::new("plain", ComparatorSlot::Bytewise),
        ]);
        let primary = reverse();
        let set = ColumnFamilySet::new(&opts, Some(&primary), None, true).unwrap();

        // Reverse order: "c" sorts before "a".
        assert!(!set.is_empty_range(0, b"c", b"a").unwrap());
        assert!(set.is_empty_range(0, b"a", b"c").unwrap());
        assert!(set.is_empty_range(1, b"c", b"a").unwrap());
        assert!(!set.is_empty_range(1, b"a", b"c").unwrap());
        assert!(set.is_empty_range(1, b"b", b"b").unwrap());
    }

    #[test]
    fn test_panicking_comparator_fails_range_check() {
        let opts = options_with(vec![ColumnFamilySpec::new("default", ComparatorSlot::Primary)]);
        let fragile = Arc::new(
            ComparatorAdapter::new(
                "fragile",
                false,
                CompareFn::new(|a, b| {
                    if a == b"boom" || b == b"boom" {
                        panic!("cannot order boom");
                    }
                    a.cmp(b)
                }),
            )
            .unwrap(),
        );
        let set = ColumnFamilySet::new(&opts, Some(&fragile), None, true).unwrap();

        assert!(!set.is_empty_range(0, b"a", b"c").unwrap());
        let err = set.is_empty_range(0, b"boom", b"z").unwrap_err();
        assert!(err.is_corruption());
        // Stays failed for every later comparison.
        assert!(set.compare(0, b"a", b"c").unwrap_err().is_corruption());
    }
}
