use std::cmp::Ordering;

use kvbridge::{ComparatorSlot, CompareFn, DatabaseHandle, DbOptions, Slice};
use tempfile::TempDir;

fn reverse() -> CompareFn {
    CompareFn::new(|a, b| b.cmp(a))
}

// Shorter keys first, then bytewise.
fn length_first() -> CompareFn {
    CompareFn::new(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
}

fn options(dir: &TempDir) -> DbOptions {
    DbOptions::new(dir.path().join("cmp_db").to_str().unwrap())
}

#[test]
fn test_scan_uses_primary_order() {
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseHandle::open(&options(&temp_dir), true, Some(reverse()), None).unwrap();
    assert_eq!(db.primary_comparator().unwrap().name(), "kvbridge.primary");

    let mut txn = db.begin_transaction();
    for key in ["a", "b", "c", "d"] {
        txn.put(key.into(), key.into(), 0).unwrap();
    }
    txn.commit().unwrap();

    let keys = db.scan("z".into(), Slice::empty(), 0).unwrap().keys().unwrap();
    assert_eq!(keys, vec![b"d".to_vec(), b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);

    // "a" sorts after "c" here, so this is the range {c, b}.
    let keys = db.scan("c".into(), "a".into(), 0).unwrap().keys().unwrap();
    assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec()]);

    // Empty under this order.
    assert!(db.scan("a".into(), "c".into(), 0).unwrap().next().is_none());

    db.delete_range("d".into(), "b".into(), 0).unwrap();
    let keys = db.scan("z".into(), Slice::empty(), 0).unwrap().keys().unwrap();
    assert_eq!(keys, vec![b"b".to_vec(), b"a".to_vec()]);
}

#[test]
fn test_secondary_slot_per_column_family() {
    let temp_dir = TempDir::new().unwrap();
    let opts = options(&temp_dir)
        .with_column_family("by_length", ComparatorSlot::Primary)
        .with_column_family("reversed", ComparatorSlot::Secondary)
        .with_column_family("plain", ComparatorSlot::Bytewise);
    let db = DatabaseHandle::open(&opts, true, Some(length_first()), Some(reverse())).unwrap();
    assert_eq!(db.column_family_count(), 4);
    assert_eq!(db.secondary_comparator().unwrap().name(), "kvbridge.secondary");

    let mut txn = db.begin_transaction();
    for cf in 1..4 {
        for key in ["bb", "a", "ccc"] {
            txn.put(key.into(), key.into(), cf).unwrap();
        }
    }
    txn.commit().unwrap();

    let by_length = db.scan(Slice::empty(), "zzzz".into(), 1).unwrap().keys().unwrap();
    assert_eq!(by_length, vec![b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()]);

    let reversed = db.scan("zzzz".into(), Slice::empty(), 2).unwrap().keys().unwrap();
    assert_eq!(reversed, vec![b"ccc".to_vec(), b"bb".to_vec(), b"a".to_vec()]);

    let plain = db.scan(Slice::empty(), "zzzz".into(), 3).unwrap().keys().unwrap();
    assert_eq!(plain, vec![b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()]);
}

#[test]
fn test_secondary_slot_requires_callback() {
    let temp_dir = TempDir::new().unwrap();
    let opts = options(&temp_dir).with_column_family("reversed", ComparatorSlot::Secondary);

    let err = DatabaseHandle::open(&opts, true, Some(reverse()), None).err().unwrap();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_enabled_without_primary_fails() {
    let temp_dir = TempDir::new().unwrap();
    let err = DatabaseHandle::open(&options(&temp_dir), true, None, Some(reverse()))
        .err()
        .unwrap();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_disabled_ignores_callbacks() {
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseHandle::open(&options(&temp_dir), false, Some(reverse()), None).unwrap();
    assert!(db.primary_comparator().is_none());

    let mut txn = db.begin_transaction();
    txn.put("b".into(), "".into(), 0).unwrap();
    txn.put("a".into(), "".into(), 0).unwrap();
    txn.commit().unwrap();

    let keys = db.scan("a".into(), "z".into(), 0).unwrap().keys().unwrap();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
}

#[test]
fn test_reopen_with_other_comparator_name_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut opts = options(&temp_dir);
    opts.primary_comparator_name = "app.order.v1".to_string();

    {
        let db = DatabaseHandle::open(&opts, true, Some(reverse()), None).unwrap();
        let mut txn = db.begin_transaction();
        txn.put("k".into(), "v".into(), 0).unwrap();
        txn.commit().unwrap();
    }

    opts.primary_comparator_name = "app.order.v2".to_string();
    let err = DatabaseHandle::open(&opts, true, Some(reverse()), None).err().unwrap();
    assert!(!err.is_ok());
    assert!(err.to_string().to_lowercase().contains("comparator"), "{err}");

    let err = DatabaseHandle::open_default(&opts).err().unwrap();
    assert!(err.to_string().to_lowercase().contains("comparator"), "{err}");

    opts.primary_comparator_name = "app.order.v1".to_string();
    let db = DatabaseHandle::open(&opts, true, Some(reverse()), None).unwrap();
    assert_eq!(db.get("k".into(), 0).unwrap(), Some(b"v".to_vec()));
}

#[test]
fn test_equal_keys_under_comparator_collapse() {
    let temp_dir = TempDir::new().unwrap();
    let mut opts = options(&temp_dir);
    opts.comparator_different_bytes_can_be_equal = true;
    let case_insensitive = CompareFn::new(|a, b| {
        a.iter()
            .map(u8::to_ascii_lowercase)
            .cmp(b.iter().map(u8::to_ascii_lowercase))
    });
    let db = DatabaseHandle::open(&opts, true, Some(case_insensitive), None).unwrap();
    assert!(db.primary_comparator().unwrap().can_different_bytes_be_equal());

    let mut txn = db.begin_transaction();
    txn.put("Key".into(), "first".into(), 0).unwrap();
    txn.commit().unwrap();
    let mut txn = db.begin_transaction();
    txn.put("KEY".into(), "second".into(), 0).unwrap();
    txn.commit().unwrap();

    assert_eq!(db.get("key".into(), 0).unwrap(), Some(b"second".to_vec()));

    // Served from an SST file now; the bloom filter stays on by default and
    // must not reject a key the comparator considers present.
    assert!(opts.bloom_filter_bits_per_key.is_some());
    db.flush(0).unwrap();
    assert_eq!(db.get("key".into(), 0).unwrap(), Some(b"second".to_vec()));
    assert_eq!(db.get("kEy".into(), 0).unwrap(), Some(b"second".to_vec()));
    assert_eq!(db.get("other".into(), 0).unwrap(), None);
}

fn fragile() -> CompareFn {
    CompareFn::new(|a, b| {
        if a == b"boom" || b == b"boom" {
            panic!("cannot order boom");
        }
        a.cmp(b)
    })
}

#[test]
fn test_comparator_panic_in_range_check_is_corruption() {
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseHandle::open(&options(&temp_dir), true, Some(fragile()), None).unwrap();

    let mut txn = db.begin_transaction();
    txn.put("a".into(), "1".into(), 0).unwrap();
    txn.commit().unwrap();

    let err = db.delete_range("boom".into(), "z".into(), 0).unwrap_err();
    assert!(err.is_corruption(), "{err}");
    assert!(db.primary_comparator().unwrap().has_failed());
}

#[test]
fn test_comparator_panic_in_engine_poisons_database() {
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseHandle::open(&options(&temp_dir), true, Some(fragile()), None).unwrap();

    let mut txn = db.begin_transaction();
    txn.put("a".into(), "1".into(), 0).unwrap();
    txn.commit().unwrap();
    assert!(db.check_comparators().is_ok());

    // The memtable lookup orders "boom" against "a" inside the engine. The
    // answer of this call is not trustworthy, only the calls after it.
    let _ = db.get("boom".into(), 0);

    assert!(db.check_comparators().unwrap_err().is_corruption());
    assert!(db.get("a".into(), 0).unwrap_err().is_corruption());
    assert!(db.delete_range("a".into(), "z".into(), 0).unwrap_err().is_corruption());
    assert!(db.scan("a".into(), "z".into(), 0).is_err());

    let mut txn = db.begin_transaction();
    assert!(txn.put("b".into(), "2".into(), 0).unwrap_err().is_corruption());
    drop(txn);

    let failure = db.primary_comparator().unwrap().failure().unwrap();
    assert!(failure.contains("cannot order boom"), "{failure}");
}

#[test]
fn test_comparator_from_signed() {
    let cmp = CompareFn::from_signed(|a, b| match a.len().cmp(&b.len()) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    });
    let temp_dir = TempDir::new().unwrap();
    let db = DatabaseHandle::open(&options(&temp_dir), true, Some(cmp), None).unwrap();

    let mut txn = db.begin_transaction();
    txn.put("xyz".into(), "3".into(), 0).unwrap();
    txn.put("q".into(), "1".into(), 0).unwrap();
    txn.commit().unwrap();

    let keys = db.scan(Slice::empty(), "long key".into(), 0).unwrap().keys().unwrap();
    assert_eq!(keys, vec![b"q".to_vec(), b"xyz".to_vec()]);
}
