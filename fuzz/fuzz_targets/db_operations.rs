#![no_main]

use kvbridge::{DatabaseHandle, DbOptions, Slice};
use libfuzzer_sys::fuzz_target;

// Fuzz target for transactional operations and range deletes.
// Every call must return a Status, never panic, whatever the bytes are.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let test_dir = format!("/tmp/kvbridge_fuzz_{}", std::process::id());
    let _ = std::fs::remove_dir_all(&test_dir);

    let db = match DatabaseHandle::open_default(&DbOptions::new(test_dir.as_str())) {
        Ok(db) => db,
        Err(_) => {
            let _ = std::fs::remove_dir_all(&test_dir);
            return;
        }
    };

    let mut txn = db.begin_transaction();
    let mut i = 0;
    while i + 2 < data.len() {
        let op_type = data[i] % 5;
        i += 1;

        let key_len = (data[i] as usize).min(255).min(data.len() - i - 1);
        i += 1;

        if i + key_len > data.len() {
            break;
        }

        let key = Slice::from(&data[i..i + key_len]);
        i += key_len;

        match op_type {
            0 => {
                if i >= data.len() {
                    break;
                }
                let value_len = (data[i] as usize).min(255).min(data.len() - i - 1);
                i += 1;

                if i + value_len > data.len() {
                    break;
                }

                let value = Slice::from(&data[i..i + value_len]);
                i += value_len;

                let _ = txn.put(key, value, 0);
            }
            1 => {
                let _ = txn.get(key, 0);
            }
            2 => {
                let _ = txn.delete(key, 0);
            }
            3 => {
                let _ = txn.commit();
                txn = db.begin_transaction();
            }
            4 => {
                let end = key.to_vec().into_iter().rev().collect::<Vec<u8>>();
                let _ = db.delete_range(key, Slice::from(&end), 0);
            }
            _ => unreachable!(),
        }
    }
    let _ = txn.commit();
    drop(txn);

    let _ = db.get(Slice::from("probe_key"), 0);

    drop(db);
    let _ = std::fs::remove_dir_all(&test_dir);
});
