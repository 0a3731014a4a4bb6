#![no_main]

use libfuzzer_sys::fuzz_target;
use longest_prefix::{truncate_last_char, TableBuilder};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either load or fail cleanly, never panic.
    let Ok(table) = TableBuilder::new().load(data) else {
        return;
    };

    let subject = String::from_utf8_lossy(data);
    match table.longest_prefix_entry(&subject) {
        Some((key, value)) => {
            assert!(subject.starts_with(key));
            assert_eq!(table.get(key), Some(value));
        }
        None => {
            let mut candidate: &str = &subject;
            while !candidate.is_empty() {
                assert_eq!(table.get(candidate), None);
                candidate = truncate_last_char(candidate);
            }
        }
    }
});
