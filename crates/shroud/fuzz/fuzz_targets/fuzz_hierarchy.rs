//! Fuzz target for hierarchy tables.
//!
//! Any accepted hierarchy must answer lookups for every value it lists at
//! every level below its height.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shroud::Parser;

#[derive(Debug, Arbitrary)]
struct Input {
    delimiter: u8,
    bytes: Vec<u8>,
}

fuzz_target!(|input: Input| {
    if input.bytes.len() > 50_000 {
        return;
    }
    let delimiter = match input.delimiter % 4 {
        0 => b';',
        1 => b',',
        2 => b'\t',
        _ => b'|',
    };

    let Ok(hierarchy) = Parser::new().parse_hierarchy_bytes(&input.bytes, delimiter, "fuzz") else {
        return;
    };
    let height = hierarchy.height();
    for value in hierarchy.domain() {
        assert!(hierarchy.contains(value));
        for level in 0..height {
            assert!(hierarchy.generalize(value, level).is_some());
        }
        assert!(hierarchy.generalize(value, height).is_none());
    }
});
