#![no_main]
use libfuzzer_sys::fuzz_target;
use practicable_model::{format_decimal, parse_decimal};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(value) = parse_decimal(s) {
            assert_eq!(parse_decimal(&format_decimal(&value)).ok(), Some(value));
        }
    }
});
