#![no_main]
use libfuzzer_sys::fuzz_target;
use practicable_smt::backends::smtlib_printer::{parse_real_numeral, real_to_smtlib};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Whatever parses must print back to a numeral with the same value.
        if let Ok(value) = parse_real_numeral(s) {
            let printed = real_to_smtlib(&value);
            assert_eq!(parse_real_numeral(&printed).ok(), Some(value));
        }
    }
});
