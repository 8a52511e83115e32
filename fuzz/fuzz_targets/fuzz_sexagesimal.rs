//! Fuzz target for `D:M:S` coordinate parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mth_metadata::sexagesimal_to_decimal;

fuzz_target!(|text: &str| {
    if let Ok(value) = sexagesimal_to_decimal(text) {
        assert!(value.is_finite());
    }
});
