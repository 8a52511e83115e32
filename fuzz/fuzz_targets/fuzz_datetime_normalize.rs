//! Fuzz target for date/time normalization.
//!
//! Normalizing must never panic, and a normalized value is a fixed point.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mth_common::time::normalize;

fuzz_target!(|text: &str| {
    if let Some(canonical) = normalize(text) {
        assert_eq!(normalize(&canonical).as_deref(), Some(canonical.as_str()));
    }
});
