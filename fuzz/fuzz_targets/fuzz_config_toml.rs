//! Fuzz target for archive configuration parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mth_core::ArchiveConfig;

fuzz_target!(|text: &str| {
    if let Ok(config) = ArchiveConfig::from_toml(text) {
        assert!(config.validate().is_ok());
    }
});
