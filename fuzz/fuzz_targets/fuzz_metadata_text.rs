//! Fuzz target for metadata text parsing.
//!
//! Tests that `MetadataRecord::from_text` handles arbitrary input without
//! panicking, and that whatever it accepts survives a second round.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mth_metadata::MetadataRecord;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(record) = MetadataRecord::from_text(text) {
        let written = record.to_text().expect("accepted record renders");
        let reread = MetadataRecord::from_text(&written).expect("rendered record parses");
        assert_eq!(reread, record);
    }
});
