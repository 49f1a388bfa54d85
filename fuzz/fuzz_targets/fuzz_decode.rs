#![no_main]
use libfuzzer_sys::fuzz_target;
use crcreport::{build_pivot, build_series, decode_records, reshape::DEFAULT_IMPLEMENTATIONS, write_csv};

// Arbitrary benchmark output through decode, reshape and CSV rendering.
// Errors are fine; panics are bugs.
fuzz_target!(|data: &[u8]| {
    let Ok(records) = decode_records(data.to_vec()) else {
        return;
    };
    let _ = build_series(&records, DEFAULT_IMPLEMENTATIONS);
    let pivot = build_pivot(&records);
    let mut out = Vec::new();
    if write_csv(&pivot, &mut out).is_ok() {
        assert!(out.starts_with(b"implementation"));
    }
});
