#![no_main]

use libfuzzer_sys::fuzz_target;
use otactl::infrastructure::sysroot::parse_status;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok((list, booted)) = parse_status(text) {
        if let Some(booted) = booted {
            assert!(list.iter().any(|d| *d == booted));
        }
        if let Some(reordered) = list.rolled_back() {
            assert!(list.promotions_to(&reordered).is_some());
        }
    }
});
