#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Delta packages come from removable media; decoding must never panic
    if let Ok(superblock) = otactl::domain::services::DeltaSuperblock::parse(data) {
        assert_eq!(superblock.target_checksum().as_str().len(), 64);
    }
});
