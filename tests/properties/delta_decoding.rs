//! Property tests for the delta superblock decoder.

use proptest::prelude::*;

use otactl::domain::services::{DeltaSuperblock, Variant};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: arbitrary bytes never panic the superblock decoder.
    #[test]
    fn property_superblock_parse_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = DeltaSuperblock::parse(&bytes);
    }

    /// PROPERTY: walking any container type over arbitrary bytes never panics.
    #[test]
    fn property_variant_walk_never_panics(
        bytes in proptest::collection::vec(any::<u8>(), 0..256),
        ty in prop_oneof![
            Just("a{sv}"),
            Just("(a{sv}aya(say)sstayay)"),
            Just("a(uayttay)"),
            Just("(yaytt)"),
            Just("mas"),
            Just("v"),
        ],
    ) {
        if let Ok(value) = Variant::from_type_str(ty, &bytes) {
            if value.validate().is_ok() {
                if let Ok(children) = value.children() {
                    for child in children {
                        let _ = child.validate();
                    }
                }
            }
        }
    }
}
