//! Static-delta package builders.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use otactl::domain::services::Value;

/// Commit checksum a package built with `fill` advances to
pub fn checksum_of(fill: u8) -> String {
    format!("{:02x}", fill).repeat(32)
}

/// Serialized superblock for a full delta to `[fill; 32]` whose commit was
/// built at `timestamp`
pub fn superblock(timestamp: u64, fill: u8) -> Vec<u8> {
    let commit = Value::Tuple(vec![
        Value::vardict(vec![("version", Value::str("2.0"))]),
        Value::empty_array("y"),
        Value::empty_array("(say)"),
        Value::str("Release 2.0"),
        Value::str(""),
        // Stored big-endian
        Value::Uint64(timestamp.swap_bytes()),
        Value::bytes(&[0x11; 32]),
        Value::bytes(&[0x22; 32]),
    ]);
    let part = Value::Tuple(vec![
        Value::Uint32(0),
        Value::bytes(&[0x33; 32]),
        Value::Uint64(2048),
        Value::Uint64(8192),
        Value::bytes(&[]),
    ]);
    let part_ty = Arc::new(part.type_of());

    Value::Tuple(vec![
        Value::vardict(vec![("ostree.endianness", Value::Byte(b'l'))]),
        Value::Uint64(timestamp.swap_bytes()),
        Value::bytes(&[]),
        Value::bytes(&[fill; 32]),
        commit,
        Value::empty_array("y"),
        Value::Array(part_ty, vec![part]),
        Value::empty_array("(yaytt)"),
    ])
    .to_bytes()
}

/// Write a package into `dir` and return its path
pub fn write_package(dir: &Path, timestamp: u64, fill: u8) -> PathBuf {
    let path = dir.join(format!("update-{}.delta", timestamp));
    std::fs::write(&path, superblock(timestamp, fill)).unwrap();
    path
}
