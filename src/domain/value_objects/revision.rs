//! Revision Value Object
//!
//! The immutable identifier of a commit in the content-addressed store.
//! Usually a 64-character SHA-256 checksum, but callers may also hand in
//! anything the store can resolve (a ref name, an abbreviated checksum).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Commit identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Length of a full hex checksum
    pub const CHECKSUM_LEN: usize = 64;

    /// Wrap a revision string, trimming surrounding whitespace
    pub fn new(rev: impl AsRef<str>) -> Self {
        Self(rev.as_ref().trim().to_string())
    }

    /// Build a revision from the 32 raw checksum bytes stored in commits
    pub fn from_checksum_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when this is a full, lowercase hex checksum
    pub fn is_checksum(&self) -> bool {
        self.0.len() == Self::CHECKSUM_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Revision {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Revision {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
