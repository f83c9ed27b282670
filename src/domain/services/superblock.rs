//! Static-delta superblock decoder
//!
//! A delta package starts with a superblock describing the commit it
//! produces. Everything the offline pipeline needs before touching the store
//! is in here: the embedded target commit (with its build timestamp) and the
//! target checksum.
//!
//! The layout is a fixed GVariant tuple:
//!
//! | # | type      | field                              |
//! |---|-----------|------------------------------------|
//! | 0 | `a{sv}`   | metadata                           |
//! | 1 | `t`       | superblock timestamp (big-endian)  |
//! | 2 | `ay`      | from checksum (empty for full)     |
//! | 3 | `ay`      | to checksum                        |
//! | 4 | commit    | target commit object               |
//! | 5 | `ay`      | prerequisite deltas                |
//! | 6 | `a(uayttay)` | part headers                    |
//! | 7 | `a(yaytt)`   | fallback objects                |

use crate::domain::entities::CommitMetadata;
use crate::domain::value_objects::Revision;

use super::gvariant::{GVariantError, Variant};

/// Commit object type
pub const COMMIT_FORMAT: &str = "(a{sv}aya(say)sstayay)";

/// Superblock type
pub const SUPERBLOCK_FORMAT: &str = "(a{sv}tayay(a{sv}aya(say)sstayay)aya(uayttay)a(yaytt))";

/// Raw checksum length in bytes
pub const CHECKSUM_BYTES: usize = 32;

/// Commit embedded in a superblock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaCommit {
    pub parent: Option<Revision>,
    pub subject: String,
    pub body: String,
    /// Build time, seconds since the epoch
    pub timestamp: u64,
    pub root_contents: Revision,
    pub root_meta: Revision,
}

/// Parsed and validated superblock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaSuperblock {
    metadata_keys: Vec<String>,
    timestamp: u64,
    from: Option<Revision>,
    to: Revision,
    commit: DeltaCommit,
    part_count: usize,
    fallback_count: usize,
}

impl DeltaSuperblock {
    /// Decode and validate a superblock.
    ///
    /// The whole value is framing-checked before any field is read, then the
    /// commit and checksum fields get their own structural checks.
    pub fn parse(bytes: &[u8]) -> Result<Self, GVariantError> {
        let root = Variant::from_type_str(SUPERBLOCK_FORMAT, bytes)?;
        root.validate()?;
        let fields = root.children()?;

        let metadata_keys = fields[0]
            .children()?
            .iter()
            .map(|entry| entry.child(0)?.as_str().map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        let timestamp = u64::from_be_bytes(fields[1].as_u64_raw()?);

        let from_bytes = fields[2].as_bytes()?;
        let from = if from_bytes.is_empty() {
            None
        } else {
            Some(checksum(from_bytes, "from checksum")?)
        };
        let to = checksum(fields[3].as_bytes()?, "to checksum")?;
        let commit = parse_commit(&fields[4])?;

        Ok(Self {
            metadata_keys,
            timestamp,
            from,
            to,
            commit,
            part_count: fields[6].n_children()?,
            fallback_count: fields[7].n_children()?,
        })
    }

    /// Checksum of the commit this delta produces
    pub fn target_checksum(&self) -> &Revision {
        &self.to
    }

    /// Checksum the delta applies on top of; `None` for a full delta
    pub fn from_checksum(&self) -> Option<&Revision> {
        self.from.as_ref()
    }

    pub fn commit(&self) -> &DeltaCommit {
        &self.commit
    }

    /// Build time of the target commit
    pub fn commit_timestamp(&self) -> u64 {
        self.commit.timestamp
    }

    /// Target commit as build metadata
    pub fn commit_metadata(&self) -> CommitMetadata {
        CommitMetadata {
            revision: self.to.clone(),
            timestamp: self.commit.timestamp,
            info: None,
        }
    }

    /// When the delta itself was generated
    pub fn generated_at(&self) -> u64 {
        self.timestamp
    }

    pub fn metadata_keys(&self) -> &[String] {
        &self.metadata_keys
    }

    pub fn part_count(&self) -> usize {
        self.part_count
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count
    }
}

fn checksum(bytes: &[u8], field: &str) -> Result<Revision, GVariantError> {
    if bytes.len() != CHECKSUM_BYTES {
        return Err(GVariantError::SizeMismatch {
            type_string: field.to_string(),
            expected: CHECKSUM_BYTES,
            actual: bytes.len(),
        });
    }
    Ok(Revision::from_checksum_bytes(bytes))
}

fn parse_commit(commit: &Variant<'_>) -> Result<DeltaCommit, GVariantError> {
    let fields = commit.children()?;
    let parent_bytes = fields[1].as_bytes()?;
    let parent = if parent_bytes.is_empty() {
        None
    } else {
        Some(checksum(parent_bytes, "parent checksum")?)
    };

    Ok(DeltaCommit {
        parent,
        subject: fields[3].as_str()?.to_string(),
        body: fields[4].as_str()?.to_string(),
        timestamp: u64::from_be_bytes(fields[5].as_u64_raw()?),
        root_contents: checksum(fields[6].as_bytes()?, "root contents checksum")?,
        root_meta: checksum(fields[7].as_bytes()?, "root metadata checksum")?,
    })
}
