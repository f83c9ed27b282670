//! Commit-derived views: build metadata and rollback bookkeeping.

use serde_json::Value;

use crate::domain::value_objects::Revision;

/// Build metadata attached to a commit.
///
/// `timestamp` is the commit's build time in seconds since the epoch, as
/// recorded by the store, not the wall clock of this device.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitMetadata {
    pub revision: Revision,
    pub timestamp: u64,
    pub info: Option<Value>,
}

/// What a rollback would currently switch to.
///
/// Recomputed after every operation that can change the deployment list and
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackDescriptor {
    pub revision: Revision,
    pub info: Option<Value>,
    pub deployment_count: usize,
}
