//! DeploymentStore port - the sysroot and its ordered deployment list
//!
//! The store exclusively owns the on-disk list and the cross-process lock.
//! Callers only ever see snapshots; a new list replaces the old one in a
//! single all-or-nothing write.

use std::path::{Path, PathBuf};

use crate::domain::entities::{Deployment, DeploymentList};
use crate::domain::ports::OutputLine;
use crate::domain::value_objects::{BootParams, Revision};

pub trait DeploymentStore: Send + Sync {
    /// Block until the exclusive sysroot lock is held
    fn lock(&self) -> Result<(), SysrootError>;

    /// Release the sysroot lock. Calling it when unlocked is a no-op.
    fn unlock(&self);

    /// Re-read the deployment list and booted deployment from disk
    fn load_state(&self) -> Result<(), SysrootError>;

    /// Deployment list as of the last load or write
    fn deployments(&self) -> DeploymentList;

    /// Atomically replace the deployment list.
    ///
    /// `deployments` must hold the same deployments as the current list; only
    /// the order may change.
    fn write_deployments(&self, deployments: &DeploymentList) -> Result<(), SysrootError>;

    /// The deployment the system is currently running
    fn booted_deployment(&self) -> Option<Deployment>;

    /// Build timestamp of a commit, seconds since the epoch
    fn commit_timestamp(&self, revision: &Revision) -> Result<u64, SysrootError>;

    /// Whether the commit's filesystem tree contains `path`.
    ///
    /// `Err` means the commit itself could not be read.
    fn commit_contains(&self, revision: &Revision, path: &Path) -> Result<bool, SysrootError>;

    /// Deploy a commit as the new default, streaming tool output to `on_line`
    fn deploy(
        &self,
        revision: &Revision,
        params: &BootParams,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<(), SysrootError>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SysrootError {
    #[error("failed to lock sysroot {path}: {message}")]
    Lock { path: PathBuf, message: String },

    #[error("failed to access sysroot: {message}")]
    AccessError { message: String },

    #[error("unrecognized deployment status line: {line}")]
    Corrupted { line: String },

    #[error("failed to write deployment list: {message}")]
    WriteError { message: String },

    #[error("failed to read commit {revision}: {message}")]
    CommitUnreadable { revision: String, message: String },

    #[error("failed to deploy {revision}: {message}")]
    DeployFailed { revision: String, message: String },
}
