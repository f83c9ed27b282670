//! Event Port
//!
//! Two channels leave the orchestrator:
//!
//! - `Completion`: exactly one per operation, delivered to whoever issued it
//! - `Notice`: any number of non-terminal status/error/bookkeeping updates,
//!   pushed to an `OtaEventSink` without backpressure

use serde_json::Value;

use crate::domain::entities::RollbackDescriptor;
use crate::domain::value_objects::Revision;
use crate::error::{OtaError, OtaResult};

/// Public operations the orchestrator runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    FetchRemoteInfo,
    Update,
    Rollback,
    ApplyOffline,
}

impl Operation {
    /// Stable name used in logs and NDJSON output
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::FetchRemoteInfo => "fetch_remote_info",
            Operation::Update => "update",
            Operation::Rollback => "rollback",
            Operation::ApplyOffline => "apply_offline",
        }
    }
}

/// State gathered by `initialize`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitializeReport {
    pub default_revision: Option<Revision>,
    pub booted_revision: Option<Revision>,
    pub booted_info: Option<Value>,
    /// Head of the local branch, i.e. what we last saw on the remote
    pub remote_revision: Option<Revision>,
    pub remote_info: Option<Value>,
}

/// Result of `fetch_remote_info`
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteInfo {
    pub revision: Revision,
    pub info: Option<Value>,
}

/// Terminal outcome of one operation
#[derive(Debug)]
pub enum Completion {
    Initialized(OtaResult<InitializeReport>),
    RemoteInfoFetched(OtaResult<RemoteInfo>),
    /// New default revision
    Updated(OtaResult<Revision>),
    /// New default revision
    RolledBack(OtaResult<Revision>),
    /// Revision the delta advanced the branch to
    OfflineApplied(OtaResult<Revision>),
}

impl Completion {
    /// A failed completion for `operation`
    pub fn failed(operation: Operation, err: OtaError) -> Self {
        match operation {
            Operation::Initialize => Completion::Initialized(Err(err)),
            Operation::FetchRemoteInfo => Completion::RemoteInfoFetched(Err(err)),
            Operation::Update => Completion::Updated(Err(err)),
            Operation::Rollback => Completion::RolledBack(Err(err)),
            Operation::ApplyOffline => Completion::OfflineApplied(Err(err)),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Completion::Initialized(_) => Operation::Initialize,
            Completion::RemoteInfoFetched(_) => Operation::FetchRemoteInfo,
            Completion::Updated(_) => Operation::Update,
            Completion::RolledBack(_) => Operation::Rollback,
            Completion::OfflineApplied(_) => Operation::ApplyOffline,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error().is_none()
    }

    pub fn error(&self) -> Option<&OtaError> {
        match self {
            Completion::Initialized(r) => r.as_ref().err(),
            Completion::RemoteInfoFetched(r) => r.as_ref().err(),
            Completion::Updated(r) | Completion::RolledBack(r) | Completion::OfflineApplied(r) => {
                r.as_ref().err()
            }
        }
    }

    /// Revision the completion reports; `None` on failure
    pub fn revision(&self) -> Option<&Revision> {
        match self {
            Completion::Initialized(r) => r.as_ref().ok()?.default_revision.as_ref(),
            Completion::RemoteInfoFetched(r) => r.as_ref().ok().map(|info| &info.revision),
            Completion::Updated(r) | Completion::RolledBack(r) | Completion::OfflineApplied(r) => {
                r.as_ref().ok()
            }
        }
    }
}

/// Non-terminal notification
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Progress text from a long-running step
    StatusChanged(String),
    /// Something went wrong; the operation may still finish
    ErrorOccurred(String),
    /// Rollback target recomputed
    RollbackChanged(RollbackDescriptor),
}

/// Receives notices from the worker thread
pub trait OtaEventSink: Send + Sync {
    fn on_notice(&self, notice: Notice);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl OtaEventSink for NoopEventSink {
    fn on_notice(&self, _notice: Notice) {}
}
