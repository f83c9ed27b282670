//! Orchestrator
//!
//! Owns the ports and runs one pipeline per request:
//!
//! - `initialize` - load state, resolve booted/default/remote revisions
//! - `fetch_remote_info` - pull the remote head's metadata
//! - `update` - pull a revision, deploy it
//! - `rollback` - swap the default deployment with the rollback candidate
//! - `apply_offline` - verify and apply a local delta package, deploy it
//!
//! Every pipeline is a closed unit. `handle` converts its `Err` into one
//! `ErrorOccurred` notice and a failed `Completion`; nothing else leaks out.

mod fetch;
mod initialize;
mod offline;
mod rollback;
mod update;

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::config::OtaConfig;
use crate::domain::entities::RollbackDescriptor;
use crate::domain::ports::{
    CommandExecutor, Completion, DeploymentStore, MetadataStore, Notice, Operation, OtaEventSink,
    OutputLine,
};
use crate::domain::services::OstreeCommands;
use crate::domain::value_objects::{BootParams, QueryTarget, Revision};
use crate::error::OtaResult;

use super::lock::LockManager;
use super::resolver::MetadataResolver;
use super::runner::{forward_line, CommandRunner, Progress};

/// One unit of work for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Initialize,
    FetchRemoteInfo,
    Update(Revision),
    Rollback,
    ApplyOffline(PathBuf),
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Initialize => Operation::Initialize,
            Request::FetchRemoteInfo => Operation::FetchRemoteInfo,
            Request::Update(_) => Operation::Update,
            Request::Rollback => Operation::Rollback,
            Request::ApplyOffline(_) => Operation::ApplyOffline,
        }
    }
}

/// Update/rollback orchestrator, parameterized by its ports
pub struct Orchestrator<S, M, E>
where
    S: DeploymentStore,
    M: MetadataStore,
    E: CommandExecutor,
{
    store: S,
    metadata: M,
    executor: E,
    config: OtaConfig,
    commands: OstreeCommands,
    /// Last computed rollback target for this session
    rollback_state: Mutex<Option<RollbackDescriptor>>,
}

impl<S, M, E> Orchestrator<S, M, E>
where
    S: DeploymentStore,
    M: MetadataStore,
    E: CommandExecutor,
{
    pub fn new(store: S, metadata: M, executor: E, config: OtaConfig) -> Self {
        let commands = config.ostree_commands();
        Self {
            store,
            metadata,
            executor,
            config,
            commands,
            rollback_state: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &OtaConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Rollback target as of the last operation that recomputed it
    pub fn rollback_descriptor(&self) -> Option<RollbackDescriptor> {
        self.rollback_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one request to completion
    pub fn handle(&self, request: Request, sink: &dyn OtaEventSink) -> Completion {
        let operation = request.operation();
        info!(operation = operation.as_str(), "operation started");

        let completion = match request {
            Request::Initialize => Completion::Initialized(self.initialize(sink)),
            Request::FetchRemoteInfo => Completion::RemoteInfoFetched(self.fetch_remote_info(sink)),
            Request::Update(revision) => Completion::Updated(self.update(&revision, sink)),
            Request::Rollback => Completion::RolledBack(self.rollback(sink)),
            Request::ApplyOffline(path) => Completion::OfflineApplied(self.apply_offline(&path, sink)),
        };

        match completion.error() {
            Some(err) => {
                warn!(operation = operation.as_str(), error = %err, "operation failed");
                sink.on_notice(Notice::ErrorOccurred(err.to_string()));
            }
            None => info!(operation = operation.as_str(), "operation finished"),
        }
        completion
    }

    fn locks(&self) -> LockManager<'_> {
        LockManager::new(&self.store)
    }

    fn runner<'a>(&'a self, sink: &'a dyn OtaEventSink) -> CommandRunner<'a> {
        CommandRunner::new(&self.executor, sink)
    }

    fn resolver<'a>(&'a self, sink: &'a dyn OtaEventSink) -> MetadataResolver<'a> {
        MetadataResolver::new(&self.metadata, &self.config.paths.metadata, sink)
    }

    fn default_revision(&self) -> Revision {
        self.store
            .deployments()
            .default_revision()
            .cloned()
            .unwrap_or_default()
    }

    /// Recompute the rollback target from the store's current list.
    ///
    /// Emits `RollbackChanged` when there is a candidate; with fewer than two
    /// deployments nothing is emitted.
    fn refresh_rollback(&self, sink: &dyn OtaEventSink) -> Option<RollbackDescriptor> {
        let deployments = self.store.deployments();
        let descriptor = deployments.rollback_candidate().map(|candidate| {
            let resolved = self
                .resolver(sink)
                .resolve(QueryTarget::Rollback, Some(candidate.checksum()));
            RollbackDescriptor {
                revision: candidate.checksum().clone(),
                info: resolved.info,
                deployment_count: deployments.len(),
            }
        });

        *self.rollback_state.lock().unwrap_or_else(PoisonError::into_inner) = descriptor.clone();
        if let Some(descriptor) = &descriptor {
            sink.on_notice(Notice::RollbackChanged(descriptor.clone()));
        }
        descriptor
    }

    /// Deploy a commit that is already in the local store.
    ///
    /// Boot parameters come from the commit's own kargs file when it has one.
    fn deploy_commit(&self, revision: &Revision, runner: &CommandRunner<'_>) -> OtaResult<()> {
        let kargs = &self.config.paths.boot_params;
        let params = if self.store.commit_contains(revision, kargs)? {
            BootParams::parse(&runner.run(&self.commands.cat(revision, kargs), Progress::Quiet)?)
        } else {
            BootParams::default()
        };

        runner.status("Deploying...");
        let sink = runner.sink();
        self.store
            .deploy(revision, &params, &mut |line: &OutputLine| {
                forward_line(sink, line, Progress::Stream)
            })?;
        info!(revision = %revision, params = %params, "deployed");
        Ok(())
    }
}
