//! Background worker
//!
//! One named thread owns the orchestrator's execution. Callers enqueue
//! requests and get a `PendingOperation` back; requests run strictly in
//! issue order, each to completion, before the next one starts. There is
//! no cancellation: dropping the client waits for the in-flight request.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::domain::entities::RollbackDescriptor;
use crate::domain::ports::{
    CommandExecutor, Completion, DeploymentStore, MetadataStore, Operation, OtaEventSink,
};
use crate::domain::value_objects::Revision;
use crate::error::{OtaError, OtaResult};

use super::orchestrator::{Orchestrator, Request};

struct Job {
    request: Request,
    reply: Sender<Completion>,
}

/// Handle to the worker thread
pub struct OtaClient<S, M, E>
where
    S: DeploymentStore + 'static,
    M: MetadataStore + 'static,
    E: CommandExecutor + 'static,
{
    orchestrator: Arc<Orchestrator<S, M, E>>,
    queue: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl<S, M, E> OtaClient<S, M, E>
where
    S: DeploymentStore + 'static,
    M: MetadataStore + 'static,
    E: CommandExecutor + 'static,
{
    /// Start the worker thread. Notices from every request go to `sink`.
    pub fn spawn(orchestrator: Orchestrator<S, M, E>, sink: Arc<dyn OtaEventSink>) -> OtaResult<Self> {
        let orchestrator = Arc::new(orchestrator);
        let (queue, jobs) = mpsc::channel::<Job>();

        let shared = Arc::clone(&orchestrator);
        let worker = thread::Builder::new()
            .name("ota-worker".to_string())
            .spawn(move || {
                for job in jobs {
                    let completion = shared.handle(job.request, sink.as_ref());
                    if job.reply.send(completion).is_err() {
                        debug!("completion dropped, caller went away");
                    }
                }
                debug!("worker queue closed");
            })?;

        Ok(Self {
            orchestrator,
            queue: Some(queue),
            worker: Some(worker),
        })
    }

    pub fn orchestrator(&self) -> &Orchestrator<S, M, E> {
        &self.orchestrator
    }

    /// Rollback target as last computed by the worker
    pub fn rollback_descriptor(&self) -> Option<RollbackDescriptor> {
        self.orchestrator.rollback_descriptor()
    }

    pub fn initialize(&self) -> PendingOperation {
        self.submit(Request::Initialize)
    }

    pub fn fetch_remote_info(&self) -> PendingOperation {
        self.submit(Request::FetchRemoteInfo)
    }

    pub fn update(&self, revision: impl Into<Revision>) -> PendingOperation {
        self.submit(Request::Update(revision.into()))
    }

    pub fn rollback(&self) -> PendingOperation {
        self.submit(Request::Rollback)
    }

    pub fn apply_offline(&self, package: impl Into<PathBuf>) -> PendingOperation {
        self.submit(Request::ApplyOffline(package.into()))
    }

    /// Queue `request`. If the worker is gone the reply sender is dropped
    /// with the job, and the pending operation resolves to `Disconnected`.
    pub fn submit(&self, request: Request) -> PendingOperation {
        let operation = request.operation();
        let (reply, completion) = mpsc::channel();
        if let Some(queue) = &self.queue {
            let _ = queue.send(Job { request, reply });
        }
        PendingOperation {
            operation,
            completion,
        }
    }
}

impl<S, M, E> Drop for OtaClient<S, M, E>
where
    S: DeploymentStore + 'static,
    M: MetadataStore + 'static,
    E: CommandExecutor + 'static,
{
    fn drop(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// A queued request whose completion has not been collected yet
#[must_use = "a pending operation does nothing unless waited on"]
pub struct PendingOperation {
    operation: Operation,
    completion: Receiver<Completion>,
}

impl PendingOperation {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Block until the operation finishes
    pub fn wait(self) -> Completion {
        self.completion
            .recv()
            .unwrap_or_else(|_| Completion::failed(self.operation, OtaError::Disconnected))
    }

    /// The completion, if the operation has already finished
    pub fn try_result(&self) -> Option<Completion> {
        match self.completion.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Completion::failed(self.operation, OtaError::Disconnected))
            }
        }
    }
}
