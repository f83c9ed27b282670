//! Update pipeline
//!
//! `Locking -> Pulling -> Deploying -> ReloadingState -> Bookkeeping`.
//! The lock covers the pull only; the deploy tool takes the sysroot lock
//! itself.

use crate::domain::ports::{CommandExecutor, DeploymentStore, MetadataStore, OtaEventSink};
use crate::domain::value_objects::Revision;
use crate::error::OtaResult;

use crate::application::runner::Progress;
use super::Orchestrator;

impl<S, M, E> Orchestrator<S, M, E>
where
    S: DeploymentStore,
    M: MetadataStore,
    E: CommandExecutor,
{
    /// Pull `revision`, deploy it and return the new default revision
    pub fn update(&self, revision: &Revision, sink: &dyn OtaEventSink) -> OtaResult<Revision> {
        let runner = self.runner(sink);

        {
            let _lock = self.locks().acquire("update")?;
            runner.status("Checking for missing objects...");
            runner.run(&self.commands.pull(revision), Progress::Stream)?;
        }

        self.deploy_commit(revision, &runner)?;
        self.store.load_state()?;
        self.refresh_rollback(sink);

        Ok(self.default_revision())
    }
}
