//! Initialize pipeline

use tracing::warn;

use crate::domain::ports::{
    CommandExecutor, DeploymentStore, InitializeReport, MetadataStore, OtaEventSink,
};
use crate::domain::value_objects::{QueryTarget, Revision};
use crate::error::OtaResult;

use crate::application::runner::Progress;
use super::Orchestrator;

impl<S, M, E> Orchestrator<S, M, E>
where
    S: DeploymentStore,
    M: MetadataStore,
    E: CommandExecutor,
{
    /// Load the sysroot and report booted, default and last-known remote
    /// revisions with their metadata.
    ///
    /// A missing local branch head is not an error: the remote fields are
    /// simply left empty.
    pub fn initialize(&self, sink: &dyn OtaEventSink) -> OtaResult<InitializeReport> {
        let _lock = self.locks().acquire("initialize")?;
        self.store.load_state()?;

        let resolver = self.resolver(sink);
        let booted_revision = self
            .store
            .booted_deployment()
            .map(|d| d.checksum().clone());
        let booted = resolver.resolve(QueryTarget::Booted, booted_revision.as_ref());
        let default_revision = self.store.deployments().default_revision().cloned();

        // What we last fetched from the remote is the head of the local branch
        let remote_revision = match self
            .runner(sink)
            .run(&self.commands.rev_parse(), Progress::Quiet)
        {
            Ok(out) => Some(Revision::new(out)).filter(|r| !r.is_empty()),
            Err(e) => {
                warn!(error = %e, "branch has no local head");
                None
            }
        };
        let remote = resolver.resolve(QueryTarget::Remote, remote_revision.as_ref());

        self.refresh_rollback(sink);

        Ok(InitializeReport {
            default_revision,
            booted_revision,
            booted_info: booted.info,
            remote_revision,
            remote_info: remote.info,
        })
    }
}
