//! Fetch-remote-info pipeline

use crate::domain::ports::{CommandExecutor, DeploymentStore, MetadataStore, OtaEventSink, RemoteInfo};
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
    /// Pull the remote head's commit object and metadata file, then resolve
    /// its metadata. Nothing beyond that one file is downloaded.
    pub fn fetch_remote_info(&self, sink: &dyn OtaEventSink) -> OtaResult<RemoteInfo> {
        let _lock = self.locks().acquire("fetch_remote_info")?;
        let runner = self.runner(sink);

        runner.run(&self.commands.pull_commit_metadata(), Progress::Quiet)?;
        runner.run(
            &self.commands.pull_subpath(&self.config.paths.metadata),
            Progress::Quiet,
        )?;
        let revision = Revision::new(runner.run(&self.commands.rev_parse(), Progress::Quiet)?);

        let resolved = self
            .resolver(sink)
            .resolve(QueryTarget::Remote, Some(&revision));
        Ok(RemoteInfo {
            revision,
            info: resolved.info,
        })
    }
}
