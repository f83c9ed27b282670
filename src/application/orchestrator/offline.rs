//! Offline delta pipeline
//!
//! `Parsing -> TimestampCheck -> Applying -> Advancing -> Deploying`.
//! Nothing is locked or written until the package has been decoded and has
//! passed the downgrade check.

use std::path::Path;

use tracing::{debug, info};

use crate::domain::ports::{CommandExecutor, DeploymentStore, MetadataStore, OtaEventSink};
use crate::domain::value_objects::Revision;
use crate::error::{OtaError, OtaResult};
use crate::infrastructure::delta;

use crate::application::runner::Progress;
use super::Orchestrator;

impl<S, M, E> Orchestrator<S, M, E>
where
    S: DeploymentStore,
    M: MetadataStore,
    E: CommandExecutor,
{
    /// Apply a static-delta package and deploy the commit it produces.
    ///
    /// Returns the commit the branch now points at.
    pub fn apply_offline(&self, package: &Path, sink: &dyn OtaEventSink) -> OtaResult<Revision> {
        let superblock = delta::read_superblock(package)?;
        let runner = self.runner(sink);

        let head = Revision::new(runner.run(&self.commands.rev_parse(), Progress::Quiet)?);
        let current = self.store.commit_timestamp(&head)?;
        let package_timestamp = superblock.commit_timestamp();
        debug!(current, package = package_timestamp, head = %head, "commit timestamps");

        // Never move the branch backwards in time
        if package_timestamp < current {
            return Err(OtaError::DowngradeRejected {
                current,
                package: package_timestamp,
            });
        }

        let target = superblock.target_checksum().clone();
        {
            let _lock = self.locks().acquire("apply_offline")?;
            runner.status("Applying the update package...");
            runner.run(&self.commands.apply_offline(package), Progress::Quiet)?;
            runner.run(&self.commands.reset(&target), Progress::Quiet)?;
            info!(target = %target, "branch advanced");
        }

        self.deploy_commit(&target, &runner)?;
        self.store.load_state()?;
        self.refresh_rollback(sink);

        Ok(target)
    }
}
