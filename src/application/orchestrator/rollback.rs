//! Rollback pipeline
//!
//! `Locking -> Validating -> Reordering -> Persisting -> Bookkeeping`, all
//! under the sysroot lock.

use tracing::info;

use crate::domain::ports::{CommandExecutor, DeploymentStore, MetadataStore, OtaEventSink};
use crate::domain::value_objects::Revision;
use crate::error::{OtaError, OtaResult};

use super::Orchestrator;

impl<S, M, E> Orchestrator<S, M, E>
where
    S: DeploymentStore,
    M: MetadataStore,
    E: CommandExecutor,
{
    /// Make the rollback candidate the default deployment.
    ///
    /// The reordered list replaces the old one in a single write. If that
    /// write fails the old list is still in place.
    pub fn rollback(&self, sink: &dyn OtaEventSink) -> OtaResult<Revision> {
        let _lock = self.locks().acquire("rollback")?;
        self.store.load_state()?;

        let current = self.store.deployments();
        let reordered = current
            .rolled_back()
            .ok_or(OtaError::InsufficientDeployments {
                count: current.len(),
            })?;

        self.store
            .write_deployments(&reordered)
            .map_err(|e| OtaError::BootConfigWrite {
                message: e.to_string(),
            })?;
        info!(
            previous = ?current.default_revision(),
            default = ?reordered.default_revision(),
            "deployment list reordered"
        );

        self.refresh_rollback(sink);
        Ok(reordered.default_revision().cloned().unwrap_or_default())
    }
}
