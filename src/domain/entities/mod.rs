//! Domain Entities

mod commit;
mod deployment;

pub use commit::{CommitMetadata, RollbackDescriptor};
pub use deployment::{Deployment, DeploymentList, ROLLBACK_INDEX};
