//! otactl - atomic update and rollback orchestration for OSTree-style
//! content-addressed OS image stores
//!
//! The orchestrator keeps a short ordered list of bootable deployments,
//! pulls or applies new commits, and rolls back by reordering that list.
//! All deployment-state mutation happens under the store's cross-process
//! sysroot lock.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-exports for convenience
pub use application::{OtaClient, Orchestrator, PendingOperation, Request};
pub use config::{ConfigWarning, OtaConfig};
pub use domain::entities::{Deployment, DeploymentList, RollbackDescriptor};
pub use domain::ports::{Completion, Notice, Operation, OtaEventSink};
pub use domain::value_objects::Revision;
pub use error::{OtaError, OtaResult};
