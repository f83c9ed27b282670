//! Application Layer
//!
//! Pipelines that drive the domain through its ports.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT touch the file system or spawn processes itself
//!
//! ## Components
//!
//! - `LockManager` - scoped sysroot lock guards
//! - `MetadataResolver` - target to revision and JSON metadata
//! - `CommandRunner` - runs store commands, forwards their output
//! - `Orchestrator` - initialize, fetch, update, rollback, apply-offline
//! - `OtaClient` - background worker serializing requests

pub mod lock;
pub mod orchestrator;
pub mod resolver;
pub mod runner;
pub mod worker;

pub use lock::{LockManager, SysrootLock};
pub use orchestrator::{Orchestrator, Request};
pub use resolver::{MetadataResolver, ResolvedMetadata};
pub use runner::{CommandRunner, Progress};
pub use worker::{OtaClient, PendingOperation};
