//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod command_executor;
pub mod deployment_store;
pub mod events;
pub mod metadata_store;

pub use command_executor::{
    CommandError, CommandExecutor, CommandLine, CommandOutput, OutputLine, ERROR_LINE_PREFIX,
};
pub use deployment_store::{DeploymentStore, SysrootError};
pub use events::{
    Completion, InitializeReport, NoopEventSink, Notice, Operation, OtaEventSink, RemoteInfo,
};
pub use metadata_store::MetadataStore;
