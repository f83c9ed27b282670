//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `process` - CommandExecutor over child processes
//! - `sysroot` - DeploymentStore over the store's admin tooling
//! - `metadata` - MetadataStore over local files and the commit store
//! - `delta` - memory-mapped delta package reader
//! - `events/` - NDJSON and console event sinks

pub mod delta;
pub mod events;
pub mod metadata;
pub mod process;
pub mod sysroot;

pub use events::{ConsoleEventSink, JsonEventSink};
pub use metadata::CommitStoreMetadata;
pub use process::ProcessExecutor;
pub use sysroot::FileSysroot;
