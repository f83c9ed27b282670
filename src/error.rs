//! Error types for otactl
//!
//! Every pipeline returns `OtaResult<T>`. The orchestrator turns an `Err`
//! into one error notice plus one failed completion, so nothing in here ever
//! crosses the pipeline boundary as a panic.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ports::{CommandError, SysrootError};
use crate::domain::services::GVariantError;

/// Result type alias for otactl operations
pub type OtaResult<T> = Result<T, OtaError>;

/// Main error type for otactl operations
#[derive(Error, Debug)]
pub enum OtaError {
    /// The exclusive sysroot lock could not be taken
    #[error("failed to acquire sysroot lock: {message}")]
    Lock { message: String },

    /// An external command could not be started
    #[error("Failed to start: {command} : {message}")]
    CommandStart { command: String, message: String },

    /// An external command started but failed while running or exited non-zero
    #[error("Process failed: {command} : {message}")]
    CommandRuntime { command: String, message: String },

    /// Metadata payload is not valid JSON
    #[error("failed to parse JSON file, error: {message}, data: {data}")]
    MetadataParse { message: String, data: String },

    /// Rollback needs a second deployment to switch to
    #[error("At least 2 system versions required for rollback")]
    InsufficientDeployments { count: usize },

    /// Persisting the reordered deployment list failed; the old list is intact
    #[error("Failed to update bootloader configuration: {message}")]
    BootConfigWrite { message: String },

    /// Delta package superblock failed structural validation
    #[error("malformed delta package {path}: {message}")]
    MalformedDelta { path: PathBuf, message: String },

    /// Delta package is older than the current branch head
    #[error("Not allowed to downgrade - current timestamp: {current}, package timestamp: {package}")]
    DowngradeRejected { current: u64, package: u64 },

    /// Deployment store failed to load or answer a query
    #[error(transparent)]
    Store(#[from] SysrootError),

    /// Configuration file could not be parsed
    #[error("invalid configuration in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// The background worker is gone and can take no more requests
    #[error("OTA worker is not running")]
    Disconnected,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OtaError {
    /// Build a `MalformedDelta` from a decoder error.
    pub fn malformed_delta(path: impl Into<PathBuf>, err: GVariantError) -> Self {
        OtaError::MalformedDelta {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<CommandError> for OtaError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Start { command, message } => OtaError::CommandStart { command, message },
            CommandError::Runtime { command, message } => {
                OtaError::CommandRuntime { command, message }
            }
        }
    }
}
