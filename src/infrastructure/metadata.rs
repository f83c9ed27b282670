//! Commit-store metadata reader
//!
//! Implements the MetadataStore port. Local files come straight off disk,
//! commit files through `ostree cat`. Any failure reads as "not found".

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::domain::ports::{CommandExecutor, MetadataStore};
use crate::domain::services::OstreeCommands;
use crate::domain::value_objects::Revision;

pub struct CommitStoreMetadata<E: CommandExecutor> {
    executor: E,
    commands: OstreeCommands,
}

impl<E: CommandExecutor> CommitStoreMetadata<E> {
    pub fn new(executor: E, commands: OstreeCommands) -> Self {
        Self { executor, commands }
    }
}

impl<E: CommandExecutor> MetadataStore for CommitStoreMetadata<E> {
    fn read_local_file(&self, path: &Path) -> Vec<u8> {
        match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "metadata file unreadable");
                Vec::new()
            }
        }
    }

    fn read_from_commit_store(&self, revision: &Revision, path: &Path) -> Vec<u8> {
        let command = self.commands.cat(revision, path);
        match self.executor.run(&command, &mut |_| {}) {
            Ok(output) if output.ok() => output.text().into_bytes(),
            Ok(output) => {
                debug!(
                    command = %command,
                    error = output.last_error().unwrap_or("non-zero exit"),
                    "no metadata in commit"
                );
                Vec::new()
            }
            Err(e) => {
                debug!(error = %e, "metadata lookup failed");
                Vec::new()
            }
        }
    }
}
