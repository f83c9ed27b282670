//! Revision & metadata resolver
//!
//! Maps a logical target (booted system, remote head, rollback candidate) to
//! the JSON build metadata that ships with it. Missing metadata is normal;
//! malformed metadata is reported and then treated as missing.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::domain::ports::{MetadataStore, Notice, OtaEventSink};
use crate::domain::value_objects::{QueryTarget, Revision};
use crate::error::OtaError;

/// A target's revision together with its parsed metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMetadata {
    pub revision: Option<Revision>,
    pub info: Option<Value>,
}

pub struct MetadataResolver<'a> {
    store: &'a dyn MetadataStore,
    metadata_path: &'a Path,
    sink: &'a dyn OtaEventSink,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(
        store: &'a dyn MetadataStore,
        metadata_path: &'a Path,
        sink: &'a dyn OtaEventSink,
    ) -> Self {
        Self {
            store,
            metadata_path,
            sink,
        }
    }

    /// Resolve `target`.
    ///
    /// `Booted` reads the running root filesystem and needs no revision.
    /// `Remote` and `Rollback` read the commit store at `revision`; without
    /// one there is nothing to read.
    pub fn resolve(&self, target: QueryTarget, revision: Option<&Revision>) -> ResolvedMetadata {
        let revision = revision.filter(|r| !r.is_empty()).cloned();
        let bytes = match (target.reads_commit_store(), &revision) {
            (false, _) => self.store.read_local_file(self.metadata_path),
            (true, Some(rev)) => self.store.read_from_commit_store(rev, self.metadata_path),
            (true, None) => Vec::new(),
        };

        ResolvedMetadata {
            info: self.parse(target, &bytes),
            revision,
        }
    }

    fn parse(&self, target: QueryTarget, bytes: &[u8]) -> Option<Value> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = OtaError::MetadataParse {
                    message: e.to_string(),
                    data: String::from_utf8_lossy(bytes).into_owned(),
                };
                warn!(%target, "{}", err);
                self.sink.on_notice(Notice::ErrorOccurred(err.to_string()));
                None
            }
        }
    }
}
