//! MetadataStore port - reads small JSON side-files
//!
//! An empty result means "not found" and is not an error.

use std::path::Path;

use crate::domain::value_objects::Revision;

pub trait MetadataStore: Send + Sync {
    /// Read a file from the running system's root filesystem
    fn read_local_file(&self, path: &Path) -> Vec<u8>;

    /// Read a file out of a commit in the content-addressed store
    fn read_from_commit_store(&self, revision: &Revision, path: &Path) -> Vec<u8>;
}
