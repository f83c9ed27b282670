//! Which system image a metadata query is about.

/// Logical target resolved by the metadata resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    /// The running system; metadata lives on the current root filesystem
    Booted,
    /// The head of the tracked branch on the remote
    Remote,
    /// The deployment a rollback would switch to
    Rollback,
}

impl QueryTarget {
    /// Whether metadata for this target comes from the commit store
    pub fn reads_commit_store(self) -> bool {
        !matches!(self, QueryTarget::Booted)
    }
}

impl std::fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueryTarget::Booted => "booted",
            QueryTarget::Remote => "remote",
            QueryTarget::Rollback => "rollback",
        };
        f.write_str(name)
    }
}
