//! Store tool command lines
//!
//! Every external command the orchestrator runs is built here, so the exact
//! argument order lives in one place and can be asserted on in tests.

use std::path::{Path, PathBuf};

use crate::domain::ports::CommandLine;
use crate::domain::value_objects::{BootParams, Revision};

/// Builds `ostree` invocations for one remote/branch pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OstreeCommands {
    program: String,
    remote: String,
    branch: String,
    /// Non-default sysroot; `None` means the running system's `/`
    sysroot: Option<PathBuf>,
    /// Keep older rollback deployments on deploy
    retain_rollback: bool,
}

impl OstreeCommands {
    pub fn new(
        program: impl Into<String>,
        remote: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            remote: remote.into(),
            branch: branch.into(),
            sysroot: None,
            retain_rollback: false,
        }
    }

    /// Target a sysroot other than `/`. Passing `/` keeps the default.
    pub fn with_sysroot(mut self, sysroot: impl AsRef<Path>) -> Self {
        let sysroot = sysroot.as_ref();
        self.sysroot = (sysroot != Path::new("/")).then(|| sysroot.to_path_buf());
        self
    }

    pub fn with_retain_rollback(mut self, retain: bool) -> Self {
        self.retain_rollback = retain;
        self
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn repo(&self, subcommand: &str) -> CommandLine {
        let cmd = CommandLine::new(&self.program).arg(subcommand);
        match &self.sysroot {
            Some(root) => cmd.arg(format!("--repo={}", root.join("ostree/repo").display())),
            None => cmd,
        }
    }

    fn admin(&self, subcommand: &str) -> CommandLine {
        let cmd = CommandLine::new(&self.program).args(["admin", subcommand]);
        match &self.sysroot {
            Some(root) => cmd.arg(format!("--sysroot={}", root.display())),
            None => cmd,
        }
    }

    /// Fetch every object reachable from `revision`
    pub fn pull(&self, revision: &Revision) -> CommandLine {
        self.repo("pull")
            .arg(format!("{}:{}", self.remote, revision))
    }

    /// Fetch only the branch head's commit object
    pub fn pull_commit_metadata(&self) -> CommandLine {
        self.repo("pull").args([
            "--commit-metadata-only",
            "--disable-static-deltas",
            self.remote.as_str(),
            self.branch.as_str(),
        ])
    }

    /// Fetch a single file of the branch head
    pub fn pull_subpath(&self, path: &Path) -> CommandLine {
        self.repo("pull").args([
            format!("--subpath={}", path.display()),
            self.remote.clone(),
            self.branch.clone(),
        ])
    }

    /// Print the commit the local branch points at
    pub fn rev_parse(&self) -> CommandLine {
        self.repo("rev-parse").arg(&self.branch)
    }

    /// Print a file out of a commit
    pub fn cat(&self, revision: &Revision, path: &Path) -> CommandLine {
        self.repo("cat")
            .arg(revision.as_str())
            .arg(path.display().to_string())
    }

    /// List a path inside a commit; fails when it does not exist
    pub fn ls(&self, revision: &Revision, path: &Path) -> CommandLine {
        self.repo("ls")
            .arg(revision.as_str())
            .arg(path.display().to_string())
    }

    /// Print commit details, including its `Date:` line
    pub fn show(&self, revision: &Revision) -> CommandLine {
        self.repo("show").arg(revision.as_str())
    }

    /// Apply a local static-delta package
    pub fn apply_offline(&self, package: &Path) -> CommandLine {
        self.repo("static-delta")
            .arg("apply-offline")
            .arg(package.display().to_string())
    }

    /// Point `remote:branch` at `checksum`
    pub fn reset(&self, checksum: &Revision) -> CommandLine {
        self.repo("reset")
            .arg(format!("{}:{}", self.remote, self.branch))
            .arg(checksum.as_str())
    }

    /// List deployments in boot order, booted one starred
    pub fn admin_status(&self) -> CommandLine {
        self.admin("status")
    }

    /// Move the deployment at `index` to the front of the boot order
    pub fn admin_set_default(&self, index: usize) -> CommandLine {
        self.admin("set-default").arg(index.to_string())
    }

    /// Deploy `revision`, replacing the kernel arguments with `params`.
    ///
    /// Bare arguments are wrapped in `--karg=`; lines already written as
    /// `--karg...` flags are passed through.
    pub fn admin_deploy(&self, revision: &Revision, params: &BootParams) -> CommandLine {
        let cmd = self.admin("deploy");
        let cmd = if self.retain_rollback {
            cmd.arg("--retain-rollback")
        } else {
            cmd
        };
        cmd.arg("--karg-none")
            .args(params.args().iter().map(|a| {
                if a.starts_with("--karg") {
                    a.clone()
                } else {
                    format!("--karg={}", a)
                }
            }))
            .arg(revision.as_str())
    }
}
