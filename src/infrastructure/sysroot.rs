//! Sysroot adapter
//!
//! Implements the DeploymentStore port on top of the store tooling:
//!
//! - `ostree admin status` - deployment list in boot order, booted one starred
//! - `ostree admin set-default` - reorders the bootloader entries
//! - `ostree admin deploy` - new deployment, pruned by the store's own policy
//! - `ostree/otactl.lock` - advisory lock between otactl processes
//!
//! The lock is a `flock` on a file of its own. The store tooling takes an
//! fcntl lock on `ostree/lock` for every command it runs, and otactl runs
//! those commands while holding its lock, so the two must never be the same.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use fs2::FileExt;
use tracing::{debug, info};

use crate::domain::entities::{Deployment, DeploymentList};
use crate::domain::ports::{CommandExecutor, CommandLine, DeploymentStore, OutputLine, SysrootError};
use crate::domain::services::OstreeCommands;
use crate::domain::value_objects::{BootParams, Revision};

/// Length of a hex-encoded commit checksum
const CHECKSUM_LEN: usize = 64;

#[derive(Default)]
struct State {
    lock_file: Option<File>,
    deployments: DeploymentList,
    booted: Option<Deployment>,
}

pub struct FileSysroot<E: CommandExecutor> {
    root: PathBuf,
    executor: E,
    commands: OstreeCommands,
    state: Mutex<State>,
}

impl<E: CommandExecutor> FileSysroot<E> {
    pub fn new(root: impl Into<PathBuf>, executor: E, commands: OstreeCommands) -> Self {
        Self {
            root: root.into(),
            executor,
            commands,
            state: Mutex::new(State::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("ostree").join("otactl.lock")
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run an admin command, mapping any failure with `fail`
    fn admin(
        &self,
        command: &CommandLine,
        on_line: &mut dyn FnMut(&OutputLine),
        fail: impl Fn(String) -> SysrootError,
    ) -> Result<Vec<String>, SysrootError> {
        let output = self
            .executor
            .run(command, on_line)
            .map_err(|e| fail(e.to_string()))?;
        if !output.ok() {
            let message = output.last_error().unwrap_or("exited with non-zero status");
            return Err(fail(message.to_string()));
        }
        Ok(output
            .lines
            .iter()
            .map(|line| line.text().to_string())
            .collect())
    }

    fn read_status(&self) -> Result<(DeploymentList, Option<Deployment>), SysrootError> {
        let lines = self.admin(&self.commands.admin_status(), &mut |_| {}, |message| {
            SysrootError::AccessError { message }
        })?;
        parse_status(&lines.join("\n"))
    }

    fn unreadable(revision: &Revision, message: impl Into<String>) -> SysrootError {
        SysrootError::CommitUnreadable {
            revision: revision.to_string(),
            message: message.into(),
        }
    }
}

/// Parse `ostree admin status` output into the boot-ordered deployment list
/// and the booted deployment.
///
/// Deployment lines read `[*] OSNAME CHECKSUM.SERIAL [(state)]`; every other
/// line is detail about the deployment above it. A starred line that does
/// not parse is an error, since the booted deployment must not be guessed.
pub fn parse_status(
    output: &str,
) -> Result<(DeploymentList, Option<Deployment>), SysrootError> {
    let mut deployments = Vec::new();
    let mut booted = None;

    for line in output.lines().map(str::trim) {
        let (starred, entry) = match line.strip_prefix('*') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, line),
        };
        match parse_entry(entry) {
            Some(deployment) => {
                if starred {
                    booted = Some(deployment.clone());
                }
                deployments.push(deployment);
            }
            None if starred => {
                return Err(SysrootError::Corrupted {
                    line: line.to_string(),
                })
            }
            None => {}
        }
    }

    Ok((DeploymentList::new(deployments), booted))
}

fn parse_entry(entry: &str) -> Option<Deployment> {
    let mut words = entry.split_whitespace();
    let osname = words.next()?;
    let (checksum, serial) = words.next()?.rsplit_once('.')?;
    let is_checksum =
        checksum.len() == CHECKSUM_LEN && checksum.bytes().all(|b| b.is_ascii_hexdigit());
    if !is_checksum || words.any(|w| !w.starts_with('(')) {
        return None;
    }
    Some(
        Deployment::new(checksum)
            .with_osname(osname)
            .with_serial(serial.parse().ok()?),
    )
}

/// Pull the commit date out of `ostree show` output
fn parse_show_date(output: &str) -> Option<u64> {
    let date = output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Date:"))?
        .trim();
    let parsed = DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z").ok()?;
    u64::try_from(parsed.timestamp()).ok()
}

impl<E: CommandExecutor> DeploymentStore for FileSysroot<E> {
    fn lock(&self) -> Result<(), SysrootError> {
        if self.state().lock_file.is_some() {
            return Ok(());
        }

        let path = self.lock_path();
        let lock_error = |e: std::io::Error| SysrootError::Lock {
            path: path.clone(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_error)?;
        // Blocks; must not hold the state mutex while waiting.
        file.lock_exclusive().map_err(lock_error)?;

        self.state().lock_file = Some(file);
        Ok(())
    }

    fn unlock(&self) {
        if let Some(file) = self.state().lock_file.take() {
            let _ = FileExt::unlock(&file);
        }
    }

    fn load_state(&self) -> Result<(), SysrootError> {
        let (deployments, booted) = self.read_status()?;
        debug!(
            count = deployments.len(),
            booted = booted.as_ref().map(|d| d.checksum().as_str()).unwrap_or(""),
            "loaded sysroot"
        );

        let mut state = self.state();
        state.deployments = deployments;
        state.booted = booted;
        Ok(())
    }

    fn deployments(&self) -> DeploymentList {
        self.state().deployments.clone()
    }

    /// Reorder the bootloader entries to match `deployments`.
    ///
    /// Each `set-default` rewrites the bootloader configuration atomically;
    /// the written order is read back and must match.
    fn write_deployments(&self, deployments: &DeploymentList) -> Result<(), SysrootError> {
        let write_error = |message: String| SysrootError::WriteError { message };

        let (current, _) = self.read_status()?;
        let steps = current.promotions_to(deployments).ok_or_else(|| {
            write_error("new order must hold exactly the current deployments".to_string())
        })?;
        for index in steps {
            self.admin(&self.commands.admin_set_default(index), &mut |_| {}, write_error)?;
        }

        let (written, booted) = self.read_status()?;
        if written != *deployments {
            return Err(write_error(format!(
                "bootloader order is {:?} after reordering",
                written
                    .iter()
                    .map(|d| d.checksum().as_str())
                    .collect::<Vec<_>>()
            )));
        }

        info!(count = written.len(), "deployment order written");
        let mut state = self.state();
        state.deployments = written;
        state.booted = booted;
        Ok(())
    }

    fn booted_deployment(&self) -> Option<Deployment> {
        self.state().booted.clone()
    }

    fn commit_timestamp(&self, revision: &Revision) -> Result<u64, SysrootError> {
        let output = self
            .executor
            .run(&self.commands.show(revision), &mut |_| {})
            .map_err(|e| Self::unreadable(revision, e.to_string()))?;
        if !output.ok() {
            return Err(Self::unreadable(
                revision,
                output.last_error().unwrap_or("exited with non-zero status"),
            ));
        }
        parse_show_date(&output.text())
            .ok_or_else(|| Self::unreadable(revision, "no commit date in output"))
    }

    fn commit_contains(&self, revision: &Revision, path: &Path) -> Result<bool, SysrootError> {
        let output = self
            .executor
            .run(&self.commands.ls(revision, path), &mut |_| {})
            .map_err(|e| Self::unreadable(revision, e.to_string()))?;
        if output.ok() {
            return Ok(true);
        }
        match output.last_error() {
            Some(error) if error.contains("No such file") => Ok(false),
            Some(error) => Err(Self::unreadable(revision, error)),
            None => Ok(false),
        }
    }

    fn deploy(
        &self,
        revision: &Revision,
        params: &BootParams,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<(), SysrootError> {
        self.admin(
            &self.commands.admin_deploy(revision, params),
            on_line,
            |message| SysrootError::DeployFailed {
                revision: revision.to_string(),
                message,
            },
        )?;
        self.load_state()
    }
}
