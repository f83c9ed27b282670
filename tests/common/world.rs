//! In-memory device used by the scenario tests.
//!
//! `FakeStore`, `FakeExecutor` and `FakeMetadata` share one `World`, so a
//! deploy done through the store is visible to the metadata reader and a
//! command run through the executor can move the branch head.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use otactl::domain::ports::{
    CommandError, CommandExecutor, CommandLine, CommandOutput, DeploymentStore, MetadataStore,
    Notice, OtaEventSink, OutputLine, SysrootError,
};
use otactl::domain::value_objects::{BootParams, Revision};
use otactl::{Deployment, DeploymentList, OtaConfig, Orchestrator, RollbackDescriptor};

#[derive(Default)]
pub struct WorldState {
    /// Deployment list as persisted
    pub disk: DeploymentList,
    /// Deployment list as of the last load
    pub loaded: DeploymentList,
    pub locked: bool,
    pub lock_count: usize,
    /// Times `lock` was called while already held
    pub lock_conflicts: usize,
    pub fail_writes: bool,
    pub writes: usize,
    /// Local branch head
    pub head: Option<String>,
    /// Commit build timestamps
    pub timestamps: HashMap<String, u64>,
    /// JSON metadata shipped in each commit
    pub payloads: HashMap<String, String>,
    /// Commands whose output starts with `error:`
    pub failing: Vec<(String, String)>,
    pub commands: Vec<String>,
    pub deploys: Vec<String>,
}

#[derive(Default)]
pub struct World {
    state: Mutex<WorldState>,
}

impl World {
    pub fn with_deployments(revs: &[&str]) -> Arc<Self> {
        let world = Arc::new(World::default());
        {
            let list: DeploymentList = revs.iter().map(|r| Deployment::new(*r)).collect();
            let mut state = world.state();
            state.disk = list.clone();
            state.loaded = list;
        }
        world
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, WorldState> {
        self.state.lock().unwrap()
    }

    pub fn set_head(&self, rev: &str, timestamp: u64) {
        let mut state = self.state();
        state.head = Some(rev.to_string());
        state.timestamps.insert(rev.to_string(), timestamp);
    }

    pub fn add_commit(&self, rev: &str, payload: &str) {
        self.state()
            .payloads
            .insert(rev.to_string(), payload.to_string());
    }

    /// Make every command starting with `prefix` print `error: message`
    pub fn fail_command(&self, prefix: &str, message: &str) {
        self.state()
            .failing
            .push((prefix.to_string(), message.to_string()));
    }

    pub fn disk_revisions(&self) -> Vec<String> {
        self.state()
            .disk
            .iter()
            .map(|d| d.checksum().to_string())
            .collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    pub fn is_locked(&self) -> bool {
        self.state().locked
    }
}

pub struct FakeStore(pub Arc<World>);

impl DeploymentStore for FakeStore {
    fn lock(&self) -> Result<(), SysrootError> {
        let mut state = self.0.state();
        if state.locked {
            state.lock_conflicts += 1;
        }
        state.locked = true;
        state.lock_count += 1;
        Ok(())
    }

    fn unlock(&self) {
        self.0.state().locked = false;
    }

    fn load_state(&self) -> Result<(), SysrootError> {
        let mut state = self.0.state();
        state.loaded = state.disk.clone();
        Ok(())
    }

    fn deployments(&self) -> DeploymentList {
        self.0.state().loaded.clone()
    }

    fn write_deployments(&self, deployments: &DeploymentList) -> Result<(), SysrootError> {
        let mut state = self.0.state();
        if state.fail_writes {
            return Err(SysrootError::WriteError {
                message: "read-only file system".to_string(),
            });
        }
        state.writes += 1;
        state.disk = deployments.clone();
        state.loaded = deployments.clone();
        Ok(())
    }

    /// The device has "rebooted" into whatever is the default
    fn booted_deployment(&self) -> Option<Deployment> {
        self.0.state().loaded.default_deployment().cloned()
    }

    fn commit_timestamp(&self, revision: &Revision) -> Result<u64, SysrootError> {
        self.0
            .state()
            .timestamps
            .get(revision.as_str())
            .copied()
            .ok_or_else(|| SysrootError::CommitUnreadable {
                revision: revision.to_string(),
                message: "no such commit".to_string(),
            })
    }

    fn commit_contains(&self, _revision: &Revision, _path: &Path) -> Result<bool, SysrootError> {
        Ok(false)
    }

    fn deploy(
        &self,
        revision: &Revision,
        _params: &BootParams,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<(), SysrootError> {
        on_line(&OutputLine::Info("Copying /etc changes: 0 modified".to_string()));
        let mut state = self.0.state();
        state.deploys.push(revision.to_string());
        state.disk = deployed(&state.disk, revision);
        Ok(())
    }
}

/// The list the store leaves after deploying `revision`: the new deployment,
/// then the previous default. Redeploying a commit gets the next serial.
pub fn deployed(list: &DeploymentList, revision: &Revision) -> DeploymentList {
    let serial = list
        .iter()
        .filter(|d| d.checksum() == revision)
        .map(|d| d.serial() + 1)
        .max()
        .unwrap_or(0);
    std::iter::once(Deployment::new(revision.clone()).with_serial(serial))
        .chain(list.default_deployment().cloned())
        .collect()
}

pub struct FakeExecutor(pub Arc<World>);

impl CommandExecutor for FakeExecutor {
    fn run(
        &self,
        command: &CommandLine,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<CommandOutput, CommandError> {
        let text = command.to_string();
        let mut state = self.0.state();
        state.commands.push(text.clone());

        let failure = state
            .failing
            .iter()
            .find(|(prefix, _)| text.starts_with(prefix.as_str()))
            .map(|(_, message)| message.clone());
        let raw: Vec<String> = if let Some(message) = failure {
            vec![format!("error: {}", message)]
        } else if text.contains(" rev-parse ") {
            state.head.clone().into_iter().collect()
        } else if text.contains(" reset ") {
            let target = command.get_args().last().cloned().unwrap_or_default();
            state.head = Some(target);
            Vec::new()
        } else if let Some(rest) = text.strip_prefix("ostree cat ") {
            let rev = rest.split(' ').next().unwrap_or_default();
            state
                .payloads
                .get(rev)
                .map(|p| p.lines().map(str::to_string).collect())
                .unwrap_or_else(|| vec!["error: No such file or directory".to_string()])
        } else if text.starts_with("ostree pull ") {
            vec!["Receiving objects: 100%".to_string()]
        } else {
            Vec::new()
        };
        drop(state);

        let lines: Vec<OutputLine> = raw.iter().filter_map(|l| OutputLine::classify(l)).collect();
        for line in &lines {
            on_line(line);
        }
        let success = !lines.iter().any(OutputLine::is_error);
        Ok(CommandOutput { lines, success })
    }
}

/// Metadata as the running system would see it
pub struct FakeMetadata(pub Arc<World>);

impl MetadataStore for FakeMetadata {
    fn read_local_file(&self, _path: &Path) -> Vec<u8> {
        let state = self.0.state();
        state
            .loaded
            .default_revision()
            .and_then(|rev| state.payloads.get(rev.as_str()))
            .map(|p| p.as_bytes().to_vec())
            .unwrap_or_default()
    }

    fn read_from_commit_store(&self, revision: &Revision, _path: &Path) -> Vec<u8> {
        self.0
            .state()
            .payloads
            .get(revision.as_str())
            .map(|p| p.as_bytes().to_vec())
            .unwrap_or_default()
    }
}

pub type FakeOrchestrator = Orchestrator<FakeStore, FakeMetadata, FakeExecutor>;

pub fn orchestrator(world: &Arc<World>) -> FakeOrchestrator {
    Orchestrator::new(
        FakeStore(Arc::clone(world)),
        FakeMetadata(Arc::clone(world)),
        FakeExecutor(Arc::clone(world)),
        OtaConfig::default(),
    )
}

#[derive(Default)]
pub struct RecordingSink {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notice::ErrorOccurred(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notice::StatusChanged(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn rollback_changes(&self) -> Vec<RollbackDescriptor> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notice::RollbackChanged(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }
}

impl OtaEventSink for RecordingSink {
    fn on_notice(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
