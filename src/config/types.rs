//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::services::OstreeCommands;
use crate::error::OtaResult;

use super::loader::{self, ConfigWarning};

/// Repository and tooling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Remote the device pulls from
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch (ref) tracked on that remote
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Store tool executable
    #[serde(default = "default_ostree")]
    pub ostree: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
            ostree: default_ostree(),
        }
    }
}

impl RepoConfig {
    /// `remote:branch`, the form `ostree reset` expects
    pub fn remote_ref(&self) -> String {
        format!("{}:{}", self.remote, self.branch)
    }
}

fn default_remote() -> String {
    "qt-os".to_string()
}

fn default_branch() -> String {
    "linux/qt".to_string()
}

fn default_ostree() -> String {
    "ostree".to_string()
}

/// File system locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the physical sysroot
    #[serde(default = "default_sysroot")]
    pub sysroot: PathBuf,

    /// Build metadata file, relative to a system root
    #[serde(default = "default_metadata")]
    pub metadata: PathBuf,

    /// Kernel arguments file inside a commit tree
    #[serde(default = "default_boot_params")]
    pub boot_params: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sysroot: default_sysroot(),
            metadata: default_metadata(),
            boot_params: default_boot_params(),
        }
    }
}

fn default_sysroot() -> PathBuf {
    PathBuf::from("/")
}

fn default_metadata() -> PathBuf {
    PathBuf::from("/usr/etc/qt-ota.json")
}

fn default_boot_params() -> PathBuf {
    PathBuf::from("/usr/lib/ostree-boot/kargs")
}

/// Deployment retention on deploy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentsConfig {
    /// Keep older rollback deployments instead of letting the store prune
    /// everything but the new default, the previous default and the booted one
    #[serde(default)]
    pub retain_rollback: bool,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtaConfig {
    #[serde(default)]
    pub repo: RepoConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub deployments: DeploymentsConfig,
}

impl OtaConfig {
    /// Load configuration from a TOML file, dropping warnings
    pub fn load(path: &Path) -> OtaResult<Self> {
        Self::load_with_warnings(path).map(|(config, _)| config)
    }

    /// Load configuration and collect unknown-key warnings
    pub fn load_with_warnings(path: &Path) -> OtaResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Command builder for the configured remote, branch and sysroot
    pub fn ostree_commands(&self) -> OstreeCommands {
        OstreeCommands::new(&self.repo.ostree, &self.repo.remote, &self.repo.branch)
            .with_sysroot(&self.paths.sysroot)
            .with_retain_rollback(self.deployments.retain_rollback)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
