//! Configuration loading

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{OtaError, OtaResult};

use super::types::OtaConfig;

/// System-wide configuration file
pub const SYSTEM_CONFIG_PATH: &str = "/etc/otactl/config.toml";

/// Non-fatal configuration warning, e.g. an unknown key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    /// 1-indexed line of the first mention, if found
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load one configuration file and collect unknown-key warnings.
pub fn load_with_warnings(path: &Path) -> OtaResult<(OtaConfig, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| OtaError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: OtaConfig = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| OtaError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
                file: path.to_path_buf(),
                key,
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Files searched when no explicit path is given, in priority order
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("otactl").join("config.toml"));
    }
    candidates
}

/// Resolve the effective configuration.
///
/// An explicit path must exist. Otherwise the first existing candidate wins,
/// falling back to defaults. Environment overrides apply last either way.
pub fn load(explicit: Option<&Path>) -> OtaResult<(OtaConfig, Vec<ConfigWarning>)> {
    let (config, warnings) = match explicit {
        Some(path) => load_with_warnings(path)?,
        None => match config_candidates().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration");
                load_with_warnings(&path)?
            }
            None => (OtaConfig::default(), Vec::new()),
        },
    };

    Ok((with_env_overrides(config), warnings))
}

/// Apply OTACTL_* environment variables
pub fn with_env_overrides(config: OtaConfig) -> OtaConfig {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
pub fn apply_overrides<F>(mut config: OtaConfig, lookup: F) -> OtaConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(remote) = get("OTACTL_REMOTE") {
        config.repo.remote = remote;
    }
    if let Some(branch) = get("OTACTL_BRANCH") {
        config.repo.branch = branch;
    }
    if let Some(ostree) = get("OTACTL_OSTREE") {
        config.repo.ostree = ostree;
    }
    if let Some(sysroot) = get("OTACTL_SYSROOT") {
        config.paths.sysroot = PathBuf::from(sysroot);
    }

    config
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "repo",
        "remote",
        "branch",
        "ostree",
        "paths",
        "sysroot",
        "metadata",
        "boot_params",
        "deployments",
        "retain_rollback",
    ];

    CANDIDATES
        .iter()
        .map(|candidate| (*candidate, levenshtein(unknown, candidate)))
        .min_by_key(|(_, dist)| *dist)
        .filter(|(_, dist)| *dist <= 2)
        .map(|(candidate, _)| candidate.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
