//! Configuration module for otactl
//!
//! Sources, highest priority first:
//! 1. Environment variables (OTACTL_*)
//! 2. Explicit `--config` file
//! 3. System config (/etc/otactl/config.toml)
//! 4. User config (~/.config/otactl/config.toml)
//! 5. Built-in defaults

mod loader;
mod types;

pub use loader::{
    apply_overrides, config_candidates, load, load_with_warnings, with_env_overrides,
    ConfigWarning, SYSTEM_CONFIG_PATH,
};
pub use types::{DeploymentsConfig, OtaConfig, PathsConfig, RepoConfig};
