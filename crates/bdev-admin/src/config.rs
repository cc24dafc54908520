//! Helper configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bdev_core::MockConfig;
use serde::{Deserialize, Serialize};

/// Top-level helper configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub backend: BackendConfig,
}

impl AdminConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Which hardware backend the helper drives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Linux sysfs discovery with nvme-cli firmware commands
    Sysfs(SysfsConfig),
    /// Canned inventory for demos and tests
    Mock(MockConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Sysfs(SysfsConfig::default())
    }
}

/// Sysfs backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysfsConfig {
    /// Directory holding one entry per NVMe controller
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    /// Directory holding the controller character devices
    #[serde(default = "default_dev_root")]
    pub dev_root: PathBuf,
    /// nvme-cli executable
    #[serde(default = "default_nvme_cli")]
    pub nvme_cli: PathBuf,
    /// fw-commit action (1 = replace image in slot and activate at next reset)
    #[serde(default = "default_commit_action")]
    pub commit_action: u8,
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/nvme")
}

fn default_dev_root() -> PathBuf {
    PathBuf::from("/dev")
}

fn default_nvme_cli() -> PathBuf {
    PathBuf::from("nvme")
}

fn default_commit_action() -> u8 {
    1
}

impl Default for SysfsConfig {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            dev_root: default_dev_root(),
            nvme_cli: default_nvme_cli(),
            commit_action: default_commit_action(),
        }
    }
}
