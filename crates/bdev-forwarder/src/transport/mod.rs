//! Transport layer for reaching the privileged helper
//!
//! - [`ProcessTransport`] spawns the helper executable for every call
//! - [`InProcessTransport`] serves calls from a local backend (tests, demos)

mod error;
mod in_process;
mod process;

pub use error::TransportError;
pub use in_process::InProcessTransport;
pub use process::ProcessTransport;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::protocol::{HelperReply, HelperRequest};

/// Carries one request across the privilege boundary and returns the reply
#[async_trait]
pub trait HelperTransport: Send + Sync {
    async fn call(&self, request: HelperRequest) -> Result<HelperReply, TransportError>;
}

/// How to launch the privileged helper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelperConfig {
    /// Helper executable (looked up on `PATH` when not absolute)
    #[serde(default = "default_helper_path")]
    pub path: PathBuf,
    /// Extra arguments, e.g. a config file for the helper
    #[serde(default)]
    pub args: Vec<String>,
    /// Upper bound on a single helper invocation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_helper_path() -> PathBuf {
    PathBuf::from("bdev-admin")
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            path: default_helper_path(),
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_config_defaults() {
        let config: HelperConfig = toml::from_str("").unwrap();
        assert_eq!(config.path, PathBuf::from("bdev-admin"));
        assert!(config.args.is_empty());
        assert_eq!(config.timeout_secs, 600);
    }

    #[test]
    fn test_helper_config_overrides() {
        let config: HelperConfig = toml::from_str(
            r#"
            path = "/usr/libexec/bdev-admin"
            args = ["/etc/bdev-admin.toml"]
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.path, PathBuf::from("/usr/libexec/bdev-admin"));
        assert_eq!(config.args, vec!["/etc/bdev-admin.toml"]);
        assert_eq!(config.timeout_secs, 30);
    }
}
