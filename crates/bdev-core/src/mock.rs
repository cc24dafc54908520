//! Mock NVMe backend for testing

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::backend::NvmeBackend;
use crate::error::{BackendError, BackendResult};
use crate::models::NvmeController;

/// Build `count` distinct controllers: `0000:80:00.N`, `model-N`, `fwRev-N`
pub fn mock_controllers(count: usize) -> Vec<NvmeController> {
    (0..count)
        .map(|i| NvmeController {
            pci_addr: format!("0000:80:00.{}", i),
            model: format!("model-{}", i),
            serial: format!("serial-{}", i),
            fw_rev: format!("fwRev-{}", i),
            numa_node: Some((i % 2) as u32),
        })
        .collect()
}

/// Canned behaviour for [`MockBackend`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    /// When set, every scan fails with this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_err: Option<String>,
    /// When set, every firmware update fails with this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_err: Option<String>,
    /// Inventory returned by every scan
    #[serde(default)]
    pub controllers: Vec<NvmeController>,
    /// Per-address update failures (PCI address -> message)
    #[serde(default)]
    pub update_errs: HashMap<String, String>,
}

/// Mock backend for testing
///
/// Records every call so tests can assert what reached the "hardware".
pub struct MockBackend {
    config: MockConfig,
    scans: AtomicUsize,
    updates: RwLock<Vec<(String, PathBuf)>>,
}

impl MockBackend {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            scans: AtomicUsize::new(0),
            updates: RwLock::new(Vec::new()),
        }
    }

    /// Backend reporting `controllers` and succeeding on every update
    pub fn with_controllers(controllers: Vec<NvmeController>) -> Self {
        Self::new(MockConfig {
            controllers,
            ..Default::default()
        })
    }

    /// Number of scans performed so far
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// PCI addresses and firmware paths of every update attempted, in order
    pub fn updated(&self) -> Vec<(String, PathBuf)> {
        self.updates.read().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

#[async_trait]
impl NvmeBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn scan(&self) -> BackendResult<Vec<NvmeController>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.config.scan_err {
            return Err(BackendError::Hardware(msg.clone()));
        }
        Ok(self.config.controllers.clone())
    }

    async fn update_controller_firmware(
        &self,
        device: &NvmeController,
        firmware_path: &Path,
    ) -> BackendResult<()> {
        self.updates
            .write()
            .push((device.pci_addr.clone(), firmware_path.to_path_buf()));

        if let Some(msg) = self.config.update_errs.get(&device.pci_addr) {
            return Err(BackendError::Hardware(msg.clone()));
        }
        if let Some(msg) = &self.config.update_err {
            return Err(BackendError::Hardware(msg.clone()));
        }
        tracing::debug!(pci_addr = %device.pci_addr, "Mock firmware update");
        Ok(())
    }
}
