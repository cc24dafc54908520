//! Sysfs NVMe backend
//!
//! Discovers controllers under `/sys/class/nvme` and drives firmware
//! updates with nvme-cli (`fw-download` followed by `fw-commit`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bdev_core::{BackendError, BackendResult, NvmeBackend, NvmeController};
use tokio::process::Command;

use crate::config::SysfsConfig;

/// `NvmeBackend` for a Linux host with the kernel NVMe driver bound
pub struct SysfsBackend {
    config: SysfsConfig,
}

/// A discovered controller together with its kernel device name
#[derive(Debug, Clone)]
struct Discovered {
    dev_name: String,
    controller: NvmeController,
}

impl SysfsBackend {
    pub fn new(config: SysfsConfig) -> Self {
        Self { config }
    }

    async fn discover(&self) -> BackendResult<Vec<Discovered>> {
        let root = &self.config.sysfs_root;
        let mut entries = tokio::fs::read_dir(root).await.map_err(|e| {
            BackendError::Hardware(format!("Failed to read {}: {}", root.display(), e))
        })?;

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            BackendError::Hardware(format!("Failed to read {}: {}", root.display(), e))
        })? {
            let dev_name = entry.file_name().to_string_lossy().into_owned();
            if !is_controller_name(&dev_name) {
                continue;
            }
            let dir = entry.path();
            // Fabric-attached controllers have no PCI address
            let Some(pci_addr) = read_attr(&dir, "address").await else {
                tracing::debug!(device = %dev_name, "Skipping controller without PCI address");
                continue;
            };

            let controller = NvmeController {
                pci_addr,
                model: read_attr(&dir, "model").await.unwrap_or_default(),
                serial: read_attr(&dir, "serial").await.unwrap_or_default(),
                fw_rev: read_attr(&dir, "firmware_rev").await.unwrap_or_default(),
                numa_node: read_attr(&dir, "numa_node")
                    .await
                    .and_then(|n| n.parse::<u32>().ok()),
            };
            found.push(Discovered {
                dev_name,
                controller,
            });
        }

        found.sort_by(|a, b| a.controller.pci_addr.cmp(&b.controller.pci_addr));
        Ok(found)
    }

    async fn device_node(&self, pci_addr: &str) -> BackendResult<PathBuf> {
        self.discover()
            .await?
            .into_iter()
            .find(|d| d.controller.pci_addr == pci_addr)
            .map(|d| self.config.dev_root.join(d.dev_name))
            .ok_or_else(|| {
                BackendError::Hardware(format!("controller {} is no longer present", pci_addr))
            })
    }

    async fn nvme(&self, args: &[String]) -> BackendResult<()> {
        let cli = &self.config.nvme_cli;
        tracing::debug!(cli = %cli.display(), ?args, "Running nvme-cli");

        let output = Command::new(cli)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                BackendError::Hardware(format!("Failed to run {}: {}", cli.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Hardware(format!(
                "nvme {} failed ({}): {}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// `nvme0`, `nvme12` - but not namespaces like `nvme0n1`
fn is_controller_name(name: &str) -> bool {
    name.strip_prefix("nvme")
        .map(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

async fn read_attr(dir: &Path, attr: &str) -> Option<String> {
    tokio::fs::read_to_string(dir.join(attr))
        .await
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl NvmeBackend for SysfsBackend {
    fn name(&self) -> &str {
        "sysfs"
    }

    async fn scan(&self) -> BackendResult<Vec<NvmeController>> {
        let controllers: Vec<_> = self
            .discover()
            .await?
            .into_iter()
            .map(|d| d.controller)
            .collect();
        tracing::info!(count = controllers.len(), "Discovered NVMe controllers");
        Ok(controllers)
    }

    async fn update_controller_firmware(
        &self,
        device: &NvmeController,
        firmware_path: &Path,
    ) -> BackendResult<()> {
        let node = self.device_node(&device.pci_addr).await?;
        let node = node.display().to_string();

        tracing::info!(pci_addr = %device.pci_addr, device = %node, "Downloading firmware");
        self.nvme(&[
            "fw-download".to_string(),
            node.clone(),
            format!("--fw={}", firmware_path.display()),
        ])
        .await?;

        tracing::info!(pci_addr = %device.pci_addr, device = %node, "Committing firmware");
        self.nvme(&[
            "fw-commit".to_string(),
            node,
            format!("--action={}", self.config.commit_action),
        ])
        .await
    }
}
