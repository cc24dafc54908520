//! Controller models

use serde::{Deserialize, Serialize};

/// Snapshot of a physical NVMe controller, captured at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvmeController {
    /// PCI address in canonical form (e.g., "0000:80:00.0")
    pub pci_addr: String,
    /// Model identifier reported by the controller
    pub model: String,
    /// Serial number
    #[serde(default)]
    pub serial: String,
    /// Currently running firmware revision
    pub fw_rev: String,
    /// NUMA node the controller is attached to, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numa_node: Option<u32>,
}

impl std::fmt::Display for NvmeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, fw {})", self.pci_addr, self.model, self.fw_rev)
    }
}

/// Result of a controller scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub controllers: Vec<NvmeController>,
}
