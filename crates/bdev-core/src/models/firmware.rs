//! Firmware update request/response models

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::NvmeController;
use crate::error::BackendResult;

/// Request to update firmware on some or all NVMe controllers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareUpdateRequest {
    /// Path to the firmware image (required)
    pub firmware_path: PathBuf,
    /// PCI addresses to update. Empty means every controller. Order is
    /// preserved and duplicates are tolerated.
    #[serde(default)]
    pub device_addrs: Vec<String>,
    /// Only update controllers with this model ID (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Only update controllers running this firmware revision (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fw_revision: Option<String>,
}

impl FirmwareUpdateRequest {
    pub fn new(firmware_path: impl Into<PathBuf>) -> Self {
        Self {
            firmware_path: firmware_path.into(),
            ..Default::default()
        }
    }

    pub fn with_devices<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.device_addrs = addrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_fw_revision(mut self, fw_revision: impl Into<String>) -> Self {
        self.fw_revision = Some(fw_revision.into());
        self
    }
}

/// Outcome of a firmware update on one controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFirmwareUpdateResult {
    /// Controller snapshot the update was issued against
    pub device: NvmeController,
    /// Error message (if the update failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceFirmwareUpdateResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-device outcomes of a firmware update, in dispatch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareUpdateResponse {
    pub results: Vec<DeviceFirmwareUpdateResult>,
}

impl FirmwareUpdateResponse {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    /// Record the outcome of one dispatched update.
    ///
    /// Entries are kept in the order they are recorded; a failure is stored
    /// as the error's display text.
    pub fn record(&mut self, device: NvmeController, outcome: BackendResult<()>) {
        self.results.push(DeviceFirmwareUpdateResult {
            device,
            error: outcome.err().map(|e| e.to_string()),
        });
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DeviceFirmwareUpdateResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeviceFirmwareUpdateResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}
