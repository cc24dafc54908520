//! Provider - NVMe firmware update orchestration

use std::sync::Arc;

use bdev_core::{
    FirmwareUpdateRequest, FirmwareUpdateResponse, NvmeBackend, ScanResponse,
};
use bdev_forwarder::{FirmwareForwarder, HelperConfig};
use tracing::{debug, info, warn};

use crate::error::{FirmwareError, FirmwareResult};
use crate::resolver::{resolve, ControllerFilter};

/// Entry point for NVMe firmware management.
///
/// By default every hardware operation is relayed through the privileged
/// helper; [`Provider::with_backend`] injects any other `NvmeBackend`.
pub struct Provider {
    backend: Arc<dyn NvmeBackend>,
}

impl Provider {
    /// Create a provider that reaches the hardware through the privileged
    /// helper described by `helper`
    pub fn new(helper: &HelperConfig) -> Self {
        Self::with_backend(Arc::new(FirmwareForwarder::spawning(helper)))
    }

    /// Create a provider over an arbitrary backend
    pub fn with_backend(backend: Arc<dyn NvmeBackend>) -> Self {
        Self { backend }
    }

    /// Name of the backend hardware calls go to
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Enumerate attached NVMe controllers. Nothing is cached.
    pub async fn scan(&self) -> FirmwareResult<ScanResponse> {
        let controllers = self.backend.scan().await.map_err(FirmwareError::Scan)?;
        debug!(count = controllers.len(), "Scanned NVMe controllers");
        Ok(ScanResponse { controllers })
    }

    /// Update firmware on the controllers selected by `req`.
    ///
    /// Validation, scan and selection failures abort the request. Once a
    /// selection exists, controllers are updated one at a time in selection
    /// order and every outcome is recorded in the response; a per-device
    /// failure never turns into an error return.
    pub async fn update_firmware(
        &self,
        req: &FirmwareUpdateRequest,
    ) -> FirmwareResult<FirmwareUpdateResponse> {
        if req.firmware_path.as_os_str().is_empty() {
            return Err(FirmwareError::MissingFirmwarePath);
        }

        let inventory = self.scan().await?.controllers;
        let filter = ControllerFilter::from_request(req);
        let selected = resolve(&inventory, &req.device_addrs, &filter)?;

        info!(
            firmware = %req.firmware_path.display(),
            devices = selected.len(),
            backend = self.backend.name(),
            "Starting NVMe firmware update"
        );

        let mut resp = FirmwareUpdateResponse::with_capacity(selected.len());
        for device in selected {
            let outcome = self
                .backend
                .update_controller_firmware(&device, &req.firmware_path)
                .await;
            match &outcome {
                Ok(()) => info!(pci_addr = %device.pci_addr, "Firmware updated"),
                Err(e) => warn!(pci_addr = %device.pci_addr, error = %e, "Firmware update failed"),
            }
            resp.record(device, outcome);
        }

        Ok(resp)
    }
}
