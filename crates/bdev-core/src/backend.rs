//! NvmeBackend trait - the hardware-access capability

use std::path::Path;

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::models::NvmeController;

/// The capability every NVMe hardware accessor implements.
///
/// The same contract is served by different implementations:
/// - `SysfsBackend` - talks to local controllers (runs inside the privileged helper)
/// - `FirmwareForwarder` - relays each call to the privileged helper process
/// - `MockBackend` - canned inventory and fault injection for tests
///
/// Callers cannot tell these apart; a forwarder failure is reported through
/// the same [`BackendError`](crate::BackendError) channel as a device failure.
#[async_trait]
pub trait NvmeBackend: Send + Sync {
    /// Short identifier for logging
    fn name(&self) -> &str;

    /// Enumerate the NVMe controllers currently attached to the host.
    ///
    /// Every call produces a fresh snapshot.
    async fn scan(&self) -> BackendResult<Vec<NvmeController>>;

    /// Write the firmware image at `firmware_path` to a single controller
    async fn update_controller_firmware(
        &self,
        device: &NvmeController,
        firmware_path: &Path,
    ) -> BackendResult<()>;
}
