//! Firmware update errors

use bdev_core::BackendError;
use thiserror::Error;

/// Result type for firmware update operations
pub type FirmwareResult<T> = Result<T, FirmwareError>;

/// Errors that abort a whole firmware update request.
///
/// Failures on individual controllers are not errors at this level; they
/// are reported inside the per-device results.
#[derive(Debug, Error)]
pub enum FirmwareError {
    /// The request did not name a firmware image
    #[error("missing path to firmware file")]
    MissingFirmwarePath,

    /// Controller discovery failed
    #[error("NVMe controller scan failed: {0}")]
    Scan(#[source] BackendError),

    /// A requested PCI address is not attached to this host
    #[error("no NVMe controller found with PCI address {0}")]
    PciAddrNotFound(String),

    /// Nothing left to update after address selection and filtering
    #[error("no matching NVMe device controllers")]
    NoMatchingControllers,
}
