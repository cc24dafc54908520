//! bdev-provider - NVMe firmware update orchestration
//!
//! Resolves a [`FirmwareUpdateRequest`](bdev_core::FirmwareUpdateRequest)
//! against a fresh controller scan and updates each selected controller in
//! turn, collecting one result per device. A failure on one controller never
//! stops the others.

pub mod error;
mod provider;
pub mod resolver;

pub use error::{FirmwareError, FirmwareResult};
pub use provider::Provider;
pub use resolver::{resolve, ControllerFilter};
