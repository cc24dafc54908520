//! bdev-core - Core traits and types for NVMe firmware management
//!
//! This crate provides the fundamental abstractions shared by the firmware
//! update provider, the privileged helper and the forwarder that relays
//! between them. Anything that can enumerate NVMe controllers and write
//! firmware to them implements [`NvmeBackend`].

pub mod backend;
pub mod error;
pub mod mock;
pub mod models;

pub use backend::NvmeBackend;
pub use error::{BackendError, BackendResult};
pub use mock::{mock_controllers, MockBackend, MockConfig};
pub use models::*;
