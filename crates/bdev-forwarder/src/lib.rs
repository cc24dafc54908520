//! bdev-forwarder - Privilege-separated NVMe backend
//!
//! Implements `NvmeBackend` by relaying every call to a privileged helper
//! (`bdev-admin`) that owns the hardware. The calling process needs no
//! special rights; the helper runs one request per invocation and answers
//! with a single JSON reply.
//!
//! # Example
//!
//! ```ignore
//! use bdev_forwarder::{FirmwareForwarder, HelperConfig};
//!
//! let forwarder = FirmwareForwarder::spawning(&HelperConfig::default());
//! let controllers = forwarder.scan().await?;
//! ```

mod forwarder;
pub mod protocol;
pub mod transport;

pub use forwarder::FirmwareForwarder;
pub use protocol::{serve_request, HelperCall, HelperOutcome, HelperReply, HelperRequest};
pub use transport::{
    HelperConfig, HelperTransport, InProcessTransport, ProcessTransport, TransportError,
};
