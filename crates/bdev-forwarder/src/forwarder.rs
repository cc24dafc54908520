//! FirmwareForwarder - NvmeBackend that relays to the privileged helper

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bdev_core::{BackendError, BackendResult, NvmeBackend, NvmeController};

use crate::protocol::{HelperCall, HelperOutcome, HelperRequest};
use crate::transport::{HelperConfig, HelperTransport, ProcessTransport, TransportError};

/// An `NvmeBackend` that performs every operation through the privileged
/// helper instead of touching hardware itself.
///
/// Whatever goes wrong on the way (spawn failure, crash, bad output) is
/// reported as [`BackendError::Transport`] or [`BackendError::Protocol`];
/// failures the helper's own backend reports come back as
/// [`BackendError::Hardware`] with the original message.
pub struct FirmwareForwarder {
    transport: Arc<dyn HelperTransport>,
}

impl FirmwareForwarder {
    pub fn new(transport: Arc<dyn HelperTransport>) -> Self {
        Self { transport }
    }

    /// Forwarder that launches the helper described by `config` per call
    pub fn spawning(config: &HelperConfig) -> Self {
        Self::new(Arc::new(ProcessTransport::new(config.clone())))
    }

    async fn forward(&self, call: HelperCall) -> BackendResult<HelperOutcome> {
        let request = HelperRequest::new(call);
        let method = request.method();

        match self.transport.call(request).await {
            Ok(reply) => Ok(reply.outcome),
            Err(e) => {
                tracing::warn!(method, error = %e, "Privileged helper call failed");
                Err(Self::map_err(e))
            }
        }
    }

    fn map_err(e: TransportError) -> BackendError {
        match e {
            TransportError::Codec(_) | TransportError::ReplyMismatch { .. } => {
                BackendError::Protocol(e.to_string())
            }
            other => BackendError::Transport(other.to_string()),
        }
    }

    fn unexpected(method: &str, outcome: &HelperOutcome) -> BackendError {
        BackendError::Protocol(format!(
            "unexpected reply to {}: {:?}",
            method, outcome
        ))
    }
}

#[async_trait]
impl NvmeBackend for FirmwareForwarder {
    fn name(&self) -> &str {
        "forwarder"
    }

    async fn scan(&self) -> BackendResult<Vec<NvmeController>> {
        match self.forward(HelperCall::Scan).await? {
            HelperOutcome::Scanned { controllers } => Ok(controllers),
            HelperOutcome::Failed { message } => Err(BackendError::Hardware(message)),
            other => Err(Self::unexpected("scan", &other)),
        }
    }

    async fn update_controller_firmware(
        &self,
        device: &NvmeController,
        firmware_path: &Path,
    ) -> BackendResult<()> {
        let call = HelperCall::UpdateFirmware {
            device: device.clone(),
            firmware_path: firmware_path.to_path_buf(),
        };
        match self.forward(call).await? {
            HelperOutcome::Updated => Ok(()),
            HelperOutcome::Failed { message } => Err(BackendError::Hardware(message)),
            other => Err(Self::unexpected("update_firmware", &other)),
        }
    }
}
