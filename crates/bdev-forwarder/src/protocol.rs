//! Wire envelope exchanged with the privileged helper
//!
//! The forwarder writes one [`HelperRequest`] to the helper's stdin and
//! reads one [`HelperReply`] from its stdout.

use std::path::PathBuf;

use bdev_core::{NvmeBackend, NvmeController};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single call into the privileged helper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperRequest {
    /// Correlation ID, echoed back in the reply
    pub id: Uuid,
    pub call: HelperCall,
}

impl HelperRequest {
    pub fn new(call: HelperCall) -> Self {
        Self {
            id: Uuid::new_v4(),
            call,
        }
    }

    pub fn method(&self) -> &'static str {
        match self.call {
            HelperCall::Scan => "scan",
            HelperCall::UpdateFirmware { .. } => "update_firmware",
        }
    }
}

/// Backend operations the helper can perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum HelperCall {
    Scan,
    UpdateFirmware {
        device: NvmeController,
        firmware_path: PathBuf,
    },
}

/// The helper's answer to a [`HelperRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperReply {
    /// ID of the request this reply answers
    pub id: Uuid,
    pub outcome: HelperOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HelperOutcome {
    /// Scan succeeded
    Scanned { controllers: Vec<NvmeController> },
    /// Firmware update succeeded
    Updated,
    /// The backend reported an error
    Failed { message: String },
}

/// Execute a request against a local backend.
///
/// This is the helper side of the boundary. Backend errors never escape:
/// they are folded into [`HelperOutcome::Failed`] with the error's text.
pub async fn serve_request(backend: &dyn NvmeBackend, request: HelperRequest) -> HelperReply {
    let outcome = match request.call {
        HelperCall::Scan => match backend.scan().await {
            Ok(controllers) => HelperOutcome::Scanned { controllers },
            Err(e) => HelperOutcome::Failed {
                message: e.to_string(),
            },
        },
        HelperCall::UpdateFirmware {
            device,
            firmware_path,
        } => match backend
            .update_controller_firmware(&device, &firmware_path)
            .await
        {
            Ok(()) => HelperOutcome::Updated,
            Err(e) => HelperOutcome::Failed {
                message: e.to_string(),
            },
        },
    };

    HelperReply {
        id: request.id,
        outcome,
    }
}
