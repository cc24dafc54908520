//! In-process transport for testing

use std::sync::Arc;

use async_trait::async_trait;
use bdev_core::NvmeBackend;

use super::{HelperTransport, TransportError};
use crate::protocol::{serve_request, HelperReply, HelperRequest};

/// Serves helper requests from a backend living in the same process.
///
/// Requests and replies still go through their JSON encoding, so the wire
/// format is exercised exactly as it would be across a process boundary.
pub struct InProcessTransport {
    backend: Arc<dyn NvmeBackend>,
}

impl InProcessTransport {
    pub fn new(backend: Arc<dyn NvmeBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl HelperTransport for InProcessTransport {
    async fn call(&self, request: HelperRequest) -> Result<HelperReply, TransportError> {
        let encoded = serde_json::to_vec(&request)?;
        let decoded: HelperRequest = serde_json::from_slice(&encoded)?;

        let reply = serve_request(self.backend.as_ref(), decoded).await;

        let encoded = serde_json::to_vec(&reply)?;
        Ok(serde_json::from_slice(&encoded)?)
    }
}
