//! bdev-admin - privileged NVMe helper
//!
//! Runs with the rights needed to touch NVMe hardware. Each invocation reads
//! one helper request from stdin, performs it against the configured
//! backend and writes one reply to stdout.

pub mod config;
pub mod sysfs;

use std::sync::Arc;

use anyhow::{Context, Result};
use bdev_core::{MockBackend, NvmeBackend};
use bdev_forwarder::{serve_request, HelperRequest};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::{AdminConfig, BackendConfig};
use crate::sysfs::SysfsBackend;

/// Build the backend selected by `config`
pub fn create_backend(config: &AdminConfig) -> Arc<dyn NvmeBackend> {
    match &config.backend {
        BackendConfig::Sysfs(cfg) => Arc::new(SysfsBackend::new(cfg.clone())),
        BackendConfig::Mock(cfg) => Arc::new(MockBackend::new(cfg.clone())),
    }
}

/// Answer a single request read from `input`, writing the reply to `output`
pub async fn serve_one<R, W>(backend: &dyn NvmeBackend, mut input: R, mut output: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .await
        .context("Failed to read request")?;

    let request: HelperRequest =
        serde_json::from_slice(&raw).context("Malformed helper request")?;
    tracing::info!(
        method = request.method(),
        request_id = %request.id,
        backend = backend.name(),
        "Handling request"
    );

    let reply = serve_request(backend, request).await;

    let mut encoded = serde_json::to_vec(&reply).context("Failed to encode reply")?;
    encoded.push(b'\n');
    output
        .write_all(&encoded)
        .await
        .context("Failed to write reply")?;
    output.flush().await.context("Failed to write reply")?;
    Ok(())
}
