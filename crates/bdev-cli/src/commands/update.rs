//! Update command - firmware update

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bdev_core::{DeviceFirmwareUpdateResult, FirmwareUpdateRequest};
use bdev_provider::Provider;
use tabled::Tabled;

use crate::output::OutputContext;

#[derive(Tabled)]
struct UpdateRow {
    #[tabled(rename = "PCI Address")]
    pci_addr: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Previous Firmware")]
    fw_rev: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&DeviceFirmwareUpdateResult> for UpdateRow {
    fn from(r: &DeviceFirmwareUpdateResult) -> Self {
        Self {
            pci_addr: r.device.pci_addr.clone(),
            model: r.device.model.clone(),
            fw_rev: r.device.fw_rev.clone(),
            result: r.error.clone().unwrap_or_else(|| "updated".to_string()),
        }
    }
}

/// Update firmware on the selected controllers
pub async fn update(
    provider: &Provider,
    firmware: PathBuf,
    devices: Vec<String>,
    model_id: Option<String>,
    fw_revision: Option<String>,
    ctx: &OutputContext,
) -> Result<()> {
    let req = FirmwareUpdateRequest {
        firmware_path: firmware,
        device_addrs: devices,
        model_id,
        fw_revision,
    };

    ctx.info(&format!(
        "Updating NVMe firmware from {}...",
        req.firmware_path.display()
    ));

    let resp = provider
        .update_firmware(&req)
        .await
        .context("Firmware update failed")?;

    let rows: Vec<UpdateRow> = resp.results.iter().map(UpdateRow::from).collect();
    ctx.print(&rows, &resp);

    let failed = resp.failed().count();
    if failed > 0 {
        bail!(
            "{} of {} controller firmware updates failed",
            failed,
            resp.results.len()
        );
    }

    ctx.success(&format!(
        "Firmware updated on {} controller(s); activate with a controller reset",
        resp.results.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use bdev_core::{mock_controllers, MockBackend, MockConfig};

    use super::*;
    use crate::output::OutputFormat;

    fn provider(update_errs: HashMap<String, String>) -> (Arc<MockBackend>, Provider) {
        let backend = Arc::new(MockBackend::new(MockConfig {
            controllers: mock_controllers(3),
            update_errs,
            ..Default::default()
        }));
        (backend.clone(), Provider::with_backend(backend))
    }

    fn quiet() -> OutputContext {
        OutputContext::new(OutputFormat::Table, true, true)
    }

    #[tokio::test]
    async fn test_partial_failure_is_an_error() {
        let errs = HashMap::from([("0000:80:00.1".to_string(), "bad image".to_string())]);
        let (backend, provider) = provider(errs);

        let err = update(&provider, "/fw.bin".into(), vec![], None, None, &quiet())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "1 of 3 controller firmware updates failed");
        assert_eq!(backend.updated().len(), 3);
    }

    #[tokio::test]
    async fn test_all_updated_is_ok() {
        let (backend, provider) = provider(HashMap::new());

        update(&provider, "/fw.bin".into(), vec![], None, None, &quiet())
            .await
            .unwrap();

        assert_eq!(backend.updated().len(), 3);
    }

    #[tokio::test]
    async fn test_request_fault_keeps_context() {
        let (backend, provider) = provider(HashMap::new());

        let err = update(
            &provider,
            "/fw.bin".into(),
            vec!["0000:99:00.0".to_string()],
            None,
            None,
            &quiet(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("Firmware update failed"), "{err:#}");
        assert!(backend.updated().is_empty());
    }
}
