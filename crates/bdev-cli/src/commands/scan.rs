//! Scan command - list NVMe controllers

use anyhow::{Context, Result};
use bdev_core::NvmeController;
use bdev_provider::Provider;
use tabled::Tabled;

use crate::output::OutputContext;

#[derive(Tabled)]
struct ControllerRow {
    #[tabled(rename = "PCI Address")]
    pci_addr: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Firmware")]
    fw_rev: String,
    #[tabled(rename = "NUMA")]
    numa_node: String,
}

impl From<&NvmeController> for ControllerRow {
    fn from(c: &NvmeController) -> Self {
        Self {
            pci_addr: c.pci_addr.clone(),
            model: c.model.clone(),
            serial: c.serial.clone(),
            fw_rev: c.fw_rev.clone(),
            numa_node: c
                .numa_node
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// List attached NVMe controllers
pub async fn scan(provider: &Provider, ctx: &OutputContext) -> Result<()> {
    let resp = provider
        .scan()
        .await
        .context("Failed to scan NVMe controllers")?;

    let rows: Vec<ControllerRow> = resp.controllers.iter().map(ControllerRow::from).collect();
    ctx.print(&rows, &resp);
    Ok(())
}
