//! Controller selection for firmware updates
//!
//! Turns a scanned inventory plus the request's address list and attribute
//! filters into the ordered set of controllers to update. Explicit addresses
//! narrow the inventory first; the attribute filters then apply to whatever
//! is left, so a caller can ask for "these devices, but only if they still
//! run revision X".

use std::collections::HashSet;

use bdev_core::{FirmwareUpdateRequest, NvmeController};

use crate::error::{FirmwareError, FirmwareResult};

/// Case-insensitive attribute filters. An unset or empty field matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerFilter {
    pub model_id: Option<String>,
    pub fw_revision: Option<String>,
}

impl ControllerFilter {
    pub fn from_request(req: &FirmwareUpdateRequest) -> Self {
        Self {
            model_id: non_empty(req.model_id.as_deref()),
            fw_revision: non_empty(req.fw_revision.as_deref()),
        }
    }

    /// Whether `ctrl` satisfies every filter that is set
    pub fn matches(&self, ctrl: &NvmeController) -> bool {
        field_matches(self.model_id.as_deref(), &ctrl.model)
            && field_matches(self.fw_revision.as_deref(), &ctrl.fw_rev)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn field_matches(want: Option<&str>, have: &str) -> bool {
    match want {
        Some(want) if !want.is_empty() => want.to_lowercase() == have.to_lowercase(),
        _ => true,
    }
}

/// Select the controllers a firmware update applies to.
///
/// With `device_addrs` empty the whole inventory is a candidate, in scan
/// order. Otherwise the addresses are de-duplicated (first occurrence wins)
/// and each must be present in `inventory`; the first one that is not fails
/// the whole resolution. An empty result is always an error, whether the
/// inventory was empty or the filters excluded everything.
pub fn resolve(
    inventory: &[NvmeController],
    device_addrs: &[String],
    filter: &ControllerFilter,
) -> FirmwareResult<Vec<NvmeController>> {
    let candidates: Vec<&NvmeController> = if device_addrs.is_empty() {
        inventory.iter().collect()
    } else {
        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(device_addrs.len());
        for addr in device_addrs {
            if !seen.insert(addr.as_str()) {
                continue;
            }
            let ctrl = inventory
                .iter()
                .find(|c| c.pci_addr == *addr)
                .ok_or_else(|| FirmwareError::PciAddrNotFound(addr.clone()))?;
            selected.push(ctrl);
        }
        selected
    };

    let selected: Vec<NvmeController> = candidates
        .into_iter()
        .filter(|c| filter.matches(c))
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(FirmwareError::NoMatchingControllers);
    }

    Ok(selected)
}
