//! End-to-end tests: provider -> forwarder -> real `bdev-admin` process
//!
//! The helper binary is configured with the mock backend through a
//! temporary config file, so no hardware or privileges are needed.

use std::path::Path;

use bdev_admin::config::{AdminConfig, BackendConfig};
use bdev_core::{mock_controllers, BackendError, FirmwareUpdateRequest, MockConfig, NvmeBackend};
use bdev_forwarder::{FirmwareForwarder, HelperConfig};
use bdev_provider::{FirmwareError, Provider};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn helper_config(dir: &TempDir, mock: &MockConfig) -> HelperConfig {
    let config = AdminConfig {
        backend: BackendConfig::Mock(mock.clone()),
    };
    let path = dir.path().join("bdev-admin.toml");
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

    HelperConfig {
        path: env!("CARGO_BIN_EXE_bdev-admin").into(),
        args: vec![path.display().to_string()],
        timeout_secs: 30,
    }
}

#[tokio::test]
async fn test_scan_via_helper_process() {
    let dir = TempDir::new().unwrap();
    let config = helper_config(
        &dir,
        &MockConfig {
            controllers: mock_controllers(3),
            ..Default::default()
        },
    );

    let forwarder = FirmwareForwarder::spawning(&config);
    let controllers = forwarder.scan().await.unwrap();
    assert_eq!(controllers, mock_controllers(3));
}

#[tokio::test]
async fn test_update_via_helper_process() {
    let dir = TempDir::new().unwrap();
    let mut mock = MockConfig {
        controllers: mock_controllers(3),
        ..Default::default()
    };
    mock.update_errs
        .insert("0000:80:00.2".into(), "boom".into());
    let provider = Provider::new(&helper_config(&dir, &mock));

    let req = FirmwareUpdateRequest::new("/fw.bin")
        .with_devices(["0000:80:00.2", "0000:80:00.0", "0000:80:00.2"]);
    let resp = provider.update_firmware(&req).await.unwrap();

    let got: Vec<_> = resp
        .results
        .iter()
        .map(|r| (r.device.pci_addr.as_str(), r.error.as_deref()))
        .collect();
    assert_eq!(got, vec![("0000:80:00.2", Some("boom")), ("0000:80:00.0", None)]);
}

#[tokio::test]
async fn test_unknown_address_via_helper_process() {
    let dir = TempDir::new().unwrap();
    let provider = Provider::new(&helper_config(
        &dir,
        &MockConfig {
            controllers: mock_controllers(3),
            ..Default::default()
        },
    ));

    let req = FirmwareUpdateRequest::new("/fw.bin").with_devices(["0000:80:00.0", "fake"]);
    let err = provider.update_firmware(&req).await.unwrap_err();
    assert!(matches!(&err, FirmwareError::PciAddrNotFound(a) if a == "fake"));
}

#[tokio::test]
async fn test_helper_scan_error_is_verbatim() {
    let dir = TempDir::new().unwrap();
    let forwarder = FirmwareForwarder::spawning(&helper_config(
        &dir,
        &MockConfig {
            scan_err: Some("mock scan".into()),
            ..Default::default()
        },
    ));

    let err = forwarder.scan().await.unwrap_err();
    assert!(matches!(err, BackendError::Hardware(_)));
    assert_eq!(err.to_string(), "mock scan");
}

#[tokio::test]
async fn test_bad_helper_config_is_transport_error() {
    let config = HelperConfig {
        path: env!("CARGO_BIN_EXE_bdev-admin").into(),
        args: vec!["/nonexistent/bdev-admin.toml".into()],
        timeout_secs: 30,
    };
    let forwarder = FirmwareForwarder::spawning(&config);

    let err = forwarder
        .update_controller_firmware(&mock_controllers(1)[0], Path::new("/fw.bin"))
        .await
        .unwrap_err();
    assert!(err.is_transport(), "{err}");
    assert!(err.to_string().contains("Failed to read config file"), "{err}");
}
