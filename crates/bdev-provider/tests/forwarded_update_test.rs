//! Firmware updates driven through the forwarder
//!
//! These tests run the provider against a `FirmwareForwarder` so every scan
//! and update crosses the helper wire format before reaching the mock
//! hardware.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bdev_core::{mock_controllers, FirmwareUpdateRequest, MockBackend, MockConfig};
use bdev_forwarder::{
    serve_request, FirmwareForwarder, HelperCall, HelperReply, HelperRequest, HelperTransport,
    InProcessTransport, TransportError,
};
use bdev_provider::{FirmwareError, Provider};
use pretty_assertions::assert_eq;

fn forwarded_provider(config: MockConfig) -> (Provider, Arc<MockBackend>) {
    let backend = Arc::new(MockBackend::new(config));
    let transport = Arc::new(InProcessTransport::new(backend.clone()));
    let forwarder = Arc::new(FirmwareForwarder::new(transport));
    (Provider::with_backend(forwarder), backend)
}

/// Serves scans normally but crashes the helper on the Nth update
struct CrashOnUpdate {
    backend: MockBackend,
    crash_on: usize,
    updates: AtomicUsize,
}

#[async_trait]
impl HelperTransport for CrashOnUpdate {
    async fn call(&self, request: HelperRequest) -> Result<HelperReply, TransportError> {
        if let HelperCall::UpdateFirmware { .. } = request.call {
            let n = self.updates.fetch_add(1, Ordering::SeqCst);
            if n == self.crash_on {
                return Err(TransportError::HelperExited {
                    status: "signal: 11 (SIGSEGV)".into(),
                    stderr: String::new(),
                });
            }
        }
        Ok(serve_request(&self.backend, request).await)
    }
}

#[tokio::test]
async fn test_update_all_through_forwarder() {
    let (provider, backend) = forwarded_provider(MockConfig {
        controllers: mock_controllers(3),
        ..Default::default()
    });

    let resp = provider
        .update_firmware(&FirmwareUpdateRequest::new("/fw.bin"))
        .await
        .unwrap();

    assert_eq!(provider.backend_name(), "forwarder");
    assert_eq!(resp.results.len(), 3);
    assert!(resp.results.iter().all(|r| r.is_success()));
    assert_eq!(backend.updated().len(), 3);
}

#[tokio::test]
async fn test_partial_failure_through_forwarder() {
    let mut update_errs = HashMap::new();
    update_errs.insert("0000:80:00.1".to_string(), "boom".to_string());
    let (provider, _) = forwarded_provider(MockConfig {
        controllers: mock_controllers(3),
        update_errs,
        ..Default::default()
    });

    let resp = provider
        .update_firmware(&FirmwareUpdateRequest::new("/fw.bin"))
        .await
        .unwrap();

    let errors: Vec<_> = resp.results.iter().map(|r| r.error.as_deref()).collect();
    assert_eq!(errors, vec![None, Some("boom"), None]);
}

#[tokio::test]
async fn test_helper_scan_failure_is_scan_error() {
    let (provider, backend) = forwarded_provider(MockConfig {
        controllers: mock_controllers(3),
        scan_err: Some("mock scan".into()),
        ..Default::default()
    });

    let err = provider
        .update_firmware(&FirmwareUpdateRequest::new("/fw.bin"))
        .await
        .unwrap_err();

    assert!(matches!(err, FirmwareError::Scan(_)));
    assert!(err.to_string().contains("mock scan"));
    assert!(backend.updated().is_empty());
}

#[tokio::test]
async fn test_helper_crash_is_isolated_to_one_device() {
    let transport = Arc::new(CrashOnUpdate {
        backend: MockBackend::with_controllers(mock_controllers(3)),
        crash_on: 1,
        updates: AtomicUsize::new(0),
    });
    let provider = Provider::with_backend(Arc::new(FirmwareForwarder::new(transport)));

    let resp = provider
        .update_firmware(&FirmwareUpdateRequest::new("/fw.bin"))
        .await
        .unwrap();

    assert!(resp.results[0].is_success());
    let crashed = resp.results[1].error.as_deref().unwrap();
    assert!(crashed.contains("SIGSEGV"), "{crashed}");
    assert!(resp.results[2].is_success());
}
