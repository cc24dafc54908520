//! bdev-admin - privileged NVMe helper
//!
//! Invoked by `FirmwareForwarder`, one request per process.
//!
//! Usage:
//!   bdev-admin [config.toml] < request.json > reply.json
//!
//! The config path may also come from `BDEV_ADMIN_CONFIG`. Without one the
//! helper drives local controllers through sysfs and nvme-cli. Logs go to
//! stderr; stdout carries only the reply.

use std::path::PathBuf;

use bdev_admin::config::AdminConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parsed command-line arguments
struct Args {
    /// Helper config file (TOML)
    config_path: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut result = Args {
        config_path: std::env::var_os("BDEV_ADMIN_CONFIG").map(PathBuf::from),
    };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(PathBuf::from(arg));
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"bdev-admin - privileged NVMe helper

Usage: bdev-admin [config.toml]

Reads one JSON request on stdin and writes one JSON reply on stdout.

Environment:
  BDEV_ADMIN_CONFIG   Config file path (overridden by the positional argument)
  RUST_LOG            Log filter (logs are written to stderr)
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bdev_admin=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    let args = parse_args();

    let config = match &args.config_path {
        Some(path) => {
            tracing::debug!("Loading config from: {}", path.display());
            AdminConfig::load_from(path)?
        }
        None => AdminConfig::default(),
    };

    let backend = bdev_admin::create_backend(&config);
    bdev_admin::serve_one(backend.as_ref(), tokio::io::stdin(), tokio::io::stdout()).await
}
