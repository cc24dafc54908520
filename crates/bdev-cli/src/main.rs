//! nvme-fw - Command-line tool for NVMe firmware updates
//!
//! Scans and updates NVMe controllers through the privileged `bdev-admin`
//! helper, so the CLI itself can run unprivileged.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use bdev_provider::Provider;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "nvme-fw")]
#[command(author, version, about = "NVMe Controller Firmware Update Tool")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "NVME_FW_CONFIG")]
    config: Option<PathBuf>,

    /// Privileged helper executable
    #[arg(long, env = "NVME_FW_HELPER")]
    helper: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List NVMe controllers attached to this host
    Scan,

    /// Update controller firmware
    Update {
        /// Firmware image path
        firmware: PathBuf,

        /// PCI address of a controller to update (repeatable, default: all)
        #[arg(short, long = "device", value_name = "PCI_ADDR")]
        devices: Vec<String>,

        /// Only update controllers with this model ID (case-insensitive)
        #[arg(long = "model")]
        model_id: Option<String>,

        /// Only update controllers running this firmware revision (case-insensitive)
        #[arg(long = "fw-rev")]
        fw_revision: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.helper.as_deref(),
        cli.output.map(<&str>::from),
        cli.no_color,
    );

    tracing::debug!(
        helper = %merged.helper.path.display(),
        args = ?merged.helper.args,
        timeout_secs = merged.helper.timeout_secs,
        output = %merged.output,
        "Resolved configuration"
    );

    let ctx = OutputContext::new(
        OutputFormat::from_name(&merged.output),
        merged.no_color,
        cli.quiet,
    );
    let provider = Provider::new(&merged.helper);

    let result = match cli.command {
        Commands::Scan => commands::scan(&provider, &ctx).await,
        Commands::Update {
            firmware,
            devices,
            model_id,
            fw_revision,
        } => commands::update(&provider, firmware, devices, model_id, fw_revision, &ctx).await,
    };

    if let Err(e) = &result {
        ctx.error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

// Implement conversion for OutputFormat to string (for config merge)
impl From<OutputFormat> for &str {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}
