mod common;
mod error;
mod package;
mod platform;
mod resolution;
mod service;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::config::ProvisionConfig;
use crate::common::distro::OperatingSystem;
use crate::common::host::{CancellationToken, HostOps, SystemHost};
use crate::package::cli::{PackageCommands, handle_package_command};
use crate::platform::{PlatformFamily, Provisioner};
use crate::service::cli::{ServiceCommands, handle_service_command};
use crate::ui::prelude::*;

/// provisionctl main parser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Platform family to act as
    #[arg(long, value_enum, default_value_t = PlatformChoice::Auto, global = true)]
    platform: PlatformChoice,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlatformChoice {
    /// Detect from the running OS
    Auto,
    Debian,
    Windows,
}

impl PlatformChoice {
    fn resolve(self, os: &OperatingSystem) -> error::Result<PlatformFamily> {
        match self {
            PlatformChoice::Auto => PlatformFamily::for_os(os),
            PlatformChoice::Debian => Ok(PlatformFamily::Debian),
            PlatformChoice::Windows => Ok(PlatformFamily::Windows),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install, search and remove packages
    Package {
        #[command(subcommand)]
        command: PackageCommands,
    },

    /// Start and stop services
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },

    /// Show the detected OS and the platform family in use
    Platform,
}

fn install_interrupt_handler(cancel: &CancellationToken) -> Result<()> {
    let cancel = cancel.clone();
    ctrlc::set_handler(move || {
        emit(Level::Warn, "provisionctl.interrupt", "Interrupted, cancelling", None);
        cancel.cancel();
    })
    .context("installing Ctrl-C handler")
}

fn run(cli: Cli) -> Result<()> {
    let os = OperatingSystem::detect();
    let family = cli
        .platform
        .resolve(&os)
        .with_context(|| format!("selecting a platform for {}", os))?;

    if let Commands::Platform = cli.command {
        emit(
            Level::Info,
            "platform.info",
            &format!("OS: {}\nPlatform: {}", os, family),
            Some(serde_json::json!({ "os": os.name(), "platform": family.name() })),
        );
        return Ok(());
    }

    let config = ProvisionConfig::load(cli.config.as_deref())?;
    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel)?;

    let host: Arc<dyn HostOps> = Arc::new(SystemHost::new(config.download_settings(), cancel));
    let provisioner = Provisioner::new(family, config.table_overrides(), host)
        .context("building the resolution table")?;
    emit(
        Level::Debug,
        "platform.bound",
        &format!("Using {} managers on {}", provisioner.family(), os),
        None,
    );

    match cli.command {
        Commands::Package { command } => handle_package_command(command, &provisioner),
        Commands::Service { command } => handle_service_command(command, &provisioner),
        Commands::Platform => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color);

    if let Err(e) = run(cli) {
        let message = format!("{:#}", e);
        let code = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<error::ProvisionError>())
            .and_then(error::ProvisionError::exit_code);
        emit(
            Level::Error,
            "provisionctl.error",
            &message,
            code.map(|code| serde_json::json!({ "exit_status": code })),
        );
        std::process::exit(1);
    }
}
