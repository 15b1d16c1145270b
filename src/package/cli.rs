use anyhow::{Context, Result};
use clap::Subcommand;

use crate::platform::Provisioner;
use crate::ui::prelude::*;

#[derive(Subcommand, Debug, Clone)]
pub enum PackageCommands {
    /// Install packages, skipping those already present
    Install {
        /// Logical package names
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Search the native package database
    Search {
        /// Package name
        name: String,
    },
    /// Remove packages
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
        /// Also remove configuration files
        #[arg(long)]
        purge: bool,
    },
    /// Refresh package indexes
    Update,
    /// Show how a logical package name resolves
    Show {
        name: String,
    },
    /// List logical package names in the resolution table
    List,
}

pub fn handle_package_command(command: PackageCommands, provisioner: &Provisioner) -> Result<()> {
    let packages = provisioner.packages();

    match command {
        PackageCommands::Install { names } => {
            packages
                .install(&names)
                .with_context(|| format!("installing {}", names.join(", ")))?;
            emit(
                Level::Success,
                "package.install.done",
                &format!("Packages ready: {}", names.join(", ")),
                None,
            );
        }
        PackageCommands::Search { name } => {
            let found = packages
                .search(&name)
                .with_context(|| format!("searching for {}", name))?;
            if found.is_empty() {
                emit(
                    Level::Info,
                    "package.search.empty",
                    &format!("No packages found for '{}'", name),
                    None,
                );
            }
            for info in found {
                let message = format!(
                    "{} {} [{}] {} - {}",
                    info.name, info.version, info.architecture, info.status, info.short_description
                );
                emit(
                    Level::Info,
                    "package.search.result",
                    &message,
                    serde_json::to_value(&info).ok(),
                );
            }
        }
        PackageCommands::Remove { names, purge } => {
            let result = if purge {
                packages.purge(&names)
            } else {
                packages.remove(&names)
            };
            result.with_context(|| format!("removing {}", names.join(", ")))?;
            emit(
                Level::Success,
                "package.remove.done",
                &format!("Removed {}", names.join(", ")),
                None,
            );
        }
        PackageCommands::Update => {
            packages
                .check_for_updates()
                .context("refreshing package indexes")?;
            emit(Level::Success, "package.update.done", "Package indexes up to date", None);
        }
        PackageCommands::Show { name } => {
            let spec = provisioner.table().require_package(&name)?;
            let message = format!(
                "{}\n  lookup: {}\n  sources: {}\n  install: {}",
                spec.name,
                spec.lookup_candidates.join(", "),
                if spec.download_sources.is_empty() {
                    "(none)".to_string()
                } else {
                    spec.download_sources.join(", ")
                },
                if spec.install_invocation.is_empty() {
                    "(none)"
                } else {
                    spec.install_invocation.as_str()
                },
            );
            emit(
                Level::Info,
                "package.show",
                &message,
                serde_json::to_value(spec).ok(),
            );
        }
        PackageCommands::List => {
            let names = provisioner.table().package_names();
            emit(
                Level::Info,
                "package.list",
                &names.join("\n"),
                Some(serde_json::json!({
                    "platform": provisioner.family().name(),
                    "packages": names,
                })),
            );
        }
    }

    Ok(())
}
