use anyhow::{Context, Result};
use clap::Subcommand;

use crate::platform::Provisioner;
use crate::ui::prelude::*;

#[derive(Subcommand, Debug, Clone)]
pub enum ServiceCommands {
    /// Start a service, falling back to aliases and direct commands
    Start { name: String },
    /// Stop a service, falling back to aliases and direct commands
    Stop { name: String },
    /// Restart a service
    Restart { name: String },
    /// Show how a logical service name resolves on this host
    Show { name: String },
    /// List logical service names in the resolution table
    List,
}

pub fn handle_service_command(command: ServiceCommands, provisioner: &Provisioner) -> Result<()> {
    let services = provisioner.services();

    match command {
        ServiceCommands::Start { name } => services
            .start(&name)
            .with_context(|| format!("starting service {}", name))?,
        ServiceCommands::Stop { name } => services
            .stop(&name)
            .with_context(|| format!("stopping service {}", name))?,
        ServiceCommands::Restart { name } => services
            .restart(&name)
            .with_context(|| format!("restarting service {}", name))?,
        ServiceCommands::Show { name } => {
            let spec = provisioner.table().service(&name);
            let installed = services.locate(&name);

            let mut message = format!(
                "{}\n  installed as: {}",
                name,
                installed.as_deref().unwrap_or("(not found)")
            );
            if let Some(spec) = spec {
                if !spec.aliases.is_empty() {
                    message.push_str(&format!("\n  aliases: {}", spec.aliases.join(", ")));
                }
                if let Some(commands) = &spec.direct_commands {
                    message.push_str(&format!(
                        "\n  start: {}\n  stop: {}",
                        commands.start, commands.stop
                    ));
                }
            }

            emit(
                Level::Info,
                "service.show",
                &message,
                Some(serde_json::json!({
                    "name": name,
                    "installed_as": installed,
                    "entry": spec,
                })),
            );
        }
        ServiceCommands::List => {
            let names = provisioner.table().service_names();
            emit(
                Level::Info,
                "service.list",
                &names.join("\n"),
                Some(serde_json::json!({
                    "platform": provisioner.family().name(),
                    "services": names,
                })),
            );
        }
    }

    Ok(())
}
