use std::ops::ControlFlow;
use std::sync::Arc;

use crate::common::fallback::{Exhausted, try_each};
use crate::common::host::HostOps;
use crate::common::shell::split_command;
use crate::error::{ProvisionError, Result};
use crate::resolution::{ResolutionTable, ServiceAction, ServiceSpec};
use crate::ui::prelude::*;

use super::{ServiceBackend, ServiceManager};

/// One fallback step after the logical name itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt<'s> {
    Managed(&'s str),
    Direct { owner: &'s str, command: &'s str },
}

impl std::fmt::Display for Attempt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attempt::Managed(name) => write!(f, "service '{}'", name),
            Attempt::Direct { owner, command } => write!(f, "`{}` ({})", command, owner),
        }
    }
}

pub struct ServiceController<B> {
    backend: B,
    table: Arc<ResolutionTable>,
    host: Arc<dyn HostOps>,
}

impl<B: ServiceBackend> ServiceController<B> {
    pub fn new(backend: B, table: Arc<ResolutionTable>, host: Arc<dyn HostOps>) -> Self {
        Self {
            backend,
            table,
            host,
        }
    }

    /// Listed once per call. A listing failure leaves every name unknown.
    fn known_services(&self) -> Vec<String> {
        match self.backend.list_services() {
            Ok(names) => names,
            Err(e) => {
                emit(
                    Level::Debug,
                    "service.list.failed",
                    &format!("Could not list {} services: {}", self.backend.name(), e),
                    None,
                );
                Vec::new()
            }
        }
    }

    fn find_known<'k>(&self, known: &'k [String], wanted: &str) -> Option<&'k str> {
        known
            .iter()
            .find(|k| self.backend.matches(k, wanted))
            .map(String::as_str)
    }

    fn control_managed(&self, known: &[String], name: &str, action: ServiceAction) -> Result<()> {
        let service = self
            .find_known(known, name)
            .ok_or_else(|| ProvisionError::ServiceNotFound(name.to_string()))?;
        self.backend.control(service, action)
    }

    fn run_direct(&self, command: &str) -> Result<()> {
        let argv = split_command(command)?;
        self.host.exec_command(&argv, None)
    }

    fn fallbacks<'s>(&'s self, spec: &'s ServiceSpec, action: ServiceAction) -> Vec<Attempt<'s>> {
        let mut attempts: Vec<Attempt<'s>> = spec
            .aliases
            .iter()
            .map(|alias| Attempt::Managed(alias.as_str()))
            .collect();

        if let Some(command) = spec.command_for(action) {
            attempts.push(Attempt::Direct {
                owner: &spec.logical_name,
                command,
            });
        }

        for alias in &spec.aliases {
            if let Some(command) = self.table.service(alias).and_then(|s| s.command_for(action)) {
                attempts.push(Attempt::Direct {
                    owner: alias,
                    command,
                });
            }
        }

        attempts
    }

    fn apply(&self, name: &str, action: ServiceAction) -> Result<()> {
        self.host.cancellation().check()?;
        let known = self.known_services();

        let first = match self.control_managed(&known, name, action) {
            Ok(()) => {
                emit(
                    Level::Success,
                    "service.action",
                    &format!("{} {}", past_tense(action), name),
                    None,
                );
                return Ok(());
            }
            Err(e) => e,
        };

        let Some(spec) = self.table.service(name).filter(|s| s.has_fallbacks()) else {
            return Err(first);
        };

        emit(
            Level::Warn,
            "service.fallback",
            &format!("Could not {} '{}': {}; trying alternatives", action, name, first),
            None,
        );

        let result = try_each(
            self.fallbacks(spec, action),
            |attempt| {
                self.host.cancellation().check()?;
                match attempt {
                    Attempt::Managed(alias) => self.control_managed(&known, alias, action),
                    Attempt::Direct { command, .. } => self.run_direct(command),
                }
            },
            |attempt, e| {
                if e.is_cancelled() {
                    return ControlFlow::Break(());
                }
                emit(
                    Level::Debug,
                    "service.fallback.failed",
                    &format!("{} {} failed: {}", action, attempt, e),
                    None,
                );
                ControlFlow::Continue(())
            },
        );

        match result {
            Ok(()) => {
                emit(
                    Level::Success,
                    "service.action",
                    &format!("{} {}", past_tense(action), name),
                    None,
                );
                Ok(())
            }
            Err(Exhausted::Empty) => Err(first),
            Err(Exhausted::Failed(last)) => Err(last),
        }
    }
}

fn past_tense(action: ServiceAction) -> &'static str {
    match action {
        ServiceAction::Start => "Started",
        ServiceAction::Stop => "Stopped",
    }
}

impl<B: ServiceBackend> ServiceManager for ServiceController<B> {
    fn start(&self, name: &str) -> Result<()> {
        self.apply(name, ServiceAction::Start)
    }

    fn stop(&self, name: &str) -> Result<()> {
        self.apply(name, ServiceAction::Stop)
    }

    fn restart(&self, _name: &str) -> Result<()> {
        Err(ProvisionError::unsupported(
            "Restart is not supported, use stop then start",
        ))
    }

    fn locate(&self, name: &str) -> Option<String> {
        let known = self.known_services();
        let aliases = self
            .table
            .service(name)
            .map(|s| s.aliases.as_slice())
            .unwrap_or_default();

        std::iter::once(name)
            .chain(aliases.iter().map(String::as_str))
            .find_map(|candidate| self.find_known(&known, candidate))
            .map(str::to_string)
    }
}
