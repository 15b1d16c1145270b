//! Host primitives used by acquisition and service control.
//!
//! Everything that touches the machine (PATH lookup, network, processes, config
//! files) goes through [`HostOps`] so the resolution logic can run against a
//! recording fake in tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use duct::cmd;
use tempfile::TempDir;

use super::download::{DownloadSettings, download_file};
use super::file_edit::find_line_and_replace_or_add;
use super::shell::display_command;
use crate::error::{ProvisionError, Result};
use crate::ui::prelude::*;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cooperative cancellation flag shared between the signal handler and
/// in-flight host calls.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ProvisionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

pub trait HostOps: Send + Sync {
    /// Resolve an executable through the standard search locations.
    fn lookup_executable(&self, name: &str) -> Option<PathBuf>;

    /// Download `url` into the existing directory `dest_dir`.
    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf>;

    /// Run a command to completion, optionally from `cwd`.
    fn exec_command(&self, argv: &[String], cwd: Option<&Path>) -> Result<()>;

    /// Run a command and return its standard output.
    fn capture_output(&self, argv: &[String]) -> Result<String>;

    /// Replace-or-append one line per `(pattern, replacement)` pair.
    fn replace_or_append_in_file(&self, path: &Path, patterns: &[(String, String)]) -> Result<()>;

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create a private temporary working directory.
    fn create_work_dir(&self) -> std::io::Result<TempDir>;

    fn cancellation(&self) -> &CancellationToken;
}

/// [`HostOps`] backed by the real system.
pub struct SystemHost {
    download: DownloadSettings,
    cancel: CancellationToken,
}

impl SystemHost {
    pub fn new(download: DownloadSettings, cancel: CancellationToken) -> Self {
        Self { download, cancel }
    }
}

impl HostOps for SystemHost {
    fn lookup_executable(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        emit(Level::Info, "host.download", &format!("Downloading {}", url), None);
        download_file(url, dest_dir, &self.download, &self.cancel)
    }

    fn exec_command(&self, argv: &[String], cwd: Option<&Path>) -> Result<()> {
        let (program, args) = argv.split_first().ok_or_else(|| ProvisionError::InvalidCommand {
            command: String::new(),
            reason: "empty command".to_string(),
        })?;
        let command = display_command(argv);
        emit(Level::Info, "host.exec", &format!("Running {}", command), None);

        let mut expr = cmd(program, args).unchecked();
        if let Some(dir) = cwd {
            expr = expr.dir(dir);
        }
        let handle = expr.start()?;

        loop {
            if let Some(output) = handle.try_wait()? {
                if output.status.success() {
                    return Ok(());
                }
                return Err(ProvisionError::CommandFailed {
                    command,
                    code: output.status.code(),
                });
            }
            if self.cancel.is_cancelled() {
                let _ = handle.kill();
                return Err(ProvisionError::Cancelled);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn capture_output(&self, argv: &[String]) -> Result<String> {
        let (program, args) = argv.split_first().ok_or_else(|| ProvisionError::InvalidCommand {
            command: String::new(),
            reason: "empty command".to_string(),
        })?;
        let command = display_command(argv);
        emit(Level::Debug, "host.capture", &command, None);

        let output = cmd(program, args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()?;

        if !output.status.success() {
            emit(
                Level::Debug,
                "host.capture.stderr",
                String::from_utf8_lossy(&output.stderr).trim(),
                None,
            );
            return Err(ProvisionError::CommandFailed {
                command,
                code: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn replace_or_append_in_file(&self, path: &Path, patterns: &[(String, String)]) -> Result<()> {
        find_line_and_replace_or_add(path, patterns)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn create_work_dir(&self) -> std::io::Result<TempDir> {
        tempfile::Builder::new().prefix("install").tempdir()
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
