//! Recording [`HostOps`] fake shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use super::host::{CancellationToken, HostOps};
use super::shell::display_command;
use crate::error::{ProvisionError, Result};

#[derive(Default)]
pub struct FakeHost {
    executables: HashMap<String, PathBuf>,
    failing_urls: HashSet<String>,
    interrupting_urls: HashSet<String>,
    failing_programs: HashMap<String, i32>,
    outputs: HashMap<String, String>,
    fail_work_dir: bool,
    cancel: CancellationToken,
    pub downloads: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<Vec<String>>>,
    pub command_dirs: Mutex<Vec<Option<PathBuf>>>,
    pub edits: Mutex<Vec<(PathBuf, Vec<(String, String)>)>>,
    pub writes: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, name: &str, path: &str) -> Self {
        self.executables.insert(name.to_string(), PathBuf::from(path));
        self
    }

    pub fn with_failing_url(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    /// Downloading `url` fires the cancellation token mid-transfer.
    pub fn with_interrupting_url(mut self, url: &str) -> Self {
        self.interrupting_urls.insert(url.to_string());
        self
    }

    /// Every command whose first argument is `program` exits with `code`.
    pub fn with_failing_program(mut self, program: &str, code: i32) -> Self {
        self.failing_programs.insert(program.to_string(), code);
        self
    }

    /// Output returned by `capture_output` for the given command line.
    pub fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    pub fn with_failing_work_dir(mut self) -> Self {
        self.fail_work_dir = true;
        self
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|argv| display_command(argv))
            .collect()
    }
}

impl HostOps for FakeHost {
    fn lookup_executable(&self, name: &str) -> Option<PathBuf> {
        self.executables.get(name).cloned()
    }

    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        self.downloads.lock().unwrap().push(url.to_string());
        if self.interrupting_urls.contains(url) {
            self.cancel.cancel();
            return Err(ProvisionError::Cancelled);
        }
        if self.failing_urls.contains(url) {
            return Err(ProvisionError::Download {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(dest_dir.join(super::download::file_name_for(url)))
    }

    fn exec_command(&self, argv: &[String], cwd: Option<&Path>) -> Result<()> {
        self.commands.lock().unwrap().push(argv.to_vec());
        self.command_dirs
            .lock()
            .unwrap()
            .push(cwd.map(Path::to_path_buf));
        match argv.first().and_then(|p| self.failing_programs.get(p)) {
            Some(code) => Err(ProvisionError::CommandFailed {
                command: display_command(argv),
                code: Some(*code),
            }),
            None => Ok(()),
        }
    }

    fn capture_output(&self, argv: &[String]) -> Result<String> {
        let command = display_command(argv);
        self.outputs
            .get(&command)
            .cloned()
            .ok_or(ProvisionError::CommandFailed {
                command,
                code: Some(1),
            })
    }

    fn replace_or_append_in_file(&self, path: &Path, patterns: &[(String, String)]) -> Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push((path.to_path_buf(), patterns.to_vec()));
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.writes.lock().unwrap().push((
            path.to_path_buf(),
            String::from_utf8_lossy(contents).into_owned(),
        ));
        Ok(())
    }

    fn create_work_dir(&self) -> std::io::Result<TempDir> {
        if self.fail_work_dir {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "temp dir not writable",
            ));
        }
        tempfile::tempdir()
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
