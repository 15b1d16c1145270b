//! Blocking HTTP(S) downloads into a caller-provided directory.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::host::CancellationToken;
use crate::error::{ProvisionError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

/// File name a download from `url` is stored under.
///
/// Uses the last non-empty path segment, falling back to `download`.
pub fn file_name_for(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(|s| s.to_string()))
        })
        .unwrap_or_else(|| "download".to_string())
}

/// Download `url` into `dest_dir` and return the path of the written file.
///
/// The destination directory must already exist. Cancellation is checked
/// between chunks; a cancelled transfer leaves a partial file behind.
pub fn download_file(
    url: &str,
    dest_dir: &Path,
    settings: &DownloadSettings,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    cancel.check()?;

    let fail = |reason: String| ProvisionError::Download {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout)
        .build()
        .map_err(|e| fail(format!("failed to create HTTP client: {}", e)))?;

    let mut response = client.get(url).send().map_err(|e| fail(e.to_string()))?;

    if !response.status().is_success() {
        return Err(fail(format!("server returned status {}", response.status())));
    }

    let dest = dest_dir.join(file_name_for(url));
    let mut file = File::create(&dest)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        if cancel.is_cancelled() {
            return Err(ProvisionError::Cancelled);
        }
        let n = response.read(&mut buf).map_err(|e| fail(e.to_string()))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
    }
    file.flush()?;

    Ok(dest)
}
