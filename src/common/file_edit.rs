//! Line-level config file editing.

use regex::RegexBuilder;
use std::fs;
use std::path::Path;

use crate::error::{ProvisionError, Result};

/// Replace the first line matching a pattern with its replacement, appending
/// the replacement when no line matched. Later matching lines are dropped.
///
/// Patterns are matched case-insensitively against whole lines. The file is
/// created when it does not exist. Line endings of the original file are kept.
pub fn find_line_and_replace_or_add(path: &Path, patterns: &[(String, String)]) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let newline = if contents.contains("\r\n") { "\r\n" } else { "\n" };

    let mut compiled = Vec::with_capacity(patterns.len());
    for (pattern, replacement) in patterns {
        let re = RegexBuilder::new(&format!("^(?:{})$", pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| ProvisionError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        compiled.push((re, replacement.as_str(), false));
    }

    let mut lines = Vec::new();
    'lines: for line in contents.lines() {
        for (re, replacement, seen) in compiled.iter_mut() {
            if re.is_match(line) {
                // Later matches would duplicate the directive.
                if !*seen {
                    lines.push(replacement.to_string());
                    *seen = true;
                }
                continue 'lines;
            }
        }
        lines.push(line.to_string());
    }

    for (_, replacement, seen) in &compiled {
        if !seen {
            lines.push(replacement.to_string());
        }
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut output = lines.join(newline);
    output.push_str(newline);
    fs::write(path, output)?;

    Ok(())
}
