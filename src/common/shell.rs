//! Shell utility functions
//!
//! Splitting command templates into argument vectors and rendering argument
//! vectors back into a readable command line for logs and errors.

use crate::error::{ProvisionError, Result};

/// Escape a string for use in a shell command
///
/// This function quotes the string only if necessary (i.e., if it contains characters
/// that have special meaning in the shell). It uses single quotes for safety.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if s.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ',' | '\\'))
    {
        return s.to_string();
    }

    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Render an argument vector as a single command line.
pub fn display_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a command template into an argument vector.
///
/// Whitespace separates tokens, quoted substrings stay single tokens. An empty
/// template or an unbalanced quote is an [`ProvisionError::InvalidCommand`].
pub fn split_command(template: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(template).map_err(|e| ProvisionError::InvalidCommand {
        command: template.to_string(),
        reason: e.to_string(),
    })?;

    if argv.is_empty() {
        return Err(ProvisionError::InvalidCommand {
            command: template.to_string(),
            reason: "empty command".to_string(),
        });
    }

    Ok(argv)
}
