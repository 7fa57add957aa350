//! Thin wrapper over `std::process::Command` for the external CLIs.

use std::path::Path;
use std::process::Command;

use crate::{Error, Result};

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Whether the host answered "not found" rather than failing outright.
    pub fn is_not_found(&self) -> bool {
        self.stderr.contains("Not Found") || self.stderr.contains("HTTP 404")
    }

    pub fn into_error(self, command: String) -> Error {
        Error::CommandFailed {
            command,
            code: self.code,
            stderr: self.stderr.trim().to_string(),
        }
    }
}

/// Run `program args..` in `workdir`, capturing output.
///
/// `env` entries are added to the inherited environment.
pub fn run_captured(
    program: &str,
    args: &[&str],
    workdir: &Path,
    env: &[(&str, &str)],
) -> Result<CommandOutput> {
    tracing::debug!(program, ?args, "Running external command");
    let mut command = Command::new(program);
    command.args(args).current_dir(workdir);
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().map_err(|source| Error::Spawn {
        program: program.to_string(),
        source,
    })?;
    Ok(CommandOutput {
        code: output.status.code(),
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Render a command line for diagnostics.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
