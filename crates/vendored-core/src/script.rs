//! Running install scripts under the install contract
//!
//! Scripts run with `bash` from a working directory chosen by the caller and
//! receive:
//!
//! - `VENDOR_REF`: resolved version
//! - `VENDOR_REPO`: `owner/name`
//! - `VENDOR_INSTALL_DIR`: relative scratch root, non-dogfood only
//! - `VENDOR_MANIFEST`: file to write produced paths to, one per line
//! - `VENDOR_NAME`: local vendor name, when known
//! - `GH_TOKEN`: credential for private fetches, when available

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use vendored_fs::{NormalizedPath, io, normalize_relative};

use crate::{Error, Result};

/// Accepted first lines of an install script.
pub const ACCEPTED_SHEBANGS: [&str; 2] = ["#!/bin/bash", "#!/usr/bin/env bash"];

/// Environment handed to one script run.
#[derive(Debug, Clone, Default)]
pub struct ScriptEnv {
    pub reference: String,
    pub repo: String,
    pub install_dir: Option<String>,
    pub manifest: PathBuf,
    pub vendor_name: Option<String>,
    pub token: Option<String>,
}

impl ScriptEnv {
    fn apply(&self, command: &mut Command) {
        command
            .env("VENDOR_REF", &self.reference)
            .env("VENDOR_REPO", &self.repo)
            .env("VENDOR_MANIFEST", &self.manifest)
            .env_remove("VENDOR_INSTALL_DIR");
        if let Some(dir) = &self.install_dir {
            command.env("VENDOR_INSTALL_DIR", dir);
        }
        if let Some(name) = &self.vendor_name {
            command.env("VENDOR_NAME", name);
        }
        if let Some(token) = &self.token {
            command.env("GH_TOKEN", token);
        }
    }
}

/// Result of running a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs scripts with a shell interpreter.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self {
            interpreter: "bash".to_string(),
        }
    }
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Run with inherited stdio so install progress reaches the user.
    pub fn run(&self, script: &Path, cwd: &Path, env: &ScriptEnv) -> Result<ScriptOutcome> {
        tracing::debug!(repo = %env.repo, version = %env.reference, "Running install script");
        let mut command = Command::new(&self.interpreter);
        command
            .arg(script)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        env.apply(&mut command);
        let status = command.status().map_err(|e| Error::io(script, e))?;
        Ok(ScriptOutcome {
            exit_code: status.code(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    /// Run capturing output, for dry runs.
    pub fn run_captured(&self, script: &Path, cwd: &Path, env: &ScriptEnv) -> Result<ScriptOutcome> {
        let mut command = Command::new(&self.interpreter);
        command.arg(script).current_dir(cwd).stdin(Stdio::null());
        env.apply(&mut command);
        self.capture(command, script)
    }

    /// Parse without executing (`bash -n`).
    pub fn check_syntax(&self, script: &Path) -> Result<ScriptOutcome> {
        let mut command = Command::new(&self.interpreter);
        command.arg("-n").arg(script).stdin(Stdio::null());
        self.capture(command, script)
    }

    fn capture(&self, mut command: Command, script: &Path) -> Result<ScriptOutcome> {
        let output = command.output().map_err(|e| Error::io(script, e))?;
        Ok(ScriptOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

pub fn has_accepted_shebang(script: &str) -> bool {
    script
        .lines()
        .next()
        .map(str::trim_end)
        .is_some_and(|line| ACCEPTED_SHEBANGS.contains(&line))
}

/// Paths a script wrote to its manifest file.
///
/// `None` when the script did not write one (registry-editing scripts);
/// otherwise the normalized, sorted, de-duplicated entries.
pub fn read_script_manifest(path: &Path) -> Result<Option<Vec<String>>> {
    let Some(lines) = io::read_lines(&NormalizedPath::new(path))? else {
        return Ok(None);
    };
    let mut files: Vec<String> = lines
        .iter()
        .map(|line| normalize_relative(line))
        .filter(|line| !line.is_empty())
        .collect();
    if files.is_empty() {
        return Ok(None);
    }
    files.sort();
    files.dedup();
    Ok(Some(files))
}
