//! Pre-trust validation of a vendor repository
//!
//! Three fail-fast checks (repository, script, version) gate five
//! collect-and-report checks that all run even after one fails: shebang,
//! syntax, a dry-run install in a scratch directory, and the manifest that
//! run produced. Nothing in the host repository is touched.

use std::fmt;
use std::fs;
use std::path::Path;

use vendored_fs::normalize_relative;
use vendored_host::SourceHost;

use crate::descriptor::repo_basename;
use crate::script::{ScriptEnv, ScriptRunner, has_accepted_shebang, read_script_manifest};
use crate::{Error, INSTALL_SCRIPT, Result, VersionResolver};

pub const CHECK_REPO_EXISTS: &str = "Repository exists";
pub const CHECK_SCRIPT_EXISTS: &str = "install.sh exists";
pub const CHECK_VERSION: &str = "Version resolvable";
pub const CHECK_SHEBANG: &str = "Valid shebang";
pub const CHECK_SYNTAX: &str = "Syntax valid";
pub const CHECK_DRY_RUN: &str = "Dry-run install";
pub const CHECK_MANIFEST_WRITTEN: &str = "Manifest written";
pub const CHECK_MANIFEST_FILES: &str = "Manifest files exist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: Option<String>,
}

/// Ordered record of every check that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    pub fn passed(&mut self, name: &str, detail: Option<String>) {
        self.push(name, CheckStatus::Pass, detail);
    }

    pub fn failed(&mut self, name: &str, detail: Option<String>) {
        self.push(name, CheckStatus::Fail, detail);
    }

    fn push(&mut self, name: &str, status: CheckStatus, detail: Option<String>) {
        self.checks.push(ValidationCheck {
            name: name.to_string(),
            status,
            detail,
        });
    }

    fn record(&mut self, name: &str, ok: bool, detail: Option<String>) -> bool {
        let status = if ok { CheckStatus::Pass } else { CheckStatus::Fail };
        self.push(name, status, detail);
        ok
    }

    pub fn pass_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count()
    }

    pub fn fail_count(&self) -> usize {
        self.total() - self.pass_count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    /// True for an empty report.
    pub fn all_passed(&self) -> bool {
        self.fail_count() == 0
    }

    pub fn status(&self, name: &str) -> Option<CheckStatus> {
        self.checks.iter().find(|c| c.name == name).map(|c| c.status)
    }

    /// `PASS (n/n checks)` or `FAIL (p/n checks passed)`.
    pub fn summary(&self) -> String {
        if self.all_passed() {
            format!("PASS ({}/{} checks)", self.pass_count(), self.total())
        } else {
            format!("FAIL ({}/{} checks passed)", self.pass_count(), self.total())
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }
}

pub struct Validator<'a> {
    host: &'a dyn SourceHost,
    runner: ScriptRunner,
}

impl<'a> Validator<'a> {
    pub fn new(host: &'a dyn SourceHost) -> Self {
        Self {
            host,
            runner: ScriptRunner::default(),
        }
    }

    pub fn with_runner(mut self, runner: ScriptRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Run every check for `repo` at `reference` (default: latest).
    ///
    /// Host failures while probing count as failed checks, so this only
    /// errors when the scratch directory itself cannot be prepared.
    pub fn validate(
        &self,
        repo: &str,
        reference: Option<&str>,
        token: Option<&str>,
    ) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        let exists = self.host.repo_exists(repo, token);
        if !report.record(CHECK_REPO_EXISTS, matches!(exists, Ok(true)), failure_detail(exists)) {
            return Ok(report);
        }

        let script_exists = self.host.file_exists(repo, INSTALL_SCRIPT, token);
        if !report.record(
            CHECK_SCRIPT_EXISTS,
            matches!(script_exists, Ok(true)),
            failure_detail(script_exists),
        ) {
            return Ok(report);
        }

        let version = match VersionResolver::new(self.host).resolve(repo, reference, token) {
            Ok(version) => {
                report.passed(CHECK_VERSION, Some(version.clone()));
                version
            }
            Err(e) => {
                report.failed(CHECK_VERSION, Some(e.to_string()));
                return Ok(report);
            }
        };

        let script = self.download_script(repo, &version, token);
        self.check_shebang(script.as_deref(), &mut report);
        self.check_syntax(script.as_deref(), &mut report)?;
        self.dry_run(repo, &version, script.as_deref(), token, &mut report)?;

        tracing::debug!(repo, summary = %report.summary(), "Validation finished");
        Ok(report)
    }

    /// Script text at `v<version>`, then `<version>`.
    fn download_script(&self, repo: &str, version: &str, token: Option<&str>) -> Option<String> {
        let mut refs = vec![version.to_string()];
        if !version.starts_with('v') {
            refs.insert(0, format!("v{version}"));
        }
        refs.iter().find_map(|reference| {
            match self.host.file_at_ref(repo, INSTALL_SCRIPT, Some(reference), token) {
                Ok(Some(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Ok(None) => None,
                Err(e) => {
                    tracing::debug!(repo, reference = %reference, error = %e, "Download failed");
                    None
                }
            }
        })
    }

    fn check_shebang(&self, script: Option<&str>, report: &mut ValidationReport) -> bool {
        match script {
            None => report.record(CHECK_SHEBANG, false, Some("install.sh could not be downloaded".into())),
            Some(text) => {
                let first = text.lines().next().unwrap_or_default().trim_end().to_string();
                let ok = has_accepted_shebang(text);
                report.record(CHECK_SHEBANG, ok, (!ok).then(|| format!("found '{first}'")))
            }
        }
    }

    fn check_syntax(&self, script: Option<&str>, report: &mut ValidationReport) -> Result<bool> {
        let Some(text) = script else {
            return Ok(report.record(CHECK_SYNTAX, false, Some("no script content".into())));
        };
        let scratch = scratch_dir()?;
        let path = scratch.path().join(INSTALL_SCRIPT);
        fs::write(&path, text).map_err(|e| Error::io(&path, e))?;

        let ok = match self.runner.check_syntax(&path) {
            Ok(outcome) if outcome.success() => report.record(CHECK_SYNTAX, true, None),
            Ok(outcome) => report.record(CHECK_SYNTAX, false, Some(outcome.stderr.trim().to_string())),
            Err(e) => report.record(CHECK_SYNTAX, false, Some(e.to_string())),
        };
        Ok(ok)
    }

    /// Checks 6-8: run, manifest written, manifest paths exist.
    fn dry_run(
        &self,
        repo: &str,
        version: &str,
        script: Option<&str>,
        token: Option<&str>,
        report: &mut ValidationReport,
    ) -> Result<()> {
        let Some(text) = script else {
            for name in [CHECK_DRY_RUN, CHECK_MANIFEST_WRITTEN, CHECK_MANIFEST_FILES] {
                report.failed(name, Some("no script content".into()));
            }
            return Ok(());
        };

        let scratch = scratch_dir()?;
        let work = scratch.path().join("work");
        let install_dir = format!(".vendored/pkg/{}", repo_basename(repo));
        let native_install = work.join(&install_dir);
        fs::create_dir_all(&native_install).map_err(|e| Error::io(&native_install, e))?;

        let script_path = scratch.path().join(INSTALL_SCRIPT);
        fs::write(&script_path, text).map_err(|e| Error::io(&script_path, e))?;
        let manifest = scratch.path().join("manifest");

        let env = ScriptEnv {
            reference: version.to_string(),
            repo: repo.to_string(),
            install_dir: Some(install_dir),
            manifest: manifest.clone(),
            vendor_name: Some(repo_basename(repo).to_string()),
            token: token.map(str::to_string),
        };

        match self.runner.run_captured(&script_path, &work, &env) {
            Ok(outcome) if outcome.success() => report.passed(CHECK_DRY_RUN, None),
            Ok(outcome) => {
                let code = outcome
                    .exit_code
                    .map_or_else(|| "killed".to_string(), |c| format!("exit code {c}"));
                report.failed(CHECK_DRY_RUN, Some(code));
                report.failed(CHECK_MANIFEST_WRITTEN, Some("skipped".into()));
                report.failed(CHECK_MANIFEST_FILES, Some("skipped".into()));
                return Ok(());
            }
            Err(e) => {
                report.failed(CHECK_DRY_RUN, Some(e.to_string()));
                report.failed(CHECK_MANIFEST_WRITTEN, Some("skipped".into()));
                report.failed(CHECK_MANIFEST_FILES, Some("skipped".into()));
                return Ok(());
            }
        }

        let Some(files) = read_script_manifest(&manifest)? else {
            report.failed(CHECK_MANIFEST_WRITTEN, Some("no manifest".into()));
            report.failed(CHECK_MANIFEST_FILES, Some("no manifest".into()));
            return Ok(());
        };
        report.passed(CHECK_MANIFEST_WRITTEN, Some(format!("{} file(s)", files.len())));

        let missing = missing_in(&work, &files);
        if missing.is_empty() {
            report.passed(CHECK_MANIFEST_FILES, None);
        } else {
            report.failed(CHECK_MANIFEST_FILES, Some(format!("missing: {}", missing.join(", "))));
        }
        Ok(())
    }
}

fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("vendored-validate-")
        .tempdir()
        .map_err(|e| Error::io(std::env::temp_dir(), e))
}

fn missing_in(root: &Path, files: &[String]) -> Vec<String> {
    files
        .iter()
        .map(|f| normalize_relative(f))
        .filter(|f| !root.join(f).exists())
        .collect()
}

fn failure_detail(probe: std::result::Result<bool, vendored_host::Error>) -> Option<String> {
    match probe {
        Ok(true) => None,
        Ok(false) => Some("not found".to_string()),
        Err(e) => Some(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_passes() {
        let report = ValidationReport::default();
        assert_eq!(report.total(), 0);
        assert!(report.all_passed());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn summary_counts() {
        let mut report = ValidationReport::default();
        report.passed("A", None);
        report.passed("B", Some("detail".into()));
        assert_eq!(report.summary(), "PASS (2/2 checks)");

        report.failed("C", Some("reason".into()));
        assert_eq!(report.summary(), "FAIL (2/3 checks passed)");
        assert_eq!(report.fail_count(), 1);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.status("C"), Some(CheckStatus::Fail));
    }

    #[test]
    fn manifest_paths_resolve_against_scratch_root() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/b.txt"), "").unwrap();
        let missing = missing_in(temp.path(), &["a/b.txt".into(), "./c.txt".into()]);
        assert_eq!(missing, vec!["c.txt".to_string()]);
    }
}
