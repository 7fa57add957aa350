//! [`SourceHost`] backed by the GitHub `gh` command-line tool.

use std::path::{Path, PathBuf};

use crate::host::{PullRequest, PullRequestOutcome, SourceHost};
use crate::process::{CommandOutput, display_command, run_captured};
use crate::Result;

const RAW_ACCEPT: &str = "Accept: application/vnd.github.raw+json";

/// Talks to GitHub through `gh api` and `gh pr`.
///
/// `gh pr` subcommands act on the checkout at `workdir`.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
    workdir: PathBuf,
}

impl GhCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: "gh".to_string(),
            workdir: workdir.into(),
        }
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str], token: Option<&str>) -> Result<CommandOutput> {
        let env: Vec<(&str, &str)> = token.map(|t| ("GH_TOKEN", t)).into_iter().collect();
        run_captured(&self.program, args, &self.workdir, &env)
    }

    /// Run a query where "not found" is an answer rather than an error.
    fn query(&self, args: &[&str], token: Option<&str>) -> Result<Option<CommandOutput>> {
        let output = self.run(args, token)?;
        if output.success() {
            Ok(Some(output))
        } else if output.is_not_found() {
            Ok(None)
        } else {
            Err(output.into_error(display_command(&self.program, args)))
        }
    }
}

impl SourceHost for GhCli {
    fn repo_exists(&self, repo: &str, token: Option<&str>) -> Result<bool> {
        let endpoint = format!("repos/{repo}");
        Ok(self
            .query(&["api", &endpoint, "--jq", ".full_name"], token)?
            .is_some())
    }

    fn latest_release_tag(&self, repo: &str, token: Option<&str>) -> Result<Option<String>> {
        let endpoint = format!("repos/{repo}/releases/latest");
        let output = self.query(&["api", &endpoint, "--jq", ".tag_name"], token)?;
        Ok(output
            .map(|o| o.stdout_text())
            .filter(|tag| !tag.is_empty()))
    }

    fn file_exists(&self, repo: &str, path: &str, token: Option<&str>) -> Result<bool> {
        let endpoint = format!("repos/{repo}/contents/{path}");
        Ok(self
            .query(&["api", &endpoint, "--jq", ".name"], token)?
            .is_some())
    }

    fn file_at_ref(
        &self,
        repo: &str,
        path: &str,
        reference: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<Vec<u8>>> {
        let endpoint = match reference {
            Some(r) => format!("repos/{repo}/contents/{path}?ref={r}"),
            None => format!("repos/{repo}/contents/{path}"),
        };
        let output = self.query(&["api", "-H", RAW_ACCEPT, &endpoint], token)?;
        Ok(output.map(|o| o.stdout))
    }

    fn create_pull_request(
        &self,
        request: &PullRequest,
        token: Option<&str>,
    ) -> Result<PullRequestOutcome> {
        let args = [
            "pr",
            "create",
            "--base",
            request.base.as_str(),
            "--head",
            request.head.as_str(),
            "--title",
            request.title.as_str(),
            "--body",
            request.body.as_str(),
        ];
        let output = self.run(&args, token)?;
        if output.success() {
            return Ok(PullRequestOutcome::Created {
                url: output.stdout_text(),
            });
        }
        if output.stderr.contains("already exists") {
            return Ok(PullRequestOutcome::AlreadyExists);
        }
        Err(output.into_error(display_command(&self.program, &args[..2])))
    }

    fn merge(&self, pr: &str, token: Option<&str>) -> Result<()> {
        let args = ["pr", "merge", pr, "--auto", "--squash"];
        let output = self.run(&args, token)?;
        if output.success() {
            Ok(())
        } else {
            Err(output.into_error(display_command(&self.program, &args)))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Install a stand-in `gh` that answers from a shell `case` table.
    fn fake_gh(dir: &TempDir, body: &str) -> GhCli {
        let script = dir.path().join("gh");
        fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        GhCli::new(dir.path()).with_program(script.to_string_lossy().to_string())
    }

    #[test]
    fn not_found_is_an_answer() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(&dir, "echo 'gh: Not Found (HTTP 404)' >&2; exit 1");

        assert!(!gh.repo_exists("owner/missing", None).unwrap());
        assert_eq!(gh.latest_release_tag("owner/missing", None).unwrap(), None);
        assert_eq!(gh.file_at_ref("owner/missing", "VERSION", None, None).unwrap(), None);
    }

    #[test]
    fn other_failures_are_errors() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(&dir, "echo 'HTTP 401: Bad credentials' >&2; exit 1");

        let err = gh.repo_exists("owner/tool", Some("bad")).unwrap_err();
        assert!(matches!(err, crate::Error::CommandFailed { .. }));
    }

    #[test]
    fn token_is_passed_as_gh_token() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(&dir, "printf '%s' \"$GH_TOKEN\"");

        let bytes = gh.file_at_ref("owner/tool", "install.sh", Some("v1.0.0"), Some("secret"));
        assert_eq!(bytes.unwrap(), Some(b"secret".to_vec()));
    }

    #[test]
    fn pull_request_already_exists() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(
            &dir,
            "echo 'a pull request for branch \"x\" already exists' >&2; exit 1",
        );
        let request = PullRequest {
            base: "main".into(),
            head: "chore/install-tool-v2.0.0".into(),
            title: "chore: install tool v2.0.0".into(),
            body: String::new(),
        };

        assert_eq!(
            gh.create_pull_request(&request, None).unwrap(),
            PullRequestOutcome::AlreadyExists
        );
    }

    #[test]
    fn latest_release_tag_trims_output() {
        let dir = TempDir::new().unwrap();
        let gh = fake_gh(&dir, "echo v2.1.0");
        assert_eq!(
            gh.latest_release_tag("owner/tool", None).unwrap().as_deref(),
            Some("v2.1.0")
        );
    }
}
