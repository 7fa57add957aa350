//! Git repository fixtures.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Initialise a real repository with `git2`: no commits, no config.
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Initialise a repository with one commit on `main` using the `git` CLI.
///
/// Configures a local identity and disables signing so commits work in CI.
///
/// # Panics
/// Panics if any git command fails.
pub fn real_git_repo_with_commit(path: &Path) {
    run_git(path, &["init"]);
    run_git(path, &["config", "user.email", "test@test.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    run_git(path, &["config", "commit.gpgsign", "false"]);

    fs::write(path.join("README.md"), "# Test")
        .unwrap_or_else(|e| panic!("real_git_repo_with_commit: failed to write README.md: {e}"));

    run_git(path, &["add", "."]);
    run_git(path, &["commit", "-m", "Initial commit"]);
    let _ = Command::new("git")
        .args(["branch", "-m", "main"])
        .current_dir(path)
        .output();
}

/// Stage `paths` with the `git` CLI.
pub fn stage(path: &Path, paths: &[&str]) {
    let mut args = vec!["add", "--"];
    args.extend_from_slice(paths);
    run_git(path, &args);
}

/// Run `git` in `path`, panicking with stderr on failure.
pub fn run_git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "`git {args:?}` failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}
