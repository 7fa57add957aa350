//! The `check` command: the pre-commit gate

use std::path::Path;

use colored::Colorize;
use vendored_core::protection::install_hook;
use vendored_core::{Error, ManifestStore, ProtectionEngine, RegistryStore};
use vendored_host::{GitRepository, SourceControl};

use crate::context;
use crate::error::Result;

/// CI checkouts are detached; the PR head branch comes from here instead.
const HEAD_REF_VAR: &str = "GITHUB_HEAD_REF";

pub fn run_check(cwd: &Path, link_hook: bool) -> Result<()> {
    let layout = context::locate(cwd)?;

    if link_hook {
        let hook = install_hook(&layout)?;
        println!(
            "{} Linked pre-commit hook at {}",
            "=>".blue().bold(),
            hook.as_str()
        );
        return Ok(());
    }

    let store = RegistryStore::new(layout.clone());
    if !store.exists()? {
        println!(
            "{} No vendored registry found, nothing to protect",
            "note:".yellow().bold()
        );
        return Ok(());
    }
    let registry = store.load()?;

    let scm = GitRepository::open(&layout.root().to_native())?;
    let staged = scm.staged_files()?;
    let branch = match head_ref_from_env() {
        Some(branch) => Some(branch),
        None => scm.current_branch()?,
    };
    tracing::debug!(staged = staged.len(), branch = ?branch, "Checking staged files");

    let manifests = ManifestStore::new(layout);
    let violations = ProtectionEngine::new(&manifests).check_all(&registry, &staged, branch.as_deref())?;

    if violations.is_empty() {
        println!("{} No protected files staged", "=>".blue().bold());
        return Ok(());
    }

    println!("{}", "Protected files staged for commit:".red().bold());
    for violation in &violations {
        println!("  {} {}", "x".red(), violation);
    }
    Err(Error::ProtectionViolations {
        count: violations.len(),
    }
    .into())
}

fn head_ref_from_env() -> Option<String> {
    std::env::var(HEAD_REF_VAR).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vendored_test_utils::{TestRepo, git};

    use crate::error::CliError;

    #[test]
    fn no_registry_passes() {
        let repo = TestRepo::new();
        run_check(repo.root(), false).unwrap();
    }

    #[test]
    fn unprotected_changes_pass() {
        let repo = TestRepo::new();
        repo.init_git();
        repo.vendor_config("tool", json!({"repo": "owner/tool", "protected": [".tool/**"]}));
        repo.write("src/lib.rs", "\n");
        git::stage(repo.root(), &["src/lib.rs"]);

        run_check(repo.root(), false).unwrap();
    }

    #[test]
    fn protected_changes_fail_with_count() {
        let repo = TestRepo::new();
        repo.init_git();
        repo.vendor_config("tool", json!({"repo": "owner/tool", "protected": [".tool/**"]}));
        repo.write(".tool/a.sh", "a\n");
        repo.write(".tool/b.sh", "b\n");
        git::stage(repo.root(), &[".tool/a.sh", ".tool/b.sh"]);

        let err = run_check(repo.root(), false).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(Error::ProtectionViolations { count: 2 })
        ));
    }
}
