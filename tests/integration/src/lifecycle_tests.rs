//! Vendor lifecycle across crates
//!
//! Install with dependencies, guard the result in a real git checkout,
//! update everything, publish, and remove, all against one host repository.

#![cfg(unix)]

use pretty_assertions::assert_eq;
use serde_json::json;
use vendored_core::{
    DependencyMode, InstallOptions, Installer, InstallingSet, ManifestStore, PrPublisher,
    ProtectionEngine, PublishOutcome, RegistryStore, Remover, results,
};
use vendored_host::{GitRepository, SourceControl};
use vendored_test_utils::{FakeHost, FakeSourceControl, TestRepo, git};

const TOOL_DEPS: &str = r#"{"helper": {"repo": "owner/helper"}}"#;

/// Writes `<name>.txt` holding the ref into the install dir and lists it.
fn script(name: &str) -> String {
    format!(
        "#!/bin/bash\nset -e\nmkdir -p \"$VENDOR_INSTALL_DIR\"\necho \"$VENDOR_REF\" > \"$VENDOR_INSTALL_DIR/{name}.txt\"\necho \"$VENDOR_INSTALL_DIR/{name}.txt\" > \"$VENDOR_MANIFEST\"\n"
    )
}

fn host_at(version: &str) -> FakeHost {
    FakeHost::new()
        .publish("owner/helper", version, &script("helper"))
        .publish("owner/tool", version, &script("tool"))
        .deps("owner/tool", version, TOOL_DEPS)
}

fn staged_violations(repo: &TestRepo) -> Vec<String> {
    let layout = repo.layout();
    let registry = RegistryStore::new(layout.clone()).load().unwrap();
    let manifests = ManifestStore::new(layout);
    let scm = GitRepository::open(repo.root()).unwrap();
    let staged = scm.staged_files().unwrap();
    let branch = scm.current_branch().unwrap();
    ProtectionEngine::new(&manifests)
        .check_all(&registry, &staged, branch.as_deref())
        .unwrap()
        .into_iter()
        .map(|v| v.to_string())
        .collect()
}

/// Fresh repository with `tool` installed, which pulls in `helper`.
fn installed_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.init_git();
    repo.monolithic_config(json!({}));

    let host = host_at("1.0.0");
    let options = InstallOptions {
        dep_mode: DependencyMode::Install,
        ..InstallOptions::default()
    };
    let result = Installer::new(repo.layout(), &host)
        .install_new_vendor("owner/tool", &options, None, &mut InstallingSet::new())
        .unwrap();
    assert_eq!(result.vendor, "tool");
    repo
}

#[test]
fn install_pulls_in_dependencies_and_records_them() {
    let repo = installed_repo();

    let registry = RegistryStore::new(repo.layout()).load().unwrap();
    assert_eq!(registry.names(), vec!["helper".to_string(), "tool".to_string()]);

    repo.assert_file_contains(".vendored/pkg/helper/helper.txt", "1.0.0");
    repo.assert_file_contains(".vendored/pkg/tool/tool.txt", "1.0.0");
    assert_eq!(repo.read(".vendored/manifests/tool.deps").trim(), "helper");
    repo.assert_file_not_exists(".vendored/manifests/helper.deps");

    let manifests = ManifestStore::new(repo.layout());
    assert_eq!(
        manifests.read_files("tool").unwrap(),
        Some(vec![".vendored/pkg/tool/tool.txt".to_string()])
    );
}

#[test]
fn installed_files_are_guarded_outside_their_install_branch() {
    let repo = installed_repo();
    repo.write(".vendored/pkg/helper/helper.txt", "hand edit\n");
    repo.write("notes.md", "ok\n");
    git::stage(repo.root(), &[".vendored/pkg/helper/helper.txt", "notes.md"]);

    assert_eq!(
        staged_violations(&repo),
        vec![
            ".vendored/pkg/helper/helper.txt (protected by helper: manifest entry)".to_string()
        ]
    );

    git::run_git(repo.root(), &["checkout", "-b", "chore/install-helper-v2.0.0"]);
    assert!(staged_violations(&repo).is_empty());
}

#[test]
fn update_all_then_publish_one_pull_request() {
    let repo = installed_repo();
    let host = host_at("2.0.0");

    let outcomes = Installer::new(repo.layout(), &host)
        .install_all(&InstallOptions::default())
        .unwrap();

    let summary: Vec<(&str, &str, &str)> = outcomes
        .iter()
        .map(|r| (r.vendor.as_str(), r.old_version.as_str(), r.new_version.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![("helper", "1.0.0", "2.0.0"), ("tool", "1.0.0", "2.0.0")]
    );
    repo.assert_file_contains(".vendored/pkg/tool/tool.txt", "2.0.0");

    let registry = RegistryStore::new(repo.layout()).load().unwrap();
    let outputs = results::outputs_for(&outcomes, &registry);
    assert_eq!(outputs[0], ("changed_count".to_string(), "2".to_string()));

    let scm = FakeSourceControl::new()
        .on_branch("main")
        .with_unstaged(&[".vendored/manifests/tool.version"]);
    let published = PrPublisher::new(&scm, &host)
        .publish(&outcomes, &registry, None)
        .unwrap();

    assert!(matches!(published, PublishOutcome::Created { automerge: false, .. }));
    assert_eq!(scm.created_branches(), vec!["chore/install-vendors".to_string()]);
    assert_eq!(
        host.pull_requests()[0].title,
        "chore: install helper v2.0.0, tool v2.0.0"
    );
}

#[test]
fn rerun_at_same_version_changes_nothing() {
    let repo = installed_repo();
    let host = host_at("1.0.0");

    let outcomes = Installer::new(repo.layout(), &host)
        .install_all(&InstallOptions::default())
        .unwrap();

    assert!(outcomes.iter().all(|r| !r.changed));
    let scm = FakeSourceControl::new().on_branch("main");
    let registry = RegistryStore::new(repo.layout()).load().unwrap();
    let published = PrPublisher::new(&scm, &host)
        .publish(&outcomes, &registry, None)
        .unwrap();
    assert_eq!(published, PublishOutcome::NoVendorChanges);
}

#[test]
fn removing_a_dependency_warns_and_keeps_dependents() {
    let repo = installed_repo();
    let remover = Remover::new(repo.layout());

    let plan = remover.plan("helper").unwrap();
    assert_eq!(plan.reverse_deps, vec!["tool".to_string()]);

    remover.execute(&plan).unwrap();

    repo.assert_file_not_exists(".vendored/pkg/helper");
    repo.assert_file_not_exists(".vendored/manifests/helper.files");
    repo.assert_file_exists(".vendored/pkg/tool/tool.txt");
    let registry = RegistryStore::new(repo.layout()).load().unwrap();
    assert_eq!(registry.names(), vec!["tool".to_string()]);
}
