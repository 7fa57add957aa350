//! Dry-run validation of vendor repositories.

#![cfg(unix)]

use vendored_core::validator::{
    CHECK_DRY_RUN, CHECK_MANIFEST_FILES, CHECK_MANIFEST_WRITTEN, CHECK_REPO_EXISTS,
    CHECK_SCRIPT_EXISTS, CHECK_SHEBANG, CHECK_SYNTAX, CHECK_VERSION,
};
use vendored_core::{CheckStatus, Validator};
use vendored_test_utils::FakeHost;

const GOOD_SCRIPT: &str = "#!/bin/bash\nmkdir -p \"$VENDOR_INSTALL_DIR\"\ntouch \"$VENDOR_INSTALL_DIR/file.txt\"\necho \"$VENDOR_INSTALL_DIR/file.txt\" > \"$VENDOR_MANIFEST\"\n";

fn names(report: &vendored_core::ValidationReport) -> Vec<&str> {
    report.checks.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn passing_repository_runs_all_eight_checks() {
    let host = FakeHost::new().publish("owner/tool", "1.0.0", GOOD_SCRIPT);

    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    assert_eq!(
        names(&report),
        vec![
            CHECK_REPO_EXISTS,
            CHECK_SCRIPT_EXISTS,
            CHECK_VERSION,
            CHECK_SHEBANG,
            CHECK_SYNTAX,
            CHECK_DRY_RUN,
            CHECK_MANIFEST_WRITTEN,
            CHECK_MANIFEST_FILES,
        ]
    );
    assert!(report.all_passed(), "{:?}", report.checks);
    assert_eq!(report.summary(), "PASS (8/8 checks)");
    assert_eq!(report.checks[2].detail.as_deref(), Some("1.0.0"));
}

#[test]
fn missing_repository_stops_after_first_check() {
    let host = FakeHost::new();
    let report = Validator::new(&host).validate("owner/absent", None, None).unwrap();

    assert_eq!(names(&report), vec![CHECK_REPO_EXISTS]);
    assert_eq!(report.summary(), "FAIL (0/1 checks passed)");
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn missing_install_script_stops_after_second_check() {
    let host = FakeHost::new().repo("owner/tool");
    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    assert_eq!(names(&report), vec![CHECK_REPO_EXISTS, CHECK_SCRIPT_EXISTS]);
    assert_eq!(report.status(CHECK_SCRIPT_EXISTS), Some(CheckStatus::Fail));
}

#[test]
fn unresolvable_version_stops_after_third_check() {
    let host = FakeHost::new().file("owner/tool", None, "install.sh", GOOD_SCRIPT);
    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.status(CHECK_VERSION), Some(CheckStatus::Fail));
}

#[test]
fn download_failure_still_reports_every_later_check() {
    let host = FakeHost::new()
        .release("owner/tool", "v1.0.0")
        .file("owner/tool", None, "install.sh", GOOD_SCRIPT);

    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    assert_eq!(report.total(), 8);
    assert_eq!(report.pass_count(), 3);
    assert_eq!(report.summary(), "FAIL (3/8 checks passed)");
}

#[test]
fn wrong_shebang_and_syntax_errors_are_collected() {
    let host = FakeHost::new().publish("owner/tool", "1.0.0", "#!/bin/sh\nif then\n");

    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    assert_eq!(report.status(CHECK_SHEBANG), Some(CheckStatus::Fail));
    assert_eq!(report.status(CHECK_SYNTAX), Some(CheckStatus::Fail));
    assert_eq!(report.total(), 8);
}

#[test]
fn script_without_manifest_fails_manifest_checks() {
    let host = FakeHost::new().publish("owner/tool", "1.0.0", "#!/bin/bash\necho ok\n");

    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    assert_eq!(report.status(CHECK_DRY_RUN), Some(CheckStatus::Pass));
    assert_eq!(report.status(CHECK_MANIFEST_WRITTEN), Some(CheckStatus::Fail));
    assert_eq!(report.status(CHECK_MANIFEST_FILES), Some(CheckStatus::Fail));
}

#[test]
fn manifest_listing_absent_files_fails_last_check() {
    let script = "#!/bin/bash\necho nonexistent/file.txt > \"$VENDOR_MANIFEST\"\n";
    let host = FakeHost::new().publish("owner/tool", "1.0.0", script);

    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    assert_eq!(report.status(CHECK_MANIFEST_WRITTEN), Some(CheckStatus::Pass));
    assert_eq!(report.status(CHECK_MANIFEST_FILES), Some(CheckStatus::Fail));
}

#[test]
fn failing_dry_run_skips_manifest_checks() {
    let host = FakeHost::new().publish("owner/tool", "1.0.0", "#!/bin/bash\nexit 1\n");

    let report = Validator::new(&host).validate("owner/tool", None, None).unwrap();

    let dry_run = report.checks.iter().find(|c| c.name == CHECK_DRY_RUN).unwrap();
    assert_eq!(dry_run.status, CheckStatus::Fail);
    assert_eq!(dry_run.detail.as_deref(), Some("exit code 1"));
    assert_eq!(report.fail_count(), 3);
}

#[test]
fn explicit_version_is_used_verbatim() {
    let host = FakeHost::new()
        .repo("owner/tool")
        .file("owner/tool", None, "install.sh", GOOD_SCRIPT)
        .file("owner/tool", Some("v0.9.0"), "install.sh", GOOD_SCRIPT);

    let report = Validator::new(&host).validate("owner/tool", Some("0.9.0"), None).unwrap();
    assert!(report.all_passed(), "{:?}", report.checks);
}
