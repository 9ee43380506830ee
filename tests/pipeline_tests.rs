//! Pipeline tests driven through the fake environment-manager and
//! archive-builder seams; no real pipenv or zip required.

mod helpers;

use helpers::{FakeArchive, FakeEnv, TestEnv};
use lambda_pack::config::PackConfig;
use lambda_pack::package::{checksum_path, package, report_path, PackageReport};
use std::fs;

#[test]
fn full_run_produces_archive_and_sidecars() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();
    let config = PackConfig::default();

    let report = package(&env.project, &config, &fake_env, &fake_zip, true).unwrap();

    let archive = env.project.join("lambda.zip");
    assert!(archive.is_file());
    assert!(checksum_path(&archive).is_file());
    assert!(report_path(&archive).is_file());
    assert_eq!(report.entries, 6);
    assert!(report.payload_bytes > 0);
}

#[test]
fn steps_run_in_pipeline_order() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true).unwrap();

    assert_eq!(
        *fake_env.calls.borrow(),
        vec!["remove_environment", "install_deploy", "environment_root"]
    );
    assert_eq!(
        fake_zip.call_names(),
        vec!["add_tree", "add_entries", "delete", "add_files", "list"]
    );
}

#[test]
fn bulk_add_excludes_runtime_libraries() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true).unwrap();

    let calls = fake_zip.calls.borrow();
    let add_tree = calls.iter().find(|c| c.starts_with("add_tree")).unwrap();
    assert!(add_tree.contains("boto3*"));
    assert!(add_tree.contains("botocore*"));
    assert!(add_tree.contains("site-packages"));
}

#[test]
fn companions_added_after_bulk_add() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true).unwrap();

    let calls = fake_zip.calls.borrow();
    let add_entries = calls.iter().find(|c| c.starts_with("add_entries")).unwrap();
    assert!(add_entries.contains("boto3_type_annotations"));
}

#[test]
fn metadata_patterns_passed_to_delete() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true).unwrap();

    let calls = fake_zip.calls.borrow();
    let delete = calls.iter().find(|c| c.starts_with("delete")).unwrap();
    for pattern in ["pip*", "setuptools*", "wheel*", "pkg_resources*", "easy_install*"] {
        assert!(delete.contains(pattern), "missing {pattern} in {delete}");
    }
    assert!(delete.contains("*.dist-info*"));
}

// Scenario B: lock out of sync - install fails, no archive is touched.
#[test]
fn install_failure_aborts_before_archive() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::failing_install(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    let err = package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true)
        .unwrap_err();

    assert!(err.to_string().contains("out of date"));
    assert!(fake_zip.calls.borrow().is_empty());
    assert!(!env.project.join("lambda.zip").exists());
}

// Scenario C: missing first-party file - late failure marks the archive
// unusable instead of leaving a library-only zip behind.
#[test]
fn missing_first_party_file_marks_archive_incomplete() {
    let env = TestEnv::new();
    env.remove_project_file("config.ini");
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    let err = package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true)
        .unwrap_err();

    assert!(err.to_string().contains("must not be deployed"));
    assert!(!env.project.join("lambda.zip").exists());
    assert!(env.project.join("lambda.zip.incomplete").is_file());
    // No checksum or report for an unusable artifact.
    assert!(!env.project.join("lambda.zip.sha256").exists());
    assert!(!env.project.join("lambda.zip.report.json").exists());
}

// Scenario D: excluded libraries not installed - companion add is a no-op.
#[test]
fn absent_companions_skip_the_add() {
    let env = TestEnv::new();
    env.remove_site_entry("boto3_type_annotations");
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::new(&["requests/", "router.py", "config.ini"]);

    package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true).unwrap();

    assert!(!fake_zip.call_names().contains(&"add_entries".to_string()));
}

#[test]
fn stale_outputs_removed_before_bulk_add() {
    let env = TestEnv::new();
    for stale in [
        "lambda.zip",
        "lambda.zip.incomplete",
        "lambda.zip.sha256",
        "lambda.zip.report.json",
    ] {
        fs::write(env.project.join(stale), "stale").unwrap();
    }
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true).unwrap();

    // Marker gone; archive and sidecars rewritten.
    assert!(!env.project.join("lambda.zip.incomplete").exists());
    let checksum = fs::read_to_string(env.project.join("lambda.zip.sha256")).unwrap();
    assert_ne!(checksum, "stale");
    assert!(checksum.ends_with("lambda.zip\n"));
}

#[test]
fn verification_rejects_broken_listing() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    // Listing with boto3's full tree still present.
    let fake_zip = FakeArchive::new(&[
        "boto3/session.py",
        "router.py",
        "config.ini",
    ]);

    let err = package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true)
        .unwrap_err();
    assert!(err.to_string().contains("Verification failed"));
}

#[test]
fn verification_can_be_skipped() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::new(&["boto3/session.py", "router.py", "config.ini"]);

    package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, false).unwrap();
}

#[test]
fn missing_site_packages_fails_before_archive() {
    let env = TestEnv::new();
    // Point the fake at a venv with no lib/ tree.
    let empty_venv = env._temp_dir.path().join("empty-venv");
    fs::create_dir_all(&empty_venv).unwrap();
    let fake_env = FakeEnv::new(&empty_venv);
    let fake_zip = FakeArchive::with_clean_listing();

    assert!(
        package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true).is_err()
    );
    assert!(fake_zip.calls.borrow().is_empty());
}

#[test]
fn report_sidecar_is_valid_json() {
    let env = TestEnv::new();
    let fake_env = FakeEnv::new(&env.venv);
    let fake_zip = FakeArchive::with_clean_listing();

    let report = package(&env.project, &PackConfig::default(), &fake_env, &fake_zip, true)
        .unwrap();

    let json = fs::read_to_string(env.project.join("lambda.zip.report.json")).unwrap();
    let parsed: PackageReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.sha256, report.sha256);
    assert_eq!(parsed.entries, report.entries);
}
