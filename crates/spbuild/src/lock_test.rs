// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use crate::lock::{LockApiVersion, LockChangeKind, PlanLock};
use crate::{BuildOptions, Error, generate_lock, generate_plan, plan_digest, verify_lock};

fn options() -> BuildOptions {
    BuildOptions::from_yaml("source: .\nruntime-version: \"3.2.2\"\n").unwrap()
}

#[rstest]
fn test_generate_lock_structure() {
    let options = options();
    let plan = generate_plan(&options);
    let lock = generate_lock(&options, &plan);

    assert_eq!(lock.api, LockApiVersion::V0);
    assert_eq!(lock.plan, plan);
    assert_eq!(lock.sha256, plan_digest(&plan));
    assert_eq!(lock.sha256.len(), 64);
    assert_eq!(lock.generated.spbuild_version, env!("CARGO_PKG_VERSION"));
    assert_eq!(
        lock.options.get("runtime-version").and_then(|v| v.as_str()),
        Some("3.2.2")
    );
}

#[rstest]
fn test_digest_is_stable() {
    let a = generate_plan(&options());
    let b = generate_plan(&options());
    assert_eq!(plan_digest(&a), plan_digest(&b));

    let mut other = options();
    other.use_alternate_allocator = true;
    assert_ne!(plan_digest(&a), plan_digest(&generate_plan(&other)));
}

#[rstest]
fn test_verify_unchanged_plan() {
    let options = options();
    let plan = generate_plan(&options);
    let lock = generate_lock(&options, &plan);
    assert!(verify_lock(&lock, &generate_plan(&options)).is_empty());
}

#[rstest]
fn test_verify_detects_added_lock_step() {
    let options = options();
    let lock = generate_lock(&options, &generate_plan(&options));

    let mut changed = options.clone();
    changed.use_bundled_dependency_manager = true;
    let changes = verify_lock(&lock, &generate_plan(&changed));

    let kinds: Vec<_> = changes.iter().map(|c| c.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![LockChangeKind::CommandAdded, LockChangeKind::DigestMismatch]
    );
    assert_eq!(changes[0].actual.as_deref(), Some("bundle"));
}

#[rstest]
fn test_verify_detects_allocator_change() {
    let mut options = options();
    options.use_alternate_allocator = true;
    let lock = generate_lock(&options, &generate_plan(&options));

    options.use_alternate_allocator = false;
    let changes = verify_lock(&lock, &generate_plan(&options));

    assert!(changes.iter().any(|c| c.kind == LockChangeKind::CommandChanged
        && c.expected.as_deref().is_some_and(|e| e.contains("--with-jemalloc"))));
    assert!(changes.iter().any(|c| c.kind == LockChangeKind::PackageRemoved
        && c.reference == "libjemalloc-dev"));
    assert_eq!(
        changes.last().map(|c| c.kind.clone()),
        Some(LockChangeKind::DigestMismatch)
    );
}

#[rstest]
fn test_verify_detects_removed_commands_and_environment() {
    let mut options = options();
    options.use_bundled_dependency_manager = true;
    let mut lock = generate_lock(&options, &generate_plan(&options));
    lock.plan
        .build_environment
        .insert("EXTRA".to_string(), "1".to_string());

    options.use_bundled_dependency_manager = false;
    let changes = verify_lock(&lock, &generate_plan(&options));

    assert!(changes.iter().any(|c| c.kind == LockChangeKind::CommandRemoved
        && c.expected.as_deref() == Some("bundle")));
    assert!(changes.iter().any(|c| c.kind == LockChangeKind::EnvironmentChanged
        && c.reference == "EXTRA"
        && c.actual.is_none()));
}

#[rstest]
fn test_verify_detects_tampered_digest() {
    let options = options();
    let plan = generate_plan(&options);
    let mut lock = generate_lock(&options, &plan);
    lock.sha256 = "deadbeef".to_string();

    let changes = verify_lock(&lock, &plan);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, LockChangeKind::DigestMismatch);
    assert_eq!(changes[0].expected.as_deref(), Some("deadbeef"));
}

#[rstest]
fn test_save_and_load() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(crate::SPBUILD_LOCK_FILENAME);

    let options = options();
    let plan = generate_plan(&options);
    let lock = generate_lock(&options, &plan);
    lock.save(&path).expect("Should write lock");

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("api: spbuild/v0/lock"));

    let loaded = PlanLock::load(&path).expect("Should read lock");
    assert!(verify_lock(&loaded, &plan).is_empty());
    assert_eq!(loaded.sha256, lock.sha256);
}

#[rstest]
fn test_load_missing_lock() {
    let tmp = TempDir::new().unwrap();
    let result = PlanLock::load(tmp.path().join("missing.lock.yaml"));
    assert!(matches!(result, Err(Error::ReadFailed { .. })));
}

#[rstest]
fn test_load_invalid_lock() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.lock.yaml");
    std::fs::write(&path, "api: spbuild/v9/lock\n").unwrap();
    assert!(matches!(
        PlanLock::load(&path),
        Err(Error::InvalidYaml { .. })
    ));
}
