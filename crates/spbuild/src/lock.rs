// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Lock file structures and helpers for spbuild.
//!
//! A lock records a generated plan so that a later run can prove it still
//! produces the exact same commands.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use sha2::{Digest, Sha256};

use crate::render_build_script;
use crate::{BuildOptions, BuildPlan};

#[cfg(test)]
#[path = "./lock_test.rs"]
mod lock_test;

/// Lock file API version.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum LockApiVersion {
    #[serde(rename = "spbuild/v0/lock")]
    V0,
}

/// Lock file structure capturing options and the generated plan.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlanLock {
    pub api: LockApiVersion,
    pub generated: GenerationMetadata,
    pub options: Mapping,
    pub plan: BuildPlan,
    pub sha256: String,
}

/// Metadata about when and where the lock was generated.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GenerationMetadata {
    pub timestamp: DateTime<Utc>,
    pub spbuild_version: String,
    pub hostname: String,
}

impl PlanLock {
    /// Load a lock file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
            error: e,
            yaml_content: yaml,
        })
    }

    /// Write this lock file to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).map_err(|e| crate::Error::InvalidYaml {
            error: e,
            yaml_content: String::new(),
        })?;
        std::fs::write(path, yaml).map_err(|e| crate::Error::WriteFailed {
            path: path.to_path_buf(),
            error: e,
        })
    }
}

/// Digest of a plan, taken over its rendered build script.
pub fn plan_digest(plan: &BuildPlan) -> String {
    format!("{:x}", Sha256::digest(render_build_script(plan).as_bytes()))
}

/// Generate a lock for a plan and the options it came from.
pub fn generate_lock(options: &BuildOptions, plan: &BuildPlan) -> PlanLock {
    PlanLock {
        api: LockApiVersion::V0,
        generated: GenerationMetadata {
            timestamp: Utc::now(),
            spbuild_version: env!("CARGO_PKG_VERSION").to_string(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
        },
        options: options.to_mapping(),
        plan: plan.clone(),
        sha256: plan_digest(plan),
    }
}

/// Verify that a freshly generated plan matches the lock.
///
/// An empty result means the plan was reproduced exactly.
pub fn verify_lock(lock: &PlanLock, plan: &BuildPlan) -> Vec<LockChange> {
    let mut changes = Vec::new();

    let locked = lock.plan.commands();
    let actual = plan.commands();
    for (i, expected) in locked.iter().enumerate() {
        match actual.get(i) {
            Some(command) if command == expected => {}
            Some(command) => changes.push(LockChange {
                kind: LockChangeKind::CommandChanged,
                reference: format!("command {}", i + 1),
                expected: Some(expected.clone()),
                actual: Some(command.clone()),
            }),
            None => changes.push(LockChange {
                kind: LockChangeKind::CommandRemoved,
                reference: format!("command {}", i + 1),
                expected: Some(expected.clone()),
                actual: None,
            }),
        }
    }
    // Extra commands beyond those in the lock are reported as added.
    for (i, extra) in actual.iter().enumerate().skip(locked.len()) {
        changes.push(LockChange {
            kind: LockChangeKind::CommandAdded,
            reference: format!("command {}", i + 1),
            expected: None,
            actual: Some(extra.clone()),
        });
    }

    for package in plan.os_packages.difference(&lock.plan.os_packages) {
        changes.push(LockChange {
            kind: LockChangeKind::PackageAdded,
            reference: package.clone(),
            expected: None,
            actual: Some(package.clone()),
        });
    }
    for package in lock.plan.os_packages.difference(&plan.os_packages) {
        changes.push(LockChange {
            kind: LockChangeKind::PackageRemoved,
            reference: package.clone(),
            expected: Some(package.clone()),
            actual: None,
        });
    }

    let names = lock
        .plan
        .build_environment
        .keys()
        .chain(plan.build_environment.keys())
        .collect::<std::collections::BTreeSet<_>>();
    for name in names {
        let expected = lock.plan.build_environment.get(name);
        let actual = plan.build_environment.get(name);
        if expected != actual {
            changes.push(LockChange {
                kind: LockChangeKind::EnvironmentChanged,
                reference: name.clone(),
                expected: expected.cloned(),
                actual: actual.cloned(),
            });
        }
    }

    let digest = plan_digest(plan);
    if digest != lock.sha256 {
        changes.push(LockChange {
            kind: LockChangeKind::DigestMismatch,
            reference: "sha256".to_string(),
            expected: Some(lock.sha256.clone()),
            actual: Some(digest),
        });
    }

    changes
}

/// A single detected change between lock and current plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockChange {
    pub kind: LockChangeKind,
    pub reference: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Types of lock mismatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockChangeKind {
    CommandChanged,
    CommandAdded,
    CommandRemoved,
    PackageAdded,
    PackageRemoved,
    EnvironmentChanged,
    DigestMismatch,
}
