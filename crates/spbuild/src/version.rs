// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime version strings and the feature version derived from them.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};

#[cfg(test)]
#[path = "./version_test.rs"]
mod version_test;

/// Pattern every runtime version must match.
pub const RUNTIME_VERSION_PATTERN: &str = r"^\d+\.\d+(\.\d+)?$";

/// Version used when no `runtime-version` option is given.
pub const DEFAULT_RUNTIME_VERSION: &str = "3.0.1";

// Unicode is disabled so that `\d` only matches ASCII digits.
static RUNTIME_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(RUNTIME_VERSION_PATTERN)
        .unicode(false)
        .build()
        .expect("runtime version pattern is a valid regex")
});

static FEATURE_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^(\d+\.\d+)\.\d+$")
        .unicode(false)
        .build()
        .expect("feature version pattern is a valid regex")
});

/// Strip the patch component from a `MAJOR.MINOR.PATCH` version.
///
/// Source archives are grouped by minor version line, so this selects the
/// remote directory holding a given release. Two-component versions and
/// anything else that is not `MAJOR.MINOR.PATCH` are returned unchanged.
pub fn derive_feature_version(version: &str) -> String {
    match FEATURE_VERSION_RE.captures(version) {
        Some(caps) => caps[1].to_string(),
        None => version.to_string(),
    }
}

/// A validated runtime version (`MAJOR.MINOR` or `MAJOR.MINOR.PATCH`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuntimeVersion(String);

impl RuntimeVersion {
    /// The full version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `MAJOR.MINOR` line this version belongs to.
    pub fn feature_version(&self) -> String {
        derive_feature_version(&self.0)
    }
}

impl Default for RuntimeVersion {
    fn default() -> Self {
        Self(DEFAULT_RUNTIME_VERSION.to_string())
    }
}

impl FromStr for RuntimeVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if RUNTIME_VERSION_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!(
                "'{s}' does not match pattern {RUNTIME_VERSION_PATTERN}"
            ))
        }
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RuntimeVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
