// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;
use rstest::rstest;

use super::*;

#[rstest]
#[case("3.0.1", "3.0")]
#[case("2.7.18", "2.7")]
#[case("10.12.100", "10.12")]
#[case("3.0", "3.0")]
#[case("3.10", "3.10")]
fn test_derive_feature_version(#[case] version: &str, #[case] expected: &str) {
    assert_eq!(derive_feature_version(version), expected);
}

#[rstest]
fn test_derive_feature_version_leaves_other_strings_alone() {
    assert_eq!(derive_feature_version("3"), "3");
    assert_eq!(derive_feature_version("3.0.1-rc1"), "3.0.1-rc1");
}

#[rstest]
#[case("3.0")]
#[case("3.0.1")]
#[case("10.20.30")]
fn test_runtime_version_accepts(#[case] version: &str) {
    let parsed: RuntimeVersion = version.parse().expect("version should be accepted");
    assert_eq!(parsed.as_str(), version);
    assert_eq!(parsed.to_string(), version);
}

#[rstest]
#[case("3")]
#[case("3.0.1-rc1")]
#[case("v3.0.1")]
#[case("3.0.1.2")]
#[case("")]
#[case(" 3.0")]
#[case("\u{663}.\u{660}")]
fn test_runtime_version_rejects(#[case] version: &str) {
    let result = version.parse::<RuntimeVersion>();
    assert!(result.is_err(), "{version:?} should be rejected");
}

#[rstest]
fn test_default_runtime_version() {
    let version = RuntimeVersion::default();
    assert_eq!(version.as_str(), "3.0.1");
    assert_eq!(version.feature_version(), "3.0");
}

proptest! {
    #[test]
    fn prop_three_components_truncate(major in 0u32..1000, minor in 0u32..1000, patch in 0u32..1000) {
        let version = format!("{major}.{minor}.{patch}");
        prop_assert_eq!(derive_feature_version(&version), format!("{major}.{minor}"));
    }

    #[test]
    fn prop_two_components_idempotent(major in 0u32..1000, minor in 0u32..1000) {
        let version = format!("{major}.{minor}");
        let once = derive_feature_version(&version);
        prop_assert_eq!(&once, &version);
        prop_assert_eq!(derive_feature_version(&once), once.clone());
    }
}
