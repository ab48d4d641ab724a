// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::Error;

fn schema_fields(result: crate::Result<BuildOptions>) -> Vec<String> {
    match result {
        Err(Error::Schema { fields, .. }) => fields,
        other => panic!("expected a schema error, got {other:?}"),
    }
}

#[rstest]
fn test_parse_minimal_options() {
    let options = BuildOptions::from_yaml("source: .\n").expect("Should parse minimal options");
    assert_eq!(options.runtime_version.as_str(), "3.0.1");
    assert_eq!(options.flavor.as_str(), "ruby");
    assert!(!options.use_bundled_dependency_manager);
    assert!(!options.use_alternate_allocator);
    assert_eq!(options.source, ".");
    assert_eq!(options.install_layout, InstallLayout::DirectPrefix);
    assert_eq!(options.source_acquisition, SourceAcquisition::DirectArchiveUrl);
    assert_eq!(options.install_prefix, "/usr");
    assert_eq!(options.dispatcher_shim, None);
    assert_eq!(options, BuildOptions::new("."));
}

#[rstest]
fn test_parse_full_options() {
    let yaml = r#"
runtime-version: "2.7.8"
flavor: ruby
use-bundled-dependency-manager: true
use-alternate-allocator: true
source: https://example.com/app.git
install-layout: destdir-staged
source-acquisition: tag-resolved-installer-tool
install-prefix: /opt/ruby/
dispatcher-shim: snap/local/ruby-launcher
"#;
    let options = BuildOptions::from_yaml(yaml).expect("Should parse full options");
    assert_eq!(options.runtime_version.as_str(), "2.7.8");
    assert!(options.use_bundled_dependency_manager);
    assert!(options.use_alternate_allocator);
    assert_eq!(options.source, "https://example.com/app.git");
    assert_eq!(options.install_layout, InstallLayout::DestdirStaged);
    assert_eq!(
        options.source_acquisition,
        SourceAcquisition::TagResolvedInstallerTool
    );
    assert_eq!(options.install_prefix, "/opt/ruby");
    assert_eq!(options.dispatcher_shim_path(), "snap/local/ruby-launcher");
}

#[rstest]
#[case("3.0")]
#[case("3.0.1")]
#[case("2.7.18")]
fn test_version_accepted(#[case] version: &str) {
    let yaml = format!("runtime-version: \"{version}\"\nsource: .\n");
    let options = BuildOptions::from_yaml(yaml).expect("version should be accepted");
    assert_eq!(options.runtime_version.as_str(), version);
}

#[rstest]
#[case("\"3\"")]
#[case("\"3.0.1-rc1\"")]
#[case("3.0")]
#[case("3")]
#[case("[3, 0]")]
fn test_version_rejected(#[case] version: &str) {
    let yaml = format!("runtime-version: {version}\nsource: .\n");
    let fields = schema_fields(BuildOptions::from_yaml(yaml));
    assert_eq!(fields, vec!["runtime-version"]);
}

#[rstest]
fn test_missing_source() {
    let result = BuildOptions::from_yaml("runtime-version: \"3.0.1\"\n");
    assert!(matches!(result, Err(Error::MissingSource)));
}

#[rstest]
fn test_null_source_is_missing() {
    assert!(matches!(
        BuildOptions::from_yaml("source: ~\n"),
        Err(Error::MissingSource)
    ));
}

#[rstest]
fn test_unknown_key_rejected() {
    let fields = schema_fields(BuildOptions::from_yaml("source: .\nfoo: 1\n"));
    assert_eq!(fields, vec!["foo"]);
}

#[rstest]
fn test_schema_error_takes_precedence_over_missing_source() {
    let fields = schema_fields(BuildOptions::from_yaml("foo: 1\n"));
    assert_eq!(fields, vec!["foo"]);
}

#[rstest]
fn test_all_violations_are_listed() {
    let yaml = r#"
use-bundler: true
runtime-version: "3"
use-alternate-allocator: "yes"
source: .
install-layout: sideways
"#;
    match BuildOptions::from_yaml(yaml) {
        Err(Error::Schema { fields, problems }) => {
            assert_eq!(
                fields,
                vec![
                    "use-bundler",
                    "runtime-version",
                    "use-alternate-allocator",
                    "install-layout"
                ]
            );
            assert_eq!(problems.len(), 4);
            assert!(problems[3].contains("direct-prefix, destdir-staged"));
        }
        other => panic!("expected a schema error, got {other:?}"),
    }
}

#[rstest]
#[case("flavor: \"ruby latest\"")]
#[case("flavor: \"-ruby\"")]
#[case("flavor: 3")]
fn test_invalid_flavor(#[case] line: &str) {
    let fields = schema_fields(BuildOptions::from_yaml(format!("{line}\nsource: .\n")));
    assert_eq!(fields, vec!["flavor"]);
}

#[rstest]
#[case("install-prefix: usr")]
#[case("install-prefix: \"/usr local\"")]
#[case("dispatcher-shim: \"$(reboot)\"")]
#[case("source-acquisition: git")]
fn test_invalid_paths_and_variants(#[case] line: &str) {
    let result = BuildOptions::from_yaml(format!("{line}\nsource: .\n"));
    assert!(matches!(result, Err(Error::Schema { .. })));
}

#[rstest]
fn test_root_prefix_is_kept() {
    let options = BuildOptions::from_yaml("install-prefix: /\nsource: .\n").unwrap();
    assert_eq!(options.install_prefix, "/");
}

#[rstest]
fn test_non_mapping_document() {
    let fields = schema_fields(BuildOptions::from_yaml("- source\n"));
    assert_eq!(fields, vec!["<document>"]);
}

#[rstest]
fn test_parse_invalid_yaml() {
    let result = BuildOptions::from_yaml("source: [\n  unclosed bracket\n");
    assert!(matches!(result, Err(Error::InvalidYaml { .. })));
}

#[rstest]
fn test_default_shim_follows_flavor() {
    let options = BuildOptions::from_yaml("flavor: jruby\nsource: .\n").unwrap();
    assert_eq!(options.dispatcher_shim_path(), "jruby-shim");
}

#[rstest]
fn test_to_mapping_validates_again() {
    let options = BuildOptions {
        use_alternate_allocator: true,
        install_layout: InstallLayout::DestdirStaged,
        ..BuildOptions::new("src")
    };
    let mapping = options.to_mapping();
    assert_eq!(
        mapping.get(INSTALL_LAYOUT).and_then(Value::as_str),
        Some("destdir-staged")
    );
    assert!(!mapping.contains_key(DISPATCHER_SHIM));
    assert_eq!(validate_options(&mapping).unwrap(), options);
}

#[rstest]
fn test_load_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(crate::SPBUILD_FILENAME);
    std::fs::write(&path, "source: .\nuse-alternate-allocator: true\n").unwrap();

    let options = BuildOptions::load(&path).expect("Should load options");
    assert!(options.use_alternate_allocator);

    let missing = BuildOptions::load(tmp.path().join("missing.yaml"));
    assert!(matches!(missing, Err(Error::ReadFailed { .. })));
}
