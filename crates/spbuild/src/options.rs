// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Option parsing and validation for runtime build plans.
//!
//! Options arrive as a loosely typed YAML mapping from the host configuration
//! and are checked against a closed schema before any plan is generated.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use strum::{Display, EnumString, VariantNames};

use crate::version::RuntimeVersion;

#[cfg(test)]
#[path = "./options_test.rs"]
mod options_test;

pub const RUNTIME_VERSION: &str = "runtime-version";
pub const FLAVOR: &str = "flavor";
pub const USE_BUNDLED_DEPENDENCY_MANAGER: &str = "use-bundled-dependency-manager";
pub const USE_ALTERNATE_ALLOCATOR: &str = "use-alternate-allocator";
pub const SOURCE: &str = "source";
pub const INSTALL_LAYOUT: &str = "install-layout";
pub const SOURCE_ACQUISITION: &str = "source-acquisition";
pub const INSTALL_PREFIX: &str = "install-prefix";
pub const DISPATCHER_SHIM: &str = "dispatcher-shim";

/// Every recognized option name, in documentation order.
pub const OPTION_NAMES: &[&str] = &[
    RUNTIME_VERSION,
    FLAVOR,
    USE_BUNDLED_DEPENDENCY_MANAGER,
    USE_ALTERNATE_ALLOCATOR,
    SOURCE,
    INSTALL_LAYOUT,
    SOURCE_ACQUISITION,
    INSTALL_PREFIX,
    DISPATCHER_SHIM,
];

/// Flavor used when no `flavor` option is given.
pub const DEFAULT_FLAVOR: &str = "ruby";

/// Prefix used by the `destdir-staged` layout when none is given.
pub const DEFAULT_INSTALL_PREFIX: &str = "/usr";

static FLAVOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("flavor pattern is a valid regex")
});

static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._/-]+$").expect("path pattern is a valid regex"));

/// How the built runtime is laid out in the staged install directory.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, VariantNames, Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InstallLayout {
    /// Configure with the staged directory itself as the prefix.
    #[default]
    DirectPrefix,
    /// Configure with a system prefix and stage through `DESTDIR`, then fix up
    /// shebangs and put a dispatcher shim in front of the interpreter.
    DestdirStaged,
}

/// Where the runtime sources come from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, VariantNames, Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SourceAcquisition {
    /// Download the release archive straight from the archive host.
    #[default]
    DirectArchiveUrl,
    /// Resolve the latest installer tool release and let it fetch and build.
    TagResolvedInstallerTool,
}

/// Named distribution of the runtime, e.g. `ruby`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flavor(String);

impl Flavor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Flavor {
    fn default() -> Self {
        Self(DEFAULT_FLAVOR.to_string())
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if FLAVOR_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!(
                "'{s}' is not a valid identifier (letters, digits, '.', '_' and '-')"
            ))
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Flavor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A single way in which raw options break the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub field: String,
    pub reason: String,
}

impl SchemaViolation {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validated options for a runtime build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildOptions {
    /// Full runtime version to build.
    pub runtime_version: RuntimeVersion,

    /// Runtime distribution, selects the archive directory and binary name.
    pub flavor: Flavor,

    /// Run the dependency-lock step after installing.
    pub use_bundled_dependency_manager: bool,

    /// Link the runtime against jemalloc.
    pub use_alternate_allocator: bool,

    /// Part source, only checked for presence.
    pub source: String,

    pub install_layout: InstallLayout,

    pub source_acquisition: SourceAcquisition,

    /// System prefix for the `destdir-staged` layout. Never ends in `/`
    /// unless it is the root itself.
    pub install_prefix: String,

    /// Dispatcher shim for the `destdir-staged` layout, relative to the part
    /// source unless absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatcher_shim: Option<String>,
}

impl BuildOptions {
    /// Options with every default applied for the given source.
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            runtime_version: RuntimeVersion::default(),
            flavor: Flavor::default(),
            use_bundled_dependency_manager: false,
            use_alternate_allocator: false,
            source: source.into(),
            install_layout: InstallLayout::default(),
            source_acquisition: SourceAcquisition::default(),
            install_prefix: DEFAULT_INSTALL_PREFIX.to_string(),
            dispatcher_shim: None,
        }
    }

    /// Parse and validate options from a YAML document.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();
        if yaml.trim().is_empty() {
            return validate_options(&Mapping::new());
        }
        let value: Value = serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
            error: e,
            yaml_content: yaml.clone(),
        })?;
        match value {
            Value::Mapping(raw) => validate_options(&raw),
            // an empty document still lacks the required source
            Value::Null => validate_options(&Mapping::new()),
            other => Err(crate::Error::schema(vec![SchemaViolation::new(
                "<document>",
                format!("expected a mapping of options, found {}", describe(&other)),
            )])),
        }
    }

    /// Load and validate options from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        Self::from_yaml(yaml)
    }

    /// The dispatcher shim path, defaulting to `<flavor>-shim`.
    pub fn dispatcher_shim_path(&self) -> String {
        self.dispatcher_shim
            .clone()
            .unwrap_or_else(|| format!("{}-shim", self.flavor))
    }

    /// Serialize back into a raw option mapping.
    pub fn to_mapping(&self) -> Mapping {
        match serde_yaml::to_value(self) {
            Ok(Value::Mapping(mapping)) => mapping,
            _ => Mapping::new(),
        }
    }
}

/// Validate a raw option mapping against the closed option schema.
///
/// Every violation is collected so that a single error names all offending
/// fields. A missing `source` is only reported once the schema is satisfied.
pub fn validate_options(raw: &Mapping) -> crate::Result<BuildOptions> {
    let mut options = BuildOptions::new(String::new());
    let mut source = None;
    let mut violations = Vec::new();

    for (key, value) in raw {
        let Some(key) = key.as_str() else {
            violations.push(SchemaViolation::new(
                describe_key(key),
                "option names must be strings",
            ));
            continue;
        };

        // null is the same as leaving the option out
        if value.is_null() {
            if !OPTION_NAMES.contains(&key) {
                violations.push(SchemaViolation::new(key, "unknown option"));
            }
            continue;
        }

        let result = match key {
            RUNTIME_VERSION => expect_version(key, value).map(|v| options.runtime_version = v),
            FLAVOR => expect_str(key, value)
                .and_then(|s| s.parse::<Flavor>().map_err(|e| SchemaViolation::new(key, e)))
                .map(|f| options.flavor = f),
            USE_BUNDLED_DEPENDENCY_MANAGER => {
                expect_bool(key, value).map(|b| options.use_bundled_dependency_manager = b)
            }
            USE_ALTERNATE_ALLOCATOR => {
                expect_bool(key, value).map(|b| options.use_alternate_allocator = b)
            }
            SOURCE => expect_str(key, value).map(|s| source = Some(s.to_string())),
            INSTALL_LAYOUT => {
                expect_variant::<InstallLayout>(key, value).map(|l| options.install_layout = l)
            }
            SOURCE_ACQUISITION => expect_variant::<SourceAcquisition>(key, value)
                .map(|a| options.source_acquisition = a),
            INSTALL_PREFIX => expect_prefix(key, value).map(|p| options.install_prefix = p),
            DISPATCHER_SHIM => {
                expect_path(key, value).map(|p| options.dispatcher_shim = Some(p))
            }
            _ => Err(SchemaViolation::new(key, "unknown option")),
        };

        if let Err(violation) = result {
            violations.push(violation);
        }
    }

    if !violations.is_empty() {
        return Err(crate::Error::schema(violations));
    }

    options.source = source.ok_or(crate::Error::MissingSource)?;
    tracing::debug!(
        flavor = %options.flavor,
        version = %options.runtime_version,
        layout = %options.install_layout,
        acquisition = %options.source_acquisition,
        "validated build options"
    );
    Ok(options)
}

fn expect_str<'a>(field: &str, value: &'a Value) -> Result<&'a str, SchemaViolation> {
    value.as_str().ok_or_else(|| {
        SchemaViolation::new(
            field,
            format!("expected a string, found {}", describe(value)),
        )
    })
}

fn expect_bool(field: &str, value: &Value) -> Result<bool, SchemaViolation> {
    value.as_bool().ok_or_else(|| {
        SchemaViolation::new(
            field,
            format!("expected a boolean, found {}", describe(value)),
        )
    })
}

fn expect_version(field: &str, value: &Value) -> Result<RuntimeVersion, SchemaViolation> {
    if value.is_number() {
        return Err(SchemaViolation::new(
            field,
            "expected a string, found a number (quote the version, e.g. \"3.0\")",
        ));
    }
    expect_str(field, value)?
        .parse()
        .map_err(|e| SchemaViolation::new(field, e))
}

fn expect_variant<T>(field: &str, value: &Value) -> Result<T, SchemaViolation>
where
    T: FromStr + VariantNames,
{
    let raw = expect_str(field, value)?;
    raw.parse().map_err(|_| {
        SchemaViolation::new(
            field,
            format!("'{raw}' is not one of: {}", T::VARIANTS.join(", ")),
        )
    })
}

fn expect_path(field: &str, value: &Value) -> Result<String, SchemaViolation> {
    let raw = expect_str(field, value)?;
    if PATH_RE.is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(SchemaViolation::new(
            field,
            format!("'{raw}' may only contain letters, digits, '.', '_', '-' and '/'"),
        ))
    }
}

fn expect_prefix(field: &str, value: &Value) -> Result<String, SchemaViolation> {
    let raw = expect_path(field, value)?;
    if !raw.starts_with('/') {
        return Err(SchemaViolation::new(
            field,
            format!("'{raw}' must be an absolute path"),
        ));
    }
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn describe_key(key: &Value) -> String {
    match key {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => format!("<{}>", describe(other)),
    }
}
