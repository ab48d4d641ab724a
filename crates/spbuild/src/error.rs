// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for spbuild operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with spbuild Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during spbuild operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Options violate the closed option schema
    #[error("Options do not match the schema: {}", problems.join("; "))]
    #[diagnostic(
        code(spbuild::schema),
        help("Offending option(s): {}. Run 'spbuild init --template full' to see every recognized option", fields.join(", "))
    )]
    Schema {
        fields: Vec<String>,
        problems: Vec<String>,
    },

    /// The required `source` option is absent
    #[error("Required option 'source' is missing")]
    #[diagnostic(
        code(spbuild::missing_source),
        help("Add a 'source' entry pointing at the part source, e.g. 'source: .'")
    )]
    MissingSource,

    /// Invalid YAML in an options or lock file
    #[error("Invalid YAML document: {error}")]
    #[diagnostic(code(spbuild::invalid_yaml), help("Check the YAML syntax"))]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(spbuild::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write file
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(code(spbuild::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Override file not found
    #[error("Override file not found: {path:?}")]
    #[diagnostic(
        code(spbuild::override_not_found),
        help("Check that the override path is correct and the file exists")
    )]
    OverrideNotFound {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Malformed `key=value` setting
    #[error("Invalid setting '{0}'")]
    #[diagnostic(
        code(spbuild::invalid_setting),
        help("Settings take the form KEY=VALUE, e.g. --set use-alternate-allocator=true")
    )]
    InvalidSetting(String),
}

impl Error {
    /// Build a schema error from collected violations.
    pub(crate) fn schema(violations: Vec<crate::options::SchemaViolation>) -> Self {
        let mut fields: Vec<String> = Vec::new();
        let mut problems = Vec::with_capacity(violations.len());
        for violation in violations {
            if !fields.contains(&violation.field) {
                fields.push(violation.field.clone());
            }
            problems.push(violation.to_string());
        }
        Self::Schema { fields, problems }
    }
}
