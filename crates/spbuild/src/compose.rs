// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Composition of option sources into a single raw option mapping.
//!
//! Sources are applied in order, later ones overriding earlier keys:
//! the options file, its `.spbuild.local.yaml` sibling, any override files,
//! and finally `key=value` settings.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::{BuildOptions, SPBUILD_LOCAL_FILENAME};

#[cfg(test)]
#[path = "./compose_test.rs"]
mod compose_test;

/// Where options are read from.
#[derive(Debug, Clone, Default)]
pub struct OptionSources {
    /// Main options file.
    pub file: PathBuf,

    /// Additional option files (from --override or SPBUILD_OVERRIDE).
    pub overrides: Vec<String>,

    /// Individual `key=value` settings (from --set).
    pub settings: Vec<String>,
}

/// Raw options merged from every source.
#[derive(Debug, Clone, Default)]
pub struct ComposedOptions {
    /// Merged option mapping, not yet validated.
    pub raw: Mapping,

    /// Files that contributed to this composition, in order.
    pub source_files: Vec<PathBuf>,
}

impl ComposedOptions {
    /// Validate the merged options.
    pub fn validate(&self) -> crate::Result<BuildOptions> {
        crate::validate_options(&self.raw)
    }

    /// Get the number of source files.
    pub fn source_count(&self) -> usize {
        self.source_files.len()
    }
}

/// Merge mappings in order, with later mappings overriding earlier keys.
pub fn compose_options(mappings: &[Mapping]) -> Mapping {
    let mut composed = Mapping::new();
    for mapping in mappings {
        for (key, value) in mapping {
            composed.insert(key.clone(), value.clone());
        }
    }
    composed
}

/// Load and merge every configured option source.
pub fn load_option_sources(sources: &OptionSources) -> crate::Result<ComposedOptions> {
    let mut mappings = Vec::new();
    let mut source_files = Vec::new();

    mappings.push(load_mapping(&sources.file)?);
    source_files.push(sources.file.clone());

    let base_dir = sources
        .file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let local_path = base_dir.join(SPBUILD_LOCAL_FILENAME);
    if local_path.is_file() {
        mappings.push(load_mapping(&local_path)?);
        source_files.push(local_path);
    }

    for override_path in &sources.overrides {
        let path = resolve_override_path(override_path, &base_dir)?;
        mappings.push(load_mapping(&path)?);
        source_files.push(path);
    }

    let mut settings = Mapping::new();
    for setting in &sources.settings {
        let (key, value) = parse_setting(setting)?;
        settings.insert(Value::String(key), value);
    }
    mappings.push(settings);

    tracing::debug!(
        files = source_files.len(),
        settings = sources.settings.len(),
        "composed option sources"
    );

    Ok(ComposedOptions {
        raw: compose_options(&mappings),
        source_files,
    })
}

/// Parse a `key=value` setting.
///
/// `true` and `false` become booleans, everything else stays a string so
/// that versions like `3.0` are never read as numbers.
pub fn parse_setting(setting: &str) -> crate::Result<(String, Value)> {
    let (key, value) = setting
        .split_once('=')
        .ok_or_else(|| crate::Error::InvalidSetting(setting.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(crate::Error::InvalidSetting(setting.to_string()));
    }
    let value = match value.trim() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    };
    Ok((key.to_string(), value))
}

/// Read a YAML file that must hold a mapping (or nothing at all).
fn load_mapping(path: &Path) -> crate::Result<Mapping> {
    let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
        path: path.to_path_buf(),
        error: e,
    })?;
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value = serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
        error: e,
        yaml_content: yaml.clone(),
    })?;
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(crate::Error::Schema {
            fields: vec!["<document>".to_string()],
            problems: vec![format!(
                "{}: expected a mapping of options",
                path.display()
            )],
        }),
    }
}

/// Resolve an override path to an absolute canonical path.
fn resolve_override_path(path: &str, base_dir: &Path) -> crate::Result<PathBuf> {
    let resolved = if path.starts_with('~') {
        let home = dirs::home_dir().ok_or_else(|| crate::Error::OverrideNotFound {
            path: PathBuf::from(path),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "HOME is not set"),
        })?;
        let rel = path.strip_prefix("~/").unwrap_or(path);
        home.join(rel)
    } else if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        base_dir.join(path)
    };

    dunce::canonicalize(&resolved).map_err(|e| crate::Error::OverrideNotFound {
        path: resolved.clone(),
        error: e,
    })
}
