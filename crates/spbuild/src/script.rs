// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Build steps with explicit working directories, and their shell rendering.

use serde::{Deserialize, Serialize};

use crate::plan::BuildPlan;

#[cfg(test)]
#[path = "./script_test.rs"]
mod script_test;

/// One step of a build script.
///
/// Serialized as a plain string for `Run` and as a mapping for `Scoped`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// A command run in the executor's working directory.
    Run(String),
    /// Commands run inside `directory`, relative to the executor's working
    /// directory. The executor leaves the directory again afterwards.
    Scoped {
        directory: String,
        commands: Vec<String>,
    },
}

/// Ordered build steps where every directory change is declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkingDirectoryScript {
    pub steps: Vec<ScriptStep>,
}

impl WorkingDirectoryScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command run in the working directory.
    pub fn run<S: Into<String>>(&mut self, command: S) -> &mut Self {
        self.steps.push(ScriptStep::Run(command.into()));
        self
    }

    /// Add commands run inside `directory`.
    pub fn scoped<D, I, S>(&mut self, directory: D, commands: I) -> &mut Self
    where
        D: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push(ScriptStep::Scoped {
            directory: directory.into(),
            commands: commands.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Flatten into independent command strings.
    ///
    /// Scoped commands run in a subshell that enters the directory first, so
    /// no command depends on a directory change made by another.
    pub fn commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        for step in &self.steps {
            match step {
                ScriptStep::Run(command) => commands.push(command.clone()),
                ScriptStep::Scoped {
                    directory,
                    commands: scoped,
                } => {
                    commands.extend(
                        scoped
                            .iter()
                            .map(|command| format!("(cd {directory} && {command})")),
                    );
                }
            }
        }
        commands
    }

    /// Number of flattened commands.
    pub fn len(&self) -> usize {
        self.steps
            .iter()
            .map(|step| match step {
                ScriptStep::Run(_) => 1,
                ScriptStep::Scoped { commands, .. } => commands.len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render a complete bash script for a build plan.
///
/// Environment values are templates that reference host variables, so they
/// are exported inside double quotes and expand when the script runs. The
/// script stops at the first failing command.
pub fn render_build_script(plan: &BuildPlan) -> String {
    let mut script = String::from("#!/bin/bash\n");
    script.push_str("# Generated by spbuild, do not edit\n");
    script.push_str("set -eo pipefail\n");

    if !plan.build_environment.is_empty() {
        script.push('\n');
        for (name, value) in &plan.build_environment {
            script.push_str(&format!("export {name}=\"{}\"\n", escape_template(value)));
        }
    }

    if !plan.os_packages.is_empty() {
        script.push('\n');
        let packages: Vec<&str> = plan.os_packages.iter().map(String::as_str).collect();
        script.push_str(&format!("# build packages: {}\n", packages.join(" ")));
    }

    // search paths may start out unset, so nounset only covers the commands
    script.push_str("\nset -u\n");
    for command in plan.commands() {
        script.push_str(&command);
        script.push('\n');
    }

    script
}

/// Escape a template for a double-quoted context, keeping `$` expansion.
fn escape_template(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('`', "\\`")
}
