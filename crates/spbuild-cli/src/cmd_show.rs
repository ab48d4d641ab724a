// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spbuild show` command.

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use serde_json::json;

/// Display the resolved options and build plan
#[derive(Debug, Args)]
pub struct CmdShow {
    #[clap(flatten)]
    pub options: crate::OptionFlags,

    /// Show required OS packages
    #[clap(long)]
    packages: bool,

    /// Show the build environment
    #[clap(long)]
    env: bool,

    /// Show the build commands
    #[clap(long)]
    commands: bool,

    /// Show all information
    #[clap(long)]
    all: bool,

    /// Output format: table, yaml, json
    #[clap(long, default_value = "table")]
    format: String,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let (composed, options) = self.options.load()?;
        let plan = self.options.generator().generate(&options);

        if self.format == "yaml" || self.format == "json" {
            let document = json!({
                "sources": composed
                    .source_files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
                "options": options,
                "os_packages": plan.os_packages,
                "build_environment": plan.build_environment,
                "commands": plan.commands(),
            });
            let rendered = if self.format == "json" {
                serde_json::to_string_pretty(&document).into_diagnostic()?
            } else {
                serde_yaml::to_string(&document).into_diagnostic()?
            };
            println!("{rendered}");
            return Ok(0);
        }

        // Nothing selected shows everything
        let nothing = !self.packages && !self.env && !self.commands;
        let show_options = self.all || nothing;
        let show_packages = self.packages || self.all || nothing;
        let show_env = self.env || self.all || nothing;
        let show_commands = self.commands || self.all || nothing;

        if show_options {
            self.show_options_table(&composed, &options);
        }
        if show_packages {
            if show_options {
                println!();
            }
            self.show_packages_table(&plan);
        }
        if show_env {
            if show_options || show_packages {
                println!();
            }
            self.show_env_table(&plan);
        }
        if show_commands {
            if show_options || show_packages || show_env {
                println!();
            }
            self.show_commands_table(&plan);
        }

        Ok(0)
    }

    fn show_options_table(
        &self,
        composed: &spbuild::ComposedOptions,
        options: &spbuild::BuildOptions,
    ) {
        println!("{}", "Option Sources:".bold());
        println!();
        for (i, path) in composed.source_files.iter().enumerate() {
            println!("  {}. {}", i + 1, path.display().to_string().cyan());
        }
        if !self.options.settings.is_empty() {
            println!("  {} {}", "--set".yellow(), self.options.settings.join(" "));
        }

        println!();
        println!("{}", "Resolved Options:".bold());
        println!();
        for (key, value) in &options.to_mapping() {
            let key = key.as_str().unwrap_or_default();
            let value = match value {
                serde_yaml::Value::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            };
            println!("  {} = {}", key.cyan(), value.green());
        }
        if options.install_layout == spbuild::InstallLayout::DestdirStaged {
            println!(
                "  {} = {}",
                "dispatcher-shim".cyan(),
                options.dispatcher_shim_path().green()
            );
        }
    }

    fn show_packages_table(&self, plan: &spbuild::BuildPlan) {
        println!("{}", "OS Packages:".bold());
        println!();
        for package in &plan.os_packages {
            println!("  - {}", package.green());
        }
        println!();
        println!("Total: {} package(s)", plan.os_packages.len());
    }

    fn show_env_table(&self, plan: &spbuild::BuildPlan) {
        println!("{}", "Build Environment:".bold());
        println!();
        for (name, value) in &plan.build_environment {
            println!("  {} = {}", name.cyan(), value.green());
        }
    }

    fn show_commands_table(&self, plan: &spbuild::BuildPlan) {
        println!("{}", "Build Commands:".bold());
        println!();
        let commands = plan.commands();
        for (i, command) in commands.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, command);
        }
        println!();
        println!("Total: {} command(s)", commands.len());
    }
}
