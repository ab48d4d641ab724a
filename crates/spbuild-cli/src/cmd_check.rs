// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Validate build options without generating anything.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Validate the build options
#[derive(Debug, Args)]
pub struct CmdCheck {
    #[clap(flatten)]
    pub options: crate::OptionFlags,
}

impl CmdCheck {
    pub fn run(&mut self) -> Result<i32> {
        let (composed, options) = self.options.load()?;

        println!("{} Options are valid", "✓".green());
        for path in &composed.source_files {
            println!("  {}", path.display().to_string().dimmed());
        }
        println!(
            "  {} {} ({}, {})",
            options.flavor,
            options.runtime_version,
            options.install_layout,
            options.source_acquisition
        );

        Ok(0)
    }
}
