// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Generate or verify lock files for spbuild plans.

use clap::Args;
use miette::Result;

/// Generate, update or verify the lock file
#[derive(Debug, Args)]
pub struct CmdLock {
    #[clap(flatten)]
    options: crate::OptionFlags,

    /// Update existing lock file
    #[clap(long)]
    update: bool,

    /// Force regeneration even if up-to-date
    #[clap(long)]
    force: bool,

    /// Verify lock is current (exit 1 if not)
    #[clap(long)]
    check: bool,
}

impl CmdLock {
    pub fn run(&mut self) -> Result<i32> {
        let (_, options) = self.options.load()?;
        let plan = self.options.generator().generate(&options);
        let lock_path = self.options.lock_path();

        if self.check {
            // Verify mode
            if !lock_path.exists() {
                eprintln!("No lock file found at {:?}", lock_path);
                return Ok(2);
            }

            let lock = spbuild::PlanLock::load(&lock_path)?;
            let changes = spbuild::verify_lock(&lock, &plan);

            if !changes.is_empty() {
                eprintln!("Lock file is out of date:");
                for change in &changes {
                    eprintln!("  - {:?}: {}", change.kind, change.reference);
                    if let Some(expected) = &change.expected {
                        eprintln!("    Expected: {expected}");
                    }
                    if let Some(actual) = &change.actual {
                        eprintln!("    Actual:   {actual}");
                    }
                }
                eprintln!("\nRun 'spbuild lock --update' to update the lock file");
                return Ok(1);
            }

            println!("Lock file is up to date");
            return Ok(0);
        }

        // Generate / update mode
        if lock_path.exists() && !self.update && !self.force {
            return Err(miette::miette!(
                "Lock file already exists at {:?}. Use --update or --force",
                lock_path
            ));
        }

        if lock_path.exists() && self.update && !self.force {
            let existing = spbuild::PlanLock::load(&lock_path)?;
            if spbuild::verify_lock(&existing, &plan).is_empty() {
                println!("Lock file is already up to date: {:?}", lock_path);
                return Ok(0);
            }
        }

        let lock = spbuild::generate_lock(&options, &plan);
        lock.save(&lock_path)?;
        tracing::info!(sha256 = %lock.sha256, "wrote lock file");
        println!("Generated lock file: {:?}", lock_path);

        Ok(0)
    }
}
