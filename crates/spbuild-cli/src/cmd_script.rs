// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spbuild script` command.

use std::path::PathBuf;

use clap::Args;
use miette::{IntoDiagnostic, Result};

/// Write the build script for the resolved plan
#[derive(Debug, Args)]
pub struct CmdScript {
    #[clap(flatten)]
    options: crate::OptionFlags,

    /// Write the script to FILE instead of stdout
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl CmdScript {
    pub fn run(&mut self) -> Result<i32> {
        let (_, options) = self.options.load()?;
        let plan = self.options.generator().generate(&options);
        let script = spbuild::render_build_script(&plan);

        let Some(output) = &self.output else {
            print!("{script}");
            return Ok(0);
        };

        std::fs::write(output, &script).map_err(|e| spbuild::Error::WriteFailed {
            path: output.clone(),
            error: e,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(output, std::fs::Permissions::from_mode(0o755))
                .into_diagnostic()?;
        }

        eprintln!("Wrote build script: {:?}", output);
        Ok(0)
    }
}
