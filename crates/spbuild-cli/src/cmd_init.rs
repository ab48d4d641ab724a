// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spbuild init` command.

use clap::Args;
use miette::Result;
use std::path::PathBuf;

/// Create a new .spbuild.yaml file
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Runtime version to build
    #[clap(long, default_value = spbuild::version::DEFAULT_RUNTIME_VERSION)]
    runtime_version: spbuild::RuntimeVersion,

    /// Template to use: minimal, standard, full
    #[clap(long, default_value = "standard")]
    template: String,
}

impl CmdInit {
    pub fn run(&mut self) -> Result<i32> {
        let options_path = self.path.join(spbuild::SPBUILD_FILENAME);

        // Check if file already exists
        if options_path.exists() {
            return Err(miette::miette!(
                ".spbuild.yaml already exists at {:?}",
                options_path
            ));
        }

        // Generate template based on option
        let content = match self.template.as_str() {
            "minimal" => self.generate_minimal_template(),
            "full" => self.generate_full_template(),
            _ => self.generate_standard_template(),
        };

        // Write file
        std::fs::write(&options_path, content).map_err(|e| spbuild::Error::WriteFailed {
            path: options_path.clone(),
            error: e,
        })?;

        println!("Created .spbuild.yaml at {:?}", options_path);
        println!();
        println!("Next steps:");
        println!("  1. Edit the file to choose the runtime options");
        println!("  2. Run 'spbuild show' to preview the build plan");
        println!("  3. Run 'spbuild lock' to pin the generated commands");

        Ok(0)
    }

    fn generate_minimal_template(&self) -> String {
        format!(
            "source: .\n\
            runtime-version: \"{}\"\n",
            self.runtime_version
        )
    }

    fn generate_standard_template(&self) -> String {
        format!(
            "# spbuild runtime build options\n\
            \n\
            # Part source (required)\n\
            source: .\n\
            \n\
            # Full runtime version, always quoted\n\
            runtime-version: \"{}\"\n\
            \n\
            # Run `bundle` after installing the runtime\n\
            use-bundled-dependency-manager: false\n\
            \n\
            # Link against jemalloc\n\
            use-alternate-allocator: false\n",
            self.runtime_version
        )
    }

    fn generate_full_template(&self) -> String {
        let mut content = String::from(
            "# spbuild runtime build options\n\
            # Full example with all fields documented\n",
        );
        for name in spbuild::OPTION_NAMES {
            content.push('\n');
            content.push_str(&self.full_template_entry(name));
        }
        content
    }

    /// Documented entry for one recognized option.
    fn full_template_entry(&self, name: &str) -> String {
        use spbuild::options::*;
        use strum::VariantNames;

        match name {
            RUNTIME_VERSION => format!(
                "# Full runtime version, always quoted\n{name}: \"{}\"\n",
                self.runtime_version
            ),
            FLAVOR => format!(
                "# Runtime distribution, selects the archive directory and binary name\n\
                {name}: {DEFAULT_FLAVOR}\n"
            ),
            USE_BUNDLED_DEPENDENCY_MANAGER => {
                format!("# Run `bundle` after installing the runtime\n{name}: false\n")
            }
            USE_ALTERNATE_ALLOCATOR => format!("# Link against jemalloc\n{name}: false\n"),
            SOURCE => format!("# Part source (required)\n{name}: .\n"),
            INSTALL_LAYOUT => format!(
                "# {}\n{name}: {}\n",
                InstallLayout::VARIANTS.join(" | "),
                InstallLayout::default()
            ),
            SOURCE_ACQUISITION => format!(
                "# {}\n{name}: {}\n",
                SourceAcquisition::VARIANTS.join(" | "),
                SourceAcquisition::default()
            ),
            INSTALL_PREFIX => {
                format!("# Used by destdir-staged only\n{name}: {DEFAULT_INSTALL_PREFIX}\n")
            }
            DISPATCHER_SHIM => format!(
                "# Used by destdir-staged only, defaults to <flavor>-shim\n# {name}: {DEFAULT_FLAVOR}-shim\n"
            ),
            _ => format!("# {name}:\n"),
        }
    }
}
