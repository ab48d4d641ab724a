// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! spbuild - Language Runtime Build Plan Generator CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_check;
mod cmd_init;
mod cmd_lock;
mod cmd_script;
mod cmd_show;

use cmd_check::CmdCheck;
use cmd_init::CmdInit;
use cmd_lock::CmdLock;
use cmd_script::CmdScript;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "spbuild",
    about = "Language Runtime Build Plan Generator",
    version,
    long_about = "Generate deterministic build plans for compiling a language runtime inside a snap packaging host"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct OptionFlags {
    /// Options file to read
    #[clap(short = 'f', long, default_value = spbuild::SPBUILD_FILENAME)]
    pub file: PathBuf,

    /// Additional options files, applied after the main file
    #[clap(
        long = "override",
        env = "SPBUILD_OVERRIDE",
        value_delimiter = ':',
        value_name = "FILE"
    )]
    pub overrides: Vec<String>,

    /// Set a single option, applied last
    #[clap(long = "set", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Placeholder naming of the host packaging tool
    #[clap(long, env = "SPBUILD_HOST", default_value_t = spbuild::Host::default())]
    pub host: spbuild::Host,
}

impl OptionFlags {
    pub fn sources(&self) -> spbuild::OptionSources {
        spbuild::OptionSources {
            file: self.file.clone(),
            overrides: self.overrides.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Compose every option source and validate the result.
    pub fn load(&self) -> Result<(spbuild::ComposedOptions, spbuild::BuildOptions)> {
        let composed = spbuild::load_option_sources(&self.sources())?;
        let options = composed.validate()?;
        Ok((composed, options))
    }

    pub fn generator(&self) -> spbuild::PlanGenerator {
        spbuild::PlanGenerator::for_host(self.host)
    }

    /// The lock file sitting next to the options file.
    pub fn lock_path(&self) -> PathBuf {
        self.file
            .parent()
            .map(|p| p.join(spbuild::SPBUILD_LOCK_FILENAME))
            .unwrap_or_else(|| PathBuf::from(spbuild::SPBUILD_LOCK_FILENAME))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a new .spbuild.yaml file
    Init(CmdInit),

    /// Display the resolved options and build plan
    Show(CmdShow),

    /// Write the build script for the resolved plan
    Script(CmdScript),

    /// Validate the build options
    Check(CmdCheck),

    /// Generate, update or verify the lock file
    Lock(CmdLock),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Init(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
            Command::Script(mut cmd) => cmd.run(),
            Command::Check(mut cmd) => cmd.run(),
            Command::Lock(mut cmd) => cmd.run(),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_option_flags_defaults() {
        let opt = Opt::parse_from(["spbuild", "check"]);
        let Command::Check(cmd) = opt.cmd else {
            panic!("expected the check command");
        };
        assert_eq!(cmd.options.file, PathBuf::from(spbuild::SPBUILD_FILENAME));
        assert_eq!(cmd.options.lock_path(), PathBuf::from(spbuild::SPBUILD_LOCK_FILENAME));
        assert!(cmd.options.settings.is_empty());
    }

    #[rstest]
    fn test_option_flags_parse() {
        let opt = Opt::parse_from([
            "spbuild",
            "-vv",
            "show",
            "-f",
            "part/.spbuild.yaml",
            "--override",
            "a.yaml:b.yaml",
            "--set",
            "use-alternate-allocator=true",
            "--host",
            "craft-parts",
        ]);
        assert_eq!(opt.logging.verbose, 2);
        let Command::Show(cmd) = opt.cmd else {
            panic!("expected the show command");
        };
        assert_eq!(cmd.options.overrides, vec!["a.yaml", "b.yaml"]);
        assert_eq!(cmd.options.host, spbuild::Host::CraftParts);
        assert_eq!(
            cmd.options.lock_path(),
            PathBuf::from("part").join(spbuild::SPBUILD_LOCK_FILENAME)
        );
    }
}
