// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Build plan generation.
//!
//! A [`BuildPlan`] is a pure function of [`BuildOptions`] and the host
//! placeholder names. Nothing here touches the network or the filesystem.
//! The commands only describe that work for the host executor.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::host::{Host, HostVariables};
use crate::options::{BuildOptions, InstallLayout, SourceAcquisition};
use crate::script::WorkingDirectoryScript;

#[cfg(test)]
#[path = "./plan_test.rs"]
mod plan_test;

/// Host serving release archives, organized as `<flavor>/<feature>/`.
pub const ARCHIVE_HOST: &str = "https://cache.ruby-lang.org/pub";

/// GitHub repository of the installer tool.
pub const INSTALLER_TOOL_REPO: &str = "postmodern/ruby-install";

/// Directory the installer tool is unpacked into.
pub const INSTALLER_TOOL_DIR: &str = "ruby-install";

/// Package providing the alternate allocator.
pub const ALLOCATOR_PACKAGE: &str = "libjemalloc-dev";

/// Configure flag enabling the alternate allocator.
pub const ALLOCATOR_CONFIGURE_FLAG: &str = "--with-jemalloc";

/// Resolves and pins the project's declared library dependencies.
pub const DEPENDENCY_LOCK_COMMAND: &str = "bundle";

const BASE_PACKAGES: &[&str] = &[
    "gcc",
    "curl",
    "make",
    "zlib1g-dev",
    "libssl-dev",
    "libreadline-dev",
];

/// https only, TLS 1.2 or newer, and a non-zero exit on any HTTP error.
const CURL: &str = "curl --proto '=https' --tlsv1.2 -sSfL";

/// Everything the host needs to build a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildPlan {
    /// OS packages required at build time.
    pub os_packages: BTreeSet<String>,

    /// Variables applied for the whole build, values are shell templates.
    pub build_environment: BTreeMap<String, String>,

    /// Ordered build steps.
    pub script: WorkingDirectoryScript,
}

impl BuildPlan {
    /// The flattened, order-significant command sequence.
    pub fn commands(&self) -> Vec<String> {
        self.script.commands()
    }
}

/// Generates build plans using one host's placeholder names.
#[derive(Debug, Clone, Default)]
pub struct PlanGenerator {
    host: HostVariables,
}

impl PlanGenerator {
    pub fn new(host: HostVariables) -> Self {
        Self { host }
    }

    pub fn for_host(host: Host) -> Self {
        Self::new(host.variables())
    }

    /// OS packages needed to compile the runtime.
    pub fn os_packages(&self, options: &BuildOptions) -> BTreeSet<String> {
        let mut packages: BTreeSet<String> =
            BASE_PACKAGES.iter().map(|p| p.to_string()).collect();
        if options.use_alternate_allocator {
            packages.insert(ALLOCATOR_PACKAGE.to_string());
        }
        packages
    }

    /// Variables that make later steps find the freshly built runtime
    /// before any copy already on the system.
    pub fn build_environment(&self, options: &BuildOptions) -> BTreeMap<String, String> {
        let stage = self.stage_root(options);
        BTreeMap::from([
            ("PATH".to_string(), format!("{stage}/bin:${{PATH}}")),
            (
                "LD_LIBRARY_PATH".to_string(),
                format!("{stage}/lib:${{LD_LIBRARY_PATH}}"),
            ),
        ])
    }

    /// The ordered build steps.
    pub fn script(&self, options: &BuildOptions) -> WorkingDirectoryScript {
        let mut script = WorkingDirectoryScript::new();

        match options.source_acquisition {
            SourceAcquisition::DirectArchiveUrl => self.build_from_archive(options, &mut script),
            SourceAcquisition::TagResolvedInstallerTool => {
                self.build_with_installer_tool(options, &mut script)
            }
        }

        if options.install_layout == InstallLayout::DestdirStaged {
            self.post_install_fixups(options, &mut script);
        }

        // Remove the old executables first so the reinstall never stops at
        // an overwrite prompt.
        let stage = self.stage_root(options);
        script.run(format!("rm -f {stage}/bin/{{bundle,bundler}}"));
        script.run("gem install --env-shebang --no-document bundler");

        if options.use_bundled_dependency_manager {
            script.run(DEPENDENCY_LOCK_COMMAND);
        }

        script
    }

    /// The ordered build commands.
    pub fn commands(&self, options: &BuildOptions) -> Vec<String> {
        self.script(options).commands()
    }

    /// Derive the complete plan.
    pub fn generate(&self, options: &BuildOptions) -> BuildPlan {
        let plan = BuildPlan {
            os_packages: self.os_packages(options),
            build_environment: self.build_environment(options),
            script: self.script(options),
        };
        tracing::debug!(
            flavor = %options.flavor,
            version = %options.runtime_version,
            commands = plan.script.len(),
            packages = plan.os_packages.len(),
            "generated build plan"
        );
        plan
    }

    /// Where the runtime lands inside the staged install directory.
    pub fn stage_root(&self, options: &BuildOptions) -> String {
        let install = &self.host.part_install;
        match options.install_layout {
            InstallLayout::DirectPrefix => install.clone(),
            InstallLayout::DestdirStaged if options.install_prefix == "/" => install.clone(),
            InstallLayout::DestdirStaged => format!("{install}{}", options.install_prefix),
        }
    }

    /// Flags for the runtime's configure script.
    pub fn configure_flags(&self, options: &BuildOptions) -> Vec<String> {
        let mut flags = vec![
            "--without-baseruby".to_string(),
            "--enable-load-relative".to_string(),
            "--enable-shared".to_string(),
        ];

        // the installer tool passes its own install directory as the prefix
        if options.source_acquisition == SourceAcquisition::DirectArchiveUrl {
            let prefix = match options.install_layout {
                InstallLayout::DirectPrefix => self.host.part_install.as_str(),
                InstallLayout::DestdirStaged => options.install_prefix.as_str(),
            };
            flags.push(format!("--prefix={prefix}"));
        }

        flags.push("--disable-install-doc".to_string());

        if options.use_alternate_allocator {
            flags.push(ALLOCATOR_CONFIGURE_FLAG.to_string());
        }

        flags
    }

    /// Download URL of the release archive.
    pub fn archive_url(options: &BuildOptions) -> String {
        let flavor = &options.flavor;
        format!(
            "{ARCHIVE_HOST}/{flavor}/{}/{flavor}-{}.tar.xz",
            options.runtime_version.feature_version(),
            options.runtime_version
        )
    }

    fn build_from_archive(&self, options: &BuildOptions, script: &mut WorkingDirectoryScript) {
        let src = &self.host.part_src;
        let flavor = &options.flavor;
        let archive = format!("{src}/{flavor}-{}.tar.xz", options.runtime_version);

        script.run(format!(
            "{CURL} -C - -o {archive} {}",
            Self::archive_url(options)
        ));
        script.run(format!("tar xf {archive}"));

        let install = match options.install_layout {
            InstallLayout::DirectPrefix => "make install".to_string(),
            InstallLayout::DestdirStaged => {
                format!("make install DESTDIR={}", self.host.part_install)
            }
        };
        script.scoped(
            format!("{flavor}-{}", options.runtime_version),
            [
                format!("./configure {}", self.configure_flags(options).join(" ")),
                format!("make -j{}", self.host.parallel_build_count),
                install,
            ],
        );
    }

    fn build_with_installer_tool(
        &self,
        options: &BuildOptions,
        script: &mut WorkingDirectoryScript,
    ) {
        let src = &self.host.part_src;
        let release = format!("{src}/{INSTALLER_TOOL_DIR}-release.json");
        let tarball = format!("{src}/{INSTALLER_TOOL_DIR}.tar.gz");

        script.run(format!(
            "{CURL} -o {release} https://api.github.com/repos/{INSTALLER_TOOL_REPO}/releases/latest"
        ));
        // An empty tag produces a URL that does not exist, so curl still fails.
        let tag = format!(
            r#"$(sed -n 's/.*"tag_name": *"\([^"]*\)".*/\1/p' {release} | head -n 1)"#
        );
        script.run(format!(
            "{CURL} -o {tarball} \"https://github.com/{INSTALLER_TOOL_REPO}/archive/refs/tags/{tag}.tar.gz\""
        ));
        script.run(format!(
            "mkdir -p {INSTALLER_TOOL_DIR} && tar xzf {tarball} -C {INSTALLER_TOOL_DIR} --strip-components=1"
        ));
        script.run(format!(
            "{INSTALLER_TOOL_DIR}/bin/ruby-install --no-install-deps --install-dir {} --jobs={} {} {} -- {}",
            self.stage_root(options),
            self.host.parallel_build_count,
            options.flavor,
            options.runtime_version,
            self.configure_flags(options).join(" ")
        ));
    }

    fn post_install_fixups(&self, options: &BuildOptions, script: &mut WorkingDirectoryScript) {
        let bin = format!("{}/bin", self.stage_root(options));
        let flavor = &options.flavor;
        let shim = options.dispatcher_shim_path();
        let shim = if shim.starts_with('/') {
            shim
        } else {
            format!("{}/{shim}", self.host.part_src)
        };

        // '.' is the only character a flavor may hold that sed treats specially
        let pattern = flavor.as_str().replace('.', "\\.");
        // only text files that start with a shebang are rewritten
        script.run(format!(
            "find {bin} -type f -exec grep -Iq '^#!' {{}} \\; -exec sed -i '1 s|^#!.*{pattern}.*$|#!/usr/bin/env {flavor}|' {{}} +"
        ));
        script.run(format!("mv {bin}/{flavor} {bin}/{flavor}.real"));
        script.run(format!("install -m 755 {shim} {bin}/{flavor}"));
    }
}

/// OS packages for `options`, using snapcraft placeholder names.
pub fn compute_os_packages(options: &BuildOptions) -> BTreeSet<String> {
    PlanGenerator::default().os_packages(options)
}

/// Build environment for `options`, using snapcraft placeholder names.
pub fn compute_build_environment(options: &BuildOptions) -> BTreeMap<String, String> {
    PlanGenerator::default().build_environment(options)
}

pub fn compute_script(options: &BuildOptions) -> WorkingDirectoryScript {
    PlanGenerator::default().script(options)
}

/// Build commands for `options`, using snapcraft placeholder names.
pub fn compute_commands(options: &BuildOptions) -> Vec<String> {
    PlanGenerator::default().commands(options)
}

/// Complete plan for `options`, using snapcraft placeholder names.
pub fn generate_plan(options: &BuildOptions) -> BuildPlan {
    PlanGenerator::default().generate(options)
}
