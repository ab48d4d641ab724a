// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! spbuild - Language Runtime Build Plan Generator
//!
//! This crate turns a small set of declarative build options into a
//! deterministic plan for compiling a language runtime from source inside a
//! snap-style packaging host.
//!
//! # Overview
//!
//! A plan is made of three parts: the OS packages the build needs, the
//! environment variables exported while building, and the ordered shell
//! commands that fetch, compile, install and post-process the runtime.
//! The same options always produce the same plan, which is what makes
//! lock files (`.spbuild.lock.yaml`) meaningful.
//!
//! # Example
//!
//! ```yaml
//! # .spbuild.yaml
//! source: .
//! runtime-version: "3.2.2"
//!
//! # Optional extras
//! use-alternate-allocator: true
//! use-bundled-dependency-manager: true
//!
//! # Install into a staging root and relocate at package time
//! install-layout: destdir-staged
//! install-prefix: /usr
//! ```

pub mod compose;
pub mod error;
pub mod host;
pub mod lock;
pub mod options;
pub mod plan;
pub mod script;
pub mod version;

pub use compose::{
    ComposedOptions,
    OptionSources,
    compose_options,
    load_option_sources,
    parse_setting,
};
pub use error::{Error, Result};
pub use host::{Host, HostVariables};
pub use lock::{LockChange, LockChangeKind, PlanLock, generate_lock, plan_digest, verify_lock};
pub use options::{
    BuildOptions,
    Flavor,
    InstallLayout,
    OPTION_NAMES,
    SchemaViolation,
    SourceAcquisition,
    validate_options,
};
pub use plan::{
    BuildPlan,
    PlanGenerator,
    compute_build_environment,
    compute_commands,
    compute_os_packages,
    compute_script,
    generate_plan,
};
pub use script::{ScriptStep, WorkingDirectoryScript, render_build_script};
pub use version::{RuntimeVersion, derive_feature_version};

/// Well-known filename for build options.
pub const SPBUILD_FILENAME: &str = ".spbuild.yaml";

/// Well-known filename for local overrides.
pub const SPBUILD_LOCAL_FILENAME: &str = ".spbuild.local.yaml";

/// Well-known filename for lock files.
pub const SPBUILD_LOCK_FILENAME: &str = ".spbuild.lock.yaml";
