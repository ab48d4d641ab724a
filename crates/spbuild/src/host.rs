// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Placeholder variables supplied by the host packaging tool.
//!
//! Generated commands never hard-code host paths. They reference shell
//! variables that the host exports before running each step.

use strum::{Display, EnumString, VariantNames};

/// Naming convention of the host packaging tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case")]
pub enum Host {
    #[default]
    Snapcraft,
    CraftParts,
}

impl Host {
    /// The placeholder variables for this host.
    pub fn variables(self) -> HostVariables {
        let prefix = match self {
            Self::Snapcraft => "SNAPCRAFT",
            Self::CraftParts => "CRAFT",
        };
        HostVariables {
            part_install: format!("${{{prefix}_PART_INSTALL}}"),
            part_src: format!("${{{prefix}_PART_SRC}}"),
            parallel_build_count: format!("${{{prefix}_PARALLEL_BUILD_COUNT}}"),
        }
    }
}

/// Shell expressions for the host-provided locations and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVariables {
    /// The staged installation directory.
    pub part_install: String,
    /// The directory holding the part source.
    pub part_src: String,
    /// The parallelism degree for compilation.
    pub parallel_build_count: String,
}

impl Default for HostVariables {
    fn default() -> Self {
        Host::default().variables()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Host::Snapcraft, "${SNAPCRAFT_PART_INSTALL}", "${SNAPCRAFT_PART_SRC}")]
    #[case(Host::CraftParts, "${CRAFT_PART_INSTALL}", "${CRAFT_PART_SRC}")]
    fn test_host_variables(#[case] host: Host, #[case] install: &str, #[case] src: &str) {
        let vars = host.variables();
        assert_eq!(vars.part_install, install);
        assert_eq!(vars.part_src, src);
        assert!(vars.parallel_build_count.ends_with("_PARALLEL_BUILD_COUNT}"));
    }

    #[rstest]
    fn test_host_parse() {
        assert_eq!("craft-parts".parse::<Host>().unwrap(), Host::CraftParts);
        assert_eq!("snapcraft".parse::<Host>().unwrap(), Host::Snapcraft);
        assert!("make".parse::<Host>().is_err());
        assert_eq!(Host::CraftParts.to_string(), "craft-parts");
    }
}
