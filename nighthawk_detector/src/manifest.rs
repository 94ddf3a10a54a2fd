//! Plugin manifest: packaging metadata and entry point declarations.
//!
//! The manifest is what the host reads to discover the plugin: package
//! metadata, the host version range the plugin supports, the runtime
//! dependencies of the Nighthawk environments, and the entry points that
//! map extension points to provider units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::provider::ProviderRegistry;

const BUNDLED: &str = include_str!("../plugin.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
    pub license: String,
    pub authors: Vec<String>,
    /// Host (Vesper) versions the plugin works with, as a semver requirement.
    pub requires_vesper: String,
    /// Minimum supported Rust toolchain, as in `Cargo.toml`.
    pub rust_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    pub package: PackageMetadata,
    #[serde(default)]
    pub runtime_dependencies: BTreeMap<String, String>,
    /// extension point → (entry name → unit name)
    #[serde(default)]
    pub entry_points: BTreeMap<String, BTreeMap<String, String>>,
}

/// One entry point declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint<'a> {
    pub name: &'a str,
    pub unit: &'a str,
}

impl PluginManifest {
    /// The manifest shipped with this crate.
    pub fn bundled() -> Result<Self, ManifestError> {
        Self::parse(BUNDLED)
    }

    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(text)?)
    }

    /// Entry points declared for an extension point, in name order.
    pub fn entry_points(&self, extension_point: &str) -> Vec<EntryPoint<'_>> {
        self.entry_points
            .get(extension_point)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(name, unit)| EntryPoint { name, unit })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check that the host at `host_version` can load this plugin:
    /// the version requirement is satisfied, dependency requirements are
    /// well formed, and every detector provider entry point resolves.
    pub fn validate(
        &self,
        registry: &ProviderRegistry,
        host_version: &str,
    ) -> Result<(), ManifestError> {
        self.check_host_version(host_version)?;
        self.check_dependencies()?;
        registry.discover(self)?;
        Ok(())
    }

    /// The manifest must describe the crate it ships in.
    pub fn check_matches_crate(&self) -> Result<(), ManifestError> {
        let pairs = [
            ("name", &self.package.name, env!("CARGO_PKG_NAME")),
            ("version", &self.package.version, env!("CARGO_PKG_VERSION")),
            (
                "rust-version",
                &self.package.rust_version,
                env!("CARGO_PKG_RUST_VERSION"),
            ),
        ];
        for (field, found, expected) in pairs {
            if found != expected {
                return Err(ManifestError::Mismatch {
                    field,
                    found: found.clone(),
                    expected: expected.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_host_version(&self, host_version: &str) -> Result<(), ManifestError> {
        let requirement = &self.package.requires_vesper;
        let req = semver::VersionReq::parse(requirement).map_err(|source| {
            ManifestError::VersionRequirement {
                requirement: requirement.clone(),
                source,
            }
        })?;
        let version =
            semver::Version::parse(host_version).map_err(|source| ManifestError::HostVersion {
                version: host_version.to_string(),
                source,
            })?;
        if !req.matches(&version) {
            return Err(ManifestError::UnsupportedHost {
                version: host_version.to_string(),
                requirement: requirement.clone(),
            });
        }
        Ok(())
    }

    fn check_dependencies(&self) -> Result<(), ManifestError> {
        for (name, requirement) in &self.runtime_dependencies {
            if semver::VersionReq::parse(requirement).is_err() {
                return Err(ManifestError::Dependency {
                    name: name.clone(),
                    requirement: requirement.clone(),
                });
            }
        }
        Ok(())
    }
}
