//! Detector provider extension point.
//!
//! The host discovers detector providers through the entry points a
//! plugin declares under [`EXTENSION_POINT`]. Each entry names a provider
//! unit; [`ProviderRegistry`] resolves those names to providers linked
//! into this crate.
//!
//! For now a provider that supports one version of a detector series is
//! assumed to support every version of it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::detector::DetectorClass;
use crate::error::{ManifestError, NameError, SettingError};
use crate::manifest::PluginManifest;
use crate::settings::{self, DetectorSettings};

/// Extension point under which detector providers register.
pub const EXTENSION_POINT: &str = "vesper.detector_providers";

/// Unit name of the built-in Nighthawk provider.
pub const NIGHTHAWK_UNIT: &str = "vesper_nighthawk";

const SUPPORTED_SERIES_NAMES: [&str; 1] = ["Nighthawk"];

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+([-+][0-9A-Za-z.-]+)?$").unwrap());

/// A source of detectors for one or more detector series.
pub trait DetectorProvider: Send + Sync {
    fn name(&self) -> &str;

    fn supported_series_names(&self) -> BTreeSet<String>;

    fn parse_settings(
        &self,
        series_name: &str,
        version_number: &str,
        settings: &[&str],
    ) -> Result<DetectorSettings, SettingError>;

    fn detector_class(
        &self,
        extension_name: &str,
        series_name: &str,
        version_number: &str,
        settings: DetectorSettings,
    ) -> DetectorClass;
}

/// Provides detectors of the `Nighthawk` series.
#[derive(Debug, Default, Clone, Copy)]
pub struct NighthawkProvider;

impl DetectorProvider for NighthawkProvider {
    fn name(&self) -> &str {
        NIGHTHAWK_UNIT
    }

    fn supported_series_names(&self) -> BTreeSet<String> {
        SUPPORTED_SERIES_NAMES.iter().map(|s| s.to_string()).collect()
    }

    fn parse_settings(
        &self,
        series_name: &str,
        version_number: &str,
        settings: &[&str],
    ) -> Result<DetectorSettings, SettingError> {
        settings::parse_detector_settings(series_name, version_number, settings)
    }

    fn detector_class(
        &self,
        extension_name: &str,
        series_name: &str,
        version_number: &str,
        settings: DetectorSettings,
    ) -> DetectorClass {
        DetectorClass::new(extension_name, series_name, version_number, settings)
    }
}

/// A detector name split into series, version and settings,
/// e.g. `Nighthawk 0.1.0 90 NMO`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorName {
    pub series_name: String,
    pub version_number: String,
    pub settings: Vec<String>,
}

impl DetectorName {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let mut parts = name.split_whitespace();
        let (series_name, version_number) = match (parts.next(), parts.next()) {
            (Some(series), Some(version)) => (series, version),
            _ => return Err(NameError::Incomplete(name.to_string())),
        };
        if !VERSION_REGEX.is_match(version_number) {
            return Err(NameError::BadVersion(version_number.to_string()));
        }
        Ok(Self {
            series_name: series_name.to_string(),
            version_number: version_number.to_string(),
            settings: parts.map(str::to_string).collect(),
        })
    }

    pub fn setting_strs(&self) -> Vec<&str> {
        self.settings.iter().map(String::as_str).collect()
    }
}

/// Providers linked into this crate, keyed by unit name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn DetectorProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the Nighthawk provider.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(NIGHTHAWK_UNIT, Arc::new(NighthawkProvider));
        registry
    }

    pub fn register(&mut self, unit: &str, provider: Arc<dyn DetectorProvider>) {
        tracing::debug!(unit, provider = provider.name(), "Registered detector provider");
        self.providers.insert(unit.to_string(), provider);
    }

    pub fn resolve(&self, unit: &str) -> Option<Arc<dyn DetectorProvider>> {
        self.providers.get(unit).cloned()
    }

    /// Providers declared by the manifest's detector provider entry points.
    pub fn discover(
        &self,
        manifest: &PluginManifest,
    ) -> Result<Vec<Arc<dyn DetectorProvider>>, ManifestError> {
        let entries = manifest.entry_points(EXTENSION_POINT);
        if entries.is_empty() {
            return Err(ManifestError::NoEntryPoints(EXTENSION_POINT.to_string()));
        }

        entries
            .into_iter()
            .map(|entry| {
                self.resolve(entry.unit)
                    .ok_or_else(|| ManifestError::UnresolvedEntryPoint {
                        extension_point: EXTENSION_POINT.to_string(),
                        name: entry.name.to_string(),
                        unit: entry.unit.to_string(),
                    })
            })
            .collect()
    }

    pub fn provider_for_series(&self, series_name: &str) -> Option<Arc<dyn DetectorProvider>> {
        self.providers
            .values()
            .find(|p| p.supported_series_names().contains(series_name))
            .cloned()
    }

    /// Resolve a full detector name to a detector class.
    pub fn detector_class(&self, detector_name: &str) -> Result<DetectorClass, NameError> {
        let name = DetectorName::parse(detector_name)?;
        let provider = self
            .provider_for_series(&name.series_name)
            .ok_or_else(|| NameError::UnsupportedSeries(name.series_name.clone()))?;

        let settings =
            provider.parse_settings(&name.series_name, &name.version_number, &name.setting_strs())?;

        Ok(provider.detector_class(
            &name.series_name,
            &name.series_name,
            &name.version_number,
            settings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── DetectorName ────────────────────────────────────────────────

    #[test]
    fn parse_full_name() {
        let name = DetectorName::parse("Nighthawk 0.1.0 90 20.1 NMO DU").unwrap();
        assert_eq!(name.series_name, "Nighthawk");
        assert_eq!(name.version_number, "0.1.0");
        assert_eq!(name.setting_strs(), vec!["90", "20.1", "NMO", "DU"]);
    }

    #[test]
    fn parse_pre_release_version() {
        let name = DetectorName::parse("Nighthawk 1.0.0-rc.1 50").unwrap();
        assert_eq!(name.version_number, "1.0.0-rc.1");
    }

    #[test]
    fn incomplete_and_bad_names() {
        assert_eq!(
            DetectorName::parse("Nighthawk"),
            Err(NameError::Incomplete("Nighthawk".to_string()))
        );
        assert_eq!(
            DetectorName::parse("Nighthawk latest 90"),
            Err(NameError::BadVersion("latest".to_string()))
        );
    }

    // ── Provider ────────────────────────────────────────────────────

    #[test]
    fn nighthawk_series_supported() {
        let provider = NighthawkProvider;
        assert_eq!(
            provider.supported_series_names(),
            BTreeSet::from(["Nighthawk".to_string()])
        );
    }

    // ── Registry ────────────────────────────────────────────────────

    #[test]
    fn discover_builtin_provider() {
        let registry = ProviderRegistry::with_builtin();
        let manifest = PluginManifest::bundled().unwrap();
        let providers = registry.discover(&manifest).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), NIGHTHAWK_UNIT);
    }

    #[test]
    fn empty_registry_cannot_resolve() {
        let registry = ProviderRegistry::new();
        let manifest = PluginManifest::bundled().unwrap();
        assert!(matches!(
            registry.discover(&manifest),
            Err(ManifestError::UnresolvedEntryPoint { .. })
        ));
    }

    #[test]
    fn detector_class_from_name() {
        let registry = ProviderRegistry::with_builtin();
        let class = registry
            .detector_class("Nighthawk 0.1.0 90 20.1 NMO DU")
            .unwrap();
        assert_eq!(class.class_name, "Nighthawk_0x1x0_90_20x1_NMO_DU");
        assert_eq!(class.extension_name, "Nighthawk");
        assert_eq!(class.settings.hop_size, Some(20.1));
    }

    #[test]
    fn detector_class_errors() {
        let registry = ProviderRegistry::with_builtin();
        assert_eq!(
            registry.detector_class("BirdVoxDetect 0.5.0 50"),
            Err(NameError::UnsupportedSeries("BirdVoxDetect".to_string()))
        );
        assert_eq!(
            registry.detector_class("Nighthawk 0.1.0 90 MO 25"),
            Err(NameError::Setting(SettingError(
                "Hop size \"25\" specified out of place. Hop size must immediately follow \
                 threshold."
                    .to_string()
            )))
        );
        assert_eq!(
            registry
                .detector_class("Nighthawk 0.1.0")
                .unwrap_err()
                .to_string(),
            "No threshold specified."
        );
    }
}
