//! Vesper detector provider plugin for the Nighthawk NFC detector.
//!
//! The plugin registers itself under the `vesper.detector_providers`
//! extension point (see `plugin.toml`) and provides detectors of the
//! `Nighthawk` series. A detector buffers audio into a temporary WAV file,
//! runs Nighthawk on it in a per-version Conda environment, and turns the
//! detection CSV Nighthawk writes into clips for a [`ClipListener`].
//!
//! ```no_run
//! use vesper_nighthawk::{ClipCollector, ProviderRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ProviderRegistry::with_builtin();
//! let class = registry.detector_class("Nighthawk 0.1.0 80 NMO")?;
//! let mut detector = class.instantiate(22050.0, ClipCollector::new())?;
//! detector.detect(&[0i16; 22050])?;
//! detector.complete_detection().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod listener;
pub mod manifest;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod services;
pub mod settings;
pub mod version;

pub use config::NighthawkConfig;
pub use detector::{Detector, DetectorClass};
pub use error::{DetectorError, ManifestError, NameError, SettingError};
pub use listener::{ClipCollector, ClipListener};
pub use manifest::PluginManifest;
pub use models::clip::{Annotations, Clip};
pub use provider::{DetectorProvider, NighthawkProvider, ProviderRegistry, EXTENSION_POINT};
pub use settings::{parse_detector_settings, DetectorSettings};
