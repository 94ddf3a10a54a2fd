//! Plugin error types.

use thiserror::Error;

/// A detector setting could not be parsed. The message is shown to
/// Vesper users as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SettingError(pub String);

/// A detector name could not be parsed or resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Detector name \"{0}\" must contain a series name and a version number.")]
    Incomplete(String),
    #[error("Bad version number \"{0}\" in detector name.")]
    BadVersion(String),
    #[error("No detector provider supports detector series \"{0}\".")]
    UnsupportedSeries(String),
    #[error(transparent)]
    Setting(#[from] SettingError),
}

/// The plugin manifest is malformed or unsatisfiable.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not parse plugin manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("entry point \"{name}\" of \"{extension_point}\" names unknown unit \"{unit}\"")]
    UnresolvedEntryPoint {
        extension_point: String,
        name: String,
        unit: String,
    },
    #[error("manifest declares no entry points for \"{0}\"")]
    NoEntryPoints(String),
    #[error("bad host version requirement \"{requirement}\": {source}")]
    VersionRequirement {
        requirement: String,
        source: semver::Error,
    },
    #[error("bad host version \"{version}\": {source}")]
    HostVersion {
        version: String,
        source: semver::Error,
    },
    #[error("host version {version} does not satisfy requirement \"{requirement}\"")]
    UnsupportedHost {
        version: String,
        requirement: String,
    },
    #[error("bad requirement \"{requirement}\" for dependency \"{name}\"")]
    Dependency { name: String, requirement: String },
    #[error("manifest {field} \"{found}\" does not match crate {field} \"{expected}\"")]
    Mismatch {
        field: &'static str,
        found: String,
        expected: String,
    },
}

/// Detection failed.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error(
        "Could not run {extension} in Conda environment \"{environment}\". \
         Error message was: {message}"
    )]
    Launch {
        extension: String,
        environment: String,
        message: String,
    },
    #[error("{0} process completed abnormally. See above log messages for details.")]
    AbnormalExit(String),
    #[error(
        "For clip starting {0} seconds into recording file, incrementing start \
         index to make it unique moved it past end index"
    )]
    UniquenessOverflow(String),
    #[error("Bad {column} value \"{value}\"")]
    BadValue { column: &'static str, value: String },
    #[error("detection already completed")]
    AlreadyCompleted,
    #[error("could not write detector input audio: {0}")]
    Audio(#[from] hound::Error),
    #[error("could not read detection file: {0}")]
    DetectionFile(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
