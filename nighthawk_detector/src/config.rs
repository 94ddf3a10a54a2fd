//! Detector runtime configuration, loaded from environment variables.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct NighthawkConfig {
    /// Conda executable used to run Nighthawk.
    pub conda_executable: String,
    /// Prefix of the per-version Conda environment name.
    pub environment_prefix: String,
    /// Python module run inside the Conda environment.
    pub module_name: String,
    /// Seconds before a Nighthawk process is killed.
    pub timeout_secs: u64,
    /// Bytes of stdout/stderr kept per stream for logging.
    pub output_limit: usize,
}

impl NighthawkConfig {
    pub fn from_env() -> Self {
        let conda_executable =
            std::env::var("NIGHTHAWK_CONDA").unwrap_or_else(|_| "conda".to_string());
        let environment_prefix =
            std::env::var("NIGHTHAWK_ENV_PREFIX").unwrap_or_else(|_| "nighthawk".to_string());
        let module_name = std::env::var("NIGHTHAWK_MODULE")
            .unwrap_or_else(|_| "nighthawk.run_nighthawk".to_string());
        let timeout_secs = std::env::var("NIGHTHAWK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);
        let output_limit = std::env::var("NIGHTHAWK_OUTPUT_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(65536);

        if timeout_secs == 0 {
            tracing::warn!("NIGHTHAWK_TIMEOUT_SECS is 0 -- every Nighthawk run will time out");
        }

        Self {
            conda_executable,
            environment_prefix,
            module_name,
            timeout_secs,
            output_limit,
        }
    }

    /// Conda environment for a detector version, e.g. `nighthawk-0.1.0`.
    pub fn environment_name(&self, version_number: &str) -> String {
        format!("{}-{}", self.environment_prefix, version_number)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NighthawkConfig {
    fn default() -> Self {
        Self {
            conda_executable: "conda".to_string(),
            environment_prefix: "nighthawk".to_string(),
            module_name: "nighthawk.run_nighthawk".to_string(),
            timeout_secs: 3600,
            output_limit: 65536,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_name_includes_version() {
        let config = NighthawkConfig::default();
        assert_eq!(config.environment_name("0.1.0"), "nighthawk-0.1.0");
    }

    #[test]
    fn custom_prefix() {
        let config = NighthawkConfig {
            environment_prefix: "nh".to_string(),
            ..NighthawkConfig::default()
        };
        assert_eq!(config.environment_name("1.0.0"), "nh-1.0.0");
        assert_eq!(config.timeout(), Duration::from_secs(3600));
    }
}
