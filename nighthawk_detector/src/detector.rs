//! Vesper wrapper for the Nighthawk NFC detector.
//!
//! A [`Detector`] works on one audio channel. It accepts consecutive
//! sample slices of any size via [`Detector::detect`], appends them to a
//! temporary WAV file, and runs Nighthawk on that file when
//! [`Detector::complete_detection`] is called. Clips found by Nighthawk
//! are then handed to the detector's [`ClipListener`].

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tempfile::TempPath;

use crate::config::NighthawkConfig;
use crate::error::DetectorError;
use crate::listener::ClipListener;
use crate::services::detection_file::{self, float_text};
use crate::services::executor::{self, CondaRunner, ScriptRunner};
use crate::services::wave_writer::{WaveFileWriter, WaveSample};
use crate::settings::{detector_class_name, DetectorSettings};

/// A detector type: series, version and settings, ready to instantiate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorClass {
    /// Name of the extension providing the detector, e.g. "Nighthawk".
    pub extension_name: String,
    pub series_name: String,
    pub version_number: String,
    pub settings: DetectorSettings,
    pub class_name: String,
}

impl DetectorClass {
    pub fn new(
        extension_name: &str,
        series_name: &str,
        version_number: &str,
        settings: DetectorSettings,
    ) -> Self {
        Self {
            extension_name: extension_name.to_string(),
            series_name: series_name.to_string(),
            version_number: version_number.to_string(),
            class_name: detector_class_name(series_name, version_number, &settings),
            settings,
        }
    }

    /// Create a detector that runs Nighthawk through Conda, configured
    /// from the environment.
    pub fn instantiate<L: ClipListener>(
        &self,
        input_sample_rate: f64,
        listener: L,
    ) -> Result<Detector<L>, DetectorError> {
        let config = NighthawkConfig::from_env();
        let runner = Arc::new(CondaRunner::new(config.clone()));
        self.instantiate_with(input_sample_rate, listener, runner, config)
    }

    pub fn instantiate_with<L: ClipListener>(
        &self,
        input_sample_rate: f64,
        listener: L,
        runner: Arc<dyn ScriptRunner>,
        config: NighthawkConfig,
    ) -> Result<Detector<L>, DetectorError> {
        Detector::new(self.clone(), input_sample_rate, listener, runner, config)
    }
}

/// One Nighthawk detector instance.
pub struct Detector<L: ClipListener> {
    class: DetectorClass,
    input_sample_rate: f64,
    listener: L,
    runner: Arc<dyn ScriptRunner>,
    config: NighthawkConfig,
    input_writer: Option<WaveFileWriter>,
    // Deleted on drop.
    input_path: Option<TempPath>,
}

impl<L: ClipListener> Detector<L> {
    fn new(
        class: DetectorClass,
        input_sample_rate: f64,
        listener: L,
        runner: Arc<dyn ScriptRunner>,
        config: NighthawkConfig,
    ) -> Result<Self, DetectorError> {
        if !(1.0..=f64::from(u32::MAX)).contains(&input_sample_rate) {
            return Err(DetectorError::BadValue {
                column: "input_sample_rate",
                value: input_sample_rate.to_string(),
            });
        }

        // The file stays on disk after the writer closes it so Nighthawk
        // can reopen it; `TempPath` removes it when the detector is done.
        let (file, input_path) = tempfile::Builder::new()
            .prefix("vesper-nighthawk-")
            .suffix(".wav")
            .tempfile()?
            .into_parts();

        let wav_rate = input_sample_rate.round() as u32;
        let input_writer = WaveFileWriter::new(file, wav_rate)?;

        Ok(Self {
            class,
            input_sample_rate,
            listener,
            runner,
            config,
            input_writer: Some(input_writer),
            input_path: Some(input_path),
        })
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.class.settings
    }

    pub fn input_sample_rate(&self) -> f64 {
        self.input_sample_rate
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn class(&self) -> &DetectorClass {
        &self.class
    }

    pub fn class_name(&self) -> &str {
        &self.class.class_name
    }

    /// Append samples to the detector input.
    pub fn detect<S: WaveSample>(&mut self, samples: &[S]) -> Result<(), DetectorError> {
        let writer = self
            .input_writer
            .as_mut()
            .ok_or(DetectorError::AlreadyCompleted)?;
        writer.write(samples)
    }

    /// Run Nighthawk on all input passed to [`Detector::detect`] and
    /// deliver the resulting clips to the listener.
    ///
    /// Temporary files are removed whether or not detection succeeds.
    pub async fn complete_detection(&mut self) -> Result<(), DetectorError> {
        let writer = self
            .input_writer
            .take()
            .ok_or(DetectorError::AlreadyCompleted)?;
        let input_path = self
            .input_path
            .take()
            .ok_or(DetectorError::AlreadyCompleted)?;

        let frames = writer.frames();
        writer.close()?;

        let output_dir = tempfile::Builder::new()
            .prefix("vesper-nighthawk-")
            .tempdir()?;

        tracing::info!(
            detector = %self.class.class_name,
            frames,
            input = %input_path.display(),
            "Completing detection"
        );

        let result = self.run_nighthawk(&input_path, output_dir.path()).await;

        drop(input_path);
        if let Err(e) = output_dir.close() {
            tracing::warn!("Could not remove Nighthawk output directory: {e}");
        }

        result
    }

    async fn run_nighthawk(
        &mut self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<(), DetectorError> {
        let extension_name = self.class.extension_name.clone();
        let environment_name = self.config.environment_name(&self.class.version_number);
        let args = command_args(&self.class.settings, input_path, output_dir);

        let output = match self
            .runner
            .run_python_module(&self.config.module_name, &args, &environment_name)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                crate::metrics::run_completed("launch_error");
                return Err(DetectorError::Launch {
                    extension: extension_name,
                    environment: environment_name,
                    message: e.to_string(),
                });
            }
        };

        executor::log_process_output(&extension_name, &output);
        crate::metrics::run_duration(output.duration_ms);

        if !output.success() {
            crate::metrics::run_completed("failure");
            return Err(DetectorError::AbnormalExit(extension_name));
        }
        crate::metrics::run_completed("success");

        let detection_file_path = detection_file::detection_file_path(input_path, output_dir);
        detection_file::process_detection_file(
            &detection_file_path,
            self.input_sample_rate,
            &mut self.listener,
        )?;

        Ok(())
    }
}

/// Nighthawk command line arguments for the given settings.
pub fn command_args(settings: &DetectorSettings, input_path: &Path, output_dir: &Path) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(hop_size) = settings.hop_size {
        args.push("--hop-size".to_string());
        args.push(float_text(hop_size));
    }

    args.push("--threshold".to_string());
    args.push(float_text(settings.threshold));

    if let Some(merge_overlaps) = settings.merge_overlaps {
        args.push(flag_arg(merge_overlaps, "merge-overlaps"));
    }
    if let Some(drop_uncertain) = settings.drop_uncertain {
        args.push(flag_arg(drop_uncertain, "drop-uncertain"));
    }

    args.push("--output-dir".to_string());
    args.push(output_dir.display().to_string());
    args.push(input_path.display().to_string());

    args
}

fn flag_arg(value: bool, name: &str) -> String {
    if value {
        format!("--{name}")
    } else {
        format!("--no-{name}")
    }
}
