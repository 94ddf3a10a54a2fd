//! Nighthawk process executor. Runs a Python module in a Conda environment.
//!
//! Nighthawk has its own Python dependencies, so it runs in its own Conda
//! environment (`<prefix>-<version>`), which need not be the environment
//! the host runs in. Output is captured and logged, never streamed.

use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::NighthawkConfig;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, -1 if the process was killed by a signal or timed out.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a Python module with arguments in a named environment.
///
/// `Err` means the process could not be run at all; a process that ran
/// and failed is an `Ok` with a non-zero exit code.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run_python_module(
        &self,
        module_name: &str,
        args: &[String],
        environment_name: &str,
    ) -> anyhow::Result<ProcessOutput>;
}

/// Runs modules with `conda run -n <env> python -m <module> <args>`.
#[derive(Debug, Clone)]
pub struct CondaRunner {
    config: NighthawkConfig,
}

impl CondaRunner {
    pub fn new(config: NighthawkConfig) -> Self {
        Self { config }
    }

    /// Full command line, for logging and tests.
    pub fn command_line(
        &self,
        module_name: &str,
        args: &[String],
        environment_name: &str,
    ) -> Vec<String> {
        let mut line = vec![
            self.config.conda_executable.clone(),
            "run".to_string(),
            "-n".to_string(),
            environment_name.to_string(),
            "python".to_string(),
            "-m".to_string(),
            module_name.to_string(),
        ];
        line.extend(args.iter().cloned());
        line
    }
}

#[async_trait]
impl ScriptRunner for CondaRunner {
    async fn run_python_module(
        &self,
        module_name: &str,
        args: &[String],
        environment_name: &str,
    ) -> anyhow::Result<ProcessOutput> {
        let line = self.command_line(module_name, args, environment_name);
        let timeout = self.config.timeout();
        let start = Instant::now();

        tracing::info!(
            environment = %environment_name,
            module = %module_name,
            command = %line.join(" "),
            "Running Nighthawk"
        );

        let result = tokio::time::timeout(timeout, async {
            Command::new(&line[0])
                .args(&line[1..])
                .kill_on_drop(true)
                .output()
                .await
        })
        .await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => anyhow::bail!("failed to execute {}: {e}", line[0]),
            Err(_) => {
                return Ok(ProcessOutput {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: format!("Process timed out after {}s", timeout.as_secs()),
                    duration_ms: start.elapsed().as_millis() as u64,
                });
            }
        };

        let limit = self.config.output_limit;
        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: truncate_output(&String::from_utf8_lossy(&output.stdout), limit),
            stderr: truncate_output(&String::from_utf8_lossy(&output.stderr), limit),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Keep the last `limit` bytes of process output.
pub fn truncate_output(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut cut = text.len() - limit;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    format!("...truncated...\n{}", &text[cut..])
}

/// Log exit status and both output streams of a detector process.
pub fn log_process_output(extension_name: &str, output: &ProcessOutput) {
    if output.success() {
        tracing::info!(
            extension = %extension_name,
            duration_ms = output.duration_ms,
            "{extension_name} process completed normally."
        );
    } else {
        tracing::warn!(
            extension = %extension_name,
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "{extension_name} process completed abnormally with return code {}. \
             No clips will be created.",
            output.exit_code
        );
    }

    log_stream(extension_name, &output.stdout, "standard output");
    log_stream(extension_name, &output.stderr, "standard error");
}

fn log_stream(extension_name: &str, text: &str, stream_name: &str) {
    for message in stream_messages(extension_name, text, stream_name) {
        tracing::info!("{message}");
    }
}

/// Log messages for one output stream: a single "was empty" message, or a
/// heading followed by each line indented.
pub fn stream_messages(extension_name: &str, text: &str, stream_name: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![format!("{extension_name} process {stream_name} was empty.")];
    }
    std::iter::once(format!("{extension_name} process {stream_name} was:"))
        .chain(text.lines().map(|line| format!("    {line}")))
        .collect()
}
