//! Detector metrics, recorded through the `metrics` facade.
//!
//! No exporter is installed here; the host process picks one.

use metrics::{counter, histogram};

/// Record a finished Nighthawk run ("success", "failure" or "launch_error").
pub fn run_completed(status: &str) {
    counter!("nighthawk_runs_total", "status" => status.to_string()).increment(1);
}

/// Record Nighthawk process duration.
pub fn run_duration(duration_ms: u64) {
    histogram!("nighthawk_run_duration_ms").record(duration_ms as f64);
}

/// Record clips delivered to a listener.
pub fn clips_emitted(count: usize) {
    counter!("nighthawk_clips_total").increment(count as u64);
}

/// Record detection file rows that could not be turned into clips.
pub fn clips_ignored(count: usize) {
    counter!("nighthawk_clips_ignored_total").increment(count as u64);
}
