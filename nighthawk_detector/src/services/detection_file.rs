//! Nighthawk detection CSV → clips.
//!
//! Start indices are made unique within a file by incrementing them.
//! End indices are never incremented, so making a start index unique
//! shortens its clip.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::DetectorError;
use crate::listener::ClipListener;
use crate::models::clip::{Annotations, Clip};
use crate::models::detection::DetectionRow;

/// Name of the detection file Nighthawk writes for an input file.
pub fn detection_file_path(input_file_path: &Path, output_dir_path: &Path) -> PathBuf {
    let stem = input_file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir_path.join(format!("{stem}_detections.csv"))
}

/// Sample index nearest to a time, rounding halves to even.
pub fn time_to_index(
    column: &'static str,
    time: &str,
    sample_rate: f64,
) -> Result<u64, DetectorError> {
    let bad_value = || DetectorError::BadValue {
        column,
        value: time.to_string(),
    };
    let seconds: f64 = time.trim().parse().map_err(|_| bad_value())?;
    let index = (seconds * sample_rate).round_ties_even();
    // u64::MAX as f64 rounds up to 2^64, which does not fit.
    if !(0.0..u64::MAX as f64).contains(&index) {
        return Err(bad_value());
    }
    Ok(index as u64)
}

/// Increment a start index until it is not in `start_indices`, then claim it.
///
/// `None` if incrementing would pass `u64::MAX`.
pub fn make_start_index_unique(
    mut start_index: u64,
    start_indices: &mut HashSet<u64>,
) -> Option<u64> {
    while start_indices.contains(&start_index) {
        start_index = start_index.checked_add(1)?;
    }
    start_indices.insert(start_index);
    Some(start_index)
}

/// Float text the way Nighthawk's Python tooling prints it: shortest
/// round-trip digits, fixed notation for exponents in `-4..16`, otherwise
/// scientific with a signed two-digit exponent (`95.0`, `0.0001`, `1e-05`).
pub(crate) fn float_text(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{x:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs());
    }

    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if exponent < 0 {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
        return format!("{sign}0.{zeros}{digits}");
    }

    let point = exponent as usize + 1;
    if digits.len() > point {
        format!("{sign}{}.{}", &digits[..point], &digits[point..])
    } else {
        format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
    }
}

/// Build a clip from one detection row.
pub fn clip_from_row(
    row: &DetectionRow,
    sample_rate: f64,
    start_indices: &mut HashSet<u64>,
) -> Result<Clip, DetectorError> {
    // The start index is claimed before anything else in the row is parsed,
    // so a row that fails later still shifts later rows with the same start.
    let unincremented_start = time_to_index("start_sec", &row.start_sec, sample_rate)?;
    let start_index = make_start_index_unique(unincremented_start, start_indices)
        .ok_or_else(|| DetectorError::UniquenessOverflow(row.start_sec.clone()))?;

    // End indices are never incremented; see module docs.
    let end_index = time_to_index("end_sec", &row.end_sec, sample_rate)?;
    if start_index > end_index {
        return Err(DetectorError::UniquenessOverflow(row.start_sec.clone()));
    }

    let prob: f64 = row.prob.trim().parse().map_err(|_| DetectorError::BadValue {
        column: "prob",
        value: row.prob.clone(),
    })?;

    let score = float_text(100.0 * prob);
    let mut annotations = Annotations::new();
    annotations.insert("Detector Score", score.clone());
    annotations.insert("Classification", format!("Call.{}", row.class));
    annotations.insert("Classifier Score", score);
    push_nighthawk_annotations(&mut annotations, row);

    if start_index != unincremented_start {
        annotations.insert(
            "Start Index Uniqueness Offset",
            (start_index - unincremented_start).to_string(),
        );
    }

    Ok(Clip {
        start_index,
        length: end_index - start_index,
        annotations,
    })
}

/// Annotations that copy Nighthawk's output columns verbatim.
pub fn push_nighthawk_annotations(annotations: &mut Annotations, row: &DetectionRow) {
    annotations.insert("Nighthawk Class", row.class.clone());
    annotations.insert("Nighthawk Class Probability", row.prob.clone());
    annotations.insert("Nighthawk Order", row.order.clone());
    annotations.insert("Nighthawk Order Probability", row.prob_order.clone());
    annotations.insert("Nighthawk Family", row.family.clone());
    annotations.insert("Nighthawk Family Probability", row.prob_family.clone());
    annotations.insert("Nighthawk Group", row.group.clone());
    annotations.insert("Nighthawk Group Probability", row.prob_group.clone());
    annotations.insert("Nighthawk Species", row.species.clone());
    annotations.insert("Nighthawk Species Probability", row.prob_species.clone());
}

/// Clips read from a detection file, plus the number of rows skipped.
#[derive(Debug, Default)]
pub struct ClipBatch {
    pub clips: Vec<Clip>,
    pub ignored: usize,
}

/// Read clips from detection CSV text. Bad rows are logged and skipped.
pub fn read_clips<R: Read>(reader: R, sample_rate: f64) -> Result<ClipBatch, DetectorError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut start_indices = HashSet::new();
    let mut batch = ClipBatch::default();

    for (line, record) in csv_reader.deserialize::<DetectionRow>().enumerate() {
        let result = record
            .map_err(DetectorError::from)
            .and_then(|row| clip_from_row(&row, sample_rate, &mut start_indices));

        match result {
            Ok(clip) => batch.clips.push(clip),
            Err(e) => {
                tracing::warn!(row = line + 1, "{e}. Clip will be ignored.");
                batch.ignored += 1;
            }
        }
    }

    Ok(batch)
}

/// Read a detection file and hand its clips to a listener.
///
/// `complete_processing` is called after the last clip. Returns the number
/// of clips delivered.
pub fn process_detection_file(
    file_path: &Path,
    sample_rate: f64,
    listener: &mut dyn ClipListener,
) -> Result<usize, DetectorError> {
    let file = std::fs::File::open(file_path)?;
    let batch = read_clips(file, sample_rate)?;

    for clip in &batch.clips {
        listener.process_clip(clip.start_index, clip.length, &clip.annotations);
    }
    listener.complete_processing();

    crate::metrics::clips_emitted(batch.clips.len());
    if batch.ignored > 0 {
        crate::metrics::clips_ignored(batch.ignored);
    }

    tracing::info!(
        file = %file_path.display(),
        clips = batch.clips.len(),
        ignored = batch.ignored,
        "Processed detection file"
    );

    Ok(batch.clips.len())
}
