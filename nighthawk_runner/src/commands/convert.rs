use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use vesper_nighthawk::models::detection::DetectionRow;
use vesper_nighthawk::services::detection_file::{push_nighthawk_annotations, time_to_index};
use vesper_nighthawk::Annotations;

/// Duration of the Nighthawk model input, in seconds.
pub const MODEL_INPUT_DURATION: f64 = 1.0;
pub const DEFAULT_HOP_DURATION: f64 = 0.2;
pub const DEFAULT_THRESHOLD: f64 = 50.0;

#[derive(Debug, Serialize)]
pub struct Detection {
    pub start_index: u64,
    pub end_index: u64,
    pub annotations: Annotations,
}

#[derive(Debug, Serialize)]
pub struct DetectionFile {
    pub detections: Vec<Detection>,
}

pub fn parse_hop_duration(value: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(hop) if hop > 0.0 && hop <= MODEL_INPUT_DURATION => Ok(hop),
        _ => Err(format!(
            "Bad hop duration \"{value}\". Hop duration must be a number in the range \
             (0, {MODEL_INPUT_DURATION}]."
        )),
    }
}

pub fn parse_threshold(value: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(t) if (0.0..=100.0).contains(&t) => Ok(t),
        _ => Err(format!(
            "Bad detection threshold \"{value}\". Threshold must be a number in the range \
             [0, 100]."
        )),
    }
}

/// Detection with Nighthawk's own values as annotations.
pub fn detection_from_row(row: &DetectionRow, sample_rate: f64) -> eyre::Result<Detection> {
    let start_index = time_to_index("start_sec", &row.start_sec, sample_rate)?;
    let end_index = time_to_index("end_sec", &row.end_sec, sample_rate)?;

    let mut annotations = Annotations::new();
    annotations.insert("Detector Score", row.prob.clone());
    annotations.insert("Classification", row.class.clone());
    annotations.insert("Classifier Score", row.prob.clone());
    push_nighthawk_annotations(&mut annotations, row);

    Ok(Detection {
        start_index,
        end_index,
        annotations,
    })
}

/// Paths of the detector output CSV and the Vesper JSON detection file.
pub fn detection_file_paths(input_file_path: &Path, output_dir_path: Option<&Path>) -> (PathBuf, PathBuf) {
    let dir = output_dir_path
        .map(Path::to_path_buf)
        .or_else(|| input_file_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = input_file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = format!("{stem}_detections");
    (dir.join(format!("{stem}.csv")), dir.join(format!("{stem}.json")))
}

/// Convert `<stem>_detections.csv` to `<stem>_detections.json`.
pub fn run(input_file_path: &Path, output_dir_path: Option<&Path>) -> eyre::Result<String> {
    let sample_rate = hound::WavReader::open(input_file_path)?.spec().sample_rate as f64;
    let (csv_path, json_path) = detection_file_paths(input_file_path, output_dir_path);

    let mut reader = csv::Reader::from_path(&csv_path)?;
    let detections = reader
        .deserialize::<DetectionRow>()
        .map(|row| detection_from_row(&row?, sample_rate))
        .collect::<eyre::Result<Vec<_>>>()?;

    let count = detections.len();
    let file = BufWriter::new(File::create(&json_path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(file, formatter);
    DetectionFile { detections }.serialize(&mut serializer)?;
    serializer.into_inner().flush()?;

    tracing::info!(
        csv = %csv_path.display(),
        json = %json_path.display(),
        count,
        "Wrote detection file"
    );

    Ok(format!("[convert] {count} detections -> {}", json_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "start_sec,end_sec,class,prob,order,prob_order,family,prob_family,group,prob_group,species,prob_species\n\
        1.0,1.5,AMRE,0.95,Passeriformes,0.99,Parulidae,0.98,,,amered,0.9\n\
        1.0,1.25,SWTH,0.6,Passeriformes,0.97,Turdidae,0.9,,,swathr,0.6\n";

    fn write_wav(path: &Path, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();
    }

    #[test]
    fn option_validation() {
        assert_eq!(parse_hop_duration("0.5"), Ok(0.5));
        assert!(parse_hop_duration("0").is_err());
        assert!(parse_hop_duration("1.5").is_err());
        assert_eq!(parse_threshold("100"), Ok(100.0));
        assert_eq!(
            parse_threshold("101").unwrap_err(),
            "Bad detection threshold \"101\". Threshold must be a number in the range [0, 100]."
        );
    }

    #[test]
    fn paths_default_to_input_directory() {
        let (csv, json) = detection_file_paths(Path::new("/data/night.wav"), None);
        assert_eq!(csv, Path::new("/data/night_detections.csv"));
        assert_eq!(json, Path::new("/data/night_detections.json"));

        let (csv, _) = detection_file_paths(Path::new("/data/night.wav"), Some(Path::new("/out")));
        assert_eq!(csv, Path::new("/out/night_detections.csv"));
    }

    #[test]
    fn converts_csv_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("night.wav");
        write_wav(&wav, 1000);
        std::fs::write(dir.path().join("night_detections.csv"), CSV).unwrap();

        let out = run(&wav, None).unwrap();
        assert!(out.contains("2 detections"));

        let text = std::fs::read_to_string(dir.path().join("night_detections.json")).unwrap();
        assert!(text.starts_with("{\n    \"detections\": ["));

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let detections = json["detections"].as_array().unwrap();
        assert_eq!(detections.len(), 2);
        // Start indices are not made unique here.
        assert_eq!(detections[0]["start_index"], 1000);
        assert_eq!(detections[1]["start_index"], 1000);
        assert_eq!(detections[1]["end_index"], 1250);
        assert_eq!(detections[0]["annotations"]["Detector Score"], "0.95");
        assert_eq!(detections[0]["annotations"]["Classification"], "AMRE");
        assert_eq!(detections[0]["annotations"]["Nighthawk Species"], "amered");

        // Annotation order is preserved in the file.
        let score = text.find("Detector Score").unwrap();
        let species = text.find("Nighthawk Species Probability").unwrap();
        assert!(score < species);
    }

    #[test]
    fn missing_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("night.wav");
        write_wav(&wav, 1000);
        assert!(run(&wav, None).is_err());
    }
}
