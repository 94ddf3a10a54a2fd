//! Nighthawk detector settings.
//!
//! Vesper names detectors `<series> <version> <settings>`, e.g.
//! `Nighthawk 0.1.0 90 20.1 NMO DU`. The settings part is a threshold,
//! an optional hop size that must immediately follow it, and any number
//! of boolean flags.

use serde::{Deserialize, Serialize};

use crate::error::SettingError;

/// Parsed settings of a Nighthawk detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// Detection threshold in [0, 100].
    pub threshold: f64,
    /// Hop size, percent of the model input duration, in (0, 100].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hop_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_overlaps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_uncertain: Option<bool>,
}

enum Setting {
    HopSize(f64),
    MergeOverlaps(bool),
    DropUncertain(bool),
}

fn expand_flag(value: &str) -> Option<Setting> {
    match value {
        "MO" => Some(Setting::MergeOverlaps(true)),
        "NMO" => Some(Setting::MergeOverlaps(false)),
        "DU" => Some(Setting::DropUncertain(true)),
        "NDU" => Some(Setting::DropUncertain(false)),
        _ => None,
    }
}

/// Parse the settings part of a detector name.
///
/// Repeated settings are accepted and the last one wins.
pub fn parse_detector_settings(
    _series_name: &str,
    _version_number: &str,
    settings: &[&str],
) -> Result<DetectorSettings, SettingError> {
    let (first, rest) = settings
        .split_first()
        .ok_or_else(|| SettingError("No threshold specified.".to_string()))?;

    let mut parsed = DetectorSettings {
        threshold: parse_threshold(first)?,
        ..DetectorSettings::default()
    };

    let others = rest
        .iter()
        .map(|s| parse_setting(s))
        .collect::<Result<Vec<_>, _>>()?;

    let hop_index = others.iter().position(|s| matches!(s, Setting::HopSize(_)));
    if let Some(i) = hop_index.filter(|&i| i != 0) {
        return Err(SettingError(format!(
            "Hop size \"{}\" specified out of place. Hop size must immediately follow threshold.",
            rest[i]
        )));
    }

    for setting in others {
        match setting {
            Setting::HopSize(h) => parsed.hop_size = Some(h),
            Setting::MergeOverlaps(b) => parsed.merge_overlaps = Some(b),
            Setting::DropUncertain(b) => parsed.drop_uncertain = Some(b),
        }
    }

    Ok(parsed)
}

fn parse_threshold(value: &str) -> Result<f64, SettingError> {
    match parse_number(value) {
        Some(t) if (0.0..=100.0).contains(&t) => Ok(t),
        _ => Err(SettingError(format!(
            "Bad threshold \"{value}\". Threshold must be a number in the range [0, 100]."
        ))),
    }
}

fn parse_setting(value: &str) -> Result<Setting, SettingError> {
    if parse_number(value).is_some() {
        return parse_hop_size(value).map(Setting::HopSize);
    }
    expand_flag(value)
        .ok_or_else(|| SettingError(format!("Unrecognized detector setting value \"{value}\".")))
}

fn parse_hop_size(value: &str) -> Result<f64, SettingError> {
    match parse_number(value) {
        Some(h) if h > 0.0 && h <= 100.0 => Ok(h),
        _ => Err(SettingError(format!(
            "Bad hop size \"{value}\". Hop size must be a number in the range (0, 100]."
        ))),
    }
}

/// Any float text, NaN included. NaN fails every range check.
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Class name of a detector, e.g. `Nighthawk_0x1x0_90_20x1_NMO_DU`.
pub fn detector_class_name(
    series_name: &str,
    version_number: &str,
    settings: &DetectorSettings,
) -> String {
    let mut name = format!("{series_name}_{version_number}_{}", settings.threshold);
    if let Some(hop) = settings.hop_size {
        name.push_str(&format!("_{hop}"));
    }
    if let Some(merge) = settings.merge_overlaps {
        name.push_str(&flag_suffix(merge, "MO"));
    }
    if let Some(drop) = settings.drop_uncertain {
        name.push_str(&flag_suffix(drop, "DU"));
    }
    name.replace('.', "x")
}

fn flag_suffix(value: bool, code: &str) -> String {
    if value {
        format!("_{code}")
    } else {
        format!("_N{code}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(settings: &str) -> Result<DetectorSettings, SettingError> {
        let settings: Vec<&str> = settings.split_whitespace().collect();
        parse_detector_settings("Nighthawk", "0.0.0", &settings)
    }

    fn expected(
        threshold: f64,
        hop_size: Option<f64>,
        merge_overlaps: Option<bool>,
        drop_uncertain: Option<bool>,
    ) -> DetectorSettings {
        DetectorSettings {
            threshold,
            hop_size,
            merge_overlaps,
            drop_uncertain,
        }
    }

    // ── Valid settings ──────────────────────────────────────────────

    #[test]
    fn threshold_only() {
        assert_eq!(parse("50").unwrap(), expected(50.0, None, None, None));
        assert_eq!(parse("90.25").unwrap(), expected(90.25, None, None, None));
    }

    #[test]
    fn threshold_bounds_inclusive() {
        assert_eq!(parse("0").unwrap().threshold, 0.0);
        assert_eq!(parse("100").unwrap().threshold, 100.0);
    }

    #[test]
    fn threshold_and_hop_size() {
        assert_eq!(parse("90 25").unwrap(), expected(90.0, Some(25.0), None, None));
    }

    #[test]
    fn flags() {
        assert_eq!(parse("90 MO").unwrap(), expected(90.0, None, Some(true), None));
        assert_eq!(parse("90 NMO").unwrap(), expected(90.0, None, Some(false), None));
        assert_eq!(parse("90 DU").unwrap(), expected(90.0, None, None, Some(true)));
        assert_eq!(parse("90 NDU").unwrap(), expected(90.0, None, None, Some(false)));
        assert_eq!(
            parse("90 MO DU").unwrap(),
            expected(90.0, None, Some(true), Some(true))
        );
    }

    #[test]
    fn hop_size_then_flag() {
        assert_eq!(
            parse("90 25 MO").unwrap(),
            expected(90.0, Some(25.0), Some(true), None)
        );
    }

    #[test]
    fn repeated_flags_last_wins() {
        assert_eq!(parse("90 MO MO").unwrap(), expected(90.0, None, Some(true), None));
        assert_eq!(parse("90 MO NMO").unwrap(), expected(90.0, None, Some(false), None));
    }

    // ── Errors ──────────────────────────────────────────────────────

    fn error_message(settings: &str) -> String {
        parse(settings).unwrap_err().to_string()
    }

    #[test]
    fn no_threshold() {
        assert_eq!(error_message(""), "No threshold specified.");
    }

    #[test]
    fn bad_thresholds() {
        for value in ["Bobo", "-1", "101", "nan"] {
            assert_eq!(
                error_message(value),
                format!(
                    "Bad threshold \"{value}\". Threshold must be a number in the range [0, 100]."
                )
            );
        }
    }

    #[test]
    fn bad_hop_sizes() {
        for value in ["0", "101", "-5", "nan", "NaN"] {
            assert_eq!(
                error_message(&format!("90 {value}")),
                format!("Bad hop size \"{value}\". Hop size must be a number in the range (0, 100].")
            );
        }
    }

    #[test]
    fn unrecognized_value() {
        assert_eq!(
            error_message("90 Bobo"),
            "Unrecognized detector setting value \"Bobo\"."
        );
    }

    #[test]
    fn hop_size_out_of_place() {
        assert_eq!(
            error_message("90 MO 25"),
            "Hop size \"25\" specified out of place. Hop size must immediately follow threshold."
        );
    }

    // ── Class names ─────────────────────────────────────────────────

    #[test]
    fn class_name_full() {
        let settings = parse("90 20.1 NMO DU").unwrap();
        assert_eq!(
            detector_class_name("Nighthawk", "0.1.0", &settings),
            "Nighthawk_0x1x0_90_20x1_NMO_DU"
        );
    }

    #[test]
    fn class_name_threshold_only() {
        let settings = parse("50.5").unwrap();
        assert_eq!(
            detector_class_name("Nighthawk", "1.0.0", &settings),
            "Nighthawk_1x0x0_50x5"
        );
    }
}
