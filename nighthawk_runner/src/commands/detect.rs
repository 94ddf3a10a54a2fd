use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::{SampleFormat, WavReader};

use vesper_nighthawk::services::wave_writer::WaveSample;
use vesper_nighthawk::{ClipCollector, Detector, ProviderRegistry};

const CHUNK_FRAMES: usize = 65536;

/// Feed one channel of a WAV file to a detector in chunks.
///
/// Returns the number of frames fed.
pub fn feed_channel(
    reader: &mut WavReader<BufReader<File>>,
    channel: u16,
    detector: &mut Detector<ClipCollector>,
) -> eyre::Result<u64> {
    let spec = reader.spec();
    if channel >= spec.channels {
        eyre::bail!(
            "channel {channel} out of range: file has {} channel(s)",
            spec.channels
        );
    }
    let channels = spec.channels as usize;
    let channel = channel as usize;

    match spec.sample_format {
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            feed(
                reader.samples::<i32>(),
                channels,
                channel,
                |s| scale_int_sample(s, bits),
                detector,
            )
        }
        SampleFormat::Float => feed(
            reader.samples::<f32>(),
            channels,
            channel,
            |s| s * i16::MAX as f32,
            detector,
        ),
    }
}

/// Scale an integer sample of `bits` bits to the 16-bit range.
pub fn scale_int_sample(sample: i32, bits: u16) -> i32 {
    if bits < 16 {
        sample << (16 - bits)
    } else {
        sample >> (bits - 16)
    }
}

fn feed<S, T>(
    samples: impl Iterator<Item = hound::Result<S>>,
    channels: usize,
    channel: usize,
    convert: impl Fn(S) -> T,
    detector: &mut Detector<ClipCollector>,
) -> eyre::Result<u64>
where
    T: WaveSample,
{
    let mut frames = 0u64;
    let mut chunk = Vec::with_capacity(CHUNK_FRAMES);

    for (i, sample) in samples.enumerate() {
        let sample = sample?;
        if i % channels != channel {
            continue;
        }
        chunk.push(convert(sample));
        if chunk.len() == CHUNK_FRAMES {
            detector.detect(&chunk)?;
            frames += chunk.len() as u64;
            chunk.clear();
        }
    }
    detector.detect(&chunk)?;
    frames += chunk.len() as u64;

    Ok(frames)
}

/// Run the named detector on a WAV file and return its clips as JSON lines.
pub async fn run(input_file_path: &Path, detector_name: &str, channel: u16) -> eyre::Result<String> {
    let registry = ProviderRegistry::with_builtin();
    let class = registry.detector_class(detector_name)?;

    let mut reader = WavReader::open(input_file_path)?;
    let sample_rate = reader.spec().sample_rate as f64;

    let mut detector = class.instantiate(sample_rate, ClipCollector::new())?;
    let frames = feed_channel(&mut reader, channel, &mut detector)?;

    tracing::info!(
        detector = %class.class_name,
        file = %input_file_path.display(),
        frames,
        "Running detector"
    );

    detector.complete_detection().await?;

    let mut out = String::new();
    for clip in &detector.listener().clips {
        out.push_str(&serde_json::to_string(clip)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, frames: usize) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for c in 0..spec.channels {
                match spec.sample_format {
                    SampleFormat::Float => writer.write_sample(0.5f32).unwrap(),
                    SampleFormat::Int => writer.write_sample(i as i32 * (c as i32 + 1)).unwrap(),
                }
            }
        }
        writer.finalize().unwrap();
    }

    fn detector() -> Detector<ClipCollector> {
        ProviderRegistry::with_builtin()
            .detector_class("Nighthawk 0.1.0 50")
            .unwrap()
            .instantiate(8000.0, ClipCollector::new())
            .unwrap()
    }

    #[test]
    fn feeds_selected_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        write_wav(&path, spec, 100);

        let mut d = detector();
        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(feed_channel(&mut reader, 1, &mut d).unwrap(), 100);

        let mut reader = WavReader::open(&path).unwrap();
        assert!(feed_channel(&mut reader, 2, &mut d).is_err());
    }

    #[test]
    fn int_samples_scale_to_16_bits() {
        assert_eq!(scale_int_sample(-128, 8), i16::MIN as i32);
        assert_eq!(scale_int_sample(127, 8), 127 << 8);
        assert_eq!(scale_int_sample(1234, 16), 1234);
        assert_eq!(scale_int_sample(0x7f_ffff, 24), i16::MAX as i32);
        assert_eq!(scale_int_sample(i32::MIN, 32), i16::MIN as i32);
    }

    #[test]
    fn feeds_narrow_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrow.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [-128i8, 0, 127] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let mut d = detector();
        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(feed_channel(&mut reader, 0, &mut d).unwrap(), 3);
    }

    #[test]
    fn feeds_wide_and_float_samples() {
        let dir = tempfile::tempdir().unwrap();

        let wide = dir.path().join("wide.wav");
        write_wav(
            &wide,
            hound::WavSpec {
                channels: 1,
                sample_rate: 8000,
                bits_per_sample: 24,
                sample_format: SampleFormat::Int,
            },
            10,
        );
        let float = dir.path().join("float.wav");
        write_wav(
            &float,
            hound::WavSpec {
                channels: 1,
                sample_rate: 8000,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            },
            10,
        );

        let mut d = detector();
        let mut reader = WavReader::open(&wide).unwrap();
        assert_eq!(feed_channel(&mut reader, 0, &mut d).unwrap(), 10);
        let mut reader = WavReader::open(&float).unwrap();
        assert_eq!(feed_channel(&mut reader, 0, &mut d).unwrap(), 10);
    }
}
