//! Incremental 16-bit PCM WAV writer for detector input.

use std::fs::File;
use std::io::BufWriter;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::DetectorError;

/// Conversion of input samples to 16-bit WAV samples.
///
/// Non-`i16` samples are rounded half to even and saturated.
pub trait WaveSample: Copy {
    fn to_wave_sample(self) -> i16;
}

impl WaveSample for i16 {
    fn to_wave_sample(self) -> i16 {
        self
    }
}

impl WaveSample for i32 {
    fn to_wave_sample(self) -> i16 {
        self.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}

impl WaveSample for f32 {
    fn to_wave_sample(self) -> i16 {
        (self as f64).to_wave_sample()
    }
}

impl WaveSample for f64 {
    fn to_wave_sample(self) -> i16 {
        // `as` saturates and maps NaN to 0.
        self.round_ties_even() as i16
    }
}

/// Writes a mono WAV file one sample slice at a time.
pub struct WaveFileWriter {
    writer: WavWriter<BufWriter<File>>,
    frames: u64,
}

impl WaveFileWriter {
    pub fn new(file: File, sample_rate: u32) -> Result<Self, DetectorError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::new(BufWriter::new(file), spec)?;
        Ok(Self { writer, frames: 0 })
    }

    pub fn write<S: WaveSample>(&mut self, samples: &[S]) -> Result<(), DetectorError> {
        let mut i16_writer = self.writer.get_i16_writer(samples.len() as u32);
        for &sample in samples {
            i16_writer.write_sample(sample.to_wave_sample());
        }
        i16_writer.flush()?;
        self.frames += samples.len() as u64;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Write the final header and flush the file.
    pub fn close(self) -> Result<(), DetectorError> {
        self.writer.finalize()?;
        Ok(())
    }
}
