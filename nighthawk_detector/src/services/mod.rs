//! Detector services: process execution, audio files, detection files.

pub mod detection_file;
pub mod executor;
pub mod wave_writer;
