//! Detector data models.

pub mod clip;
pub mod detection;
