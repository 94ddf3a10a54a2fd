//! Receiver of detected clips.

use crate::models::clip::{Annotations, Clip};

/// Host-side consumer of a detector's clips.
///
/// `process_clip` is called once per clip in detection file order, then
/// `complete_processing` once after the last clip.
pub trait ClipListener: Send {
    fn process_clip(&mut self, start_index: u64, length: u64, annotations: &Annotations);

    fn complete_processing(&mut self);
}

/// Listener that collects clips in memory.
#[derive(Debug, Default)]
pub struct ClipCollector {
    pub clips: Vec<Clip>,
    pub completed: bool,
}

impl ClipCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipListener for ClipCollector {
    fn process_clip(&mut self, start_index: u64, length: u64, annotations: &Annotations) {
        self.clips.push(Clip {
            start_index,
            length,
            annotations: annotations.clone(),
        });
    }

    fn complete_processing(&mut self) {
        self.completed = true;
    }
}
