//! Voice playback state for the real-time mixer.
//!
//! A [`Voice`] walks a shared [`SampleBuffer`] frame by frame, wrapping to the
//! start of the sample while repetitions remain.

use crate::messages::SampleBuffer;

/// A single playing sample.
#[derive(Debug)]
pub struct Voice {
    /// The sample buffer being played.
    pub sample: SampleBuffer,

    /// Next frame to render.
    pub frame_pos: usize,

    /// Repetitions left after the current pass; negative repeats forever.
    pub loops_remaining: i32,
}

impl Voice {
    /// Creates a voice starting at `start_frame`.
    pub fn new(sample: SampleBuffer, start_frame: usize, loops: i32) -> Self {
        Self {
            sample,
            frame_pos: start_frame,
            loops_remaining: loops,
        }
    }

    /// Index of the first sample of the next frame, or `None` once the voice
    /// has played out.
    pub fn advance(&mut self) -> Option<usize> {
        let frames = self.sample.frames();
        if frames == 0 {
            return None;
        }

        if self.frame_pos >= frames {
            if self.loops_remaining == 0 {
                return None;
            }
            if self.loops_remaining > 0 {
                self.loops_remaining -= 1;
            }
            self.frame_pos = 0;
        }

        let base = self.frame_pos * self.sample.channels;
        self.frame_pos += 1;
        Some(base)
    }
}
