//! Message definitions for communication between the control thread and the
//! real-time audio thread.
//!
//! This module defines the enums that serve as the wire format for messages passed through the
//! ring buffers between the engine thread and the audio callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Decoded, device-ready interleaved audio.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub channels: usize,
    pub samples: Arc<[f32]>,
}

impl SampleBuffer {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }
}

/// Message that is emitted from the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMessage {
    /// Frames rendered since the music of `generation` started.
    MusicPosition { generation: u64, frames: u64 },

    /// The music of `generation` ended, ran out of loops or finished fading.
    MusicFinished { generation: u64 },
}

/// Latest music status, overwritten by the audio thread after every block.
///
/// Unlike a queue it cannot fill up: the control side may read it rarely and
/// still sees the newest position and every finish of the current generation.
/// Generation 0 never plays, so a fresh status reports nothing.
#[derive(Debug, Default)]
pub struct MusicStatus {
    position_frames: AtomicU64,
    position_generation: AtomicU64,
    finished_generation: AtomicU64,
}

impl MusicStatus {
    pub fn publish(&self, message: &AudioMessage) {
        match *message {
            AudioMessage::MusicPosition { generation, frames } => {
                self.position_frames.store(frames, Ordering::Relaxed);
                self.position_generation.store(generation, Ordering::Release);
            }
            AudioMessage::MusicFinished { generation } => {
                self.finished_generation.store(generation, Ordering::Release);
            }
        }
    }

    /// Frames played by the music of `generation`, if it has reported yet.
    pub fn position(&self, generation: u64) -> Option<u64> {
        if self.position_generation.load(Ordering::Acquire) != generation {
            return None;
        }
        Some(self.position_frames.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self, generation: u64) -> bool {
        self.finished_generation.load(Ordering::Acquire) == generation
    }
}

/// Message that is emitted from the control side.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Replace the music voice and start it.
    ///
    /// # Parameters
    /// * `generation` - Tag echoed back in status messages
    /// * `sample` - Pre-decoded music
    /// * `loops` - Extra repetitions, negative loops forever
    /// * `start_frame` - Frame playback starts from
    PlayMusic {
        generation: u64,
        sample: SampleBuffer,
        loops: i32,
        start_frame: usize,
    },

    /// Ramp the music down to silence over `frames`, then stop it.
    FadeoutMusic { frames: usize },

    /// Set the music volume (0.0 to 1.0).
    SetMusicVolume(f32),

    /// Start a one-shot sound.
    PlaySound { sample: SampleBuffer, extra_loops: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_status_reports_nothing() {
        let status = MusicStatus::default();
        assert_eq!(status.position(1), None);
        assert!(!status.is_finished(1));
    }

    #[test]
    fn test_status_ignores_other_generations() {
        let status = MusicStatus::default();
        status.publish(&AudioMessage::MusicPosition {
            generation: 1,
            frames: 4_410,
        });
        status.publish(&AudioMessage::MusicFinished { generation: 1 });

        assert_eq!(status.position(1), Some(4_410));
        assert!(status.is_finished(1));
        assert_eq!(status.position(2), None);
        assert!(!status.is_finished(2));

        status.publish(&AudioMessage::MusicPosition {
            generation: 2,
            frames: 64,
        });
        assert_eq!(status.position(2), Some(64));
        assert_eq!(status.position(1), None);
        assert!(status.is_finished(1));
    }
}
