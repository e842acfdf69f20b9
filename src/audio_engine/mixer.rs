//! Real-time audio mixer implementation.
//!
//! [`RtMixer`] runs inside the device callback. It owns one music voice and a
//! fixed pool of sound-effect voices, applies control messages, renders the
//! interleaved output buffer and reports music progress back to the control
//! side. Nothing here allocates or blocks, but dropping a finished or replaced
//! voice may release the last reference to its sample and free that buffer on
//! the audio thread.

use crate::audio_engine::constants::{MAX_VOICES, VOLUME_MAX, VOLUME_MIN};
use crate::audio_engine::voice::Voice;
use crate::messages::{AudioMessage, ControlMessage, SampleBuffer};
use cpal::Sample;

/// Linear gain ramp used for music fade-outs.
#[derive(Debug, Clone, Copy)]
struct Fade {
    total: usize,
    remaining: usize,
}

impl Fade {
    /// Gain for the next frame, or `None` once the ramp is exhausted.
    fn next_gain(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        let gain = self.remaining as f32 / self.total as f32;
        self.remaining -= 1;
        Some(gain)
    }
}

#[derive(Debug)]
struct MusicVoice {
    generation: u64,
    voice: Voice,
    played_frames: u64,
    fade: Option<Fade>,
}

/// Real-time mixer for one music stream plus overlapping sound effects.
pub struct RtMixer {
    /// Number of output channels (1 for mono, 2 for stereo).
    channels: usize,

    /// Gain applied to the music voice only.
    music_volume: f32,

    music: Option<MusicVoice>,

    /// Sound-effect voices with MAX_VOICES slots.
    voices: [Option<Voice>; MAX_VOICES],
}

impl RtMixer {
    /// Creates a silent mixer rendering `channels` interleaved channels.
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            music_volume: VOLUME_MAX,
            music: None,
            voices: std::array::from_fn(|_| None),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Applies a control message.
    pub fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::PlayMusic {
                generation,
                sample,
                loops,
                start_frame,
            } => self.play_music(generation, sample, loops, start_frame),
            ControlMessage::FadeoutMusic { frames } => self.fadeout_music(frames),
            ControlMessage::SetMusicVolume(volume) => self.set_music_volume(volume),
            ControlMessage::PlaySound {
                sample,
                extra_loops,
            } => self.play_sound(sample, extra_loops),
        }
    }

    /// Replaces the current music voice.
    ///
    /// Samples whose channel count differs from the mixer are ignored.
    pub fn play_music(
        &mut self,
        generation: u64,
        sample: SampleBuffer,
        loops: i32,
        start_frame: usize,
    ) {
        if sample.channels != self.channels {
            return;
        }

        self.music = Some(MusicVoice {
            generation,
            voice: Voice::new(sample, start_frame, loops),
            played_frames: 0,
            fade: None,
        });
    }

    /// Ramps the music down over `frames` and stops it. Zero stops at once.
    pub fn fadeout_music(&mut self, frames: usize) {
        let Some(music) = self.music.as_mut() else {
            return;
        };

        // An earlier, shorter fade keeps running.
        if let Some(fade) = music.fade
            && fade.remaining <= frames
        {
            return;
        }

        music.fade = Some(Fade {
            total: frames,
            remaining: frames,
        });
    }

    /// Sets the music gain.
    ///
    /// Invalid values (NaN, infinite, or out of range) are silently ignored.
    pub fn set_music_volume(&mut self, volume: f32) {
        if !volume.is_finite() || !(VOLUME_MIN..=VOLUME_MAX).contains(&volume) {
            return;
        }

        self.music_volume = volume;
    }

    /// Starts a sound effect in the first free voice.
    ///
    /// If no free voice slot is available, the sound is dropped.
    pub fn play_sound(&mut self, sample: SampleBuffer, extra_loops: u32) {
        if sample.channels != self.channels {
            return;
        }

        let loops = i32::try_from(extra_loops).unwrap_or(i32::MAX);
        if let Some(slot) = self.voices.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(Voice::new(sample, 0, loops));
        }
    }

    /// Renders interleaved audio into `output`.
    ///
    /// Returns the music status after this block: its position while it is
    /// still playing, or a finish notice on the block where it ended.
    pub fn render(&mut self, output: &mut [f32]) -> Option<AudioMessage> {
        output.fill(Sample::EQUILIBRIUM);

        let channels = self.channels;
        if channels == 0 {
            return None;
        }

        let report = self.render_music(output, channels);

        for slot in &mut self.voices {
            let Some(voice) = slot.as_mut() else {
                continue;
            };

            let mut finished = false;
            for frame in output.chunks_exact_mut(channels) {
                let Some(base) = voice.advance() else {
                    finished = true;
                    break;
                };
                for (channel, out) in frame.iter_mut().enumerate() {
                    *out += voice.sample.samples[base + channel];
                }
            }

            if finished {
                *slot = None;
            }
        }

        report
    }

    fn render_music(&mut self, output: &mut [f32], channels: usize) -> Option<AudioMessage> {
        let volume = self.music_volume;
        let music = self.music.as_mut()?;

        let mut finished = false;
        for frame in output.chunks_exact_mut(channels) {
            let gain = match music.fade.as_mut() {
                Some(fade) => match fade.next_gain() {
                    Some(gain) => gain,
                    None => {
                        finished = true;
                        break;
                    }
                },
                None => 1.0,
            };

            let Some(base) = music.voice.advance() else {
                finished = true;
                break;
            };

            let scale = gain * volume;
            for (channel, out) in frame.iter_mut().enumerate() {
                *out += music.voice.sample.samples[base + channel] * scale;
            }
            music.played_frames += 1;
        }

        let generation = music.generation;
        if finished {
            self.music = None;
            return Some(AudioMessage::MusicFinished { generation });
        }

        Some(AudioMessage::MusicPosition {
            generation,
            frames: music.played_frames,
        })
    }

    pub fn is_music_playing(&self) -> bool {
        self.music.is_some()
    }

    pub fn active_sounds(&self) -> usize {
        self.voices.iter().filter(|slot| slot.is_some()).count()
    }
}
