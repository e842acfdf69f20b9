//! The audio-device [`Mixer`] backed by a CPAL output stream.
//!
//! The control side keeps only what it needs to answer queries without
//! blocking: the loaded music, a generation counter tagging each
//! `play_music`, and the latest status published by the audio thread.

use rtrb::Producer;

use crate::audio_engine::audio_stream::{AudioStreamHandle, create_audio_stream, start_stream};
use crate::audio_engine::capability::Mixer;
use crate::audio_engine::config::DeviceSettings;
use crate::audio_engine::errors::MixerError;
use crate::audio_engine::sample_loader::decode_to_sample_buffer;
use crate::messages::{ControlMessage, SampleBuffer};

/// Sample widths accepted in [`DeviceSettings::bit_depth`]. The stream is
/// always f32 regardless.
const SUPPORTED_BIT_DEPTHS: [u8; 4] = [8, 16, 24, 32];

/// A [`Mixer`] playing through the default output device.
pub struct CpalMixer {
    settings: DeviceSettings,
    handle: Option<AudioStreamHandle>,
    music: Option<SampleBuffer>,
    generation: u64,
    music_busy: bool,
    music_frames: u64,
}

impl Default for CpalMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalMixer {
    pub fn new() -> Self {
        Self {
            settings: DeviceSettings::fallback(),
            handle: None,
            music: None,
            generation: 0,
            music_busy: false,
            music_frames: 0,
        }
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn handle(&self) -> Result<&AudioStreamHandle, MixerError> {
        self.handle.as_ref().ok_or(MixerError::NotOpen)
    }

    fn producer(&mut self) -> Result<&mut Producer<ControlMessage>, MixerError> {
        self.handle
            .as_mut()
            .map(|handle| &mut handle.producer)
            .ok_or(MixerError::NotOpen)
    }

    fn send(&mut self, message: ControlMessage, label: &'static str) -> Result<(), MixerError> {
        self.producer()?
            .push(message)
            .map_err(|_| MixerError::QueueFull(label))
    }

    fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<SampleBuffer, MixerError> {
        let handle = self.handle()?;
        Ok(decode_to_sample_buffer(
            name,
            bytes,
            handle.output_channels,
            handle.output_sample_rate,
        )?)
    }

    /// Refreshes busy and position from the audio thread's status, ignoring
    /// music that has since been replaced.
    fn sync_status(&mut self) {
        let Some(handle) = self.handle.as_ref() else {
            return;
        };

        if let Some(frames) = handle.status.position(self.generation) {
            self.music_frames = frames;
        }
        if handle.status.is_finished(self.generation) {
            self.music_busy = false;
        }
    }
}

impl Mixer for CpalMixer {
    type Sound = SampleBuffer;

    fn pre_init(&mut self, settings: &DeviceSettings) -> Result<(), MixerError> {
        if !(1..=2).contains(&settings.channels) {
            return Err(MixerError::UnsupportedSettings(format!(
                "{} channels",
                settings.channels
            )));
        }
        if settings.sample_rate == 0 {
            return Err(MixerError::UnsupportedSettings("0 Hz".to_string()));
        }
        if !SUPPORTED_BIT_DEPTHS.contains(&settings.bit_depth.unsigned_abs()) {
            return Err(MixerError::UnsupportedSettings(format!(
                "{} bit samples",
                settings.bit_depth
            )));
        }

        self.settings = *settings;
        Ok(())
    }

    fn open(&mut self) -> Result<(), MixerError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let handle = create_audio_stream(&self.settings)?;
        start_stream(&handle.stream)?;
        log::info!(
            "Audio device open ({} ch@{} Hz)",
            handle.output_channels,
            handle.output_sample_rate
        );

        self.handle = Some(handle);
        Ok(())
    }

    fn close(&mut self) -> Result<(), MixerError> {
        if self.handle.take().is_some() {
            log::info!("Audio device closed");
        }
        self.music = None;
        self.music_busy = false;
        self.music_frames = 0;
        Ok(())
    }

    fn load_music(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), MixerError> {
        self.music = Some(self.decode(name, bytes)?);
        Ok(())
    }

    fn play_music(&mut self, loops: i32, start_offset: f64) -> Result<(), MixerError> {
        let sample_rate = self.handle()?.output_sample_rate;
        let sample = self.music.clone().ok_or(MixerError::NoMusicLoaded)?;
        let start_frame = (start_offset.max(0.0) * f64::from(sample_rate)) as usize;

        self.generation += 1;
        self.send(
            ControlMessage::PlayMusic {
                generation: self.generation,
                sample,
                loops,
                start_frame,
            },
            "PlayMusic",
        )?;

        self.music_busy = true;
        self.music_frames = 0;
        Ok(())
    }

    fn fadeout_music(&mut self, duration_ms: u32) -> Result<(), MixerError> {
        let sample_rate = self.handle()?.output_sample_rate;
        if !self.is_music_busy() {
            return Ok(());
        }

        let frames = u64::from(duration_ms) * u64::from(sample_rate) / 1000;
        self.send(
            ControlMessage::FadeoutMusic {
                frames: usize::try_from(frames).unwrap_or(usize::MAX),
            },
            "FadeoutMusic",
        )
    }

    fn is_music_busy(&mut self) -> bool {
        self.sync_status();
        self.music_busy
    }

    fn music_position_ms(&mut self) -> i64 {
        self.sync_status();
        let Some(handle) = self.handle.as_ref() else {
            return -1;
        };
        if !self.music_busy {
            return -1;
        }

        let ms = self.music_frames * 1000 / u64::from(handle.output_sample_rate.max(1));
        i64::try_from(ms).unwrap_or(i64::MAX)
    }

    fn set_music_volume(&mut self, volume: f32) -> Result<(), MixerError> {
        self.send(ControlMessage::SetMusicVolume(volume), "SetMusicVolume")
    }

    fn load_sound(&mut self, name: &str, bytes: Vec<u8>) -> Result<SampleBuffer, MixerError> {
        self.decode(name, bytes)
    }

    fn play_sound(&mut self, sound: &SampleBuffer, extra_loops: u32) -> Result<(), MixerError> {
        self.send(
            ControlMessage::PlaySound {
                sample: sound.clone(),
                extra_loops,
            },
            "PlaySound",
        )
    }
}
