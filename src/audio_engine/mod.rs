//! Audio Engine Module
//!
//! This module provides the audio subsystem of a scene-based game engine:
//! background music that follows the scene's selection, one-shot sound
//! effects, and volume control with hardware MIDI compensation.
//! It is organized into sub-modules, each with a specific responsibility:
//!
//! - [`subsystem`]: The façade the engine drives every tick
//! - [`reconciler`]: Wanted-versus-playing music state machine
//! - [`volume`] and [`midi`]: Master volume and MIDI scaling
//! - [`capability`]: Mixer, asset and engine-context interfaces
//! - [`device`]: The CPAL-backed mixer
//! - [`audio_stream`]: CPAL audio stream management and real-time callback
//! - [`mixer`]: Real-time mixing engine
//! - [`sample_loader`]: Audio file decoding and resampling
//!
//! The [`AudioEngine`] class exposes the subsystem to Python.

use pyo3::exceptions::{PyFileNotFoundError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

pub mod audio_stream;
pub mod capability;
pub mod channels;
pub mod config;
pub mod constants;
pub mod device;
pub mod errors;
pub mod midi;
pub mod mixer;
pub mod reconciler;
pub mod sample_loader;
pub mod sound;
pub mod subsystem;
pub mod track;
pub mod voice;
pub mod volume;

#[cfg(test)]
mod test_support;

pub use capability::{AssetLoader, DirectoryLoader, EngineContext, Mixer, SceneContext};
pub use config::{AudioConfig, DeviceSettings, ErrorPolicy};
pub use device::CpalMixer;
pub use errors::{AudioError, MixerError, SampleLoadError};
pub use subsystem::{AudioSubsystem, MixerStatus};
pub use track::{MusicSelection, TrackKind};

use crate::audio_engine::audio_stream::setup_logger;

impl From<AudioError> for PyErr {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::NotFound(_) => PyFileNotFoundError::new_err(err.to_string()),
            AudioError::VolumeOutOfRange(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// A music selection as seen from Python: `(filename, loops, start_offset)`.
type PySelection = (String, i32, f64);

/// Game-facing audio: music, sound effects and volume.
#[pyclass(unsendable)]
pub struct AudioEngine {
    audio: AudioSubsystem<CpalMixer>,
    context: SceneContext,
}

#[pymethods]
impl AudioEngine {
    /// Create an engine resolving assets against `base_path`.
    ///
    /// Nothing touches the device until `pre_init` and `init`.
    #[new]
    #[pyo3(signature = (base_path, sample_rate=44100, fade_music=0.0, debug_sound=false))]
    pub fn new(base_path: String, sample_rate: u32, fade_music: f32, debug_sound: bool) -> Self {
        setup_logger();

        let config = AudioConfig {
            sample_rate,
            fade_music,
            debug_sound,
            base_path: base_path.into(),
            ..AudioConfig::default()
        }
        .with_env_overrides();
        let assets = Box::new(DirectoryLoader::new(config.base_path.clone()));

        AudioEngine {
            audio: AudioSubsystem::new(CpalMixer::new(), assets, config),
            context: SceneContext::default(),
        }
    }

    pub fn pre_init(&mut self) -> PyResult<()> {
        Ok(self.audio.pre_init()?)
    }

    /// Open the device. A failure leaves the engine permanently silent.
    pub fn init(&mut self) -> PyResult<()> {
        Ok(self.audio.init()?)
    }

    #[pyo3(signature = (filename, loops=-1, startpos=0.0))]
    pub fn music_start(&mut self, filename: &str, loops: i32, startpos: f64) -> PyResult<()> {
        Ok(self
            .audio
            .start_music(&mut self.context, filename, loops, startpos)?)
    }

    pub fn music_stop(&mut self) -> PyResult<()> {
        Ok(self.audio.stop_music(&mut self.context)?)
    }

    /// Bring playback in line with the current selection. Call once per tick.
    pub fn restore_music(&mut self) -> PyResult<()> {
        Ok(self.audio.restore_music(&self.context)?)
    }

    /// Seconds until `offset` seconds into the current music, if known.
    pub fn music_delay(&mut self, offset: f64) -> Option<f64> {
        self.audio.music_delay(offset)
    }

    /// Play a sound effect, repeating it `loops` extra times.
    #[pyo3(signature = (filename, loops=0))]
    pub fn play(&mut self, filename: &str, loops: u32) -> PyResult<()> {
        Ok(self.audio.play_sound(&self.context, filename, loops)?)
    }

    pub fn set_music_volume(&mut self, volume: f32) -> PyResult<()> {
        Ok(self.audio.set_music_volume(volume)?)
    }

    pub fn disable_mixer(&mut self) -> PyResult<()> {
        Ok(self.audio.disable()?)
    }

    pub fn enable_mixer(&mut self) -> PyResult<()> {
        Ok(self.audio.enable()?)
    }

    pub fn shut_down(&mut self) -> PyResult<()> {
        Ok(self.audio.shutdown()?)
    }

    /// Update the player's music and sound preferences.
    pub fn set_preferences(&mut self, music: bool, sound: bool) {
        self.context.music_enabled = music;
        self.context.sound_enabled = sound;
    }

    pub fn music_selection(&self) -> Option<PySelection> {
        self.context
            .music
            .as_ref()
            .map(|sel| (sel.filename.clone(), sel.loops, sel.start_offset))
    }

    /// Replace the selection without touching playback; `restore_music`
    /// applies it.
    #[pyo3(signature = (selection=None))]
    pub fn set_music_selection(&mut self, selection: Option<PySelection>) {
        self.context.music = selection.map(|(filename, loops, start_offset)| {
            MusicSelection::new(filename, loops, start_offset)
        });
    }

    /// Whether the device opened successfully.
    pub fn is_working(&self) -> bool {
        self.audio.status() == MixerStatus::Working
    }

    pub fn is_enabled(&self) -> bool {
        self.audio.is_enabled()
    }

    pub fn master_music_volume(&self) -> f32 {
        self.audio.master_music_volume()
    }
}
