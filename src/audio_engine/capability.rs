//! Interfaces to the collaborators the subsystem drives: the mixer device, the
//! asset store and the engine context.

use std::path::{Path, PathBuf};

use crate::audio_engine::config::DeviceSettings;
use crate::audio_engine::errors::{AudioError, MixerError};
use crate::audio_engine::track::MusicSelection;

/// A mixing device with one music stream and fire-and-forget sound effects.
///
/// Every call may fail; the subsystem decides what a failure means.
pub trait Mixer {
    /// Handle to a decoded one-shot sound.
    type Sound;

    fn pre_init(&mut self, settings: &DeviceSettings) -> Result<(), MixerError>;

    fn open(&mut self) -> Result<(), MixerError>;

    fn close(&mut self) -> Result<(), MixerError>;

    /// Replaces the music stream. `name` is only a format hint.
    fn load_music(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), MixerError>;

    /// Plays the loaded music `loops` extra times (negative = forever),
    /// starting `start_offset` seconds in.
    fn play_music(&mut self, loops: i32, start_offset: f64) -> Result<(), MixerError>;

    fn fadeout_music(&mut self, duration_ms: u32) -> Result<(), MixerError>;

    fn is_music_busy(&mut self) -> bool;

    /// Milliseconds since the music started, or -1 when unknown.
    fn music_position_ms(&mut self) -> i64;

    fn set_music_volume(&mut self, volume: f32) -> Result<(), MixerError>;

    fn load_sound(&mut self, name: &str, bytes: Vec<u8>) -> Result<Self::Sound, MixerError>;

    fn play_sound(&mut self, sound: &Self::Sound, extra_loops: u32) -> Result<(), MixerError>;
}

/// Resolves a logical asset name to its bytes.
pub trait AssetLoader {
    fn load(&self, name: &str) -> Result<Vec<u8>, AudioError>;
}

/// Loads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    base: PathBuf,
}

impl DirectoryLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl AssetLoader for DirectoryLoader {
    fn load(&self, name: &str) -> Result<Vec<u8>, AudioError> {
        match std::fs::read(self.base.join(name)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(AudioError::NotFound(name.to_string()))
            }
            Err(err) => Err(AudioError::Io(err)),
        }
    }
}

/// The slice of engine state the audio subsystem reads and writes.
pub trait EngineContext {
    fn music_selection(&self) -> Option<MusicSelection>;

    fn set_music_selection(&mut self, selection: Option<MusicSelection>);

    fn prefers_music(&self) -> bool;

    fn prefers_sound(&self) -> bool;
}

/// Plain owned [`EngineContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneContext {
    pub music: Option<MusicSelection>,
    pub music_enabled: bool,
    pub sound_enabled: bool,
}

impl Default for SceneContext {
    fn default() -> Self {
        Self {
            music: None,
            music_enabled: true,
            sound_enabled: true,
        }
    }
}

impl EngineContext for SceneContext {
    fn music_selection(&self) -> Option<MusicSelection> {
        self.music.clone()
    }

    fn set_music_selection(&mut self, selection: Option<MusicSelection>) {
        self.music = selection;
    }

    fn prefers_music(&self) -> bool {
        self.music_enabled
    }

    fn prefers_sound(&self) -> bool {
        self.sound_enabled
    }
}
