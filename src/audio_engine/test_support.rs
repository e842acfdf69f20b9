//! Fakes shared by the unit tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::audio_engine::capability::{AssetLoader, Mixer};
use crate::audio_engine::config::DeviceSettings;
use crate::audio_engine::errors::{AudioError, MixerError};
use crate::audio_engine::midi::HardwareVolume;

#[derive(Debug, Clone, PartialEq)]
pub enum MixerCall {
    PreInit(DeviceSettings),
    Open,
    Close,
    LoadMusic(String),
    PlayMusic(i32, f64),
    FadeoutMusic(u32),
    SetMusicVolume(f32),
    LoadSound(String),
    PlaySound(String, u32),
}

/// Mixer that records every command and answers queries from its fields.
#[derive(Debug)]
pub struct RecordingMixer {
    pub calls: Vec<MixerCall>,
    pub queries: usize,
    pub busy: bool,
    pub position_ms: i64,
    pub pre_init_failures: usize,
    pub fail_open: bool,
    pub fail_close: bool,
    pub fail_load: bool,
    pub fail_volume: bool,
}

impl Default for RecordingMixer {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            queries: 0,
            busy: false,
            position_ms: -1,
            pre_init_failures: 0,
            fail_open: false,
            fail_close: false,
            fail_load: false,
            fail_volume: false,
        }
    }
}

impl RecordingMixer {
    pub fn count(&self, matches: impl Fn(&MixerCall) -> bool) -> usize {
        self.calls.iter().filter(|call| matches(call)).count()
    }

    /// Commands and queries seen so far.
    pub fn interactions(&self) -> usize {
        self.calls.len() + self.queries
    }
}

impl Mixer for RecordingMixer {
    type Sound = String;

    fn pre_init(&mut self, settings: &DeviceSettings) -> Result<(), MixerError> {
        self.calls.push(MixerCall::PreInit(*settings));
        if self.pre_init_failures > 0 {
            self.pre_init_failures -= 1;
            return Err(MixerError::UnsupportedSettings("scripted".into()));
        }
        Ok(())
    }

    fn open(&mut self) -> Result<(), MixerError> {
        self.calls.push(MixerCall::Open);
        if self.fail_open {
            return Err(MixerError::NoDevice);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), MixerError> {
        self.calls.push(MixerCall::Close);
        self.busy = false;
        if self.fail_close {
            return Err(MixerError::Stream("scripted close failure".into()));
        }
        Ok(())
    }

    fn load_music(&mut self, name: &str, _bytes: Vec<u8>) -> Result<(), MixerError> {
        self.calls.push(MixerCall::LoadMusic(name.to_string()));
        if self.fail_load {
            return Err(MixerError::Stream("scripted load failure".into()));
        }
        Ok(())
    }

    fn play_music(&mut self, loops: i32, start_offset: f64) -> Result<(), MixerError> {
        self.calls.push(MixerCall::PlayMusic(loops, start_offset));
        self.busy = true;
        Ok(())
    }

    fn fadeout_music(&mut self, duration_ms: u32) -> Result<(), MixerError> {
        self.calls.push(MixerCall::FadeoutMusic(duration_ms));
        Ok(())
    }

    fn is_music_busy(&mut self) -> bool {
        self.queries += 1;
        self.busy
    }

    fn music_position_ms(&mut self) -> i64 {
        self.queries += 1;
        self.position_ms
    }

    fn set_music_volume(&mut self, volume: f32) -> Result<(), MixerError> {
        self.calls.push(MixerCall::SetMusicVolume(volume));
        if self.fail_volume {
            return Err(MixerError::Stream("scripted volume failure".into()));
        }
        Ok(())
    }

    fn load_sound(&mut self, name: &str, _bytes: Vec<u8>) -> Result<Self::Sound, MixerError> {
        self.calls.push(MixerCall::LoadSound(name.to_string()));
        if self.fail_load {
            return Err(MixerError::Stream("scripted load failure".into()));
        }
        Ok(name.to_string())
    }

    fn play_sound(&mut self, sound: &Self::Sound, extra_loops: u32) -> Result<(), MixerError> {
        self.calls.push(MixerCall::PlaySound(sound.clone(), extra_loops));
        Ok(())
    }
}

/// Asset store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn with_files(names: &[&str]) -> Self {
        Self {
            files: names
                .iter()
                .map(|name| (name.to_string(), name.as_bytes().to_vec()))
                .collect(),
        }
    }
}

impl AssetLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<Vec<u8>, AudioError> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| AudioError::NotFound(name.to_string()))
    }
}

/// Hardware volume register whose reading the test controls.
#[derive(Debug, Clone)]
pub struct ScriptedVolume {
    value: Rc<Cell<Option<u16>>>,
    reads: Rc<Cell<usize>>,
}

impl ScriptedVolume {
    pub fn new(raw: u16) -> Self {
        Self {
            value: Rc::new(Cell::new(Some(raw))),
            reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing() -> Self {
        let volume = Self::new(0);
        volume.set(None);
        volume
    }

    pub fn set(&self, raw: Option<u16>) {
        self.value.set(raw);
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl HardwareVolume for ScriptedVolume {
    fn read(&mut self) -> Result<u16, AudioError> {
        self.reads.set(self.reads.get() + 1);
        self.value
            .get()
            .ok_or_else(|| AudioError::HardwareVolume("scripted failure".into()))
    }
}
