//! Master music volume and its translation into device volume.

use crate::audio_engine::capability::Mixer;
use crate::audio_engine::constants::{VOLUME_MAX, VOLUME_MIN};
use crate::audio_engine::errors::AudioError;
use crate::audio_engine::midi::{MidiCompensator, PlatformMode};
use crate::audio_engine::track::TrackKind;

/// Owns the logical master music volume.
#[derive(Debug)]
pub struct VolumeController {
    master_volume: f32,
    fading: bool,
    track_kind: TrackKind,
    compensator: MidiCompensator,
}

impl Default for VolumeController {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeController {
    pub fn new() -> Self {
        Self {
            master_volume: VOLUME_MAX,
            fading: false,
            track_kind: TrackKind::Waveform,
            compensator: MidiCompensator::Noop,
        }
    }

    pub fn install(&mut self, compensator: MidiCompensator) {
        log::info!("Music volume control mode: {:?}", compensator.mode());
        self.compensator = compensator;
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn set_fading(&mut self, fading: bool) {
        self.fading = fading;
    }

    pub fn track_kind(&self) -> TrackKind {
        self.track_kind
    }

    pub fn set_track_kind(&mut self, kind: TrackKind) {
        self.track_kind = kind;
    }

    pub fn platform_mode(&self) -> PlatformMode {
        self.compensator.mode()
    }

    pub fn midi_scale_factor(&self) -> Option<f32> {
        self.compensator.scale_factor()
    }

    /// Opportunistic recompute of the MIDI scale factor.
    pub fn recompute_midi_scale(&mut self) -> bool {
        self.compensator
            .recompute(self.master_volume, self.fading, self.track_kind)
    }

    /// Device volume for the current track at master volume `volume`.
    pub fn effective_volume(&self, volume: f32) -> f32 {
        self.compensator
            .effective_volume(volume, self.track_kind)
            .clamp(VOLUME_MIN, VOLUME_MAX)
    }

    /// Stores `volume` as the master volume and forwards it to the mixer.
    ///
    /// The master volume is updated even when the mixer call fails.
    pub fn set_music_volume<M: Mixer>(
        &mut self,
        mixer: &mut M,
        volume: f32,
    ) -> Result<(), AudioError> {
        self.store(volume)?;
        let result = mixer.set_music_volume(self.effective_volume(volume));
        self.compensator.refresh();
        result.map_err(AudioError::from)
    }

    /// Stores `volume` as the master volume without touching the device.
    pub fn store(&mut self, volume: f32) -> Result<(), AudioError> {
        if !volume.is_finite() || !(VOLUME_MIN..=VOLUME_MAX).contains(&volume) {
            return Err(AudioError::VolumeOutOfRange(volume));
        }

        self.master_volume = volume;
        Ok(())
    }

    /// Sends the current master volume to the mixer again.
    pub fn apply<M: Mixer>(&mut self, mixer: &mut M) -> Result<(), AudioError> {
        self.set_music_volume(mixer, self.master_volume)
    }
}
