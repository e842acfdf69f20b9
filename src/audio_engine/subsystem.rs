//! The audio subsystem: music reconciliation, sound effects, volume and the
//! device gate, behind one owned object.
//!
//! Every operation is a silent no-op until [`AudioSubsystem::init`] has found a
//! working device, and forever after it found a broken one.

use crate::audio_engine::capability::{AssetLoader, EngineContext, Mixer};
use crate::audio_engine::config::{AudioConfig, DeviceSettings, ErrorPolicy};
use crate::audio_engine::errors::AudioError;
use crate::audio_engine::midi::{self, HardwareVolume, MidiCompensator, PlatformMode};
use crate::audio_engine::reconciler::{MusicReconciler, ReconcilerState, Transition};
use crate::audio_engine::sound;
use crate::audio_engine::track::MusicSelection;
use crate::audio_engine::volume::VolumeController;

/// Outcome of the startup device probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixerStatus {
    #[default]
    Unknown,
    Working,
    Broken,
}

pub struct AudioSubsystem<M: Mixer> {
    mixer: M,
    assets: Box<dyn AssetLoader>,
    config: AudioConfig,
    policy: ErrorPolicy,
    status: MixerStatus,
    enabled: bool,
    volume: VolumeController,
    reconciler: MusicReconciler,
}

impl<M: Mixer> AudioSubsystem<M> {
    pub fn new(mixer: M, assets: Box<dyn AssetLoader>, config: AudioConfig) -> Self {
        let policy = config.error_policy();
        let reconciler = MusicReconciler::new(config.fade_music_ms());
        Self {
            mixer,
            assets,
            config,
            policy,
            status: MixerStatus::Unknown,
            enabled: true,
            volume: VolumeController::new(),
            reconciler,
        }
    }

    /// Configures the device before it is opened.
    ///
    /// Falls back to device-chosen settings if the configured ones are refused.
    pub fn pre_init(&mut self) -> Result<(), AudioError> {
        let settings = DeviceSettings::from_config(&self.config);
        let result = self.mixer.pre_init(&settings).or_else(|err| {
            log::warn!("Mixer refused {settings:?} ({err}), retrying with defaults.");
            self.mixer.pre_init(&DeviceSettings::fallback())
        });
        self.policy
            .on_tick("configure the mixer", result.map_err(AudioError::from))?;
        Ok(())
    }

    /// Probes the device once, using this platform's MIDI volume register.
    pub fn init(&mut self) -> Result<(), AudioError> {
        self.init_with_hardware(midi::platform_hardware_volume())
    }

    /// Probes the device once, compensating MIDI volume through `hardware`.
    pub fn init_with_hardware(
        &mut self,
        hardware: Option<Box<dyn HardwareVolume>>,
    ) -> Result<(), AudioError> {
        if self.status != MixerStatus::Unknown {
            return Ok(());
        }

        if let Err(err) = self.mixer.open() {
            self.status = MixerStatus::Broken;
            log::warn!("Audio disabled: {err}");
            if self.policy.surfaces_errors() {
                return Err(AudioError::DeviceUnavailable(err));
            }
            return Ok(());
        }

        self.status = MixerStatus::Working;
        log::info!("Audio device ready.");

        let compensator = MidiCompensator::probe(hardware, self.volume.master_volume());
        self.volume.install(compensator);
        Ok(())
    }

    fn is_working(&self) -> bool {
        self.status == MixerStatus::Working
    }

    /// Selects `filename` and reconciles.
    ///
    /// Always restarts playback from `start_offset`, even when the same track
    /// is already selected; rollback and load rely on that.
    pub fn start_music<C: EngineContext>(
        &mut self,
        context: &mut C,
        filename: &str,
        loops: i32,
        start_offset: f64,
    ) -> Result<(), AudioError> {
        if !self.is_working() {
            return Ok(());
        }

        self.stop_music(context)?;
        context.set_music_selection(Some(MusicSelection::new(filename, loops, start_offset)));
        let result = self.reconcile(&*context);
        self.policy.on_request("play music", result)?;
        Ok(())
    }

    /// Clears the selection and reconciles, fading out the current track.
    pub fn stop_music<C: EngineContext>(&mut self, context: &mut C) -> Result<(), AudioError> {
        if !self.is_working() {
            return Ok(());
        }

        context.set_music_selection(None);
        let result = self.reconcile(&*context);
        self.policy.on_request("stop music", result)?;
        Ok(())
    }

    /// One reconciliation pass. Call after every change to the selection or
    /// preferences, and once per frame.
    pub fn restore_music<C: EngineContext>(&mut self, context: &C) -> Result<(), AudioError> {
        if !self.is_working() {
            return Ok(());
        }

        let result = self.reconcile(context);
        self.policy.on_tick("restore music", result)?;
        Ok(())
    }

    fn reconcile<C: EngineContext>(&mut self, context: &C) -> Result<Transition, AudioError> {
        self.volume.recompute_midi_scale();

        if !self.enabled {
            return Ok(Transition::None);
        }

        let wanted = if context.prefers_music() {
            context.music_selection()
        } else {
            None
        };

        self.reconciler.reconcile(
            wanted.as_ref(),
            &mut self.mixer,
            self.assets.as_ref(),
            &mut self.volume,
        )
    }

    /// Seconds until the music has been playing for `offset` seconds; negative
    /// once that point has passed, `None` when nothing is playing.
    pub fn music_delay(&mut self, offset: f64) -> Option<f64> {
        if !self.is_working() || !self.enabled {
            return None;
        }

        let position_ms = self.mixer.music_position_ms();
        if position_ms < 0 {
            return None;
        }

        Some(offset - position_ms as f64 / 1000.0)
    }

    /// Plays a one-shot sound effect, if sound is wanted.
    pub fn play_sound<C: EngineContext>(
        &mut self,
        context: &C,
        filename: &str,
        extra_loops: u32,
    ) -> Result<(), AudioError> {
        if !self.is_working() || !self.enabled || filename.is_empty() || !context.prefers_sound() {
            return Ok(());
        }

        let result = sound::play_sound(
            &mut self.mixer,
            self.assets.as_ref(),
            filename,
            extra_loops,
        );
        self.policy.on_request("play sound", result)?;
        Ok(())
    }

    /// Sets the master music volume (`0.0..=1.0`).
    ///
    /// While the device is disabled only the logical volume is stored.
    pub fn set_music_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        if !self.is_working() {
            return Ok(());
        }

        self.volume.recompute_midi_scale();

        if !self.enabled {
            // Re-applied by the next track start.
            return self.volume.store(volume);
        }

        let result = self.volume.set_music_volume(&mut self.mixer, volume);
        self.policy.on_request("set music volume", result)?;
        Ok(())
    }

    /// Releases the device so another subsystem (video playback) can own it.
    ///
    /// The subsystem counts as disabled afterwards even if the release failed.
    pub fn disable(&mut self) -> Result<(), AudioError> {
        if !self.is_working() || !self.enabled {
            return Ok(());
        }

        let result = self.mixer.close();
        self.enabled = false;
        self.reconciler.device_released(&mut self.volume);
        log::info!("Audio device released.");
        self.policy
            .on_request("disable the mixer", result.map_err(AudioError::from))?;
        Ok(())
    }

    /// Re-acquires the device after [`AudioSubsystem::disable`].
    ///
    /// The selected music restarts on the next reconciliation pass.
    pub fn enable(&mut self) -> Result<(), AudioError> {
        if !self.is_working() || self.enabled {
            return Ok(());
        }

        let result = self.mixer.open();
        self.enabled = true;
        log::info!("Audio device re-acquired.");
        self.policy
            .on_request("enable the mixer", result.map_err(AudioError::from))?;
        Ok(())
    }

    /// Releases the device at engine shutdown.
    pub fn shutdown(&mut self) -> Result<(), AudioError> {
        self.disable()
    }

    pub fn status(&self) -> MixerStatus {
        self.status
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> &ReconcilerState {
        self.reconciler.state()
    }

    /// The track believed to be loaded and playing.
    pub fn current_music(&self) -> Option<&MusicSelection> {
        self.reconciler.current()
    }

    pub fn master_music_volume(&self) -> f32 {
        self.volume.master_volume()
    }

    pub fn platform_mode(&self) -> PlatformMode {
        self.volume.platform_mode()
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut M {
        &mut self.mixer
    }
}
