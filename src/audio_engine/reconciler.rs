//! Drives the physically playing music towards the engine's selection.
//!
//! There is no completion callback from the device: a pass has to be run after
//! every change to the selection or preferences, and once per frame so that a
//! finished fadeout is noticed.

use crate::audio_engine::capability::{AssetLoader, Mixer};
use crate::audio_engine::errors::AudioError;
use crate::audio_engine::track::MusicSelection;
use crate::audio_engine::volume::VolumeController;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReconcilerState {
    /// No track believed playing.
    #[default]
    Idle,
    Playing(MusicSelection),
    FadingOut(MusicSelection),
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Nothing to do, or waiting for the device.
    None,
    /// A fadeout was issued for the previous track.
    FadeOut(MusicSelection),
    /// A track was loaded and started.
    Start(MusicSelection),
    /// A finished fadeout was observed.
    Settled,
}

#[derive(Debug, Default)]
pub struct MusicReconciler {
    current: Option<MusicSelection>,
    state: ReconcilerState,
    fade_ms: u32,
}

impl MusicReconciler {
    pub fn new(fade_ms: u32) -> Self {
        Self {
            current: None,
            state: ReconcilerState::Idle,
            fade_ms,
        }
    }

    pub fn current(&self) -> Option<&MusicSelection> {
        self.current.as_ref()
    }

    pub fn state(&self) -> &ReconcilerState {
        &self.state
    }

    /// Forgets the playing track after the device was released.
    pub fn device_released(&mut self, volume: &mut VolumeController) {
        self.current = None;
        self.state = ReconcilerState::Idle;
        volume.set_fading(false);
    }

    /// Runs one pass towards `wanted`.
    ///
    /// On a failed load or play the belief stays `None`, so the next pass
    /// retries.
    pub fn reconcile<M: Mixer>(
        &mut self,
        wanted: Option<&MusicSelection>,
        mixer: &mut M,
        assets: &dyn AssetLoader,
        volume: &mut VolumeController,
    ) -> Result<Transition, AudioError> {
        if self.current.as_ref() == wanted {
            return Ok(self.settle_fadeout(mixer, volume));
        }

        // The new track starts on a later pass, once the fadeout has finished.
        if let Some(previous) = self.current.take() {
            log::info!("Fading out music {:?} over {} ms", previous.filename, self.fade_ms);
            self.state = ReconcilerState::FadingOut(previous.clone());
            mixer.fadeout_music(self.fade_ms)?;
            volume.set_fading(true);
            return Ok(Transition::FadeOut(previous));
        }

        if mixer.is_music_busy() {
            return Ok(Transition::None);
        }

        let Some(wanted) = wanted else {
            self.state = ReconcilerState::Idle;
            return Ok(Transition::None);
        };

        volume.set_fading(false);
        volume.set_track_kind(wanted.kind());
        self.state = ReconcilerState::Idle;

        let bytes = assets.load(&wanted.filename)?;
        mixer.load_music(&wanted.filename, bytes)?;
        mixer.play_music(wanted.loops, wanted.start_offset)?;

        log::info!(
            "Playing music {:?} (loops {}, from {}s)",
            wanted.filename,
            wanted.loops,
            wanted.start_offset
        );
        self.current = Some(wanted.clone());
        self.state = ReconcilerState::Playing(wanted.clone());

        volume.apply(mixer)?;
        Ok(Transition::Start(wanted.clone()))
    }

    fn settle_fadeout<M: Mixer>(
        &mut self,
        mixer: &mut M,
        volume: &mut VolumeController,
    ) -> Transition {
        if !matches!(self.state, ReconcilerState::FadingOut(_)) || mixer.is_music_busy() {
            return Transition::None;
        }

        self.state = ReconcilerState::Idle;
        volume.set_fading(false);
        Transition::Settled
    }
}
