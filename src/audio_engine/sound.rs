//! One-shot sound effects.
//!
//! Once started, a sound effect cannot be stopped, paused or re-levelled; no
//! handle is kept.

use crate::audio_engine::capability::{AssetLoader, Mixer};
use crate::audio_engine::errors::AudioError;

/// Loads `filename` and starts it immediately, `extra_loops` more times after
/// the first play.
pub fn play_sound<M: Mixer>(
    mixer: &mut M,
    assets: &dyn AssetLoader,
    filename: &str,
    extra_loops: u32,
) -> Result<(), AudioError> {
    let bytes = assets.load(filename)?;
    let sound = mixer.load_sound(filename, bytes)?;
    mixer.play_sound(&sound, extra_loops)?;
    log::debug!("Playing sound {filename:?} (extra loops {extra_loops})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::test_support::{MemoryLoader, MixerCall, RecordingMixer};

    #[test]
    fn test_play_sound() {
        let mut mixer = RecordingMixer::default();
        let assets = MemoryLoader::with_files(&["click.wav"]);

        play_sound(&mut mixer, &assets, "click.wav", 2).unwrap();
        assert_eq!(
            mixer.calls,
            vec![
                MixerCall::LoadSound("click.wav".into()),
                MixerCall::PlaySound("click.wav".into(), 2),
            ]
        );
    }

    #[test]
    fn test_play_missing_sound() {
        let mut mixer = RecordingMixer::default();
        let assets = MemoryLoader::default();

        let result = play_sound(&mut mixer, &assets, "click.wav", 0);
        assert!(matches!(result, Err(AudioError::NotFound(_))));
        assert!(mixer.calls.is_empty());
    }

    #[test]
    fn test_decode_failure_does_not_play() {
        let mut mixer = RecordingMixer::default();
        mixer.fail_load = true;
        let assets = MemoryLoader::with_files(&["click.wav"]);

        assert!(matches!(
            play_sound(&mut mixer, &assets, "click.wav", 0),
            Err(AudioError::Mixer(_))
        ));
        assert_eq!(mixer.count(|c| matches!(c, MixerCall::PlaySound(..))), 0);
    }
}
