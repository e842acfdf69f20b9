//! Subsystem configuration and the failure policy derived from it.

use std::path::PathBuf;

use crate::audio_engine::constants::{
    BUFFER_SIZE_ENV, DEFAULT_BIT_DEPTH, DEFAULT_BUFFER_SIZE, DEFAULT_CHANNELS, DEFAULT_FADE_MUSIC,
    DEFAULT_SAMPLE_RATE,
};
use crate::audio_engine::errors::AudioError;

/// Read-only configuration consumed by the audio subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,

    /// Music fadeout duration in seconds.
    pub fade_music: f32,

    /// Surface transient failures to the caller instead of logging them.
    pub debug_sound: bool,

    /// Directory assets are resolved against.
    pub base_path: PathBuf,

    /// Device buffer size in frames.
    pub buffer_size: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fade_music: DEFAULT_FADE_MUSIC,
            debug_sound: false,
            base_path: PathBuf::from("."),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl AudioConfig {
    /// Applies the buffer size override from the environment.
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(BUFFER_SIZE_ENV).ok();
        self.with_buffer_size_override(value.as_deref())
    }

    fn with_buffer_size_override(mut self, value: Option<&str>) -> Self {
        let Some(value) = value else {
            return self;
        };

        match value.trim().parse::<u32>() {
            Ok(size) if size > 0 => self.buffer_size = size,
            _ => log::warn!("Ignoring invalid {BUFFER_SIZE_ENV}={value:?}"),
        }
        self
    }

    /// Fadeout duration in device time units (milliseconds).
    pub fn fade_music_ms(&self) -> u32 {
        if !self.fade_music.is_finite() || self.fade_music <= 0.0 {
            return 0;
        }
        (self.fade_music * 1000.0) as u32
    }

    /// Error policy selected by the debug flag.
    pub fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy {
            surface_errors: self.debug_sound,
        }
    }
}

/// Parameters handed to [`Mixer::pre_init`](crate::audio_engine::capability::Mixer::pre_init).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    pub sample_rate: u32,
    /// Negative values denote signed samples. Advisory only: the device
    /// stream always renders f32, so this is validated but never selects the
    /// sample format.
    pub bit_depth: i8,
    pub channels: u16,
    /// `None` lets the device choose.
    pub buffer_size: Option<u32>,
}

impl DeviceSettings {
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            bit_depth: DEFAULT_BIT_DEPTH,
            channels: DEFAULT_CHANNELS,
            buffer_size: Some(config.buffer_size),
        }
    }

    /// Settings used when the configured ones are rejected.
    pub fn fallback() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
            channels: DEFAULT_CHANNELS,
            buffer_size: None,
        }
    }
}

/// Decides whether a failure reaches the caller or is logged and dropped.
///
/// In production every device-level failure is swallowed so the host keeps
/// running; with `debug_sound` set they are returned for diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    surface_errors: bool,
}

impl ErrorPolicy {
    pub fn new(surface_errors: bool) -> Self {
        Self { surface_errors }
    }

    pub fn surfaces_errors(&self) -> bool {
        self.surface_errors
    }

    /// Settles the outcome of an operation the caller asked for.
    ///
    /// Call-local failures (missing asset, bad argument) are always returned.
    pub fn on_request<T>(
        &self,
        context: &str,
        result: Result<T, AudioError>,
    ) -> Result<Option<T>, AudioError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.surface_errors || err.is_call_local() => Err(err),
            Err(err) => {
                log::warn!("Error while trying to {context}: {err}");
                Ok(None)
            }
        }
    }

    /// Settles the outcome of a polled reconciliation pass.
    pub fn on_tick<T>(
        &self,
        context: &str,
        result: Result<T, AudioError>,
    ) -> Result<Option<T>, AudioError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.surface_errors => Err(err),
            Err(err) => {
                log::warn!("Error while trying to {context}: {err}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::errors::MixerError;

    #[test]
    fn test_default_config() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.buffer_size, 4096);
        assert!(!config.debug_sound);
        assert_eq!(config.fade_music_ms(), 0);
    }

    #[test]
    fn test_buffer_size_override() {
        let config = AudioConfig::default().with_buffer_size_override(Some("2048"));
        assert_eq!(config.buffer_size, 2048);
    }

    #[test]
    fn test_invalid_buffer_size_override_is_ignored() {
        let config = AudioConfig::default().with_buffer_size_override(Some("lots"));
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);

        let config = AudioConfig::default().with_buffer_size_override(Some("0"));
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);

        let config = AudioConfig::default().with_buffer_size_override(None);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_fade_music_ms() {
        let config = AudioConfig {
            fade_music: 1.5,
            ..AudioConfig::default()
        };
        assert_eq!(config.fade_music_ms(), 1500);

        let config = AudioConfig {
            fade_music: -2.0,
            ..AudioConfig::default()
        };
        assert_eq!(config.fade_music_ms(), 0);
    }

    #[test]
    fn test_device_settings_from_config() {
        let config = AudioConfig {
            sample_rate: 22_050,
            buffer_size: 1024,
            ..AudioConfig::default()
        };
        let settings = DeviceSettings::from_config(&config);
        assert_eq!(settings.sample_rate, 22_050);
        assert_eq!(settings.bit_depth, -16);
        assert_eq!(settings.channels, 2);
        assert_eq!(settings.buffer_size, Some(1024));
        assert_eq!(DeviceSettings::fallback().buffer_size, None);
    }

    #[test]
    fn test_production_policy_swallows_mixer_failures() {
        let policy = ErrorPolicy::new(false);
        let result: Result<(), AudioError> = Err(MixerError::NotOpen.into());
        assert!(matches!(policy.on_request("play music", result), Ok(None)));

        let result: Result<(), AudioError> = Err(MixerError::NotOpen.into());
        assert!(matches!(policy.on_tick("play music", result), Ok(None)));
    }

    #[test]
    fn test_production_policy_returns_call_local_failures_on_request() {
        let policy = ErrorPolicy::new(false);
        let result: Result<(), AudioError> = Err(AudioError::NotFound("a.ogg".into()));
        assert!(matches!(
            policy.on_request("play music", result),
            Err(AudioError::NotFound(_))
        ));

        let result: Result<(), AudioError> = Err(AudioError::NotFound("a.ogg".into()));
        assert!(matches!(policy.on_tick("play music", result), Ok(None)));
    }

    #[test]
    fn test_debug_policy_surfaces_everything() {
        let policy = AudioConfig {
            debug_sound: true,
            ..AudioConfig::default()
        }
        .error_policy();
        assert!(policy.surfaces_errors());

        let result: Result<(), AudioError> = Err(MixerError::NoDevice.into());
        assert!(policy.on_tick("restore music", result).is_err());
        assert!(matches!(policy.on_request("x", Ok::<_, AudioError>(3)), Ok(Some(3))));
    }
}
