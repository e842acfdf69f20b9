//! Audio-specific error types.

use thiserror::Error;

/// Errors that can occur while decoding audio data into sample buffers.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    /// Failed to decode the audio data.
    #[error("failed to decode audio data: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// Failed to create resampler.
    #[error("failed to create resampler: {0}")]
    ResamplerConstruction(#[from] rubato::ResamplerConstructionError),

    /// Failed to resample audio.
    #[error("failed to resample audio: {0}")]
    Resample(#[from] rubato::ResampleError),

    /// Audio data has no default track.
    #[error("audio data has no default track")]
    NoDefaultTrack,

    /// Audio data is missing sample rate information.
    #[error("audio data is missing a sample rate")]
    MissingSampleRate,

    /// Audio data is missing channel information.
    #[error("audio data is missing channel information")]
    MissingChannels,

    /// Unsupported channel mapping configuration.
    #[error(
        "unsupported channel mapping: file has {file_channels} channels, output has {output_channels} channels (only mono↔stereo supported)"
    )]
    UnsupportedChannels {
        /// Number of channels in the source file.
        file_channels: usize,
        /// Number of channels expected for output.
        output_channels: usize,
    },
}

/// Failures reported by a [`Mixer`](crate::audio_engine::capability::Mixer).
#[derive(Debug, Error)]
pub enum MixerError {
    /// The device has not been opened, or was closed.
    #[error("mixer device is not open")]
    NotOpen,

    /// No output device is available.
    #[error("no audio output device found")]
    NoDevice,

    /// The output stream could not be configured, built or started.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// `play_music` was called before any music was loaded.
    #[error("no music loaded")]
    NoMusicLoaded,

    /// The control ring buffer is full.
    #[error("failed to send {0} - buffer may be full")]
    QueueFull(&'static str),

    /// Music or sound data could not be decoded.
    #[error(transparent)]
    Load(#[from] SampleLoadError),

    /// The requested device settings cannot be honoured.
    #[error("unsupported device settings: {0}")]
    UnsupportedSettings(String),
}

/// Errors surfaced by the audio subsystem.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The initial device probe failed; the subsystem is permanently silent.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(#[source] MixerError),

    /// A single mixer call failed.
    #[error("mixer failure: {0}")]
    Mixer(#[from] MixerError),

    /// The hardware MIDI volume register could not be read.
    #[error("couldn't read hardware MIDI volume: {0}")]
    HardwareVolume(String),

    /// An asset could not be found.
    #[error("file not found: {0}")]
    NotFound(String),

    /// An asset could not be read.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// A volume outside `0.0..=1.0` (or not finite) was requested.
    #[error("volume out of range: {0}")]
    VolumeOutOfRange(f32),
}

impl AudioError {
    /// Whether this failure belongs to the call that requested it rather than
    /// to the device.
    pub fn is_call_local(&self) -> bool {
        matches!(self, AudioError::NotFound(_) | AudioError::VolumeOutOfRange(_))
    }
}
