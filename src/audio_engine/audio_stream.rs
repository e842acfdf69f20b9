//! Audio Stream Module
//!
//! This module handles CPAL audio stream management including:
//! - Output configuration negotiation
//! - Audio callback setup
//! - Real-time message processing and status publishing

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig};
use env_logger::{Builder, Env};
use std::sync::Arc;

use rtrb::{Producer, RingBuffer};

use crate::audio_engine::config::DeviceSettings;
use crate::audio_engine::constants::RING_CAPACITY;
use crate::audio_engine::errors::MixerError;
use crate::audio_engine::mixer::RtMixer;
use crate::messages::{ControlMessage, MusicStatus};

/// Handle to the audio stream with its control channel and status
pub struct AudioStreamHandle {
    pub stream: Stream,
    pub producer: Producer<ControlMessage>,
    pub status: Arc<MusicStatus>,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Setup and configure the logger for audio operations
pub fn setup_logger() {
    // Users can override via `RUST_LOG`, e.g. `RUST_LOG=debug` when troubleshooting.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// Opens the default output device and builds a stream for `settings`.
///
/// The requested rate and channel count are used when the device supports
/// them as f32 output; otherwise the device's default rate is used with the
/// requested channel count. A fixed buffer size the backend rejects is
/// retried with the backend default.
pub fn create_audio_stream(settings: &DeviceSettings) -> Result<AudioStreamHandle, MixerError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(MixerError::NoDevice)?;

    let config = choose_stream_config(&device, settings)?;

    log::info!(
        "Opening audio device... ({} ch@{} Hz, buffer {:?})",
        config.channels,
        config.sample_rate,
        config.buffer_size
    );

    let built = match build_stream(&device, &config) {
        Ok(built) => built,
        Err(err) if config.buffer_size != BufferSize::Default => {
            log::warn!("Fixed buffer size rejected ({err}), retrying with the device default");
            let config = StreamConfig {
                buffer_size: BufferSize::Default,
                ..config.clone()
            };
            build_stream(&device, &config)?
        }
        Err(err) => return Err(err),
    };
    let (stream, producer, status) = built;

    Ok(AudioStreamHandle {
        stream,
        producer,
        status,
        output_channels: usize::from(config.channels),
        output_sample_rate: config.sample_rate,
    })
}

fn choose_stream_config(
    device: &Device,
    settings: &DeviceSettings,
) -> Result<StreamConfig, MixerError> {
    let buffer_size = settings
        .buffer_size
        .map_or(BufferSize::Default, BufferSize::Fixed);

    let supported = device
        .supported_output_configs()
        .map_err(|err| MixerError::Stream(err.to_string()))?
        .any(|range| {
            range.channels() == settings.channels
                && range.sample_format() == SampleFormat::F32
                && range.min_sample_rate() <= settings.sample_rate
                && settings.sample_rate <= range.max_sample_rate()
        });

    if supported {
        return Ok(StreamConfig {
            channels: settings.channels,
            sample_rate: settings.sample_rate,
            buffer_size,
        });
    }

    let default = device
        .default_output_config()
        .map_err(|err| MixerError::Stream(err.to_string()))?;
    log::info!(
        "Device does not offer {} Hz, using its default of {} Hz",
        settings.sample_rate,
        default.sample_rate()
    );

    Ok(StreamConfig {
        channels: settings.channels,
        sample_rate: default.sample_rate(),
        buffer_size,
    })
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
) -> Result<(Stream, Producer<ControlMessage>, Arc<MusicStatus>), MixerError> {
    // Control side -> audio thread
    let (producer_in, mut consumer_in) = RingBuffer::new(RING_CAPACITY);

    // Audio thread -> control side
    let status = Arc::new(MusicStatus::default());
    let published = Arc::clone(&status);

    let mut mixer = RtMixer::new(usize::from(config.channels));

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                while let Ok(message) = consumer_in.pop() {
                    mixer.handle(message);
                }

                if let Some(message) = mixer.render(data) {
                    published.publish(&message);
                }
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|err| MixerError::Stream(err.to_string()))?;

    Ok((stream, producer_in, status))
}

/// Start playing the audio stream
pub fn start_stream(stream: &Stream) -> Result<(), MixerError> {
    stream
        .play()
        .map_err(|err| MixerError::Stream(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_setup() {
        // Multiple calls should be safe (though only the first takes effect)
        setup_logger();
        setup_logger();
    }

    #[test]
    fn test_audio_stream_creation() {
        // Actual stream creation requires audio hardware
        if cpal::default_host().default_output_device().is_none() {
            return;
        }

        // May still fail in sandboxed environments; it must not panic.
        if let Ok(handle) = create_audio_stream(&DeviceSettings::fallback()) {
            assert!(handle.output_channels >= 1);
            assert!(handle.output_sample_rate > 0);
        }
    }
}
