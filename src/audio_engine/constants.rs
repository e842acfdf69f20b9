//! Audio subsystem defaults and limits.

/// Default output sample rate requested from the device.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Requested sample format: signed 16 bit.
pub const DEFAULT_BIT_DEPTH: i8 = -16;

/// Number of output channels requested from the device.
pub const DEFAULT_CHANNELS: u16 = 2;

/// Device buffer size in frames, unless overridden by [`BUFFER_SIZE_ENV`].
pub const DEFAULT_BUFFER_SIZE: u32 = 4096;

/// Environment variable overriding the device buffer size.
pub const BUFFER_SIZE_ENV: &str = "SOUND_BUFSIZE";

/// Default music fadeout duration in seconds.
pub const DEFAULT_FADE_MUSIC: f32 = 0.0;

/// Full-scale reading of the hardware MIDI volume register.
pub const MIDI_VOLUME_MAX: u16 = 0xFFFF;

/// Minimum volume level (silence).
pub const VOLUME_MIN: f32 = 0.0;

/// Maximum volume level (100%).
pub const VOLUME_MAX: f32 = 1.0;

/// Maximum number of sound effects that can play simultaneously.
pub const MAX_VOICES: usize = 32;

/// Capacity of the control and status ring buffers.
pub const RING_CAPACITY: usize = 1024;
