//! MIDI volume compensation.
//!
//! On some platforms MIDI output goes through a hardware/driver volume register
//! that the mixer gain does not control. The register cannot be written, only
//! read, so the compensator reads it once, derives the ratio between it and the
//! logical master volume, and scales later volume commands for MIDI tracks by
//! that ratio.

use crate::audio_engine::constants::MIDI_VOLUME_MAX;
use crate::audio_engine::errors::AudioError;
use crate::audio_engine::track::TrackKind;

/// Read access to the OS MIDI volume register.
pub trait HardwareVolume {
    /// Current register value in `0..=0xFFFF`.
    fn read(&mut self) -> Result<u16, AudioError>;
}

/// Which compensator was wired in at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformMode {
    NativeMidiControl,
    Fallback,
}

/// Returns the first successful reading among `count` devices.
///
/// Only the low word (left channel) of a reading is kept.
pub fn read_first_device(
    count: u32,
    mut read: impl FnMut(u32) -> Option<u32>,
) -> Result<u16, AudioError> {
    for device in 0..count {
        if let Some(raw) = read(device) {
            return Ok((raw & u32::from(MIDI_VOLUME_MAX)) as u16);
        }
    }

    log::warn!("Couldn't read raw midi volume from {count} device(s).");
    Err(AudioError::HardwareVolume(format!(
        "no readable MIDI output among {count} device(s)"
    )))
}

#[cfg(windows)]
mod winmm {
    #[link(name = "winmm")]
    unsafe extern "system" {
        pub fn midiOutGetNumDevs() -> u32;
        pub fn midiOutGetVolume(hmo: isize, pdw_volume: *mut u32) -> u32;
    }
}

/// Reads the MIDI output volume through winmm.
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct WinMmVolume;

#[cfg(windows)]
impl HardwareVolume for WinMmVolume {
    fn read(&mut self) -> Result<u16, AudioError> {
        // SAFETY: takes no arguments and only queries the device table.
        let count = unsafe { winmm::midiOutGetNumDevs() };
        read_first_device(count, |device| {
            let mut volume = 0u32;
            // SAFETY: a device id is accepted in place of an open handle, and
            // `volume` outlives the call.
            let rv = unsafe { winmm::midiOutGetVolume(device as isize, &mut volume) };
            (rv == 0).then_some(volume)
        })
    }
}

/// The hardware MIDI register of this platform, if it has one with devices.
#[cfg(windows)]
pub fn platform_hardware_volume() -> Option<Box<dyn HardwareVolume>> {
    // SAFETY: see `WinMmVolume::read`.
    if unsafe { winmm::midiOutGetNumDevs() } == 0 {
        return None;
    }
    Some(Box::new(WinMmVolume))
}

/// The hardware MIDI register of this platform, if it has one with devices.
#[cfg(not(windows))]
pub fn platform_hardware_volume() -> Option<Box<dyn HardwareVolume>> {
    None
}

/// Compensator wired to a readable hardware register.
pub struct NativeCompensator {
    source: Box<dyn HardwareVolume>,
    scale_factor: f32,
    last_observed: Option<u16>,
}

impl NativeCompensator {
    fn new(source: Box<dyn HardwareVolume>) -> Self {
        Self {
            source,
            scale_factor: 0.0,
            last_observed: None,
        }
    }

    fn recompute(&mut self, master_volume: f32, fading: bool, kind: TrackKind) -> bool {
        // The register drifts on its own while a fade is running.
        if fading || kind != TrackKind::Midi {
            return false;
        }

        let raw = match self.source.read() {
            Ok(raw) => raw,
            Err(err) => {
                log::debug!("Keeping MIDI scale factor {}: {err}", self.scale_factor);
                return false;
            }
        };

        if self.last_observed == Some(raw) {
            return true;
        }

        if master_volume <= 0.0 {
            return false;
        }

        self.last_observed = Some(raw);
        let mix_fraction = f32::from(raw) / f32::from(MIDI_VOLUME_MAX);
        self.scale_factor = mix_fraction / master_volume;
        log::debug!("MIDI scale factor is now {}", self.scale_factor);
        true
    }

    fn refresh(&mut self) {
        self.last_observed = self.source.read().ok();
    }
}

/// Strategy chosen once at startup.
pub enum MidiCompensator {
    Native(NativeCompensator),
    Noop,
}

impl Default for MidiCompensator {
    fn default() -> Self {
        Self::Noop
    }
}

impl std::fmt::Debug for MidiCompensator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native(native) => f
                .debug_struct("Native")
                .field("scale_factor", &native.scale_factor)
                .field("last_observed", &native.last_observed)
                .finish(),
            Self::Noop => f.write_str("Noop"),
        }
    }
}

impl MidiCompensator {
    /// Wires in the native compensator if `source` yields an initial factor.
    ///
    /// Anything less leaves a fully inert [`MidiCompensator::Noop`].
    pub fn probe(source: Option<Box<dyn HardwareVolume>>, master_volume: f32) -> Self {
        let Some(source) = source else {
            log::info!("No MIDI volume control on this platform.");
            return Self::Noop;
        };

        let mut native = NativeCompensator::new(source);
        if native.recompute(master_volume, false, TrackKind::Midi) {
            log::info!("MIDI volume compensation enabled (factor {}).", native.scale_factor);
            Self::Native(native)
        } else {
            log::warn!("Couldn't initialize MIDI volume compensation, falling back.");
            Self::Noop
        }
    }

    pub fn mode(&self) -> PlatformMode {
        match self {
            Self::Native(_) => PlatformMode::NativeMidiControl,
            Self::Noop => PlatformMode::Fallback,
        }
    }

    /// Recomputes the scale factor from a fresh register read.
    ///
    /// Returns `false` when skipped (fading, non-MIDI track, no compensation)
    /// or when the read failed; the previous factor is kept.
    pub fn recompute(&mut self, master_volume: f32, fading: bool, kind: TrackKind) -> bool {
        match self {
            Self::Native(native) => native.recompute(master_volume, fading, kind),
            Self::Noop => false,
        }
    }

    /// Volume to hand to the mixer for a logical `volume`.
    pub fn effective_volume(&self, volume: f32, kind: TrackKind) -> f32 {
        match self {
            Self::Native(native) if kind == TrackKind::Midi => {
                (volume * native.scale_factor).min(1.0)
            }
            _ => volume,
        }
    }

    /// Re-reads the register after a volume change, best effort.
    pub fn refresh(&mut self) {
        if let Self::Native(native) = self {
            native.refresh();
        }
    }

    pub fn scale_factor(&self) -> Option<f32> {
        match self {
            Self::Native(native) => Some(native.scale_factor),
            Self::Noop => None,
        }
    }
}
