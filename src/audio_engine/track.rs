//! Music selection and track-kind detection.

/// A music track the engine wants playing.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicSelection {
    /// Asset name, relative to the base path.
    pub filename: String,

    /// Extra repetitions after the first play; negative loops forever.
    pub loops: i32,

    /// Seconds into the track where playback starts.
    pub start_offset: f64,
}

impl MusicSelection {
    pub fn new(filename: impl Into<String>, loops: i32, start_offset: f64) -> Self {
        Self {
            filename: filename.into(),
            loops,
            start_offset,
        }
    }

    pub fn kind(&self) -> TrackKind {
        detect_kind(&self.filename)
    }
}

/// How a music track reaches the speakers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackKind {
    /// Mixed digitally through the mixer gain.
    #[default]
    Waveform,

    /// Rendered by a MIDI device with its own hardware volume register.
    Midi,
}

/// Classifies a filename by its extension (`.mid`/`.midi`, any case).
pub fn detect_kind(filename: &str) -> TrackKind {
    let lower = filename.to_lowercase();
    if lower.ends_with(".mid") || lower.ends_with(".midi") {
        TrackKind::Midi
    } else {
        TrackKind::Waveform
    }
}
