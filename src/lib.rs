use pyo3::pymodule;

pub mod audio_engine;
pub mod messages;

/// The Python module implemented in Rust.
#[pymodule]
mod scene_audio {
    #[pymodule_export]
    use super::audio_engine::AudioEngine;
}
