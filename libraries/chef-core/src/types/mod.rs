//! Domain types

mod audio;
mod audio_file;
mod preset;

pub use audio::{AudioBuffer, AudioFormat, SampleRate};
pub use audio_file::AudioFile;
pub use preset::{NameChangeMode, NameChangeParameters, Preset, PresetMetadata, Transformation};
