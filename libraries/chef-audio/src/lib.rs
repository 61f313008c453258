//! AudioChef Audio
//!
//! Decoding, encoding, and the effect toolbox.
//!
//! This crate provides:
//! - Full-file decoding via Symphonia (WAV, FLAC, MP3, OGG, AAC, M4A) to the
//!   normalized intermediate: interleaved stereo f32 at native sample rate
//! - WAV encoding via hound
//! - Built-in effects and the registry that builds them by name from bound
//!   JSON parameters
//!
//! # Example: Decoding and Processing
//!
//! ```rust,no_run
//! use chef_audio::effects::EffectChain;
//! use chef_audio::registry::{EffectParams, EffectRegistry};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), chef_audio::AudioError> {
//! let mut buffer = chef_audio::decoder::decode(Path::new("/music/take.flac"))?;
//!
//! let registry = EffectRegistry::with_builtin_effects();
//! let mut chain = EffectChain::new();
//! chain.add_effect(registry.create("Reverb", &EffectParams::new())?);
//!
//! let sample_rate = buffer.format.sample_rate.as_hz();
//! chain.process(&mut buffer.samples, sample_rate);
//!
//! chef_audio::encoder::encode(&buffer, Path::new("/music/take.wav"))?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod effects;
pub mod encoder;
mod error;
pub mod formats;
pub mod registry;

pub use error::{AudioError, Result};
pub use formats::{AudioFormatSupport, SUPPORTED_AUDIO_FORMATS};
pub use registry::{EffectParams, EffectRegistry};
