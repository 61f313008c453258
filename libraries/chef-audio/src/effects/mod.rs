//! Audio effects
//!
//! Trait-based effect chain for batch processing. All effects operate on
//! interleaved stereo f32 samples in the [-1.0, 1.0] range.
//!
//! Available effects:
//! - **Gain**: fixed gain in dB
//! - **Compressor**: dynamic range compressor
//! - **Limiter**: brick-wall limiter
//! - **HighpassFilter** / **LowpassFilter**: Butterworth sections
//! - **Reverb**: Schroeder/Freeverb network

mod chain;
mod compressor;
mod filter;
mod gain;
mod limiter;
mod reverb;

pub use chain::{AudioEffect, EffectChain};
pub use compressor::{Compressor, CompressorSettings};
pub use filter::{HighpassFilter, HighpassSettings, LowpassFilter, LowpassSettings};
pub use gain::{Gain, GainSettings};
pub use limiter::{Limiter, LimiterSettings};
pub use reverb::{Reverb, ReverbSettings};
