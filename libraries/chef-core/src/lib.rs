//! AudioChef Core
//!
//! Domain types, the reactive state store, and error handling shared by every
//! AudioChef crate.
//!
//! This crate defines:
//! - **Domain Types**: `Preset`, `Transformation`, `NameChangeParameters`,
//!   `AudioFile`, `AudioBuffer`
//! - **State Store**: a key/value context with synchronous watchers and
//!   reducers, used to propagate preset updates through the UI
//! - **Error Handling**: unified `ChefError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use chef_core::{NameChangeMode, NameChangeParameters, Preset, Transformation};
//!
//! let rename = NameChangeParameters::replace("take", "mix");
//! assert_eq!(rename.change_name("take_01"), "mix_01");
//!
//! let preset = Preset {
//!     ext: "wav".to_string(),
//!     transformations: vec![Transformation::named("Gain")],
//!     name_change_parameters: rename,
//! };
//! assert_eq!(preset.transformations.len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod state;
pub mod types;

pub use error::{ChefError, Result};
pub use state::{StateStore, StateValue};
pub use types::{
    AudioBuffer, AudioFile, AudioFormat, NameChangeMode, NameChangeParameters, Preset,
    PresetMetadata, SampleRate, Transformation,
};
