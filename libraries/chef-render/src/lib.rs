//! AudioChef Render
//!
//! Batch pre-flight validation, the per-file render pipeline, and the
//! cancellable background worker that runs a batch off the UI thread.
//!
//! A batch is all-or-nothing at validation time: every selected file must be
//! decodable, the output extension encodable, and the effect chain complete
//! before a single byte is read. During the run the first failing file stops
//! the batch; outputs already written stay on disk.

#![forbid(unsafe_code)]

mod error;
pub mod pipeline;
pub mod worker;

pub use error::{RenderError, Result};
pub use worker::{RenderEvent, RenderWorker};
