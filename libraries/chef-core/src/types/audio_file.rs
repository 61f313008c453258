//! A file selected for processing
//!
//! Runtime-only entity: created when a file is dropped onto the window,
//! gone when it is removed from the selection. Never persisted.

use std::path::{Path, PathBuf};

use crate::types::{AudioBuffer, NameChangeParameters};

/// A selected source file plus its current output destination.
///
/// The decoded PCM buffer is cached after the first decode and reused for the
/// lifetime of the instance. The destination pair tracks the current rename
/// rule and output-extension settings.
#[derive(Debug, Clone)]
pub struct AudioFile {
    source_path: PathBuf,
    source_stem: String,
    source_ext: String,
    decoded: Option<AudioBuffer>,
    /// Output stem under the current rename rule
    pub destination_name: String,
    /// Output extension under the current output-extension rule
    pub destination_ext: String,
}

impl AudioFile {
    /// Wrap a source path. Destination starts as the unchanged source name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let source_path = path.into();
        let source_stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_ext = source_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            destination_name: source_stem.clone(),
            destination_ext: source_ext.clone(),
            source_path,
            source_stem,
            source_ext,
            decoded: None,
        }
    }

    /// Full source path
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Source file name for display and diagnostics
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }

    /// Source stem (file name without extension)
    pub fn source_stem(&self) -> &str {
        &self.source_stem
    }

    /// Lowercased source extension, without the dot; empty when there is none
    pub fn source_ext(&self) -> &str {
        &self.source_ext
    }

    /// Cached decoded PCM, if this file has been decoded already
    pub fn decoded(&self) -> Option<&AudioBuffer> {
        self.decoded.as_ref()
    }

    /// Cache the decoded PCM buffer
    pub fn set_decoded(&mut self, buffer: AudioBuffer) {
        self.decoded = Some(buffer);
    }

    /// Recompute the destination pair from the rename rule and the output
    /// extension setting (empty output extension reuses the source's).
    pub fn update_destination(&mut self, rule: &NameChangeParameters, output_ext: &str) {
        self.destination_name = rule.change_name(&self.source_stem);
        self.destination_ext = if output_ext.is_empty() {
            self.source_ext.clone()
        } else {
            output_ext.to_lowercase()
        };
    }

    /// Output path: destination name + extension, next to the source file
    pub fn destination_path(&self) -> PathBuf {
        let file_name = format!("{}.{}", self.destination_name, self.destination_ext);
        match self.source_path.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

// Two instances are the same selection entry iff they point at the same
// source file, regardless of decode cache or destination settings.
impl PartialEq for AudioFile {
    fn eq(&self, other: &Self) -> bool {
        self.source_path == other.source_path
    }
}

impl Eq for AudioFile {}
