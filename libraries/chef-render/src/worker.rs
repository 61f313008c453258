//! Background render worker
//!
//! One batch at a time runs on a spawned thread. Progress flows back to the
//! UI over an mpsc channel; a shared atomic flag cancels the batch between
//! files (a file already being rendered finishes first).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use chef_audio::registry::EffectRegistry;
use chef_core::types::{AudioFile, Preset};

use crate::error::RenderError;
use crate::pipeline;

/// Progress event emitted by a running batch
#[derive(Debug)]
pub enum RenderEvent {
    /// Validation passed, rendering begins
    Started { total: usize },
    /// One file started rendering
    FileStarted { index: usize, file_name: String },
    /// One file finished; its output is on disk
    FileFinished { index: usize, destination: PathBuf },
    /// The batch stopped on this error; earlier outputs stay
    Failed { error: RenderError },
    /// Every file rendered
    Finished { rendered: usize },
    /// The batch was cancelled between files
    Cancelled { completed: usize },
}

/// Handle to a batch running on its own thread
pub struct RenderWorker {
    events: Receiver<RenderEvent>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<Vec<AudioFile>>>,
}

impl RenderWorker {
    /// Validate and render the batch on a new thread.
    ///
    /// The worker takes ownership of the file list so decode caches filled
    /// during the run can be handed back from [`RenderWorker::join`].
    pub fn spawn(registry: EffectRegistry, files: Vec<AudioFile>, preset: Preset) -> Self {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_flag = Arc::clone(&cancel);

        let thread = thread::spawn(move || run(&registry, files, &preset, &cancel_flag, &tx));

        Self {
            events: rx,
            cancel,
            thread: Some(thread),
        }
    }

    /// Request cancellation. Takes effect before the next file starts.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Drain any progress events without blocking
    pub fn try_next_event(&self) -> Option<RenderEvent> {
        self.events.try_recv().ok()
    }

    /// Whether the worker thread has terminated
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .is_none_or(|thread| thread.is_finished())
    }

    /// Wait for the thread and recover the file list with its decode caches
    pub fn join(mut self) -> Vec<AudioFile> {
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

fn run(
    registry: &EffectRegistry,
    mut files: Vec<AudioFile>,
    preset: &Preset,
    cancel: &AtomicBool,
    events: &Sender<RenderEvent>,
) -> Vec<AudioFile> {
    let mut chain = match pipeline::validate(registry, &files, preset) {
        Ok(chain) => chain,
        Err(error) => {
            warn!(%error, "batch rejected during validation");
            let _ = events.send(RenderEvent::Failed { error });
            return files;
        }
    };

    let total = files.len();
    info!(total, "render batch started");
    let _ = events.send(RenderEvent::Started { total });

    for (index, file) in files.iter_mut().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!(completed = index, "render batch cancelled");
            let _ = events.send(RenderEvent::Cancelled { completed: index });
            return files;
        }

        let _ = events.send(RenderEvent::FileStarted {
            index,
            file_name: file.file_name(),
        });

        match pipeline::render_file(file, &mut chain, preset) {
            Ok(destination) => {
                let _ = events.send(RenderEvent::FileFinished { index, destination });
            }
            Err(error) => {
                warn!(%error, file = %file.file_name(), "render batch failed");
                let _ = events.send(RenderEvent::Failed { error });
                return files;
            }
        }
    }

    info!(rendered = total, "render batch finished");
    let _ = events.send(RenderEvent::Finished { rendered: total });
    files
}
