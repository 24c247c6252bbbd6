//! Background thread that runs one trace.
//!
//! [`spawn`] starts a named thread that owns a snapshot of the image and
//! parameters, runs the pipeline, renders the overlay and reports back
//! over an `mpsc` channel. Every message carries the run's
//! [`Generation`] so the owner can ignore results from runs it has
//! since detached.

use std::io;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use malldir_pipeline::{PipelineError, PipelineParameters, RasterImage, RgbImage, TraceOutput};

/// Monotonically increasing run number.
pub type Generation = u64;

/// Status line posted before the first stage.
pub const STARTING: &str = "Starting trace...";

/// A completed run: the contours plus the overlay drawn from them.
#[derive(Debug, Clone)]
pub struct TraceResult {
    /// Pipeline output.
    pub output: TraceOutput,
    /// Source image with the accepted outlines drawn over it.
    pub overlay: RgbImage,
}

/// Message from a worker to the owner thread.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Progress text for the operator.
    Status {
        /// Run that posted it.
        generation: Generation,
        /// Human-readable status line.
        message: String,
    },
    /// The run is over. Posted exactly once per run, last.
    Finished {
        /// Run that posted it.
        generation: Generation,
        /// Contours and overlay, or the pipeline failure.
        outcome: Result<TraceResult, PipelineError>,
    },
}

impl WorkerMessage {
    /// The run that posted this message.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        match self {
            Self::Status { generation, .. } | Self::Finished { generation, .. } => *generation,
        }
    }
}

/// Everything a run needs, owned.
#[derive(Debug, Clone)]
pub struct TraceJob {
    /// Run number echoed in every message.
    pub generation: Generation,
    /// Shared snapshot of the image.
    pub image: RasterImage,
    /// Parameters as they were when the run started.
    pub params: PipelineParameters,
}

/// Run `job` on a new thread named `trace-worker`.
///
/// Send failures are ignored: a closed channel means the owner is gone
/// and nobody is waiting for the result.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn(job: TraceJob, sender: Sender<WorkerMessage>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("trace-worker".to_string())
        .spawn(move || run(job, &sender))
}

/// Body of the worker thread; also usable inline.
pub fn run(job: TraceJob, sender: &Sender<WorkerMessage>) {
    let TraceJob {
        generation,
        image,
        params,
    } = job;
    let status = |message: &str| {
        let _ = sender.send(WorkerMessage::Status {
            generation,
            message: message.to_string(),
        });
    };

    status(STARTING);
    let outcome = malldir_pipeline::trace_with_progress(&image, &params, |stage| {
        status(stage.status());
    })
    .map(|output| {
        let overlay = malldir_export::render_overlay(&image, &output.contours);
        TraceResult { output, overlay }
    });

    let _ = sender.send(WorkerMessage::Finished {
        generation,
        outcome,
    });
}
