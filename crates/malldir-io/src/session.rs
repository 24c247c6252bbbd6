//! The operator's tracing session.
//!
//! A [`Session`] owns the loaded image, the parameters, the accepted
//! contour set and the displayed image. Traces run on a background
//! [`worker`](crate::worker); their messages are applied only when the
//! owner calls [`poll`](Session::poll) or [`wait`](Session::wait), so
//! every state change happens on the owning thread.
//!
//! ```text
//! Idle --load--> Loaded --trace--> Processing --ok--> Done
//!                  ^                    |
//!                  |                    +--err--> Failed
//!                  +------load (any state)-------+
//! ```
//!
//! A run can start from `Loaded`, `Done` or `Failed`. Loading while a
//! run is in flight detaches that run; its messages are discarded by
//! generation when they arrive.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use malldir_export::ExportError;
use malldir_pipeline::vectorize::MIN_VERTICES;
use malldir_pipeline::{
    Calibration, Contour, ContourId, Dimensions, PipelineParameters, Point, RasterImage,
    RgbImage, polygon,
};
use tracing::{debug, info, warn};

use crate::save::{self, SaveError};
use crate::source::{self, SourceError};
use crate::worker::{self, Generation, TraceJob, WorkerMessage};

/// How long [`Session::wait`] blocks before checking the worker is alive.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Errors surfaced by session actions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The action needs an image and none is loaded.
    #[error("no image loaded")]
    NoImageLoaded,

    /// Export was requested with an empty contour set.
    #[error("no contours to export")]
    NoContours,

    /// Loading an image failed.
    #[error("failed to load image: {0}")]
    Load(#[from] SourceError),

    /// Serializing an export failed.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    /// Writing an export failed.
    #[error("save failed: {0}")]
    Save(#[from] SaveError),

    /// No contour with this id in the current set.
    #[error("no contour with id {0}")]
    UnknownContour(ContourId),

    /// Vertex index past the end of the contour.
    #[error("{contour} has no vertex {index} (it has {len})")]
    VertexOutOfRange {
        /// Contour addressed.
        contour: ContourId,
        /// Index requested.
        index: usize,
        /// Vertex count of the contour.
        len: usize,
    },

    /// Deleting would leave fewer than three vertices.
    #[error("{0} already has the minimum of 3 vertices")]
    TooFewVertices(ContourId),

    /// The calibration points coincide or the length is not positive.
    #[error("calibration needs two distinct points and a positive length")]
    InvalidCalibration,

    /// The worker thread could not be started.
    #[error("could not start trace worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing loaded yet.
    Idle,
    /// An image is loaded and no trace has completed for it.
    Loaded,
    /// A trace is running.
    Processing,
    /// The last trace succeeded.
    Done,
    /// The last trace failed; earlier contours are still in place.
    Failed,
}

/// Result of [`Session::start_trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new run was dispatched.
    Started(Generation),
    /// A run is already in flight; nothing was started.
    AlreadyRunning,
}

/// Something the operator should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Progress text from the running trace.
    Status(String),
    /// The trace finished with this many contours.
    Completed {
        /// Number of accepted contours.
        count: usize,
    },
    /// The trace failed with this message.
    Failed(String),
}

#[derive(Debug)]
struct InFlight {
    generation: Generation,
    handle: JoinHandle<()>,
}

/// Single-owner tracing session.
#[derive(Debug)]
pub struct Session {
    image: Option<RasterImage>,
    displayed: Option<RgbImage>,
    params: PipelineParameters,
    contours: Vec<Contour>,
    calibration: Option<Calibration>,
    state: SessionState,
    status: String,
    generation: Generation,
    in_flight: Option<InFlight>,
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Empty session with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parameters(PipelineParameters::default())
    }

    /// Empty session with the given parameters.
    #[must_use]
    pub fn with_parameters(params: PipelineParameters) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            image: None,
            displayed: None,
            params,
            contours: Vec::new(),
            calibration: None,
            state: SessionState::Idle,
            status: "Ready".to_string(),
            generation: 0,
            in_flight: None,
            sender,
            receiver,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Latest status line.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The loaded source image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    /// The image currently shown: the original after a load, the
    /// overlay after a successful trace or an edit.
    #[must_use]
    pub const fn displayed(&self) -> Option<&RgbImage> {
        self.displayed.as_ref()
    }

    /// Contours from the last successful trace, with any edits applied.
    #[must_use]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Look up one contour by id.
    #[must_use]
    pub fn contour(&self, id: ContourId) -> Option<&Contour> {
        self.contours.iter().find(|c| c.id == id)
    }

    /// Parameters the next trace will use.
    #[must_use]
    pub const fn parameters(&self) -> &PipelineParameters {
        &self.params
    }

    /// Replace the parameters. A running trace keeps the snapshot it
    /// started with; the change applies to the next run.
    pub fn set_parameters(&mut self, params: PipelineParameters) {
        debug!(?params, "parameters updated");
        self.params = params;
    }

    /// Whether a run is in flight.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Real-world scale, if the operator has calibrated this image.
    #[must_use]
    pub const fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Load an image file, replacing the current image.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Load`] if the file cannot be read or
    /// decoded; the session is left unchanged.
    pub fn load_file(&mut self, path: &Path) -> Result<Dimensions, SessionError> {
        let image = source::load_file(path)
            .inspect_err(|e| warn!(path = %path.display(), error = %e, "load failed"))?;
        info!(path = %path.display(), "loaded image");
        Ok(self.install(image, format!("Loaded: {}", path.display())))
    }

    /// Load the clipboard image, replacing the current image.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Load`] if the clipboard holds no image or
    /// cannot be read; the session is left unchanged.
    pub fn paste_clipboard(&mut self) -> Result<Dimensions, SessionError> {
        let image = source::paste_clipboard()
            .inspect_err(|e| warn!(error = %e, "paste failed"))?;
        info!("pasted image from clipboard");
        Ok(self.install(image, "Pasted from clipboard".to_string()))
    }

    /// Install an already-decoded image.
    pub fn load_image(&mut self, image: RasterImage) -> Dimensions {
        self.install(image, "Image loaded".to_string())
    }

    fn install(&mut self, image: RasterImage, status: String) -> Dimensions {
        if let Some(run) = self.in_flight.take() {
            info!(
                generation = run.generation,
                "new image loaded; detaching running trace"
            );
        }
        let dimensions = image.dimensions();
        debug!(%dimensions, "installing image");
        self.displayed = Some(image.pixels().clone());
        self.image = Some(image);
        self.contours.clear();
        self.calibration = None;
        self.state = SessionState::Loaded;
        self.status = status;
        dimensions
    }

    /// Start a trace of the current image with the current parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoImageLoaded`] if there is nothing to
    /// trace, or [`SessionError::Spawn`] if the worker cannot start.
    pub fn start_trace(&mut self) -> Result<StartOutcome, SessionError> {
        if let Some(run) = &self.in_flight {
            warn!(generation = run.generation, "trace already running");
            return Ok(StartOutcome::AlreadyRunning);
        }
        let Some(image) = self.image.clone() else {
            warn!("trace requested with no image loaded");
            return Err(SessionError::NoImageLoaded);
        };

        let generation = self.generation + 1;
        let job = TraceJob {
            generation,
            image,
            params: self.params.clone(),
        };
        let handle = worker::spawn(job, self.sender.clone()).map_err(SessionError::Spawn)?;
        self.generation = generation;
        info!(generation, "trace started");

        self.in_flight = Some(InFlight { generation, handle });
        self.state = SessionState::Processing;
        self.status = "Processing...".to_string();
        Ok(StartOutcome::Started(generation))
    }

    /// Apply every message already received, without blocking.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            self.apply(message, &mut events);
        }
        self.reap_dead_worker(&mut events);
        events
    }

    /// Block until the in-flight run (if any) resolves, applying its
    /// messages along the way.
    pub fn wait(&mut self) -> Vec<SessionEvent> {
        let mut events = self.poll();
        while self.in_flight.is_some() {
            match self.receiver.recv_timeout(WAIT_SLICE) {
                Ok(message) => self.apply(message, &mut events),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    self.reap_dead_worker(&mut events);
                }
            }
        }
        events
    }

    fn apply(&mut self, message: WorkerMessage, events: &mut Vec<SessionEvent>) {
        let current = self.in_flight.as_ref().map(|run| run.generation);
        if current != Some(message.generation()) {
            debug!(
                generation = message.generation(),
                "discarding message from detached run"
            );
            return;
        }

        match message {
            WorkerMessage::Status { message, .. } => {
                debug!(%message, "trace progress");
                self.status.clone_from(&message);
                events.push(SessionEvent::Status(message));
            }
            WorkerMessage::Finished {
                outcome: Ok(result),
                ..
            } => {
                self.in_flight = None;
                let count = result.output.contours.len();
                info!(count, scale = result.output.scale, "trace finished");
                self.contours = result.output.contours;
                self.displayed = Some(result.overlay);
                self.state = SessionState::Done;
                self.status = format!("Found {count} contours");
                events.push(SessionEvent::Completed { count });
            }
            WorkerMessage::Finished {
                outcome: Err(e), ..
            } => {
                self.in_flight = None;
                self.fail(e.to_string(), events);
            }
        }
    }

    /// A worker whose thread has exited without a `Finished` message
    /// counts as a failed run.
    fn reap_dead_worker(&mut self, events: &mut Vec<SessionEvent>) {
        let exited = self
            .in_flight
            .as_ref()
            .is_some_and(|run| run.handle.is_finished());
        if !exited {
            return;
        }
        // Anything the thread sent is already queued.
        while let Ok(message) = self.receiver.try_recv() {
            self.apply(message, events);
        }
        if let Some(run) = self.in_flight.take() {
            let reason = match run.handle.join() {
                Ok(()) => "trace worker stopped without a result",
                Err(_) => "trace worker crashed",
            };
            self.fail(reason.to_string(), events);
        }
    }

    fn fail(&mut self, message: String, events: &mut Vec<SessionEvent>) {
        warn!(error = %message, "trace failed");
        self.state = SessionState::Failed;
        self.status = format!("Error: {message}");
        events.push(SessionEvent::Failed(message));
    }

    /// Write the current contours as SVG. Returns the number of paths.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoImageLoaded`] or
    /// [`SessionError::NoContours`] when there is nothing to export, and
    /// [`SessionError::Save`] if the file cannot be written. A failed
    /// write leaves any existing file at `path` untouched.
    pub fn export_svg(&self, path: &Path) -> Result<usize, SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImageLoaded)?;
        if self.contours.is_empty() {
            warn!("export requested with no contours");
            return Err(SessionError::NoContours);
        }
        let svg = malldir_export::to_svg(&self.contours, image.dimensions())?;
        save::write_atomic(path, svg.as_bytes())?;
        info!(path = %path.display(), count = self.contours.len(), "exported SVG");
        Ok(self.contours.len())
    }

    /// Write the displayed image as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoImageLoaded`] if nothing is displayed,
    /// and [`SessionError::Save`] if encoding or writing fails.
    pub fn export_overlay(&self, path: &Path) -> Result<(), SessionError> {
        let displayed = self.displayed.as_ref().ok_or(SessionError::NoImageLoaded)?;
        save::write_png(path, displayed)?;
        info!(path = %path.display(), "exported overlay");
        Ok(())
    }

    /// Move one vertex of a contour. The area is recomputed and the
    /// overlay redrawn.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownContour`] or
    /// [`SessionError::VertexOutOfRange`] if the vertex does not exist.
    pub fn update_vertex(
        &mut self,
        id: ContourId,
        index: usize,
        point: Point,
    ) -> Result<(), SessionError> {
        let contour = self.contour_mut(id)?;
        let len = contour.vertices.len();
        let vertex = contour
            .vertices
            .points_mut()
            .get_mut(index)
            .ok_or(SessionError::VertexOutOfRange {
                contour: id,
                index,
                len,
            })?;
        *vertex = point;
        contour.area = polygon::shoelace_area(contour.vertices.points());
        debug!(%id, index, x = point.x, y = point.y, "vertex moved");
        self.redraw();
        Ok(())
    }

    /// Remove one vertex of a contour, refusing to go below three.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownContour`],
    /// [`SessionError::VertexOutOfRange`] or
    /// [`SessionError::TooFewVertices`].
    pub fn delete_vertex(&mut self, id: ContourId, index: usize) -> Result<(), SessionError> {
        let contour = self.contour_mut(id)?;
        let len = contour.vertices.len();
        if index >= len {
            return Err(SessionError::VertexOutOfRange {
                contour: id,
                index,
                len,
            });
        }
        if len <= MIN_VERTICES {
            warn!(%id, "refusing to delete below minimum vertex count");
            return Err(SessionError::TooFewVertices(id));
        }
        contour.vertices.points_mut().remove(index);
        contour.area = polygon::shoelace_area(contour.vertices.points());
        debug!(%id, index, "vertex deleted");
        self.redraw();
        Ok(())
    }

    fn contour_mut(&mut self, id: ContourId) -> Result<&mut Contour, SessionError> {
        self.contours
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SessionError::UnknownContour(id))
    }

    fn redraw(&mut self) {
        if let Some(image) = &self.image {
            self.displayed = Some(malldir_export::render_overlay(image, &self.contours));
        }
    }

    /// Set the real-world scale from two points a known distance apart.
    /// Returns pixels per unit.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidCalibration`] if the points
    /// coincide or the length is not a positive number.
    pub fn calibrate(
        &mut self,
        p1: Point,
        p2: Point,
        real_length: f64,
        unit: &str,
    ) -> Result<f64, SessionError> {
        let calibration =
            Calibration::new(p1, p2, real_length, unit).ok_or(SessionError::InvalidCalibration)?;
        let ppu = calibration.pixels_per_unit();
        info!(pixels_per_unit = ppu, unit, "calibrated");
        self.calibration = Some(calibration);
        Ok(ppu)
    }

    /// Area of a contour in square calibrated units, or `None` if the
    /// session is not calibrated.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownContour`] if there is no such contour.
    pub fn real_area(&self, id: ContourId) -> Result<Option<f64>, SessionError> {
        let contour = self.contour(id).ok_or(SessionError::UnknownContour(id))?;
        Ok(self.calibration.as_ref().map(|c| c.contour_area(contour)))
    }
}
