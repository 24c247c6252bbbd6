//! malldir-io: Image sources, file output and the tracing session.
//!
//! Everything that touches the outside world lives here: reading image
//! files and the clipboard, writing exports atomically, and running the
//! pipeline on a background thread on behalf of a single-owner
//! [`Session`].

pub mod save;
pub mod session;
pub mod source;
pub mod worker;

pub use save::SaveError;
pub use session::{Session, SessionError, SessionEvent, SessionState, StartOutcome};
pub use source::SourceError;
pub use worker::{Generation, TraceResult, WorkerMessage};
