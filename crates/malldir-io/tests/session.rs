//! Session lifecycle against real worker threads.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use image::{Rgb, RgbImage};
use malldir_io::{Session, SessionError, SessionEvent, SessionState, StartOutcome};
use malldir_pipeline::{PipelineParameters, RasterImage};

/// White page with black filled rectangles `(x0, y0, x1, y1)`, half-open.
fn page(width: u32, height: u32, shops: &[(u32, u32, u32, u32)]) -> RasterImage {
    RasterImage::new(RgbImage::from_fn(width, height, |x, y| {
        let inside = shops
            .iter()
            .any(|&(x0, y0, x1, y1)| (x0..x1).contains(&x) && (y0..y1).contains(&y));
        if inside { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
    }))
}

fn two_shops() -> RasterImage {
    page(200, 100, &[(20, 20, 80, 80), (120, 20, 180, 80)])
}

fn blank() -> RasterImage {
    page(120, 90, &[])
}

fn completed_count(events: &[SessionEvent]) -> Option<usize> {
    events.iter().find_map(|e| match e {
        SessionEvent::Completed { count } => Some(*count),
        _ => None,
    })
}

#[test]
fn new_session_is_idle() {
    let session = Session::new();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.image().is_none());
    assert!(session.contours().is_empty());
}

#[test]
fn trace_without_image_is_refused() {
    let mut session = Session::new();
    assert!(matches!(session.start_trace(), Err(SessionError::NoImageLoaded)));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn export_without_image_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new();
    assert!(matches!(
        session.export_svg(&dir.path().join("out.svg")),
        Err(SessionError::NoImageLoaded)
    ));
    assert!(matches!(
        session.export_overlay(&dir.path().join("out.png")),
        Err(SessionError::NoImageLoaded)
    ));
}

#[test]
fn successful_trace_reaches_done() {
    let mut session = Session::new();
    session.load_image(two_shops());
    assert_eq!(session.state(), SessionState::Loaded);

    assert!(matches!(session.start_trace().unwrap(), StartOutcome::Started(_)));
    assert_eq!(session.state(), SessionState::Processing);

    let events = session.wait();
    assert_eq!(completed_count(&events), Some(2));
    assert!(events.contains(&SessionEvent::Status("Starting trace...".to_string())));
    assert_eq!(session.state(), SessionState::Done);
    assert_eq!(session.contours().len(), 2);
    assert_eq!(session.status(), "Found 2 contours");
    assert!(!session.is_processing());
}

#[test]
fn second_start_while_processing_is_a_no_op() {
    let mut session = Session::new();
    session.load_image(two_shops());
    let first = session.start_trace().unwrap();
    assert!(matches!(first, StartOutcome::Started(_)));
    assert_eq!(session.start_trace().unwrap(), StartOutcome::AlreadyRunning);
    assert_eq!(session.start_trace().unwrap(), StartOutcome::AlreadyRunning);

    let events = session.wait();
    let completions = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Completed { .. }))
        .count();
    assert_eq!(completions, 1);

    // A new run may start once the previous one resolved.
    assert!(matches!(session.start_trace().unwrap(), StartOutcome::Started(_)));
    session.wait();
}

#[test]
fn failed_run_keeps_previous_contours() {
    let mut session = Session::new();
    session.load_image(two_shops());
    session.start_trace().unwrap();
    session.wait();
    let before = session.contours().to_vec();
    assert_eq!(before.len(), 2);

    session.set_parameters(PipelineParameters {
        approx_epsilon_percent: 50.0,
        ..PipelineParameters::default()
    });
    session.start_trace().unwrap();
    let events = session.wait();

    assert!(matches!(events.last(), Some(SessionEvent::Failed(_))));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.contours(), before.as_slice());

    // Retrying from Failed is allowed.
    session.set_parameters(PipelineParameters::default());
    assert!(matches!(session.start_trace().unwrap(), StartOutcome::Started(_)));
    session.wait();
    assert_eq!(session.state(), SessionState::Done);
}

#[test]
fn loading_during_a_run_discards_its_result() {
    let mut session = Session::new();
    session.load_image(two_shops());
    session.start_trace().unwrap();

    // Detach the first run by loading a page with nothing on it.
    session.load_image(blank());
    assert_eq!(session.state(), SessionState::Loaded);
    assert!(!session.is_processing());

    session.start_trace().unwrap();
    let events = session.wait();
    assert_eq!(completed_count(&events), Some(0));

    // Give the detached run time to post, then make sure it changes nothing.
    std::thread::sleep(Duration::from_millis(300));
    assert!(session.poll().is_empty());
    assert!(session.contours().is_empty());
    assert_eq!(session.state(), SessionState::Done);
}

#[test]
fn empty_result_cannot_be_exported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.svg");
    let mut session = Session::new();
    session.load_image(blank());
    session.start_trace().unwrap();
    session.wait();

    assert_eq!(session.state(), SessionState::Done);
    assert!(matches!(session.export_svg(&path), Err(SessionError::NoContours)));
    assert!(!path.exists());
}

#[test]
fn exports_svg_and_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let svg_path = dir.path().join("plan.svg");
    let png_path = dir.path().join("plan.png");
    let mut session = Session::new();
    session.load_image(two_shops());
    session.start_trace().unwrap();
    session.wait();

    assert_eq!(session.export_svg(&svg_path).unwrap(), 2);
    let svg = std::fs::read_to_string(&svg_path).unwrap();
    assert_eq!(svg.matches("<path ").count(), 2);
    assert!(svg.contains(r#"viewBox="0 0 200 100""#));

    session.export_overlay(&png_path).unwrap();
    let overlay = image::open(&png_path).unwrap().to_rgb8();
    assert_eq!(overlay.dimensions(), (200, 100));
    assert!(overlay.pixels().any(|p| p.0 == [0, 255, 0]));
}

#[test]
fn load_failure_leaves_session_unchanged() {
    let mut session = Session::new();
    session.load_image(two_shops());
    let err = session
        .load_file(std::path::Path::new("/nonexistent/plan.png"))
        .unwrap_err();
    assert!(matches!(err, SessionError::Load(_)));
    assert_eq!(session.state(), SessionState::Loaded);
    assert_eq!(session.image().map(RasterImage::width), Some(200));
}

#[test]
fn parameter_changes_apply_to_next_run_only() {
    let mut session = Session::new();
    session.load_image(two_shops());
    session.start_trace().unwrap();
    // Changed mid-run: the running trace keeps its snapshot.
    session.set_parameters(PipelineParameters {
        min_area: 1_000_000,
        ..PipelineParameters::default()
    });
    let events = session.wait();
    assert_eq!(completed_count(&events), Some(2));

    session.start_trace().unwrap();
    let events = session.wait();
    assert_eq!(completed_count(&events), Some(0));
}
