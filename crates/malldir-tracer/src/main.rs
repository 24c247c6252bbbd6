//! malldir-tracer: trace storefront outlines from scanned mall directories.
//!
//! Two ways in:
//!
//! - `trace` runs the pipeline once on a file (or the clipboard), prints
//!   a per-contour report and writes the requested exports.
//! - `shell` opens a line-oriented session for loading, tuning,
//!   re-tracing, editing vertices and exporting interactively.
//!
//! # Usage
//!
//! ```text
//! malldir-tracer trace floor2.png --svg floor2.svg --overlay floor2.png
//! malldir-tracer shell floor2.png
//! ```
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`. Logs go to
//! stderr so `--json` output on stdout stays machine-readable.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod params;
mod shell;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, bail, eyre};
use malldir_io::{Session, SessionEvent, SessionState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::params::ParamArgs;

/// Trace storefront outlines from scanned mall directories into SVG.
#[derive(Parser)]
#[command(name = "malldir-tracer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trace one image and export the result.
    Trace(TraceArgs),

    /// Interactive session on stdin.
    Shell {
        /// Image to load at startup.
        image: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,
    },
}

#[derive(Args)]
struct TraceArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP, TIFF).
    #[arg(required_unless_present = "clipboard")]
    image: Option<PathBuf>,

    /// Read the image from the system clipboard instead of a file.
    #[arg(long, conflicts_with = "image")]
    clipboard: bool,

    #[command(flatten)]
    params: ParamArgs,

    /// Write the outlines as SVG to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the source image with outlines drawn on it as PNG to this file.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Print contours as JSON on stdout instead of the text report.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Trace(args) => run_trace(&args),
        Command::Shell { image, params } => {
            let mut session = Session::with_parameters(params.to_parameters()?);
            if let Some(path) = image {
                let dimensions = session.load_file(&path)?;
                info!(path = %path.display(), %dimensions, "image loaded");
            }
            shell::run(&mut session)
        }
    }
}

fn run_trace(args: &TraceArgs) -> Result<()> {
    let mut session = Session::with_parameters(args.params.to_parameters()?);

    let dimensions = match &args.image {
        Some(path) => session.load_file(path)?,
        None if args.clipboard => session.paste_clipboard()?,
        None => bail!("an image path or --clipboard is required"),
    };
    info!(%dimensions, "image loaded");

    session.start_trace()?;
    for event in session.wait() {
        match event {
            SessionEvent::Status(message) => info!("{message}"),
            SessionEvent::Completed { count } => info!(count, "trace complete"),
            SessionEvent::Failed(message) => error!("{message}"),
        }
    }
    if session.state() != SessionState::Done {
        return Err(eyre!("{}", session.status()));
    }

    if args.json {
        let report = serde_json::json!({
            "dimensions": dimensions,
            "parameters": session.parameters(),
            "contours": session.contours(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&session);
    }

    if let Some(path) = &args.svg {
        let count = session.export_svg(path)?;
        info!(path = %path.display(), count, "wrote SVG");
    }
    if let Some(path) = &args.overlay {
        session.export_overlay(path)?;
        info!(path = %path.display(), "wrote overlay");
    }
    Ok(())
}

fn print_report(session: &Session) {
    println!("{}", session.status());
    for contour in session.contours() {
        println!(
            "  {:<12} {:>4} vertices  area {:>10.1} px^2",
            contour.id.to_string(),
            contour.vertices.len(),
            contour.area,
        );
    }
}
