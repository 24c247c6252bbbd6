//! Line-oriented interactive session.
//!
//! Each input line is one command. Trace progress arrives between
//! commands: pending events are printed after every line, and `wait`
//! blocks until the running trace resolves.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use color_eyre::eyre::{Result, bail, eyre};
use malldir_io::{Session, SessionEvent, StartOutcome};
use malldir_pipeline::{ContourId, Point};
use tracing::debug;

use crate::params;

const HELP: &str = "\
commands:
  load <path>                       load an image file
  paste                             load an image from the clipboard
  set <name> <value>                change a parameter for the next trace
  params                            show the current parameters
  trace                             start a trace in the background
  wait                              block until the running trace finishes
  status                            show the session state
  list                              list traced contours
  export <path>                     write contours as SVG
  overlay <path>                    write the outlined image as PNG
  move <id> <index> <x> <y>         move one vertex
  delete <id> <index>               remove one vertex
  calibrate <x1> <y1> <x2> <y2> <length> <unit>
                                    set real-world scale from a known distance
  area <id>                         area of a contour in calibrated units
  help                              show this text
  quit                              leave";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(PathBuf),
    Paste,
    Set { name: String, value: String },
    Params,
    Trace,
    Wait,
    Status,
    List,
    Export(PathBuf),
    Overlay(PathBuf),
    Move { id: ContourId, index: usize, to: Point },
    Delete { id: ContourId, index: usize },
    Calibrate { p1: Point, p2: Point, length: f64, unit: String },
    Area(ContourId),
    Help,
    Quit,
}

impl Command {
    /// Parse a line. Blank lines and `#` comments yield `None`.
    ///
    /// # Errors
    ///
    /// Fails for an unknown command or malformed arguments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb, args.as_slice()) {
            ("load", [path]) => Self::Load(PathBuf::from(path)),
            ("paste", []) => Self::Paste,
            ("set", [name, value]) => Self::Set {
                name: (*name).to_string(),
                value: (*value).to_string(),
            },
            ("params", []) => Self::Params,
            ("trace", []) => Self::Trace,
            ("wait", []) => Self::Wait,
            ("status", []) => Self::Status,
            ("list", []) => Self::List,
            ("export", [path]) => Self::Export(PathBuf::from(path)),
            ("overlay", [path]) => Self::Overlay(PathBuf::from(path)),
            ("move", [id, index, x, y]) => Self::Move {
                id: contour_id(id)?,
                index: index_arg(index)?,
                to: Point::new(number(x)?, number(y)?),
            },
            ("delete", [id, index]) => Self::Delete {
                id: contour_id(id)?,
                index: index_arg(index)?,
            },
            ("calibrate", [x1, y1, x2, y2, length, unit]) => Self::Calibrate {
                p1: Point::new(number(x1)?, number(y1)?),
                p2: Point::new(number(x2)?, number(y2)?),
                length: number(length)?,
                unit: (*unit).to_string(),
            },
            ("area", [id]) => Self::Area(contour_id(id)?),
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            (
                "load" | "paste" | "set" | "params" | "trace" | "wait" | "status" | "list"
                | "export" | "overlay" | "move" | "delete" | "calibrate" | "area" | "help"
                | "quit",
                _,
            ) => bail!("wrong arguments for {verb:?}; type `help`"),
            _ => bail!("unknown command {verb:?}; type `help`"),
        };
        Ok(Some(command))
    }
}

fn number(word: &str) -> Result<f64> {
    word.parse()
        .map_err(|_| eyre!("expected a number, got {word:?}"))
}

fn index_arg(word: &str) -> Result<usize> {
    word.parse()
        .map_err(|_| eyre!("expected a vertex index, got {word:?}"))
}

/// Accepts both `3` and `contour_3`.
fn contour_id(word: &str) -> Result<ContourId> {
    word.strip_prefix("contour_")
        .unwrap_or(word)
        .parse()
        .map(ContourId)
        .map_err(|_| eyre!("expected a contour id, got {word:?}"))
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Read commands from stdin until `quit` or end of input.
///
/// # Errors
///
/// Only I/O failures on stdin or stdout end the loop with an error;
/// command failures are reported and the loop continues.
pub fn run(session: &mut Session) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    println!("{}", session.status());
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let flow = match Command::parse(&line) {
            Ok(Some(command)) => {
                debug!(?command, "shell command");
                execute(session, command).unwrap_or_else(|err| {
                    println!("Error: {err}");
                    Flow::Continue
                })
            }
            Ok(None) => Flow::Continue,
            Err(err) => {
                println!("{err}");
                Flow::Continue
            }
        };
        print_events(&session.poll());
        if flow == Flow::Quit {
            return Ok(());
        }
        print!("> ");
        stdout.flush()?;
    }
    Ok(())
}

fn execute(session: &mut Session, command: Command) -> Result<Flow> {
    match command {
        Command::Load(path) => {
            let dimensions = session.load_file(&path)?;
            println!("{} ({dimensions})", session.status());
        }
        Command::Paste => {
            let dimensions = session.paste_clipboard()?;
            println!("{} ({dimensions})", session.status());
        }
        Command::Set { name, value } => {
            let mut next = session.parameters().clone();
            params::apply_setting(&mut next, &name, &value)?;
            next.validate()?;
            session.set_parameters(next);
        }
        Command::Params => {
            println!("{}", serde_json::to_string_pretty(session.parameters())?);
        }
        Command::Trace => match session.start_trace()? {
            StartOutcome::Started(_) => {}
            StartOutcome::AlreadyRunning => println!("A trace is already running"),
        },
        Command::Wait => print_events(&session.wait()),
        Command::Status => println!("{:?}: {}", session.state(), session.status()),
        Command::List => {
            for contour in session.contours() {
                let real = session
                    .real_area(contour.id)?
                    .zip(session.calibration())
                    .map(|(area, c)| format!("  ({area:.2} {}^2)", c.unit))
                    .unwrap_or_default();
                println!(
                    "{}: {} vertices, area {:.1} px^2{real}",
                    contour.id,
                    contour.vertices.len(),
                    contour.area,
                );
            }
        }
        Command::Export(path) => {
            let count = session.export_svg(&path)?;
            println!("Exported {count} contours to {}", path.display());
        }
        Command::Overlay(path) => {
            session.export_overlay(&path)?;
            println!("Saved overlay to {}", path.display());
        }
        Command::Move { id, index, to } => session.update_vertex(id, index, to)?,
        Command::Delete { id, index } => session.delete_vertex(id, index)?,
        Command::Calibrate {
            p1,
            p2,
            length,
            unit,
        } => {
            let ppu = session.calibrate(p1, p2, length, &unit)?;
            println!("{ppu:.3} px per {unit}");
        }
        Command::Area(id) => match session.real_area(id)? {
            Some(area) => {
                let unit = session.calibration().map_or("", |c| c.unit.as_str());
                println!("{id}: {area:.2} {unit}^2");
            }
            None => bail!("not calibrated; use `calibrate` first"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn print_events(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::Status(message) => println!("{message}"),
            SessionEvent::Completed { count } => println!("Found {count} contours"),
            SessionEvent::Failed(message) => println!("Error: {message}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("# note").unwrap(), None);
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse("trace"), Command::Trace);
        assert_eq!(parse("  wait "), Command::Wait);
        assert_eq!(parse("exit"), Command::Quit);
        assert_eq!(parse("load plan.png"), Command::Load(PathBuf::from("plan.png")));
        assert_eq!(
            parse("set min_area 300"),
            Command::Set {
                name: "min_area".to_string(),
                value: "300".to_string(),
            }
        );
    }

    #[test]
    fn contour_ids_accept_both_spellings() {
        assert_eq!(parse("area 2"), Command::Area(ContourId(2)));
        assert_eq!(parse("area contour_2"), Command::Area(ContourId(2)));
    }

    #[test]
    fn vertex_edits() {
        assert_eq!(
            parse("move 0 3 10.5 20"),
            Command::Move {
                id: ContourId(0),
                index: 3,
                to: Point::new(10.5, 20.0),
            }
        );
        assert_eq!(
            parse("delete contour_1 0"),
            Command::Delete {
                id: ContourId(1),
                index: 0,
            }
        );
    }

    #[test]
    fn calibrate_takes_two_points_a_length_and_a_unit() {
        assert_eq!(
            parse("calibrate 0 0 100 0 25 m"),
            Command::Calibrate {
                p1: Point::new(0.0, 0.0),
                p2: Point::new(100.0, 0.0),
                length: 25.0,
                unit: "m".to_string(),
            }
        );
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(Command::parse("frobnicate").is_err());
        assert!(Command::parse("load").is_err());
        assert!(Command::parse("move 0 1 x 2").is_err());
        assert!(Command::parse("area shop").is_err());
        assert!(Command::parse("delete 0 -1").is_err());
    }

    #[test]
    fn set_validates_before_applying() {
        let mut session = Session::new();
        let result = execute(
            &mut session,
            Command::Set {
                name: "approx_epsilon_percent".to_string(),
                value: "50".to_string(),
            },
        );
        assert!(result.is_err());
        assert_eq!(session.parameters(), &malldir_pipeline::PipelineParameters::default());
    }

    #[test]
    fn quit_ends_the_loop() {
        let mut session = Session::new();
        assert_eq!(execute(&mut session, Command::Quit).unwrap(), Flow::Quit);
        assert_eq!(execute(&mut session, Command::Help).unwrap(), Flow::Continue);
    }
}
