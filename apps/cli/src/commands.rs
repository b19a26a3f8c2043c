use std::io::{self, BufRead, Write};

use analysis::{HomeSummary, PilotStats};
use model::*;
use serde::Serialize;
use tracing::debug;

use crate::session::{HomeSession, Notice};

pub const HELP: &str = "\
commands:
  add pilot=..; team=..; time=2.35; compound=soft; tires=4; status=ok|failed; reason=..; mechanic=..; at=YYYY-MM-DD HH:MM
  list [query]       stops whose pilot contains the query
  delete <id>        remove one stop
  stats <pilot>      per-pilot statistics
  pilots             roster cards
  chart              recent stops as bars
  summary            home screen statistics
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(PitStopDraft),
    List(String),
    Delete(PitStopId),
    Stats(String),
    Pilots,
    Chart,
    Summary,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:?}, try `help`")]
    Unknown(String),
    #[error("`{command}` needs {what}")]
    MissingArgument { command: &'static str, what: &'static str },
    #[error("{0:?} is not a pit stop id")]
    BadId(String),
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("expected key=value, got {0:?}")]
    MalformedField(String),
    #[error(transparent)]
    BadLabel(#[from] ParseLabelError),
    #[error("{0:?} is not a date and time (YYYY-MM-DD HH:MM)")]
    BadTimestamp(String),
}

/// Parses one shell line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let cmd = match word.to_lowercase().as_str() {
        "add" => Command::Add(parse_draft(rest)?),
        "list" | "search" => Command::List(rest.to_string()),
        "delete" | "rm" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument { command: "delete", what: "an id" });
            }
            Command::Delete(rest.parse().map_err(|_| CommandError::BadId(rest.to_string()))?)
        }
        "stats" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument { command: "stats", what: "a pilot name" });
            }
            Command::Stats(rest.to_string())
        }
        "pilots" => Command::Pilots,
        "chart" => Command::Chart,
        "summary" | "home" => Command::Summary,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

/// `key=value; key=value` into a form draft. Fields left out keep the form defaults.
fn parse_draft(args: &str) -> Result<PitStopDraft, CommandError> {
    let mut d = PitStopDraft::default();
    for field in args.split(';').map(str::trim).filter(|f| !f.is_empty()) {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| CommandError::MalformedField(field.to_string()))?;
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "pilot" => d.pilot = value.to_string(),
            "team" => d.team = value.to_string(),
            "time" => d.elapsed_seconds = value.to_string(),
            "compound" => d.tire_compound = value.parse()?,
            "tires" => d.tires_changed = value.to_string(),
            "status" => d.status = value.parse()?,
            "reason" => d.failure_reason = value.to_string(),
            "mechanic" => d.mechanic = value.to_string(),
            "at" => {
                d.timestamp = parse_timestamp(value)
                    .map_err(|_| CommandError::BadTimestamp(value.to_string()))?
            }
            other => return Err(CommandError::UnknownField(other.to_string())),
        }
    }
    Ok(d)
}

/// Output sink that prints either human text or one JSON document per result.
pub struct Printer<W> {
    out: W,
    json: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    fn emit<T: Serialize>(&mut self, value: &T, text: impl FnOnce(&mut W) -> io::Result<()>) -> io::Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, value).map_err(io::Error::other)?;
            writeln!(self.out)
        } else {
            text(&mut self.out)
        }
    }

    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        self.emit(notice, |w| writeln!(w, "{notice}"))
    }

    pub fn message(&mut self, msg: &str) -> io::Result<()> {
        self.emit(&serde_json::json!({ "message": msg }), |w| writeln!(w, "{msg}"))
    }

    pub fn error(&mut self, err: &dyn std::fmt::Display) -> io::Result<()> {
        let msg = err.to_string();
        self.emit(&serde_json::json!({ "error": msg }), |w| writeln!(w, "error: {msg}"))
    }

    pub fn summary(&mut self, s: &HomeSummary) -> io::Result<()> {
        self.emit(s, |w| {
            writeln!(w, "pit stops: {} ({} ok, {} failed)", s.total, s.ok, s.failed)?;
            match &s.fastest {
                Some(r) => writeln!(w, "fastest:   {:.2}s {} ({})", r.elapsed_seconds, r.pilot, r.team)?,
                None => writeln!(w, "fastest:   N/A")?,
            }
            writeln!(w, "average:   {}", seconds_or_na(s.average_seconds))?;
            writeln!(w, "success:   {:.1}%", s.success_rate)?;
            if !s.recent.is_empty() {
                writeln!(w, "recent:")?;
                for r in &s.recent {
                    write_row(w, r)?;
                }
            }
            Ok(())
        })
    }

    pub fn records<'a>(&mut self, records: impl Iterator<Item = &'a PitStopRecord>) -> io::Result<()> {
        let all: Vec<&PitStopRecord> = records.collect();
        self.emit(&all, |w| {
            if all.is_empty() {
                return writeln!(w, "no pit stops");
            }
            for r in &all {
                write_row(w, r)?;
            }
            Ok(())
        })
    }

    pub fn pilot_stats(&mut self, s: &PilotStats) -> io::Result<()> {
        self.emit(s, |w| {
            if s.total == 0 {
                return writeln!(w, "no pit stops for {}", s.pilot);
            }
            writeln!(w, "{}: {} stops ({} ok, {} failed)", s.pilot, s.total, s.ok, s.failed)?;
            let best = s.fastest_seconds.map_or_else(|| "N/A".to_string(), |t| format!("{t:.2}s"));
            writeln!(w, "fastest {best}, average {}, success {:.1}%", seconds_or_na(s.average_seconds), s.success_rate)?;
            for r in &s.history {
                write_row(w, r)?;
            }
            Ok(())
        })
    }

    pub fn roster(&mut self, cards: &[analysis::PilotCard]) -> io::Result<()> {
        self.emit(&cards, |w| {
            for c in cards {
                let best = c.fastest_seconds.map_or_else(|| "-".to_string(), |t| format!("{t:.2}s"));
                writeln!(w, "{:<18} {:<14} {:>3} stops {:>3} ok  best {best}", c.pilot, c.team, c.total, c.successful)?;
            }
            Ok(())
        })
    }

    pub fn chart(&mut self, bars: &[analysis::ChartBar]) -> io::Result<()> {
        self.emit(&bars, |w| {
            if bars.is_empty() {
                return writeln!(w, "no data to chart");
            }
            let max = bars.iter().map(|b| b.elapsed_seconds).fold(0.0_f64, f64::max);
            for b in bars {
                // 40 columns for the slowest bar
                let width = if max > 0.0 { (b.elapsed_seconds / max * 40.0).round() as usize } else { 0 };
                writeln!(w, "{:>2} {:<18} {:<40} {:.2}s", b.index + 1, b.pilot, "#".repeat(width), b.elapsed_seconds)?;
            }
            Ok(())
        })
    }
}

fn seconds_or_na(t: f64) -> String {
    // 0.0 means "no successful stops"
    if t > 0.0 {
        format!("{t:.2}s")
    } else {
        "N/A".to_string()
    }
}

fn write_row<W: Write>(w: &mut W, r: &PitStopRecord) -> io::Result<()> {
    write!(
        w,
        "#{:<4} {} {:<18} {:<14} {:>5.2}s {:<12} {} tires  {:<6} mech. {}",
        r.id,
        format_timestamp(&r.timestamp),
        r.pilot,
        r.team,
        r.elapsed_seconds,
        r.tire_compound,
        r.tires_changed,
        r.status,
        r.mechanic,
    )?;
    match &r.failure_reason {
        Some(reason) => writeln!(w, "  ({reason})"),
        None => writeln!(w),
    }
}

/// Runs one command against the session. Returns `false` once the user asked to quit.
pub fn execute<W: Write>(session: &mut HomeSession, cmd: Command, p: &mut Printer<W>) -> io::Result<bool> {
    debug!(?cmd, "executing");
    match cmd {
        Command::Add(draft) => {
            let mut form = session.begin_add();
            *form.draft_mut() = draft;
            match form.submit() {
                Ok(outcome) => {
                    if let Some(notice) = session.finish_add(outcome) {
                        p.notice(&notice)?;
                    }
                }
                Err(errs) => p.error(&errs)?,
            }
        }
        Command::List(query) => {
            // read-only: the working copy is dropped without a merge-back
            let list = session.open_list();
            p.records(list.search(&query))?
        }
        Command::Delete(id) => {
            let mut list = session.open_list();
            let notice = list.delete(id);
            p.notice(&notice)?;
            if matches!(notice, Notice::Deleted { .. }) {
                let updated = session.close_list(list);
                p.notice(&updated)?;
            }
        }
        Command::Stats(pilot) => p.pilot_stats(&session.pilot_stats(&pilot))?,
        Command::Pilots => p.roster(&session.roster())?,
        Command::Chart => p.chart(&session.chart())?,
        Command::Summary => p.summary(&session.summary())?,
        Command::Help => p.message(HELP)?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Reads commands line by line until `quit` or end of input.
pub fn run_shell<R: BufRead, W: Write>(session: &mut HomeSession, input: R, p: &mut Printer<W>) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(cmd)) => {
                if !execute(session, cmd, p)? {
                    break;
                }
            }
            Err(e) => p.error(&e)?,
        }
    }
    Ok(())
}
