use crate::utils::*;
use crate::clock::ManualClock;
use crate::sim::Simulation;
use serde::Serialize;

/// What a scenario line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Arrive { name: String, size: Units },
    Depart { name: String },
}

/// One timed request of a scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptEvent {
    /// 1-based line in the source, for error reporting.
    pub line:   usize,
    pub at:     Duration,
    pub op:     Op,
}

/// Defines the interface for reading scenarios.
///
/// [`CsvScript`] is the only source shipped; anything that can produce an
/// ordered list of [`ScriptEvent`]s can drive a replay.
pub trait EventSource {
    fn read_events(&self) -> Result<Vec<ScriptEvent>, ScriptError>;
}

/// A comma-separated scenario file:
///
/// ```text
/// time_ms,op,name,size
/// 0,arrive,P1,40
/// 1500,depart,P1
/// ```
///
/// The header is optional. Blank lines and lines starting with `#` are
/// skipped. Times must never decrease.
pub struct CsvScript {
    pub path: PathBuf,
}

impl CsvScript {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl EventSource for CsvScript {
    fn read_events(&self) -> Result<Vec<ScriptEvent>, ScriptError> {
        let fd = std::fs::File::open(&self.path)?;

        parse_events(BufReader::new(fd))
    }
}

pub fn parse_str(text: &str) -> Result<Vec<ScriptEvent>, ScriptError> {
    parse_events(text.as_bytes())
}

pub fn parse_events<R: BufRead>(reader: R) -> Result<Vec<ScriptEvent>, ScriptError> {
    let mut res = vec![];
    let mut last_at = Duration::ZERO;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let txt = line.trim();
        if txt.is_empty() || txt.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = txt.split(',')
            .map(str::trim)
            .collect();
        if res.is_empty() && fields[0].eq_ignore_ascii_case("time_ms") {
            continue;
        }

        let malformed = |message: String| ScriptError::Malformed { line: line_no, message };
        if fields.len() < 3 {
            return Err(malformed(format!("expected at least 3 columns, found {}", fields.len())));
        }
        let at_ms: u64 = fields[0]
            .parse()
            .map_err(|_| malformed(format!("bad time {:?}", fields[0])))?;
        let at = Duration::from_millis(at_ms);
        if at < last_at {
            return Err(ScriptError::TimeTravel { line: line_no, at_ms });
        }
        last_at = at;

        let name = fields[2].to_string();
        let op = match fields[1].to_ascii_lowercase().as_str() {
            "arrive"    => {
                let raw = fields.get(3).copied().unwrap_or("");
                let size = raw
                    .parse::<Units>()
                    .map_err(|_| malformed(format!("bad size {:?} for {}", raw, name)))?;
                Op::Arrive { name, size }
            },
            "depart"    => { Op::Depart { name } },
            other       => {
                return Err(malformed(format!("unknown operation {:?}", other)));
            }
        };
        res.push(ScriptEvent { line: line_no, at, op });
    }

    Ok(res)
}

/// Tallies of a finished replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub arrivals:               usize,
    pub placed_on_arrival:      usize,
    pub queued_on_arrival:      usize,
    pub departures:             usize,
    pub unknown_departures:     usize,
    pub admitted_from_queue:    usize,
}

/// Feeds `events` to `sim` in order, moving its clock to each event's
/// time first. Stops at the first arrival the simulation refuses.
pub fn replay(sim: &mut Simulation<ManualClock>, events: &[ScriptEvent]) -> Result<ReplayStats, ScriptError> {
    let mut stats = ReplayStats::default();

    for evt in events {
        sim.clock().set(evt.at);
        match &evt.op {
            Op::Arrive { name, size }   => {
                let p = sim.submit_arrival(name, *size)
                    .map_err(|source| ScriptError::Rejected { line: evt.line, source })?;
                stats.arrivals += 1;
                if p.is_resident() {
                    stats.placed_on_arrival += 1;
                } else {
                    stats.queued_on_arrival += 1;
                }
            },
            Op::Depart { name }         => {
                let before = sim.waiting_len();
                if sim.submit_departure(name) {
                    stats.departures += 1;
                    stats.admitted_from_queue += before - sim.waiting_len();
                } else {
                    stats.unknown_departures += 1;
                }
            }
        }
    }

    Ok(stats)
}
