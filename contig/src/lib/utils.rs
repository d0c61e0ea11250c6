pub use std::{
    rc::Rc,
    cell::Cell,
    collections::VecDeque,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::{Duration, Instant},
};
pub use thiserror::Error;
pub use itertools::Itertools;

/// The unit for measuring the simulated address space. Process sizes,
/// block sizes and offsets all share it.
///
/// The simulation is agnostic to what a unit stands for (bytes, KiB,
/// pages...). The operator picks the total at start-up and every request
/// is expressed in the same currency.
pub type Units = usize;

/// Failures that are reported before any state is touched.
///
/// Running out of space is *not* an error: a rejected arrival simply
/// lands in the wait queue. Departures that name nobody come back as
/// `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("process size must be positive (got {size} for {name:?})")]
    ZeroSize { name: String, size: Units },
    #[error("process name must not be blank")]
    BlankName,
    #[error("{name:?} is already resident or waiting")]
    DuplicateName { name: String },
    #[error("total memory must be positive")]
    ZeroCapacity,
}

impl SimError {
    /// Every variant except [`SimError::ZeroCapacity`] belongs to the
    /// "invalid request" family, i.e. it was caused by a bad arrival.
    pub fn is_invalid_request(&self) -> bool {
        !matches!(self, SimError::ZeroCapacity)
    }
}

/// Appears while reading a scenario script.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("line {line}: time {at_ms} ms is earlier than the previous event")]
    TimeTravel { line: usize, at_ms: u64 },
    #[error("line {line}: {source}")]
    Rejected { line: usize, source: SimError },
}

/// Milliseconds since simulation start, as shown in reports.
#[inline]
pub fn as_millis(d: Duration) -> u64 {
    d.as_millis() as u64
}
