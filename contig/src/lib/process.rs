use crate::utils::*;
use serde::Serialize;
use std::fmt;

/// Where a [`Process`] currently stands.
///
/// ```text
/// New ──► Resident ──► Departed
///  │          ▲
///  └► Waiting ┘
/// ```
///
/// `New` only exists between construction and the first placement
/// attempt; no caller ever observes it. `Departed` is terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Resident,
    Waiting,
    Departed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match self {
            Status::New         => "new",
            Status::Resident    => "in memory",
            Status::Waiting     => "waiting",
            Status::Departed    => "finished",
        };

        f.write_str(txt)
    }
}

/// One simulated process: a name, how much memory it wants, and the
/// timestamps of its lifecycle.
///
/// Records are shared (see [`ProcessHandle`]) between the history, the
/// wait queue and the block that owns them. Only the allocator and the
/// wait queue mutate them, hence the `Cell`s and the crate-private
/// setters.
#[derive(Debug)]
pub struct Process {
    // Position in the history. Unique for the simulation's lifetime,
    // unlike the name.
    id:             usize,
    name:           String,
    size:           Units,
    arrival:        Duration,
    admission:      Cell<Option<Duration>>,
    departure:      Cell<Option<Duration>>,
    wait_start:     Cell<Option<Duration>>,
    wait:           Cell<Option<Duration>>,
    status:         Cell<Status>,
}

/// Processes are single-threadedly shared.
pub type ProcessHandle = Rc<Process>;

impl Process {
    pub(crate) fn new(id: usize, name: String, size: Units, arrival: Duration) -> Self {
        Self {
            id,
            name,
            size,
            arrival,
            admission:  Cell::new(None),
            departure:  Cell::new(None),
            wait_start: Cell::new(None),
            wait:       Cell::new(None),
            status:     Cell::new(Status::New),
        }
    }

    #[inline]
    pub fn id(&self) -> usize { self.id }

    #[inline]
    pub fn name(&self) -> &str { &self.name }

    #[inline]
    pub fn size(&self) -> Units { self.size }

    #[inline]
    pub fn status(&self) -> Status { self.status.get() }

    pub fn arrival(&self) -> Duration { self.arrival }

    pub fn admission(&self) -> Option<Duration> { self.admission.get() }

    pub fn departure(&self) -> Option<Duration> { self.departure.get() }

    /// Set while queued, cleared on admission.
    pub fn wait_start(&self) -> Option<Duration> { self.wait_start.get() }

    /// How long the process sat in the wait queue. Only present for
    /// processes that had to wait and were eventually admitted.
    pub fn wait(&self) -> Option<Duration> { self.wait.get() }

    pub fn is_resident(&self) -> bool { self.status() == Status::Resident }

    pub fn is_waiting(&self) -> bool { self.status() == Status::Waiting }

    /// Only new and waiting processes may be given a block.
    pub fn is_admissible(&self) -> bool {
        matches!(self.status(), Status::New | Status::Waiting)
    }

    // The transitions below return `false` and change nothing when the
    // current status does not allow them.

    pub(crate) fn admit(&self, now: Duration) -> bool {
        if !self.is_admissible() {
            return false;
        }
        self.admission.set(Some(now));
        self.status.set(Status::Resident);
        if let Some(start) = self.wait_start.take() {
            self.wait.set(Some(now.saturating_sub(start)));
        }

        true
    }

    pub(crate) fn start_waiting(&self, now: Duration) -> bool {
        if self.status() != Status::New {
            return false;
        }
        self.status.set(Status::Waiting);
        self.wait_start.set(Some(now));

        true
    }

    pub(crate) fn depart(&self, now: Duration) -> bool {
        if self.status() != Status::Resident {
            return false;
        }
        self.departure.set(Some(now));
        self.status.set(Status::Departed);

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_duration_is_measured_from_enqueue() {
        let p = Process::new(0, String::from("A"), 10, Duration::from_secs(1));
        assert!(p.start_waiting(Duration::from_secs(2)));
        assert_eq!(p.status(), Status::Waiting);
        assert_eq!(p.wait_start(), Some(Duration::from_secs(2)));

        assert!(p.admit(Duration::from_secs(7)));
        assert_eq!(p.status(), Status::Resident);
        assert_eq!(p.wait_start(), None);
        assert_eq!(p.wait(), Some(Duration::from_secs(5)));
        assert_eq!(p.admission(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn direct_admission_has_no_wait() {
        let p = Process::new(0, String::from("A"), 10, Duration::ZERO);
        assert!(p.admit(Duration::from_millis(3)));
        assert_eq!(p.wait(), None);
        assert!(p.depart(Duration::from_millis(9)));
        assert_eq!(p.status(), Status::Departed);
        assert_eq!(p.departure(), Some(Duration::from_millis(9)));
    }

    #[test]
    fn departed_is_terminal() {
        let p = Process::new(0, String::from("A"), 10, Duration::ZERO);
        assert!(!p.depart(Duration::ZERO));
        assert!(p.admit(Duration::ZERO));
        assert!(!p.admit(Duration::from_millis(1)));
        assert!(!p.start_waiting(Duration::from_millis(1)));
        assert!(p.depart(Duration::from_millis(2)));

        assert!(!p.admit(Duration::from_millis(3)));
        assert!(!p.start_waiting(Duration::from_millis(3)));
        assert!(!p.depart(Duration::from_millis(3)));
        assert_eq!(p.status(), Status::Departed);
        assert_eq!(p.admission(), Some(Duration::ZERO));
        assert_eq!(p.departure(), Some(Duration::from_millis(2)));
    }
}
