use crate::utils::*;

/// Source of "now" for the simulation.
///
/// Every timestamp a [`Process`](crate::Process) carries is a [`Duration`]
/// measured from the moment the clock was created, so the clock only has
/// to be monotonic, never wall-clock accurate.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Real elapsed time since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Used for scenario replay and
/// for keeping tests deterministic.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jumps to `at`. Going backwards is ignored so that the
    /// clock stays monotonic.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
