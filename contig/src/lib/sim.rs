use crate::utils::*;
use crate::allocator::Allocator;
use crate::block::BlockList;
use crate::clock::{Clock, MonotonicClock};
use crate::process::{Process, ProcessHandle};
use crate::queue::WaitQueue;
use crate::snapshot::Snapshot;
use log::{info, warn};

/// What the operator decides before the simulation starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub total_size:     Units,
    /// Refuse arrivals whose name is already resident or waiting.
    /// Off by default: names are the caller's business.
    pub unique_names:   bool,
}

impl SimConfig {
    pub fn new(total_size: Units) -> Self {
        Self { total_size, unique_names: false }
    }

    pub fn unique_names(mut self, on: bool) -> Self {
        self.unique_names = on;
        self
    }
}

/// Called once after every completed arrival or departure. Observers
/// re-read whatever they need (usually [`Simulation::snapshot`]).
pub type Observer<C> = Box<dyn FnMut(&Simulation<C>)>;

/// Drives the [`Allocator`] and owns everything around it: the
/// [`WaitQueue`], the history of every process ever submitted and the
/// list of observers.
///
/// Requests are handled one at a time and each runs to completion, so
/// observers never see a half-split or half-merged block list.
pub struct Simulation<C: Clock = MonotonicClock> {
    config:     SimConfig,
    clock:      C,
    allocator:  Allocator,
    queue:      WaitQueue,
    history:    Vec<ProcessHandle>,
    observers:  Vec<Observer<C>>,
}

impl Simulation<MonotonicClock> {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> Simulation<C> {
    pub fn with_clock(config: SimConfig, clock: C) -> Result<Self, SimError> {
        let allocator = Allocator::new(config.total_size)?;
        info!("Simulation started with {} units", config.total_size);

        Ok(Self {
            config,
            clock,
            allocator,
            queue:      WaitQueue::new(),
            history:    vec![],
            observers:  vec![],
        })
    }

    /// A new process asks for `size` units. It is placed right away if
    /// some hole fits it, queued otherwise; either way the returned
    /// record tells which.
    ///
    /// Blank names and zero sizes are refused before anything changes.
    pub fn submit_arrival(&mut self, name: &str, size: Units) -> Result<ProcessHandle, SimError> {
        if name.trim().is_empty() {
            return Err(SimError::BlankName);
        }
        if size == 0 {
            return Err(SimError::ZeroSize { name: name.to_string(), size });
        }
        if self.config.unique_names && self.is_known(name) {
            return Err(SimError::DuplicateName { name: name.to_string() });
        }
        if size > self.config.total_size {
            warn!("{} wants {} units, more than the {} available in total", name, size, self.config.total_size);
        }

        let now = self.clock.now();
        let process = Rc::new(Process::new(self.history.len(), name.to_string(), size, now));
        self.history.push(process.clone());
        if !self.allocator.allocate(&process, now) {
            self.queue.enqueue(process.clone(), now);
        }
        self.notify();

        Ok(process)
    }

    /// The resident process `name` leaves. Its space is coalesced with
    /// neighbouring holes and the wait queue gets one retry pass.
    ///
    /// Returns `false` if nobody by that name is resident; waiting
    /// processes cannot be removed.
    pub fn submit_departure(&mut self, name: &str) -> bool {
        let now = self.clock.now();
        let found = self.allocator.free(name, now);
        if found {
            let admitted = self.queue.drain_and_retry(&mut self.allocator, now);
            if !admitted.is_empty() {
                info!(
                    "Admitted from queue: {} ({} still waiting)",
                    admitted.iter().map(|p| p.name()).join(", "),
                    self.queue.len()
                );
            }
        } else {
            warn!("Nothing to remove: {:?} is not resident", name);
        }
        self.notify();

        found
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Simulation<C>) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer(&*self);
        }
        self.observers = observers;
    }

    fn is_known(&self, name: &str) -> bool {
        self.allocator.resident(name).is_some() || self.queue.contains(name)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.allocator.blocks(), self.queue.iter(), self.history.iter())
    }

    #[inline]
    pub fn clock(&self) -> &C { &self.clock }

    #[inline]
    pub fn blocks(&self) -> &BlockList { self.allocator.blocks() }

    pub fn waiting(&self) -> impl Iterator<Item = &ProcessHandle> + '_ {
        self.queue.iter()
    }

    pub fn waiting_len(&self) -> usize { self.queue.len() }

    /// Every process ever submitted, in submission order.
    pub fn history(&self) -> &[ProcessHandle] { &self.history }

    /// The most recently submitted process called `name`.
    pub fn find(&self, name: &str) -> Option<&ProcessHandle> {
        self.history
            .iter()
            .rev()
            .find(|p| p.name() == name)
    }

    /// Names that a departure request may currently target, in
    /// address order.
    pub fn resident_names(&self) -> Vec<String> {
        self.blocks()
            .iter()
            .filter_map(|b| b.owner())
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn total_size(&self) -> Units { self.blocks().total_size() }

    pub fn used_size(&self) -> Units { self.blocks().used_size() }

    pub fn free_size(&self) -> Units { self.blocks().free_size() }
}
