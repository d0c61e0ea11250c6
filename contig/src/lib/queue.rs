use crate::utils::*;
use crate::allocator::Allocator;
use crate::process::ProcessHandle;
use log::{info, warn};

/// Processes that did not fit on arrival, oldest first.
#[derive(Debug, Default)]
pub struct WaitQueue {
    waiting: VecDeque<ProcessHandle>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `process` to the tail and starts its wait timer. Only new
    /// processes may queue; anything else is refused with `false`.
    pub fn enqueue(&mut self, process: ProcessHandle, now: Duration) -> bool {
        if !process.start_waiting(now) {
            warn!("{} cannot queue while {:?}", process.name(), process.status());
            return false;
        }
        info!("{} queued ({} units), {} waiting", process.name(), process.size(), self.waiting.len() + 1);
        self.waiting.push_back(process);

        true
    }

    /// One head-to-tail pass over the queue, offering each waiter to the
    /// allocator in turn. Admitted waiters leave the queue on the spot, so
    /// the ones behind them are tried against whatever space is left.
    ///
    /// Returns the admitted processes in admission order. Entries that
    /// were placed behind the queue's back are dropped from it.
    pub fn drain_and_retry(&mut self, allocator: &mut Allocator, now: Duration) -> Vec<ProcessHandle> {
        let mut admitted = vec![];
        self.waiting.retain(|p| {
            if !p.is_waiting() {
                false
            } else if allocator.allocate(p, now) {
                admitted.push(p.clone());
                false
            } else {
                true
            }
        });

        admitted
    }

    #[inline]
    pub fn len(&self) -> usize { self.waiting.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.waiting.is_empty() }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, ProcessHandle> {
        self.waiting.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.waiting
            .iter()
            .any(|p| p.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Process, Status};

    fn proc(id: usize, name: &str, size: Units) -> ProcessHandle {
        Rc::new(Process::new(id, name.to_string(), size, Duration::ZERO))
    }

    #[test]
    fn blocked_head_does_not_stop_the_pass() {
        // 10 units, all taken by "X".
        let mut alloc = Allocator::new(10).unwrap();
        assert!(alloc.allocate(&proc(0, "X", 10), Duration::ZERO));

        let mut q = WaitQueue::new();
        let big = proc(1, "big", 8);
        let small = proc(2, "small", 3);
        let tiny = proc(3, "tiny", 2);
        assert!(q.enqueue(big.clone(), Duration::ZERO));
        assert!(q.enqueue(small.clone(), Duration::ZERO));
        assert!(q.enqueue(tiny.clone(), Duration::ZERO));

        assert!(alloc.free("X", Duration::from_secs(1)));
        let admitted = q.drain_and_retry(&mut alloc, Duration::from_secs(1));

        // `big` gets the first 8 units; `small` no longer fits; `tiny`
        // takes the last 2.
        let names: Vec<&str> = admitted.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["big", "tiny"]);
        assert_eq!(q.len(), 1);
        assert!(q.contains("small"));
        assert_eq!(small.status(), Status::Waiting);
        assert_eq!(big.wait(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn only_new_processes_queue() {
        let mut alloc = Allocator::new(10).unwrap();
        let mut q = WaitQueue::new();
        let resident = proc(0, "A", 4);
        assert!(alloc.allocate(&resident, Duration::ZERO));
        assert!(!q.enqueue(resident.clone(), Duration::ZERO));
        assert_eq!(resident.status(), Status::Resident);

        let waiter = proc(1, "B", 20);
        assert!(q.enqueue(waiter.clone(), Duration::ZERO));
        assert!(!q.enqueue(waiter.clone(), Duration::ZERO));
        assert_eq!(q.len(), 1);

        assert!(alloc.free("A", Duration::ZERO));
        assert!(!q.enqueue(resident.clone(), Duration::ZERO));
        assert_eq!(resident.status(), Status::Departed);
        assert!(!q.contains("A"));
    }

    #[test]
    fn waiter_placed_elsewhere_leaves_the_queue() {
        let mut alloc = Allocator::new(10).unwrap();
        let mut q = WaitQueue::new();
        let p = proc(0, "A", 4);
        assert!(q.enqueue(p.clone(), Duration::ZERO));
        assert!(alloc.allocate(&p, Duration::ZERO));

        let admitted = q.drain_and_retry(&mut alloc, Duration::from_millis(1));
        assert!(admitted.is_empty());
        assert!(q.is_empty());
        assert_eq!(alloc.blocks().iter().filter(|b| b.is_owned_by("A")).count(), 1);
    }

    #[test]
    fn empty_pass_is_harmless() {
        let mut alloc = Allocator::new(10).unwrap();
        let mut q = WaitQueue::new();
        assert!(q.drain_and_retry(&mut alloc, Duration::ZERO).is_empty());
        assert!(q.is_empty());
    }
}
