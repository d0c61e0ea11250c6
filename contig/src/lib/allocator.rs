use crate::utils::*;
use crate::block::{Block, BlockList};
use crate::process::ProcessHandle;
use log::{debug, info, warn};

/// First-fit placement over a [`BlockList`], with splitting on
/// allocation and exhaustive coalescing on release.
///
/// The allocator does not read any clock by itself: callers hand it the
/// current time so that one request sees one instant throughout.
#[derive(Clone, Debug)]
pub struct Allocator {
    blocks: BlockList,
}

impl Allocator {
    pub fn new(total: Units) -> Result<Self, SimError> {
        if total == 0 {
            return Err(SimError::ZeroCapacity);
        }

        Ok(Self { blocks: BlockList::new(total) })
    }

    #[inline]
    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    /// Index of the leftmost free block that can hold `size` units.
    pub fn first_fit(&self, size: Units) -> Option<usize> {
        self.blocks.blocks
            .iter()
            .position(|b| b.is_free() && b.size >= size)
    }

    /// The block currently owned by `name`, if any.
    pub fn resident(&self, name: &str) -> Option<&ProcessHandle> {
        self.blocks
            .position_of(name)
            .and_then(|idx| self.blocks.blocks[idx].owner())
    }

    /// Places `process` in the first free block that fits it. Returns
    /// `false`, leaving everything untouched, if there is none or if the
    /// process is already resident or gone.
    ///
    /// A block bigger than the request is split: the process gets the
    /// leading part and the remainder becomes a new free block right
    /// after it.
    pub fn allocate(&mut self, process: &ProcessHandle, now: Duration) -> bool {
        if !process.is_admissible() {
            warn!("{} cannot be placed while {:?}", process.name(), process.status());
            return false;
        }
        let want = process.size();
        if want == 0 {
            return false;
        }
        let idx = match self.first_fit(want) {
            Some(idx)   => { idx },
            None        => {
                debug!(
                    "No hole fits {} ({} units, {} free in {} hole(s))",
                    process.name(), want, self.blocks.free_size(), self.blocks.fragmentation().holes
                );
                return false;
            }
        };

        let chosen = &mut self.blocks.blocks[idx];
        let remainder = chosen.size - want;
        chosen.size = want;
        chosen.owner = Some(process.clone());
        if remainder > 0 {
            self.blocks.blocks.insert(idx + 1, Block::hole(remainder));
            debug!("Split block #{}: {} for {}, {} left free", idx, want, process.name(), remainder);
        }
        process.admit(now);
        info!(
            "{} placed in block #{} ({} units, {} / {} used)",
            process.name(), idx, want, self.blocks.used_size(), self.blocks.total_size()
        );

        true
    }

    /// Releases the block owned by `name` and merges the freed space with
    /// its free neighbours. Returns `false` if no resident process goes
    /// by that name.
    pub fn free(&mut self, name: &str, now: Duration) -> bool {
        let idx = match self.blocks.position_of(name) {
            Some(idx)   => { idx },
            None        => { return false; }
        };
        if let Some(owner) = self.blocks.blocks[idx].owner.take() {
            if !owner.depart(now) {
                warn!("{} owned block #{} while {:?}", owner.name(), idx, owner.status());
            }
            info!("{} left block #{} ({} units freed)", owner.name(), idx, owner.size());
        }
        let merges = self.coalesce();
        if merges > 0 {
            debug!("Coalesced {} hole(s), {} block(s) remain", merges, self.blocks.len());
        }

        true
    }

    /// Merges every run of neighbouring free blocks into one. Returns the
    /// number of merges performed; a second call in a row always
    /// returns 0.
    pub fn coalesce(&mut self) -> usize {
        let blocks = &mut self.blocks.blocks;
        let mut merges = 0;
        let mut idx = 0;
        while idx + 1 < blocks.len() {
            if blocks[idx].is_free() && blocks[idx + 1].is_free() {
                let absorbed = blocks.remove(idx + 1);
                blocks[idx].size += absorbed.size;
                merges += 1;
                // Stay put: the grown block has a new right neighbour.
            } else {
                idx += 1;
            }
        }

        merges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Process, Status};

    fn proc(id: usize, name: &str, size: Units) -> ProcessHandle {
        Rc::new(Process::new(id, name.to_string(), size, Duration::ZERO))
    }

    fn layout(a: &Allocator) -> Vec<(Option<String>, Units)> {
        a.blocks()
            .iter()
            .map(|b| (b.owner().map(|p| p.name().to_string()), b.size()))
            .collect()
    }

    #[test]
    fn exact_fit_claims_block_in_place() {
        let mut a = Allocator::new(50).unwrap();
        assert!(a.allocate(&proc(0, "A", 50), Duration::ZERO));
        assert_eq!(layout(&a), vec![(Some("A".into()), 50)]);
        assert_eq!(a.blocks().free_size(), 0);
    }

    #[test]
    fn split_leaves_trailing_hole() {
        let mut a = Allocator::new(100).unwrap();
        let p = proc(0, "A", 30);
        assert!(a.allocate(&p, Duration::from_millis(4)));
        assert_eq!(layout(&a), vec![(Some("A".into()), 30), (None, 70)]);
        assert_eq!(a.blocks().free_size(), 70);
        assert_eq!(p.status(), Status::Resident);
        assert_eq!(p.admission(), Some(Duration::from_millis(4)));
    }

    #[test]
    fn rejection_leaves_blocks_untouched() {
        let mut a = Allocator::new(20).unwrap();
        assert!(a.allocate(&proc(0, "A", 15), Duration::ZERO));
        let before = layout(&a);
        let p = proc(1, "B", 6);
        assert!(!a.allocate(&p, Duration::ZERO));
        assert_eq!(layout(&a), before);
        assert_eq!(p.status(), Status::New);
    }

    #[test]
    fn first_fit_takes_leftmost_hole() {
        let mut a = Allocator::new(100).unwrap();
        for (i, n) in ["A", "B", "C"].iter().enumerate() {
            assert!(a.allocate(&proc(i, n, 10), Duration::ZERO));
        }
        assert!(a.free("A", Duration::ZERO));
        assert!(a.free("C", Duration::ZERO));
        // Holes: [0..10) and [20..100).
        assert_eq!(a.first_fit(5), Some(0));
        assert_eq!(a.first_fit(11), Some(2));
        assert!(a.allocate(&proc(3, "D", 5), Duration::ZERO));
        assert_eq!(
            layout(&a),
            vec![(Some("D".into()), 5), (None, 5), (Some("B".into()), 10), (None, 80)]
        );
    }

    #[test]
    fn freeing_middle_block_cascades() {
        let mut a = Allocator::new(30).unwrap();
        for (i, n) in ["A", "B", "C"].iter().enumerate() {
            assert!(a.allocate(&proc(i, n, 10), Duration::ZERO));
        }
        assert!(a.free("A", Duration::ZERO));
        assert!(a.free("C", Duration::ZERO));
        assert_eq!(a.blocks().len(), 3);
        assert!(a.free("B", Duration::ZERO));
        assert_eq!(layout(&a), vec![(None, 30)]);
    }

    #[test]
    fn coalesce_merges_long_runs_and_is_idempotent() {
        let mut a = Allocator::new(40).unwrap();
        a.blocks.blocks = vec![
            Block::hole(10),
            Block::hole(10),
            Block::hole(10),
            Block::hole(10),
        ];
        assert_eq!(a.coalesce(), 3);
        assert_eq!(layout(&a), vec![(None, 40)]);
        assert_eq!(a.coalesce(), 0);
        assert_eq!(layout(&a), vec![(None, 40)]);
    }

    #[test]
    fn unknown_name_frees_nothing() {
        let mut a = Allocator::new(10).unwrap();
        assert!(a.allocate(&proc(0, "A", 4), Duration::ZERO));
        let before = layout(&a);
        assert!(!a.free("Z", Duration::ZERO));
        assert_eq!(layout(&a), before);
    }

    #[test]
    fn resident_process_is_not_placed_twice() {
        let mut a = Allocator::new(20).unwrap();
        let p = proc(0, "A", 5);
        assert!(a.allocate(&p, Duration::ZERO));
        let before = layout(&a);
        assert!(!a.allocate(&p, Duration::from_millis(1)));
        assert_eq!(layout(&a), before);
        assert_eq!(a.blocks().iter().filter(|b| b.is_owned_by("A")).count(), 1);
        assert_eq!(p.admission(), Some(Duration::ZERO));
    }

    #[test]
    fn departed_process_stays_departed() {
        let mut a = Allocator::new(20).unwrap();
        let p = proc(0, "A", 5);
        assert!(a.allocate(&p, Duration::ZERO));
        assert!(a.free("A", Duration::from_millis(1)));

        let mut fresh = Allocator::new(20).unwrap();
        assert!(!fresh.allocate(&p, Duration::from_millis(2)));
        assert_eq!(layout(&fresh), vec![(None, 20)]);
        assert_eq!(p.status(), Status::Departed);
        assert!(!a.allocate(&p, Duration::from_millis(2)));
        assert_eq!(layout(&a), vec![(None, 20)]);
    }

    #[test]
    fn zero_capacity_is_refused() {
        assert_eq!(Allocator::new(0).unwrap_err(), SimError::ZeroCapacity);
    }
}
