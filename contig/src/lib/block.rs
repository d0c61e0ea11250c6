use crate::utils::*;
use crate::process::ProcessHandle;
use serde::Serialize;

/// A contiguous stretch of the address space. Free when
/// [`owner`](Block::owner) is `None`.
#[derive(Clone, Debug)]
pub struct Block {
    pub(crate) size:    Units,
    pub(crate) owner:   Option<ProcessHandle>,
}

impl Block {
    pub(crate) fn hole(size: Units) -> Self {
        Self { size, owner: None }
    }

    #[inline]
    pub fn size(&self) -> Units { self.size }

    #[inline]
    pub fn owner(&self) -> Option<&ProcessHandle> { self.owner.as_ref() }

    #[inline]
    pub fn is_free(&self) -> bool { self.owner.is_none() }

    /// `true` if the block belongs to a process called `name`.
    pub fn is_owned_by(&self, name: &str) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|p| p.name() == name)
    }
}

/// How scattered the free space is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Fragmentation {
    /// Number of free blocks.
    pub holes:          usize,
    pub largest_free:   Units,
    /// `1 - largest_free / free`. Zero when all free space is in a
    /// single hole, or when there is no free space at all.
    pub external:       f64,
}

/// The address space, as an address-ordered sequence of [`Block`]s.
///
/// The list is only mutated by the [`Allocator`](crate::Allocator),
/// which keeps the following true between operations:
///
/// 1. block sizes add up to [`total_size`](BlockList::total_size),
/// 2. no two neighbouring blocks are both free,
/// 3. no block is empty,
/// 4. a process owns at most one block.
///
/// There is always at least one block.
#[derive(Clone, Debug)]
pub struct BlockList {
    pub(crate) blocks:  Vec<Block>,
    total:              Units,
}

impl BlockList {
    pub(crate) fn new(total: Units) -> Self {
        Self {
            blocks: vec![Block::hole(total)],
            total,
        }
    }

    /// Constant for the simulation's lifetime.
    #[inline]
    pub fn total_size(&self) -> Units { self.total }

    pub fn used_size(&self) -> Units {
        self.blocks
            .iter()
            .filter(|b| !b.is_free())
            .map(|b| b.size)
            .sum()
    }

    pub fn free_size(&self) -> Units {
        self.total - self.used_size()
    }

    #[inline]
    pub fn len(&self) -> usize { self.blocks.len() }

    /// Whether the list holds no blocks at all.
    #[inline]
    pub fn is_empty(&self) -> bool { self.blocks.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Blocks in address order, each paired with its starting offset.
    pub fn with_offsets(&self) -> impl Iterator<Item = (Units, &Block)> + '_ {
        self.blocks
            .iter()
            .scan(0, |offset, b| {
                let start = *offset;
                *offset += b.size;
                Some((start, b))
            })
    }

    /// Index of the block owned by `name`, if that process is resident.
    /// With duplicate names the lowest address wins.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.is_owned_by(name))
    }

    pub fn fragmentation(&self) -> Fragmentation {
        let (holes, largest_free, free) = self.blocks
            .iter()
            .filter(|b| b.is_free())
            .fold((0, 0, 0), |(n, max, sum), b| (n + 1, max.max(b.size), sum + b.size));
        let external = if free == 0 {
            0.0
        } else {
            1.0 - largest_free as f64 / free as f64
        };

        Fragmentation { holes, largest_free, external }
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
