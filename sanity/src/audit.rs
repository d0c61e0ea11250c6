use contig::{Clock, Simulation, Status, Units};
use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;

/// The first broken rule found by [`audit`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("block list is empty")]
    NoBlocks,
    #[error("blocks add up to {sum} units, expected {total}")]
    Partition { sum: Units, total: Units },
    #[error("block #{index} is empty")]
    EmptyBlock { index: usize },
    #[error("free block #{index} is followed by another free block")]
    AdjacentHoles { index: usize },
    #[error("{name} owns {count} blocks")]
    SharedOwner { name: String, count: usize },
    #[error("{name} is queued {count} times")]
    QueuedTwice { name: String, count: usize },
    #[error("{name} is both resident and waiting")]
    ResidentAndWaiting { name: String },
    #[error("{name} is {found:?}, expected {expected:?}")]
    WrongStatus { name: String, expected: Status, found: Status },
}

// History id -> (name, occurrences).
type Tally<'s> = IndexMap<usize, (&'s str, usize)>;

/// Checks everything that must hold between two requests:
///
/// - the blocks partition the address space and none is empty,
/// - no two neighbouring blocks are free,
/// - a process owns at most one block and sits in the queue at most once,
/// - nobody is both resident and waiting,
/// - every recorded status agrees with where the process actually is.
pub fn audit<C: Clock>(sim: &Simulation<C>) -> Result<(), AuditError> {
    let blocks = sim.blocks();
    if blocks.is_empty() {
        return Err(AuditError::NoBlocks);
    }

    let sum: Units = blocks.iter().map(|b| b.size()).sum();
    if sum != blocks.total_size() {
        return Err(AuditError::Partition { sum, total: blocks.total_size() });
    }
    if let Some(index) = blocks.iter().position(|b| b.size() == 0) {
        return Err(AuditError::EmptyBlock { index });
    }
    let adjacent = blocks.iter()
        .tuple_windows::<(_, _)>()
        .position(|(a, b)| a.is_free() && b.is_free());
    if let Some(index) = adjacent {
        return Err(AuditError::AdjacentHoles { index });
    }

    let mut owners: Tally = IndexMap::new();
    for p in blocks.iter().filter_map(|b| b.owner()) {
        owners.entry(p.id()).or_insert((p.name(), 0)).1 += 1;
    }
    if let Some((name, count)) = owners.values().find(|(_, c)| *c > 1) {
        return Err(AuditError::SharedOwner { name: name.to_string(), count: *count });
    }

    let mut queued: Tally = IndexMap::new();
    for p in sim.waiting() {
        queued.entry(p.id()).or_insert((p.name(), 0)).1 += 1;
    }
    if let Some((name, count)) = queued.values().find(|(_, c)| *c > 1) {
        return Err(AuditError::QueuedTwice { name: name.to_string(), count: *count });
    }
    let both = queued.iter()
        .find(|(id, _)| owners.contains_key(*id))
        .map(|(_, (name, _))| *name);
    if let Some(name) = both {
        return Err(AuditError::ResidentAndWaiting { name: name.to_string() });
    }

    for p in sim.history() {
        let expected = if owners.contains_key(&p.id()) {
            Status::Resident
        } else if queued.contains_key(&p.id()) {
            Status::Waiting
        } else {
            Status::Departed
        };
        if p.status() != expected {
            return Err(AuditError::WrongStatus {
                name:       p.name().to_string(),
                expected,
                found:      p.status(),
            });
        }
    }

    Ok(())
}
