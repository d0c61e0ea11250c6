use crate::utils::*;
use crate::block::{BlockList, Fragmentation};
use crate::process::{Process, Status};
use serde::Serialize;

/// A block as seen from the outside.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockView {
    pub offset: Units,
    pub size:   Units,
    pub owner:  Option<String>,
}

/// A process as seen from the outside. Times are milliseconds since the
/// simulation started.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub name:           String,
    pub size:           Units,
    pub status:         Status,
    pub arrival_ms:     u64,
    pub admission_ms:   Option<u64>,
    pub wait_ms:        Option<u64>,
    pub departure_ms:   Option<u64>,
}

impl From<&Process> for ProcessSummary {
    fn from(p: &Process) -> Self {
        Self {
            name:           p.name().to_string(),
            size:           p.size(),
            status:         p.status(),
            arrival_ms:     as_millis(p.arrival()),
            admission_ms:   p.admission().map(as_millis),
            wait_ms:        p.wait().map(as_millis),
            departure_ms:   p.departure().map(as_millis),
        }
    }
}

/// Read-only picture of the whole simulation after some operation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub blocks:         Vec<BlockView>,
    pub waiting:        Vec<ProcessSummary>,
    pub history:        Vec<ProcessSummary>,
    pub total_size:     Units,
    pub used_size:      Units,
    pub free_size:      Units,
    pub fragmentation:  Fragmentation,
}

impl Snapshot {
    pub(crate) fn capture<'a, W, H>(blocks: &BlockList, waiting: W, history: H) -> Self
    where
        W: IntoIterator<Item = &'a Rc<Process>>,
        H: IntoIterator<Item = &'a Rc<Process>>,
    {
        Self {
            blocks: blocks
                .with_offsets()
                .map(|(offset, b)| BlockView {
                    offset,
                    size:   b.size(),
                    owner:  b.owner().map(|p| p.name().to_string()),
                })
                .collect(),
            waiting:        waiting.into_iter().map(|p| ProcessSummary::from(&**p)).collect(),
            history:        history.into_iter().map(|p| ProcessSummary::from(&**p)).collect(),
            total_size:     blocks.total_size(),
            used_size:      blocks.used_size(),
            free_size:      blocks.free_size(),
            fragmentation:  blocks.fragmentation(),
        }
    }

    /// One-line memory status, e.g. `Memory used: 70 / 100 | Free: 30 | Waiting: 0`.
    pub fn summary(&self) -> String {
        format!(
            "Memory used: {} / {} | Free: {} | Waiting: {}",
            self.used_size, self.total_size, self.free_size, self.waiting.len()
        )
    }

    /// Names of resident processes in address order.
    pub fn residents(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| b.owner.as_deref())
            .collect()
    }

    pub fn count(&self, status: Status) -> usize {
        self.history
            .iter()
            .filter(|p| p.status == status)
            .count()
    }
}
