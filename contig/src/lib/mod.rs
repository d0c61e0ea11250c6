//! Welcome to `contig`!
//!
//! A simulation of contiguous, single-region memory allocation. A fixed
//! address space is carved into [`Block`]s; arriving processes are placed
//! *first-fit*, splitting the chosen hole, and departing ones give their
//! block back, which is then merged with every free neighbour. Whoever
//! does not fit waits in a FIFO [`WaitQueue`] that gets one retry pass
//! after each departure.
//!
//! [`Simulation`] is the entry point. Presentation is left to the caller:
//! the library only offers [`Snapshot`]s and change notifications.

mod utils;
mod clock;
mod process;
mod block;
mod allocator;
mod queue;
mod snapshot;
mod sim;
pub mod script;

pub use crate::utils::{Units, SimError, ScriptError, as_millis};
pub use crate::clock::{Clock, MonotonicClock, ManualClock};
pub use crate::process::{Process, ProcessHandle, Status};
pub use crate::block::{Block, BlockList, Fragmentation};
pub use crate::allocator::Allocator;
pub use crate::queue::WaitQueue;
pub use crate::snapshot::{BlockView, ProcessSummary, Snapshot};
pub use crate::sim::{Observer, SimConfig, Simulation};
