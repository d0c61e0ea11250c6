//! Sanity tooling for `contig`: an invariant [`audit`](audit::audit) that
//! can be run against any [`Simulation`](contig::Simulation), and seeded
//! random workloads that exercise it.

pub mod audit;
pub mod workload;

pub use crate::audit::{audit, AuditError};
pub use crate::workload::{run, run_many, RunReport, WorkloadError, Workload};
