use crate::audit::{audit, AuditError};
use contig::{as_millis, Fragmentation, ManualClock, SimConfig, SimError, Simulation, Units};
use rand::prelude::*;
use rayon::prelude::*;
use log::info;
use serde::Serialize;
use thiserror::Error;
use std::time::Duration;

/// Shape of a random workload.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Workload {
    pub total:          Units,
    pub steps:          usize,
    /// Arrivals ask for `1..=max_size` units, uniformly.
    pub max_size:       Units,
    /// Probability that a step is a departure (when anyone is resident).
    pub depart_ratio:   f64,
    pub seed:           u64,
}

/// What one run went through.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    pub seed:                   u64,
    pub arrivals:               usize,
    pub departures:             usize,
    pub queued_on_arrival:      usize,
    pub admitted_from_queue:    usize,
    pub peak_waiting:           usize,
    /// Mean wait of the processes that had to queue and got in.
    pub mean_wait_ms:           Option<f64>,
    pub final_used:             Units,
    pub final_free:             Units,
    pub final_waiting:          usize,
    pub fragmentation:          Fragmentation,
}

#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("bad workload: {0}")]
    BadWorkload(String),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("seed {seed}, step {step}: {source}")]
    Audit { seed: u64, step: usize, source: AuditError },
}

impl Workload {
    fn check(&self) -> Result<(), WorkloadError> {
        if self.max_size == 0 {
            return Err(WorkloadError::BadWorkload(String::from("max size must be positive")));
        }
        if !(0.0..=1.0).contains(&self.depart_ratio) {
            return Err(WorkloadError::BadWorkload(format!("departure ratio {} not in [0, 1]", self.depart_ratio)));
        }

        Ok(())
    }
}

/// Runs `workload.steps` random requests against a fresh simulation, auditing
/// it after every single one. Each step advances the clock by 1 ms.
pub fn run(workload: Workload) -> Result<RunReport, WorkloadError> {
    workload.check()?;
    let mut rng = StdRng::seed_from_u64(workload.seed);
    let mut sim = Simulation::with_clock(SimConfig::new(workload.total), ManualClock::new())?;
    let mut report = RunReport {
        seed:                   workload.seed,
        arrivals:               0,
        departures:             0,
        queued_on_arrival:      0,
        admitted_from_queue:    0,
        peak_waiting:           0,
        mean_wait_ms:           None,
        final_used:             0,
        final_free:             0,
        final_waiting:          0,
        fragmentation:          sim.blocks().fragmentation(),
    };

    for step in 0..workload.steps {
        sim.clock().advance(Duration::from_millis(1));
        let residents = sim.resident_names();
        let victim = if rng.gen_bool(workload.depart_ratio) {
            residents.choose(&mut rng)
        } else {
            None
        };
        match victim {
            Some(name)  => {
                let before = sim.waiting_len();
                sim.submit_departure(name);
                report.departures += 1;
                report.admitted_from_queue += before - sim.waiting_len();
            },
            None        => {
                let size = rng.gen_range(1..=workload.max_size);
                let p = sim.submit_arrival(&format!("p{}", step), size)?;
                report.arrivals += 1;
                if p.is_waiting() {
                    report.queued_on_arrival += 1;
                }
            }
        }
        report.peak_waiting = report.peak_waiting.max(sim.waiting_len());
        audit(&sim).map_err(|source| WorkloadError::Audit { seed: workload.seed, step, source })?;
    }

    let waits: Vec<u64> = sim.history()
        .iter()
        .filter_map(|p| p.wait())
        .map(as_millis)
        .collect();
    if !waits.is_empty() {
        report.mean_wait_ms = Some(waits.iter().sum::<u64>() as f64 / waits.len() as f64);
    }
    report.final_used = sim.used_size();
    report.final_free = sim.free_size();
    report.final_waiting = sim.waiting_len();
    report.fragmentation = sim.blocks().fragmentation();
    info!(
        "Seed {} done: {} arrivals, {} departures, {} still waiting",
        workload.seed, report.arrivals, report.departures, report.final_waiting
    );

    Ok(report)
}

/// `runs` independent runs, seeded `workload.seed`, `workload.seed + 1`, ...
/// Runs are spread over the rayon pool; results keep seed order.
pub fn run_many(workload: Workload, runs: usize) -> Vec<Result<RunReport, WorkloadError>> {
    (0..runs as u64)
        .into_par_iter()
        .map(|i| run(Workload { seed: workload.seed.wrapping_add(i), ..workload }))
        .collect()
}
