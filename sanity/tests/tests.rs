use sanity::*;
use contig::{ManualClock, SimConfig, Simulation};

fn workload(seed: u64) -> Workload {
    Workload {
        total:          256,
        steps:          2_000,
        max_size:       64,
        depart_ratio:   0.4,
        seed,
    }
}

#[test]
fn fresh_simulation_passes_audit() {
    let sim = Simulation::with_clock(SimConfig::new(10), ManualClock::new()).unwrap();
    assert_eq!(audit(&sim), Ok(()));
}

#[test]
fn audit_holds_through_hand_driven_requests() {
    let mut sim = Simulation::with_clock(SimConfig::new(30), ManualClock::new()).unwrap();
    for (n, s) in [("a", 10), ("b", 10), ("c", 10), ("d", 5), ("e", 25)] {
        sim.submit_arrival(n, s).unwrap();
        assert_eq!(audit(&sim), Ok(()));
    }
    for n in ["a", "c", "b", "d"] {
        sim.submit_departure(n);
        assert_eq!(audit(&sim), Ok(()));
    }
}

#[test]
fn random_workloads_keep_invariants() {
    for seed in 0..4 {
        let report = run(workload(seed)).unwrap();
        assert_eq!(report.arrivals + report.departures, 2_000);
        assert_eq!(report.final_used + report.final_free, 256);
        assert!(report.admitted_from_queue <= report.queued_on_arrival);
        assert!(report.final_waiting <= report.peak_waiting);
    }
}

#[test]
fn same_seed_same_run() {
    assert_eq!(run(workload(42)).unwrap(), run(workload(42)).unwrap());
}

#[test]
fn departure_heavy_workload_drains_queue() {
    let report = run(Workload { depart_ratio: 1.0, ..workload(7) }).unwrap();
    // Memory is empty on every arrival, so requests alternate.
    assert_eq!(report.arrivals, 1_000);
    assert_eq!(report.queued_on_arrival, 0);
    assert_eq!(report.final_waiting, 0);
}

#[test]
fn many_runs_keep_seed_order() {
    let reports = run_many(workload(100), 6);
    assert_eq!(reports.len(), 6);
    for (i, r) in reports.into_iter().enumerate() {
        assert_eq!(r.unwrap().seed, 100 + i as u64);
    }
}

#[test]
fn bad_workloads_are_refused() {
    assert!(matches!(
        run(Workload { depart_ratio: 1.5, ..workload(0) }),
        Err(WorkloadError::BadWorkload(_))
    ));
    assert!(matches!(
        run(Workload { max_size: 0, ..workload(0) }),
        Err(WorkloadError::BadWorkload(_))
    ));
    assert!(matches!(
        run(Workload { total: 0, ..workload(0) }),
        Err(WorkloadError::Sim(_))
    ));
}
