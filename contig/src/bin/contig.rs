use contig::*;
use contig::script::{replay, CsvScript, EventSource, ReplayStats};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use itertools::Itertools;
use serde::Serialize;
use std::path::PathBuf;

/// Replays a scenario of process arrivals and departures against a
/// contiguous, first-fit memory.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Total memory, in units
    #[arg(short, long, value_parser = clap::value_parser!(Units))]
    total:          Units,

    /// Path to scenario (CSV: time_ms,op,name,size)
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    script:         PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format:         Format,

    /// Refuse arrivals whose name is already resident or waiting
    #[arg(long)]
    unique_names:   bool,

    /// Print the memory summary after every request
    #[arg(long)]
    trace:          bool,

    /// Raise log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose:        u8,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum Format {
    /// Human-readable tables
    Text,
    /// A single JSON document
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    stats:      &'a ReplayStats,
    snapshot:   &'a Snapshot,
}

fn main() -> Result<()> {
    let cli = Args::parse();
    let default_level = match cli.verbose {
        0   => "warn",
        1   => "info",
        _   => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let events = CsvScript::new(cli.script.clone())
        .read_events()
        .with_context(|| format!("reading scenario {}", cli.script.display()))?;
    let config = SimConfig::new(cli.total).unique_names(cli.unique_names);
    let mut sim = Simulation::with_clock(config, ManualClock::new())
        .context("starting simulation")?;
    if cli.trace {
        sim.subscribe(|s| {
            let at = s.clock().now();
            eprintln!("[{:>9}] {}", fmt_time(Some(at)), s.snapshot().summary());
        });
    }

    let stats = replay(&mut sim, &events)
        .with_context(|| format!("replaying {}", cli.script.display()))?;
    let snap = sim.snapshot();

    match cli.format {
        Format::Json    => {
            let report = Report { stats: &stats, snapshot: &snap };
            println!("{}", serde_json::to_string_pretty(&report)?);
        },
        Format::Text    => { print_text(&stats, &snap); }
    }

    Ok(())
}

fn fmt_time(t: Option<std::time::Duration>) -> String {
    match t {
        Some(d) => { format!("{:.3} s", d.as_secs_f64()) },
        None    => { String::from("-") }
    }
}

fn fmt_ms(ms: Option<u64>) -> String {
    fmt_time(ms.map(std::time::Duration::from_millis))
}

fn print_text(stats: &ReplayStats, snap: &Snapshot) {
    println!("{}", snap.summary());
    println!(
        "Holes: {} | Largest hole: {} | External fragmentation: {:.1}%",
        snap.fragmentation.holes,
        snap.fragmentation.largest_free,
        snap.fragmentation.external * 100.0
    );
    println!(
        "Arrivals: {} ({} placed, {} queued) | Departures: {} | Admitted from queue: {} | Nothing to remove: {}",
        stats.arrivals,
        stats.placed_on_arrival,
        stats.queued_on_arrival,
        stats.departures,
        stats.admitted_from_queue,
        stats.unknown_departures
    );

    println!("\nMemory map");
    for b in &snap.blocks {
        let label = match &b.owner {
            Some(name)  => { name.as_str() },
            None        => { "free" }
        };
        println!("  [{:>8} .. {:>8})  {:<16} {:>8}", b.offset, b.offset + b.size, label, b.size);
    }

    if !snap.waiting.is_empty() {
        println!("\nWaiting: {}", snap.waiting.iter().map(|p| p.name.as_str()).join(" <- "));
    }

    println!("\nHistory");
    println!(
        "  {:<16} {:>8} {:>11} {:>11} {:>11} {:>11}  {}",
        "Name", "Size", "Arrival", "Admission", "Wait", "Departure", "Status"
    );
    for p in &snap.history {
        println!(
            "  {:<16} {:>8} {:>11} {:>11} {:>11} {:>11}  {}",
            p.name,
            p.size,
            fmt_ms(Some(p.arrival_ms)),
            fmt_ms(p.admission_ms),
            fmt_ms(p.wait_ms),
            fmt_ms(p.departure_ms),
            p.status
        );
    }
}
