use sanity::*;
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use contig::Units;

/// Seeded random arrivals and departures against a first-fit memory,
/// auditing every invariant after each request.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Total memory, in units
    #[arg(short, long, default_value_t = 1024)]
    #[arg(value_parser = clap::value_parser!(Units))]
    total:          Units,

    /// Requests per run
    #[arg(long, default_value_t = 10_000)]
    steps:          usize,

    /// Number of independent runs
    #[arg(short, long, default_value_t = 8)]
    runs:           usize,

    /// Seed of the first run
    #[arg(short, long, default_value_t = 0)]
    seed:           u64,

    /// Largest size an arrival may ask for
    #[arg(short, long, default_value_t = 128)]
    #[arg(value_parser = clap::value_parser!(Units))]
    max_size:       Units,

    /// Probability of a step being a departure
    #[arg(short, long, default_value_t = 0.45)]
    depart_ratio:   f64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format:         Format,

    /// Raise log verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose:        u8,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Args::parse();
    let default_level = match cli.verbose {
        0   => "warn",
        1   => "info",
        _   => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let workload = Workload {
        total:          cli.total,
        steps:          cli.steps,
        max_size:       cli.max_size,
        depart_ratio:   cli.depart_ratio,
        seed:           cli.seed,
    };
    let (reports, failures): (Vec<_>, Vec<_>) = run_many(workload, cli.runs)
        .into_iter()
        .partition(|r| r.is_ok());
    let reports: Vec<RunReport> = reports.into_iter().filter_map(Result::ok).collect();

    match cli.format {
        Format::Json    => { println!("{}", serde_json::to_string_pretty(&reports)?); },
        Format::Text    => {
            for r in &reports {
                println!(
                    "seed {:>4}: {} arrivals ({} queued, {} admitted later), {} departures, \
                     peak queue {}, mean wait {}, final {} / {} used, {} hole(s), ext. frag {:.1}%",
                    r.seed,
                    r.arrivals,
                    r.queued_on_arrival,
                    r.admitted_from_queue,
                    r.departures,
                    r.peak_waiting,
                    r.mean_wait_ms.map_or(String::from("-"), |w| format!("{:.1} ms", w)),
                    r.final_used,
                    workload.total,
                    r.fragmentation.holes,
                    r.fragmentation.external * 100.0
                );
            }
        }
    }

    if !failures.is_empty() {
        for f in failures.iter().filter_map(|r| r.as_ref().err()) {
            eprintln!("{}", f);
        }
        bail!("{} of {} run(s) failed", failures.len(), cli.runs);
    }

    Ok(())
}
