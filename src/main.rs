use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use clap::Parser;
use sched_sim::{
    CoreConfig, Sim, SimError, Summary, Workload,
    core::{Snapshot, timeline},
    sim::DEFAULT_MAX_TICKS,
};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sched-sim")]
#[command(about = "Compare CPU scheduling policies on the same workload", long_about = None)]
struct Args {
    /// Workload JSON file (tasks and policies); the built-in demo set when omitted
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Write all run summaries to this JSON file (overwrites)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Time charged per context switch
    #[arg(short = 'c', long)]
    overload_cost: Option<f64>,

    /// Execution granularity per tick
    #[arg(short = 's', long)]
    time_slice: Option<f64>,

    /// Force-finish tasks at the tick they miss their deadline
    #[arg(long)]
    stop_at_deadline: bool,

    /// Milliseconds to sleep between ticks (display only)
    #[arg(short = 't', long, default_value_t = 0)]
    delay: u64,

    /// Wait for Enter before moving on to the next policy
    #[arg(short, long)]
    manual: bool,

    /// Print the per-tick timeline of each run
    #[arg(long)]
    timeline: bool,

    /// Abort a run after this many ticks
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,

    /// Seed for lottery policies that do not set their own
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sched_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let workload = match &args.file {
        Some(path) => Workload::load(path)?,
        None => Workload::default(),
    };

    let base = CoreConfig {
        continue_after_deadline: !args.stop_at_deadline,
        ..CoreConfig::default()
    };
    let mut config = workload.core_config(base);
    if let Some(cost) = args.overload_cost {
        config.overload_cost = cost;
    }
    if let Some(slice) = args.time_slice {
        config.time_slice = slice;
    }

    info!(
        tasks = workload.tasks.len(),
        policies = workload.policies.len(),
        time_slice = config.time_slice,
        overload_cost = config.overload_cost,
        "loaded workload"
    );

    let mut summaries = Vec::with_capacity(workload.policies.len());
    for (i, policy) in workload.policies.iter().enumerate() {
        let mut policy = policy.clone();
        if policy.seed.is_none() {
            policy.seed = args.seed;
        }

        // Every run gets its own copy of the tasks
        let mut sim = Sim::new(workload.tasks()?, policy.build()?, config)?;
        if args.timeline {
            sim = sim.record_history();
        }

        let summary = sim.run_to_completion_with(args.max_ticks, |core, events| {
            for event in events {
                debug!(now = core.now(), ?event);
            }
            if args.delay > 0 {
                thread::sleep(Duration::from_millis(args.delay));
            }
        })?;

        if args.timeline {
            print_timeline(&summary, sim.history());
        }
        print_summary(&summary);
        summaries.push(summary);

        if args.manual && i + 1 < workload.policies.len() {
            wait_for_enter()?;
        }
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&summaries)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "saved results");
    }

    Ok(())
}

fn wait_for_enter() -> io::Result<()> {
    print!("Press Enter to run the next policy...");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

fn print_summary(summary: &Summary) {
    let mode = if summary.preemptive {
        "preemptive"
    } else {
        "non-preemptive"
    };
    println!("{} ({mode})", summary.policy);
    println!("  Total time: {:.2} t.u.", summary.total_time);
    println!(
        "  Overloads: {} ({:.2} t.u.)",
        summary.overload_count, summary.total_overload_time
    );
    println!("  Tasks: {} ({} failed)", summary.task_count, summary.failed_count);
    if !summary.failed_tasks.is_empty() {
        println!("  Missed deadlines: {}", summary.failed_tasks.join(", "));
    }
    println!("  Average turnaround time: {:.2}", summary.avg_turnaround_time);
    println!("  Average wait time: {:.2}", summary.avg_wait_time);
    println!("  Average response time: {:.2}", summary.avg_response_time);
    println!();
}

fn print_timeline(summary: &Summary, history: &[Snapshot]) {
    let Some(first) = history.first() else {
        return;
    };
    let width = first.tasks.iter().map(|t| t.name.len()).max().unwrap_or(0);
    let rows = timeline(history);

    println!("{} timeline (# run, . wait, * switch, = done)", summary.policy);
    for (i, view) in first.tasks.iter().enumerate() {
        let line: String = rows.iter().map(|row| row[i].symbol()).collect();
        println!("  {:>width$} |{line}|", view.name);
    }
}
