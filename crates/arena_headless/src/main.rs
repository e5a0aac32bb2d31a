//! Headless arena runner.
//!
//! This binary runs the arena without graphics, controlled via JSON on
//! stdin/stdout. Designed for bots, CI testing, and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p arena_headless
//!
//! # Run a scenario for one minute of game time, printing state every second
//! cargo run -p arena_headless -- run --scenario scenarios/skirmish.ron --ticks 3750 --every 62
//!
//! # Check that eight copies end on the same state hash
//! cargo run -p arena_headless -- verify --runs 8 --ticks 10000
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_headless::{batch::verify_determinism, runner::HeadlessRunner, scenario::Scenario};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless arena runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario for a fixed number of ticks
    Run {
        /// Scenario file to load (default: four-corner skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of ticks to run
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Print a state line every N ticks (0 = summary only)
        #[arg(short, long, default_value = "0")]
        every: u64,
    },

    /// Serve JSON-line commands on stdin
    Interactive {
        /// Scenario file to load (default: four-corner skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },

    /// Verify determinism by running the same scenario in parallel
    Verify {
        /// Scenario file to load (default: four-corner skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario's seed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value = "3600")]
        ticks: u64,
    },

    /// Run N ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Scenario to benchmark
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            ticks,
            every,
        }) => cmd_run(scenario, ticks, every),
        Some(Commands::Interactive { scenario }) => cmd_interactive(scenario),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
            ticks,
        }) => cmd_verify(scenario, seed, runs, ticks),
        Some(Commands::Benchmark { ticks, scenario }) => cmd_benchmark(ticks, scenario),
        None => {
            // Default: interactive mode
            cmd_interactive(None);
        }
    }
}

/// Load a scenario or exit with a message.
fn load_scenario(path: Option<PathBuf>) -> Scenario {
    if let Some(path) = &path {
        tracing::info!("Using scenario: {}", path.display());
    }
    match Scenario::load_or_default(path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    }
}

fn build_runner(scenario: &Scenario) -> HeadlessRunner {
    match HeadlessRunner::new(scenario) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to build scenario '{}': {e}", scenario.name);
            std::process::exit(1);
        }
    }
}

/// Run a scenario for a fixed number of ticks
fn cmd_run(scenario: Option<PathBuf>, ticks: u64, every: u64) {
    let scenario = load_scenario(scenario);
    let mut runner = build_runner(&scenario);
    tracing::info!(ticks, every, "Running {}", scenario.name);

    if let Err(e) = runner.run_for(ticks, every, io::stdout().lock()) {
        eprintln!("Failed to write output: {e}");
        std::process::exit(1);
    }
}

/// Serve an interactive session
fn cmd_interactive(scenario: Option<PathBuf>) {
    let scenario = load_scenario(scenario);
    let mut runner = build_runner(&scenario);
    tracing::info!("Starting interactive session");

    if let Err(e) = runner.run_interactive(io::stdin().lock(), io::stdout().lock()) {
        eprintln!("Session failed: {e}");
        std::process::exit(1);
    }
}

/// Verify determinism
fn cmd_verify(scenario: Option<PathBuf>, seed: Option<u64>, runs: u32, ticks: u64) {
    let mut scenario = load_scenario(scenario);
    if let Some(seed) = seed {
        scenario = scenario.with_seed(seed);
    }
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs, {} ticks)",
        scenario.name,
        scenario.config.seed,
        runs,
        ticks
    );

    let report = match verify_determinism(&scenario, runs, ticks) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        eprintln!("PASS: All {runs} runs produced identical results");
        if let Some(hash) = report.hashes.first() {
            eprintln!("  State hash: {hash:016x}");
        }
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for hash in report.unique_hashes() {
            eprintln!("  Hash: {hash:016x}");
        }
        std::process::exit(1);
    }
}

/// Run benchmark
fn cmd_benchmark(ticks: u64, scenario: Option<PathBuf>) {
    tracing::info!("Running {} tick benchmark", ticks);

    let scenario = load_scenario(scenario);
    let mut sim = match scenario.build() {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("Starting benchmark with {} entities", sim.entities().len());
    eprintln!("Running {ticks} ticks...");

    // Warmup
    for _ in 0..100 {
        sim.tick();
    }

    // Benchmark
    let start = Instant::now();
    for _ in 0..ticks {
        sim.tick();
    }
    let elapsed = start.elapsed();

    let tps = ticks as f64 / elapsed.as_secs_f64();

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {ticks}");
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {tps:.1}");
    eprintln!("ms/tick: {:.4}", elapsed.as_millis() as f64 / ticks.max(1) as f64);
    eprintln!("Final entities: {}", sim.entities().len());
    eprintln!("State hash: {:016x}", sim.state_hash());
}
