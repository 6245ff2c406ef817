//! Command-line runner for the counter contention benchmark.
//!
//! Run with:
//! ```bash
//! cargo run --release -- --threads 10 --perThread 10000 --cpBatch 50
//! ```
//!
//! Unrecognized flags are ignored, so wrapper scripts can pass extra options
//! through without breaking the run.

use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use tracing::error;

use contesa::driver::Benchmark;
use contesa::error::BenchError;
use contesa::report::format_line;
use contesa::report::json::JsonReport;
use contesa::report::table::{TableReport, TableStyle};
use contesa::settings::{
    Settings, DEFAULT_BATCH, DEFAULT_COUNTER_KEY, DEFAULT_PER_THREAD, DEFAULT_THREADS,
};
use contesa::store::{CounterStore, MemoryStore, StoreConfig};
use contesa::strategy::Strategy;

/// Output format for the run.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per scenario followed by a summary table
    Table,
    /// A single JSON document
    Json,
}

/// Table style selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Modern,
    Markdown,
    Blank,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Modern => TableStyle::Modern,
            StyleChoice::Markdown => TableStyle::Markdown,
            StyleChoice::Blank => TableStyle::Blank,
        }
    }
}

/// Benchmark four strategies for incrementing a shared counter:
/// no lock, pessimistic lock, optimistic compare-and-swap and an atomic
/// counter (optionally batched).
#[derive(Parser, Debug)]
#[command(name = "contesa", author, version, about, long_about = None)]
struct Args {
    /// Concurrent workers per scenario
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    threads: usize,

    /// Increments performed by each worker
    #[arg(long = "perThread", default_value_t = DEFAULT_PER_THREAD)]
    per_thread: u64,

    /// Increments folded into one atomic add (1 disables batching)
    #[arg(long = "cpBatch", default_value_t = DEFAULT_BATCH)]
    cp_batch: u64,

    /// Name of the shared counter
    #[arg(long, default_value = DEFAULT_COUNTER_KEY)]
    key: String,

    /// Give up an increment after this many failed compare-and-swaps
    #[arg(long = "maxCasRetries")]
    max_cas_retries: Option<u64>,

    /// Simulated store round trip in microseconds
    #[arg(long = "latencyMicros", default_value_t = 0)]
    latency_micros: u64,

    /// Cluster to connect to
    #[arg(long = "clusterName", default_value = "counter-cluster")]
    cluster_name: String,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Summary table style
    #[arg(long, value_enum, default_value = "rounded")]
    style: StyleChoice,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings::new(self.threads, self.per_thread)
            .with_batch_size(self.cp_batch)
            .with_counter_key(self.key.clone())
            .with_max_cas_retries(self.max_cas_retries)
    }

    fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_cluster_name(self.cluster_name.clone())
            .with_round_trip(Duration::from_micros(self.latency_micros))
    }
}

/// Drops every token that is neither a flag `Args` declares nor the value
/// of one, so unknown options are ignored instead of rejected.
fn retain_known_flags(raw: Vec<String>) -> Vec<String> {
    let command = Args::command();
    let mut tokens = raw.into_iter();
    let mut kept: Vec<String> = tokens.next().into_iter().collect();

    while let Some(token) = tokens.next() {
        if matches!(token.as_str(), "-h" | "--help" | "-V" | "--version") {
            kept.push(token);
            continue;
        }

        let (flag, inline_value) = match token.split_once('=') {
            Some((flag, _)) => (flag, true),
            None => (token.as_str(), false),
        };

        let known = command.get_arguments().find(|arg| {
            if let Some(long) = flag.strip_prefix("--") {
                arg.get_long() == Some(long)
            } else if let Some(short) = flag.strip_prefix('-') {
                short
                    .chars()
                    .next()
                    .is_some_and(|c| arg.get_short() == Some(c))
            } else {
                false
            }
        });

        let Some(arg) = known else {
            continue;
        };
        let takes_value = arg.get_action().takes_values() && !inline_value;

        kept.push(token);
        if takes_value {
            if let Some(value) = tokens.next() {
                kept.push(value);
            }
        }
    }
    kept
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<(), BenchError> {
    let settings = args.settings();
    settings.validate()?;

    let store = MemoryStore::connect(args.store_config())?;
    let as_table = matches!(args.format, OutputFormat::Table);

    if as_table {
        println!(
            "Settings: threads={}, perThread={}, expected={}, cpBatch={}",
            settings.thread_count(),
            settings.per_thread_increments(),
            settings.expected_total(),
            settings.batch_size()
        );
        println!(
            "Cluster: {} (map {}, round trip {:?})",
            store.config().cluster_name,
            store.config().map_name,
            store.config().round_trip
        );
    }

    let outcome = Benchmark::new(&store, settings.clone()).and_then(|bench| {
        bench.run_each(&Strategy::ALL, |result| {
            if as_table {
                println!("{}", format_line(result));
            }
        })
    });
    let closed = store.close();
    let results = outcome?;
    closed?;

    match args.format {
        OutputFormat::Table => {
            let report = TableReport::new()
                .with_style(args.style.into())
                .with_title("\n=== SUMMARY ===");
            println!("{}", report.render(&results));
        }
        OutputFormat::Json => {
            let json = JsonReport::new()
                .pretty(true)
                .include_timestamp(true)
                .to_json(&settings, &results)
                .map_err(|err| BenchError::Configuration(format!("cannot encode report: {err}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse_from(retain_known_flags(std::env::args().collect()));
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "benchmark aborted");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
