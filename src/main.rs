//! CLI entry point for the flight delay lookup tool.
//!
//! Provides subcommands for running a single airport/airline query, listing
//! the carriers in the dataset, and an interactive prompt session.

use std::ffi::OsStr;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use flight_delay_stats::{
    dataset::Dataset,
    matcher::resolve_airline,
    output::{QueryReport, print_json, render_report},
    session,
    stats::{QueryKey, SeriesMode},
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "flight_delay_stats")]
#[command(about = "Historical on-time performance for an airline at an airport", long_about = None)]
struct Cli {
    /// Path to the delay-cause CSV dataset
    #[arg(short, long, default_value = "Airline_Delay_Cause.csv", global = true)]
    data: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up delay statistics for one airport/airline pair
    Query {
        /// Airport code (three letters, like LAX)
        airport: String,

        /// Airline name (such as Delta); fuzzy-matched against the dataset
        airline: String,

        /// How to aggregate the monthly series
        #[arg(short, long, value_enum, default_value_t = ModeArg::Average)]
        mode: ModeArg,

        /// Emit the report as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the distinct carrier names present in the dataset
    Airlines,
    /// Start an interactive query session
    Interactive {
        /// Initial monthly-series view mode
        #[arg(short, long, value_enum, default_value_t = ModeArg::Average)]
        mode: ModeArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One point per month, all years combined
    Average,
    /// One point per year-month, chronological
    Timeline,
}

impl From<ModeArg> for SeriesMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Average => SeriesMode::AverageByMonth,
            ModeArg::Timeline => SeriesMode::Timeline,
        }
    }
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/flight_delay_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("flight_delay_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    // Load failure is fatal: nothing works without the dataset.
    let dataset = Dataset::load(&cli.data)?;
    let stdout = std::io::stdout();

    match cli.command {
        Commands::Query {
            airport,
            airline,
            mode,
            json,
        } => {
            let candidates = dataset.carrier_names();
            let Some(carrier) = resolve_airline(&airline, candidates.iter().copied()) else {
                warn!(input = %airline, "No airline match");
                eprintln!("Could not find a close match for that airline.");
                return Ok(ExitCode::FAILURE);
            };

            let key = QueryKey::new(airport.to_uppercase(), carrier);
            match QueryReport::build(&dataset, key.clone(), mode.into()) {
                Some(report) => {
                    if json {
                        print_json(&mut stdout.lock(), &report)?;
                    } else {
                        if let Some((min, max)) = dataset.year_range() {
                            println!("Data includes flights from {min} to {max}");
                        }
                        println!("Searched airline: {}", report.query.carrier_name);
                        render_report(&mut stdout.lock(), &report)?;
                    }
                }
                None => {
                    info!(airport = %key.airport, carrier = %key.carrier_name, "No data for query");
                    println!("Nothing found for that airport/airline combination.");
                }
            }
        }
        Commands::Airlines => {
            let names = dataset.carrier_names();
            info!(total = names.len(), "Carrier list");
            for name in names {
                println!("{name}");
            }
        }
        Commands::Interactive { mode } => {
            let stdin = std::io::stdin();
            session::run(&dataset, mode.into(), &mut stdin.lock(), &mut stdout.lock())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
