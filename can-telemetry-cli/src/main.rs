//! CAN Telemetry CLI Application
//!
//! Command-line front end for the can-telemetry-decoder library:
//! - `run`: decode a frame stream and keep the snapshot documents current
//! - `analyze` / `raw-analyze`: per-identifier counts for captured logs
//! - `convert`: raw slcan capture to JSON-lines envelopes

use anyhow::Result;
use can_telemetry_decoder::{
    Dispatcher, EngineConfig, IntervalPublisher, PublishPolicy, SnapshotPublisher, TelemetrySnapshot,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod config;
mod raw;
mod report;
mod source;

use source::{Input, ReplayOptions};

/// CAN Telemetry - Decode vehicle CAN traffic into JSON snapshots
#[derive(Parser, Debug)]
#[command(name = "can-telemetry")]
#[command(about = "Decode vehicle CAN traffic into JSON telemetry snapshots", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode JSON-lines envelopes and publish the snapshot documents
    Run {
        /// JSON-lines log to read (default: stdin)
        #[arg(value_name = "LOG")]
        log: Option<PathBuf>,

        /// Path to configuration file (config.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Directory receiving the snapshot documents
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,

        /// Publish changed documents every N milliseconds instead of after each frame
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,

        /// Replay with the recorded inter-frame delays
        #[arg(long)]
        timing: bool,

        /// Loop over the log until interrupted
        #[arg(long)]
        continuous: bool,

        /// Maximum number of frames to process
        #[arg(long, value_name = "COUNT")]
        max_frames: Option<usize>,
    },

    /// Count frames per identifier in a JSON-lines log
    Analyze {
        #[arg(value_name = "LOG")]
        log: PathBuf,
    },

    /// Count frames per identifier in a raw slcan log
    RawAnalyze {
        #[arg(value_name = "RAW")]
        raw: PathBuf,
    },

    /// Convert a raw slcan log into JSON-lines envelopes
    Convert {
        #[arg(value_name = "RAW")]
        raw: PathBuf,

        /// Output file, overwritten if it exists
        #[arg(value_name = "OUT")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Telemetry CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", can_telemetry_decoder::VERSION);

    match args.command {
        Command::Run {
            log: log_path,
            config: config_path,
            data_dir,
            interval_ms,
            timing,
            continuous,
            max_frames,
        } => {
            let mut app = match &config_path {
                Some(path) => {
                    log::info!("Loading configuration from: {:?}", path);
                    config::load_config(path)?
                }
                None => config::AppConfig::default(),
            };
            if let Some(dir) = data_dir {
                app.engine.data_dir = dir;
            }
            if let Some(ms) = interval_ms {
                app.engine.publish = PublishPolicy::Interval { interval_ms: ms };
            }

            let input = log_path.map_or(Input::Stdin, Input::File);
            let options = ReplayOptions {
                honor_timing: timing || app.input.honor_timing,
                continuous: continuous || app.input.continuous,
                max_frames,
            };
            log::info!("Reading frames from {:?} (subject label {:?})", input, app.input.subject);
            run_mode(&app.engine, &input, options)
        }
        Command::Analyze { log } => analyze_mode(&log),
        Command::RawAnalyze { raw } => raw_analyze_mode(&raw),
        Command::Convert { raw, output } => convert_mode(&raw, &output),
    }
}

/// Run mode - decode every frame, publish per policy, print a summary
fn run_mode(engine: &EngineConfig, input: &Input, options: ReplayOptions) -> Result<()> {
    let snapshot = TelemetrySnapshot::new();
    let publisher = SnapshotPublisher::from_config(snapshot.clone(), engine);

    let (mut dispatcher, interval) = match engine.publish.interval() {
        None => (Dispatcher::new(snapshot).with_publisher(publisher), None),
        Some(period) => (Dispatcher::new(snapshot), Some(IntervalPublisher::spawn(publisher, period))),
    };
    log::info!("Writing snapshots to {:?} ({:?})", engine.data_dir, engine.publish);

    let result = source::replay(input, options, |line| {
        dispatcher.dispatch_json(line);
    });

    // final flush happens on stop, even when the input failed
    if let Some(interval) = interval {
        interval.stop();
    }
    let frames = result?;
    log::info!("Processed {} frames", frames);

    report::print_run_summary(dispatcher.stats(), engine);
    Ok(())
}

fn analyze_mode(path: &Path) -> Result<()> {
    let counts = report::count_log_ids(path)?;
    report::print_log_analysis(&counts);
    Ok(())
}

fn raw_analyze_mode(path: &Path) -> Result<()> {
    let counts = raw::count_ids(path)?;
    report::print_raw_analysis(&counts);
    Ok(())
}

fn convert_mode(input: &Path, output: &Path) -> Result<()> {
    let stats = raw::convert(input, output)?;
    log::info!(
        "Converted {} lines ({} skipped) into {:?}",
        stats.converted,
        stats.skipped,
        output
    );
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
