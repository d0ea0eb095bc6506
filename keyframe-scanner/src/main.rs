//! keyframe-scanner - replay a scan log through the registration engine
//!
//! Reads a JSON-lines scan log, runs every scan through the decision engine
//! backed by point-to-point ICP and an in-memory keyframe store, and writes
//! one registration record per accepted scan.
//!
//! ```text
//! keyframe-scanner --input scans.jsonl --output records.jsonl [--config keyframe-scanner.toml]
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;

use keyframe_scanner::{
    InMemoryKeyframeStore, PointToPointIcp, RecordWriter, RegistrationEngine, Result,
    ScanConverter, ScanLogReader, ScannerConfig, ScannerError,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (default: keyframe-scanner.toml, then /etc/keyframe-scanner.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-lines scan log to replay
    #[arg(short, long)]
    input: PathBuf,

    /// JSON-lines file receiving one record per accepted scan
    #[arg(short, long)]
    output: PathBuf,
}

/// Counters reported at the end of a replay.
#[derive(Debug, Default)]
struct ReplayStats {
    scans: u64,
    rejected: u64,
    keyframes: u64,
    loop_closures: u64,
}

fn load_config(args: &Args) -> Result<ScannerConfig> {
    let config = match &args.config {
        Some(path) => ScannerConfig::load(path)?,
        None => ScannerConfig::load_default()?,
    };
    Ok(config)
}

fn replay(config: &ScannerConfig, input: &Path, output: &Path) -> Result<ReplayStats> {
    let mut engine = RegistrationEngine::new(
        config,
        PointToPointIcp::new(config.registration.icp_config()),
        InMemoryKeyframeStore::new(config.store.clone()),
        ScanConverter::new(config.preprocessing.clone()),
    )?;

    let reader = ScanLogReader::open(input)?;
    let mut writer = RecordWriter::create(output)?;
    let mut stats = ReplayStats::default();

    for scan in reader {
        let scan = scan?;
        stats.scans += 1;

        let record = match engine.process_scan(scan) {
            Ok(record) => record,
            Err(ScannerError::MalformedInput(_)) => {
                stats.rejected += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if record.keyframe_flag {
            stats.keyframes += 1;
        }
        if record.loop_closure_flag {
            stats.loop_closures += 1;
        }

        engine.store_mut().ingest(&record);
        writer.write(&record)?;
    }

    let written = writer.finish()?;
    log::info!("Wrote {} records to {}", written, output.display());
    Ok(stats)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let (input, output) = (&args.input, &args.output);

    log::info!("keyframe-scanner starting");
    log::info!("  Input: {}", input.display());
    log::info!("  Output: {}", output.display());
    log::info!(
        "  Loop closure: every {} keyframes, tolerance {} m",
        config.loop_closure.loop_closure_skip,
        config.loop_closure.loop_closure_correspondence_distance
    );

    let stats = replay(&config, input, output)?;

    log::info!(
        "Replay complete: {} scans, {} rejected, {} keyframes, {} loop closures",
        stats.scans,
        stats.rejected,
        stats.keyframes,
        stats.loop_closures
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
