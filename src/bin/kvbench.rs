//! kvbench Binary
//!
//! Runs the sequential write / read / scan / compact benchmark against one
//! database.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use kvbench::engine::{MemoryBackend, ThreadedEngine};
use kvbench::{BenchConfig, BenchReport, BenchmarkDriver, Engine, KvError, OpenOptions};
use tracing_subscriber::{fmt, EnvFilter};

/// Engine backing the run
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    /// On-disk sled database at --db-path
    Sled,
    /// Process-local sorted map (no I/O)
    Memory,
}

/// kvbench
#[derive(Parser, Debug)]
#[command(name = "kvbench")]
#[command(about = "Sequential smoke-test benchmark for an embedded key-value store")]
#[command(version)]
struct Args {
    /// Number of sequential writes (must be positive)
    #[arg(value_parser = clap::value_parser!(u64).range(1..), default_value_t = 1000)]
    num_writes: u64,

    /// Database directory (reused across runs unless --fresh is given)
    #[arg(short, long, default_value = "test")]
    db_path: PathBuf,

    /// Storage backend
    #[arg(short, long, value_enum, default_value_t = Backend::Sled)]
    backend: Backend,

    /// Remove the database directory before the run
    #[arg(long)]
    fresh: bool,

    /// Log cumulative elapsed time every N writes (0 disables)
    #[arg(long, default_value_t = 10_000)]
    progress_every: u64,

    /// Read back keys 0..N after writing
    #[arg(long, default_value_t = 25)]
    read_back: u64,

    /// Key the scan cursor seeks to
    #[arg(long, default_value = "50")]
    seek_key: String,

    /// Maximum number of entries the scan cursor yields
    #[arg(long, default_value_t = 50_000)]
    scan_limit: usize,

    /// Number of scanned entries to print
    #[arg(long, default_value_t = 9)]
    sample: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvbench=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("kvbench v{}", kvbench::VERSION);
    tracing::info!("Backend: {:?}, database: {}", args.backend, args.db_path.display());

    if let Err(e) = run(&args).await {
        tracing::error!("Benchmark failed: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Runner Done");
}

async fn run(args: &Args) -> Result<BenchReport, KvError> {
    if args.fresh && args.db_path.exists() {
        tracing::info!("Removing {}", args.db_path.display());
        std::fs::remove_dir_all(&args.db_path)?;
    }

    let config = BenchConfig::builder()
        .num_writes(args.num_writes)
        .progress_interval(args.progress_every)
        .read_back(args.read_back)
        .seek_key(args.seek_key.clone())
        .scan_limit(args.scan_limit)
        .sample_size(args.sample)
        .open_options(OpenOptions::builder().create_if_missing(true).build())
        .build();

    match args.backend {
        Backend::Sled => run_sled(args, config).await,
        Backend::Memory => {
            let backend = MemoryBackend::new().named(&args.db_path);
            drive(ThreadedEngine::spawn(backend), config).await
        }
    }
}

#[cfg(feature = "sled")]
async fn run_sled(args: &Args, config: BenchConfig) -> Result<BenchReport, KvError> {
    drive(kvbench::SledEngine::new(&args.db_path), config).await
}

#[cfg(not(feature = "sled"))]
async fn run_sled(_args: &Args, _config: BenchConfig) -> Result<BenchReport, KvError> {
    Err(KvError::Config(
        "the sled backend is not compiled in; rebuild with --features sled".to_string(),
    ))
}

async fn drive<E: Engine>(
    engine: Result<E, kvbench::EngineError>,
    config: BenchConfig,
) -> Result<BenchReport, KvError> {
    let engine = engine.map_err(|e| KvError::Config(format!("failed to start engine: {e}")))?;
    BenchmarkDriver::new(engine, config).run().await
}
