//! `sarco`: run half-sarcomere simulations from meta records.
//!
//! Accepts one or more `*.meta.json` files (each a record or an array
//! of records), executes every run, and writes observations to
//! `<out>/<name>.data.json`. Exit code 0 on success, 130 if any run was
//! cancelled, 1 if any run failed.

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use sarcomere_runner::{aggregate_exit_code, run_batch, Meta};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

#[derive(Parser)]
#[command(name = "sarco")]
#[command(version)]
#[command(about = "Batch driver for half-sarcomere simulations", long_about = None)]
struct Cli {
    /// Meta record files (JSON, single record or array).
    #[arg(required = true)]
    metas: Vec<PathBuf>,

    /// Output directory for observation files.
    #[arg(short, long, default_value = "_data")]
    out: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    let mut metas: Vec<Meta> = Vec::new();
    for path in &cli.metas {
        let loaded = Meta::from_file(path)
            .with_context(|| format!("loading meta records from {}", path.display()))?;
        metas.extend(loaded);
    }
    log::info!("loaded {} run(s) from {} file(s)", metas.len(), cli.metas.len());

    let cancel = AtomicBool::new(false);
    let records = run_batch(&metas, &cli.out, &cancel);
    for record in &records {
        log::info!(
            "{}: exit {} after {} steps",
            record.name,
            record.exit_code,
            record.steps_completed
        );
    }
    std::process::exit(aggregate_exit_code(&records));
}
