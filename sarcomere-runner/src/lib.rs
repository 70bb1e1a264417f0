//! # Sarcomere runner
//!
//! Batch driver around [`myofilament`]: consumes JSON meta records
//! describing runs (boundary-condition traces, head parameter
//! overrides, seeds), executes them in parallel, and writes each run's
//! observations to `<out>/<name>.data.json`.
//!
//! ```no_run
//! use sarcomere_runner::{batch, meta::Meta};
//! use std::path::Path;
//! use std::sync::atomic::AtomicBool;
//!
//! # fn main() -> anyhow::Result<()> {
//! let metas = Meta::from_file(Path::new("workloop.meta.json"))?;
//! let cancel = AtomicBool::new(false);
//! let records = batch::run_batch(&metas, Path::new("_data"), &cancel);
//! std::process::exit(batch::aggregate_exit_code(&records));
//! # }
//! ```

pub mod batch;
pub mod meta;

pub use batch::{aggregate_exit_code, run_batch, RunRecord};
pub use meta::{Knob, Meta, MetaError};
