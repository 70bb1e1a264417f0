//! Parallel execution of meta-configured runs.
//!
//! Each meta record becomes one independent half-sarcomere simulation;
//! records run in parallel over the rayon pool, each writing its
//! observations to `<out>/<name>.data.json`. Runs share nothing but the
//! cancellation flag.

use crate::meta::Meta;
use myofilament::{HalfSarcomere, RunOutcome};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// What happened to one run.
#[derive(Debug)]
pub struct RunRecord {
    /// Run name from the meta record.
    pub name: String,
    /// Exit code: 0 success, 130 cancelled, 1 failure.
    pub exit_code: i32,
    /// Timesteps completed.
    pub steps_completed: usize,
    /// Where the observations were written, when they were.
    pub output: Option<PathBuf>,
    /// Wall time of the run.
    pub elapsed: std::time::Duration,
}

/// Execute a batch of meta records, writing observation files under
/// `out_dir`. The cancellation flag is polled cooperatively by every
/// run.
pub fn run_batch(metas: &[Meta], out_dir: &Path, cancel: &AtomicBool) -> Vec<RunRecord> {
    if let Err(err) = fs::create_dir_all(out_dir) {
        log::error!("cannot create output directory {}: {err}", out_dir.display());
    }
    let batch_start = Instant::now();
    let records: Vec<RunRecord> =
        metas.par_iter().map(|meta| run_one(meta, out_dir, cancel)).collect();
    log::info!(
        "batch of {} runs finished in {}",
        records.len(),
        humantime::format_duration(round_secs(batch_start.elapsed()))
    );
    records
}

/// Worst exit code across the batch: failure dominates cancellation
/// dominates success.
pub fn aggregate_exit_code(records: &[RunRecord]) -> i32 {
    let mut code = 0;
    for record in records {
        match record.exit_code {
            1 => return 1,
            130 => code = 130,
            _ => {}
        }
    }
    code
}

fn run_one(meta: &Meta, out_dir: &Path, cancel: &AtomicBool) -> RunRecord {
    let start = Instant::now();
    let config = match meta.to_config() {
        Ok(config) => config,
        Err(err) => {
            log::error!("run '{}': {err}", meta.name);
            return RunRecord {
                name: meta.name.clone(),
                exit_code: 1,
                steps_completed: 0,
                output: None,
                elapsed: start.elapsed(),
            };
        }
    };
    let mut hs = match HalfSarcomere::new(config) {
        Ok(hs) => hs,
        Err(err) => {
            log::error!("run '{}': {err}", meta.name);
            return RunRecord {
                name: meta.name.clone(),
                exit_code: 1,
                steps_completed: 0,
                output: None,
                elapsed: start.elapsed(),
            };
        }
    };

    let (observations, outcome) = hs.run(meta.run_steps(), Some(cancel));
    match &outcome {
        RunOutcome::Completed => {}
        RunOutcome::Cancelled => log::warn!(
            "run '{}': cancelled after {} steps",
            meta.name,
            observations.len()
        ),
        RunOutcome::Failed(err) => log::error!(
            "run '{}': failed after {} steps: {err}",
            meta.name,
            observations.len()
        ),
    }

    // Partial observations are still worth keeping.
    let out_path = out_dir.join(format!("{}.data.json", meta.name));
    let output = match serde_json::to_string(&observations)
        .map_err(anyhow::Error::from)
        .and_then(|json| fs::write(&out_path, json).map_err(anyhow::Error::from))
    {
        Ok(()) => Some(out_path),
        Err(err) => {
            log::error!("run '{}': cannot write observations: {err}", meta.name);
            return RunRecord {
                name: meta.name.clone(),
                exit_code: 1,
                steps_completed: observations.len(),
                output: None,
                elapsed: start.elapsed(),
            };
        }
    };

    let elapsed = start.elapsed();
    log::info!(
        "run '{}': {} steps in {} (exit {})",
        meta.name,
        observations.len(),
        humantime::format_duration(round_secs(elapsed)),
        outcome.exit_code()
    );
    RunRecord {
        name: meta.name.clone(),
        exit_code: outcome.exit_code(),
        steps_completed: observations.len(),
        output,
        elapsed,
    }
}

/// Whole seconds for log-friendly durations.
fn round_secs(d: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_secs(d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    fn quick_meta(name: &str) -> Meta {
        serde_json::from_str(&format!(
            r#"{{
                "name": "{name}",
                "timestep_length": 0.5,
                "timestep_number": 6,
                "pCa": 4.0,
                "seed": 5,
                "starts": [[0,0,0,0,0,0,0,0],[1,1,1,1]]
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn batch_writes_one_file_per_run() {
        let dir = std::env::temp_dir().join("sarco-batch-test");
        let _ = fs::remove_dir_all(&dir);
        let cancel = AtomicBool::new(false);
        let metas = vec![quick_meta("a"), quick_meta("b")];
        let records = run_batch(&metas, &dir, &cancel);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.exit_code, 0);
            assert_eq!(record.steps_completed, 5);
            let path = record.output.as_ref().unwrap();
            let text = fs::read_to_string(path).unwrap();
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["axial_force"].as_array().unwrap().len(), 5);
        }
        assert_eq!(aggregate_exit_code(&records), 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cancellation_dominates_success_but_not_failure() {
        let ok = RunRecord {
            name: "ok".into(),
            exit_code: 0,
            steps_completed: 5,
            output: None,
            elapsed: std::time::Duration::ZERO,
        };
        let cancelled = RunRecord { name: "c".into(), exit_code: 130, ..dummy() };
        let failed = RunRecord { name: "f".into(), exit_code: 1, ..dummy() };
        assert_eq!(aggregate_exit_code(&[dummy(), ok]), 0);
        assert_eq!(aggregate_exit_code(&[dummy(), cancelled]), 130);
        let cancelled = RunRecord { name: "c".into(), exit_code: 130, ..dummy() };
        assert_eq!(aggregate_exit_code(&[cancelled, failed]), 1);
    }

    fn dummy() -> RunRecord {
        RunRecord {
            name: "dummy".into(),
            exit_code: 0,
            steps_completed: 0,
            output: None,
            elapsed: std::time::Duration::ZERO,
        }
    }

    #[test]
    fn pre_cancelled_batch_reports_130() {
        let dir = std::env::temp_dir().join("sarco-batch-cancel-test");
        let _ = fs::remove_dir_all(&dir);
        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::Relaxed);
        let records = run_batch(&[quick_meta("c")], &dir, &cancel);
        assert_eq!(records[0].exit_code, 130);
        assert_eq!(records[0].steps_completed, 0);
        assert_eq!(aggregate_exit_code(&records), 130);
        let _ = fs::remove_dir_all(&dir);
    }
}
