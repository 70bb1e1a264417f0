//! Per-timestep observables and run outcomes.
//!
//! A [`Report`] is the default observation callback payload; an
//! [`Observations`] record accumulates one list per key, which is the
//! persisted form (an object mapping each key to its per-step values).

use crate::error::SarcomereError;
use serde::{Deserialize, Serialize};

/// Observables emitted after each timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Summed thick-filament force on the M-line (pN).
    pub axial_force: f64,
    /// Fraction of tropomyosin sites under cooperativity.
    pub coop: f64,
    /// Free calcium concentration, 10^(−pCa) (M).
    pub ca: f64,
    /// Fraction of crossbridges in the free state.
    pub xb_fraction_free: f64,
    /// Fraction of crossbridges loosely bound.
    pub xb_fraction_loose: f64,
    /// Fraction of crossbridges tightly bound.
    pub xb_fraction_tight: f64,
    /// Mean blocked → closed rate across all tropomyosin sites (per ms).
    pub r_12: f64,
    /// Mean closed → blocked rate (per ms).
    pub r_21: f64,
    /// Mean closed → open rate (per ms).
    pub r_23: f64,
    /// Mean open → closed rate (per ms).
    pub r_32: f64,
    /// Mean open → blocked rate (per ms).
    pub r_31: f64,
    /// Mean blocked → open rate (per ms).
    pub r_13: f64,
    /// Free troponin concentration (count per liter of lattice fluid).
    pub free_tm: f64,
    /// Free calcium concentration (M), as reported by the species pool.
    pub free_ca: f64,
    /// Calcium-bound troponin concentration (count per liter).
    pub bound_tm: f64,
}

/// Column-wise accumulation of reports: one list per observable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    pub axial_force: Vec<f64>,
    pub coop: Vec<f64>,
    pub ca: Vec<f64>,
    pub xb_fraction_free: Vec<f64>,
    pub xb_fraction_loose: Vec<f64>,
    pub xb_fraction_tight: Vec<f64>,
    pub r_12: Vec<f64>,
    pub r_21: Vec<f64>,
    pub r_23: Vec<f64>,
    pub r_32: Vec<f64>,
    pub r_31: Vec<f64>,
    pub r_13: Vec<f64>,
    pub free_tm: Vec<f64>,
    pub free_ca: Vec<f64>,
    pub bound_tm: Vec<f64>,
}

impl Observations {
    /// Append one report to every column.
    pub fn push(&mut self, report: &Report) {
        self.axial_force.push(report.axial_force);
        self.coop.push(report.coop);
        self.ca.push(report.ca);
        self.xb_fraction_free.push(report.xb_fraction_free);
        self.xb_fraction_loose.push(report.xb_fraction_loose);
        self.xb_fraction_tight.push(report.xb_fraction_tight);
        self.r_12.push(report.r_12);
        self.r_21.push(report.r_21);
        self.r_23.push(report.r_23);
        self.r_32.push(report.r_32);
        self.r_31.push(report.r_31);
        self.r_13.push(report.r_13);
        self.free_tm.push(report.free_tm);
        self.free_ca.push(report.free_ca);
        self.bound_tm.push(report.bound_tm);
    }

    /// Completed timesteps recorded so far.
    pub fn len(&self) -> usize {
        self.axial_force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axial_force.is_empty()
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// All requested timesteps completed.
    Completed,
    /// The cancellation flag was raised; observations are partial.
    Cancelled,
    /// An error unwound the timestep loop; observations are partial.
    Failed(SarcomereError),
}

impl RunOutcome {
    /// Process exit code: 0 success, 130 user cancellation, 1 failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Cancelled => 130,
            RunOutcome::Failed(_) => 1,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report {
            axial_force: 12.0,
            coop: 0.1,
            ca: 1e-4,
            xb_fraction_free: 0.8,
            xb_fraction_loose: 0.15,
            xb_fraction_tight: 0.05,
            r_12: 2.0,
            r_21: 0.12,
            r_23: 0.04,
            r_32: 0.25,
            r_31: 0.02,
            r_13: 0.02,
            free_tm: 1e20,
            free_ca: 1e-4,
            bound_tm: 3e20,
        }
    }

    #[test]
    fn observations_grow_column_wise() {
        let mut obs = Observations::default();
        assert!(obs.is_empty());
        obs.push(&report());
        obs.push(&report());
        assert_eq!(obs.len(), 2);
        assert_eq!(obs.axial_force, vec![12.0, 12.0]);
        assert_eq!(obs.bound_tm.len(), 2);
    }

    #[test]
    fn persisted_form_maps_keys_to_lists() {
        let mut obs = Observations::default();
        obs.push(&report());
        let json = serde_json::to_value(&obs).unwrap();
        for key in [
            "axial_force",
            "coop",
            "ca",
            "xb_fraction_free",
            "xb_fraction_loose",
            "xb_fraction_tight",
            "r_12",
            "r_21",
            "r_23",
            "r_32",
            "r_31",
            "r_13",
            "free_tm",
            "free_ca",
            "bound_tm",
        ] {
            assert!(json[key].is_array(), "missing key {key}");
        }
    }

    #[test]
    fn exit_codes_follow_the_driver_contract() {
        assert_eq!(RunOutcome::Completed.exit_code(), 0);
        assert_eq!(RunOutcome::Cancelled.exit_code(), 130);
        let failed = RunOutcome::Failed(SarcomereError::Corrupt("x".into()));
        assert_eq!(failed.exit_code(), 1);
    }
}
