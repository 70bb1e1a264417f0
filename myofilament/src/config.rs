//! Run configuration for a half-sarcomere.
//!
//! [`SarcomereConfig`] collects the boundary conditions, filament start
//! offsets, titin parameters, and myosin head overrides recognized by the
//! model. Head overrides use the enumerated `mh_*` keys of the reference
//! configuration record; unknown keys are a concern of the meta layer and
//! warn there rather than here.

use serde::{Deserialize, Serialize};

/// Per-timestep overrides of the boundary conditions.
///
/// Entry `i` of each series is applied when the driver enters timestep
/// `i`; entry 0 overrides the initial value at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeDependence {
    /// Face-to-face lattice spacing trace (nm).
    pub lattice_spacing: Option<Vec<f64>>,
    /// z-line trace (nm).
    pub z_line: Option<Vec<f64>>,
    /// pCa trace.
    pub p_ca: Option<Vec<f64>>,
}

impl TimeDependence {
    /// True when no trace is present.
    pub fn is_empty(&self) -> bool {
        self.lattice_spacing.is_none() && self.z_line.is_none() && self.p_ca.is_none()
    }
}

/// Overridable myosin head constants.
///
/// `c_*` keys parameterize the converter spring (rad, pN·nm/rad²),
/// `g_*` keys the globular spring (nm, pN/nm); `br`/`dr` scale the
/// binding and detachment rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadParams {
    /// Converter stiffness, strong state.
    pub c_ks: Option<f64>,
    /// Converter stiffness, weak state.
    pub c_kw: Option<f64>,
    /// Converter rest angle, weak state (rad).
    pub c_rw: Option<f64>,
    /// Converter rest angle, strong state (rad).
    pub c_rs: Option<f64>,
    /// Globular stiffness, strong state.
    pub g_ks: Option<f64>,
    /// Globular stiffness, weak state.
    pub g_kw: Option<f64>,
    /// Globular rest length, weak state (nm).
    pub g_rw: Option<f64>,
    /// Globular rest length, strong state (nm).
    pub g_rs: Option<f64>,
    /// Binding rate modifier.
    pub br: Option<f64>,
    /// Detachment rate modifier.
    pub dr: Option<f64>,
}

impl HeadParams {
    /// Overlay `other` on top of `self`, field by field.
    pub fn merged_with(&self, other: &HeadParams) -> HeadParams {
        HeadParams {
            c_ks: other.c_ks.or(self.c_ks),
            c_kw: other.c_kw.or(self.c_kw),
            c_rw: other.c_rw.or(self.c_rw),
            c_rs: other.c_rs.or(self.c_rs),
            g_ks: other.g_ks.or(self.g_ks),
            g_kw: other.g_kw.or(self.g_kw),
            g_rw: other.g_rw.or(self.g_rw),
            g_rs: other.g_rs.or(self.g_rs),
            br: other.br.or(self.br),
            dr: other.dr.or(self.dr),
        }
    }
}

/// One myosin isoform: a parameter profile with a sampling probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsoProfile {
    /// Probability of a crossbridge drawing this profile.
    pub iso_p: f64,
    /// Parameter overrides carried by the profile.
    #[serde(flatten)]
    pub params: HeadParams,
}

/// Full head configuration: base overrides plus optional isoform
/// distribution and deterministic cluster assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Base overrides applied to every head.
    #[serde(flatten)]
    pub params: HeadParams,
    /// Isoform profiles; each crossbridge samples one by `iso_p`.
    pub iso: Option<Vec<IsoProfile>>,
    /// Deterministic profile index per crossbridge face index; overrides
    /// the sampling when present.
    pub cluster: Option<Vec<usize>>,
}

/// Configuration of a half-sarcomere run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarcomereConfig {
    /// Initial face-to-face lattice spacing (nm); model default 14.0.
    pub lattice_spacing: Option<f64>,
    /// Initial z-line (nm); model default 1250.
    pub z_line: Option<f64>,
    /// Poisson ratio obeyed on z-line changes: 0.5 constant volume,
    /// 0.0 constant lattice spacing (default), negative auxetic.
    pub poisson_ratio: Option<f64>,
    /// Initial pCa; model default 4.0.
    pub p_ca: Option<f64>,
    /// Timestep length in ms.
    pub timestep_len: f64,
    /// Boundary-condition traces.
    pub time_dependence: Option<TimeDependence>,
    /// Polymer start offsets: 8 thin (0..25) and 4 thick (1..=3).
    /// Drawn from the run RNG when absent.
    pub starts: Option<(Vec<u32>, Vec<u32>)>,
    /// Titin (a, b) parameters; model defaults when absent.
    pub titin_params: Option<(f64, f64)>,
    /// Myosin head configuration.
    pub head: HeadConfig,
    /// RNG seed; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SarcomereConfig {
    fn default() -> Self {
        Self {
            lattice_spacing: None,
            z_line: None,
            poisson_ratio: None,
            p_ca: None,
            timestep_len: 1.0,
            time_dependence: None,
            starts: None,
            titin_params: None,
            head: HeadConfig::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_params_prefer_the_overlay() {
        let base = HeadParams { br: Some(2.0), dr: Some(3.0), ..Default::default() };
        let over = HeadParams { dr: Some(0.5), ..Default::default() };
        let merged = base.merged_with(&over);
        assert_eq!(merged.br, Some(2.0));
        assert_eq!(merged.dr, Some(0.5));
    }

    #[test]
    fn iso_profiles_flatten_their_params() {
        let json = r#"{ "iso_p": 0.25, "g_kw": 1.5 }"#;
        let profile: IsoProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.iso_p, 0.25);
        assert_eq!(profile.params.g_kw, Some(1.5));
    }

    #[test]
    fn default_config_is_empty_overrides() {
        let config = SarcomereConfig::default();
        assert_eq!(config.timestep_len, 1.0);
        assert!(config.time_dependence.is_none());
        assert_eq!(config.head, HeadConfig::default());
    }
}
