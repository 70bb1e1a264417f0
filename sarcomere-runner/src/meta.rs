//! Run meta records: the JSON configuration surface of the batch driver.
//!
//! A meta record names a run and fixes its boundary conditions: timestep
//! geometry, lattice spacing / z-line / pCa knobs (scalars or
//! per-timestep series), Poisson ratio, titin parameters, polymer
//! starts, and the enumerated `mh_*` myosin head overrides. Unknown keys
//! warn and are otherwise ignored; the `actin_permissiveness` key is an
//! accepted alias feeding the pCa trace, matching the reference runner.

use myofilament::{
    HeadConfig, HeadParams, IsoProfile, SarcomereConfig, TimeDependence,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Result type for meta-record handling.
pub type Result<T> = std::result::Result<T, MetaError>;

/// Errors raised while loading or validating meta records.
#[derive(Error, Debug)]
pub enum MetaError {
    /// File could not be read.
    #[error("cannot read meta file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid meta JSON.
    #[error("cannot parse meta file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A per-timestep series has the wrong length.
    #[error("meta '{name}': series '{key}' has {found} entries, expected {expected}")]
    SeriesLength {
        name: String,
        key: String,
        expected: usize,
        found: usize,
    },

    /// timestep_number must cover at least one step.
    #[error("meta '{name}': timestep_number {found} is too small")]
    TooFewTimesteps { name: String, found: usize },
}

/// A scalar knob or a per-timestep series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Knob {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Knob {
    /// Split into (initial scalar, optional series), validating series
    /// length against the run.
    fn resolve(
        &self,
        name: &str,
        key: &str,
        timestep_number: usize,
    ) -> Result<(Option<f64>, Option<Vec<f64>>)> {
        match self {
            Knob::Scalar(v) => Ok((Some(*v), None)),
            Knob::Series(series) => {
                if series.len() != timestep_number {
                    return Err(MetaError::SeriesLength {
                        name: name.to_string(),
                        key: key.to_string(),
                        expected: timestep_number,
                        found: series.len(),
                    });
                }
                Ok((None, Some(series.clone())))
            }
        }
    }
}

/// One run description, as emitted to `<name>.meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Run identifier; names the output file.
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// Local directory associated with the run.
    #[serde(default)]
    pub path_local: Option<String>,
    /// Remote bucket associated with the run.
    #[serde(default)]
    pub path_s3: Option<String>,
    /// Timestep length (ms).
    pub timestep_length: f64,
    /// Number of trace entries; the run executes one fewer step.
    pub timestep_number: usize,
    #[serde(default)]
    pub lattice_spacing: Option<Knob>,
    #[serde(default)]
    pub z_line: Option<Knob>,
    /// Calcium knob; `actin_permissiveness` is the historical alias.
    #[serde(default, rename = "pCa", alias = "actin_permissiveness")]
    pub p_ca: Option<Knob>,
    #[serde(default)]
    pub poisson_ratio: Option<f64>,
    #[serde(default)]
    pub titin_params: Option<(f64, f64)>,
    /// Polymer starts: (thin[8], thick[4]).
    #[serde(default)]
    pub starts: Option<(Vec<u32>, Vec<u32>)>,
    #[serde(default)]
    pub seed: Option<u64>,

    // Enumerated myosin head overrides.
    #[serde(default)]
    pub mh_c_ks: Option<f64>,
    #[serde(default)]
    pub mh_c_kw: Option<f64>,
    #[serde(default)]
    pub mh_c_rw: Option<f64>,
    #[serde(default)]
    pub mh_c_rs: Option<f64>,
    #[serde(default)]
    pub mh_g_ks: Option<f64>,
    #[serde(default)]
    pub mh_g_kw: Option<f64>,
    #[serde(default)]
    pub mh_g_rw: Option<f64>,
    #[serde(default)]
    pub mh_g_rs: Option<f64>,
    #[serde(default)]
    pub mh_br: Option<f64>,
    #[serde(default)]
    pub mh_dr: Option<f64>,
    #[serde(default)]
    pub mh_iso: Option<Vec<IsoProfile>>,
    #[serde(default)]
    pub mh_cluster: Option<Vec<usize>>,

    /// Anything else: sorting keys and typos both land here.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One meta record or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Box<Meta>),
    Many(Vec<Meta>),
}

impl Meta {
    /// Load meta records from a JSON file holding one record or an
    /// array of records.
    pub fn from_file(path: &Path) -> Result<Vec<Meta>> {
        let text = fs::read_to_string(path).map_err(|source| MetaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let parsed: OneOrMany =
            serde_json::from_str(&text).map_err(|source| MetaError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(match parsed {
            OneOrMany::One(meta) => vec![*meta],
            OneOrMany::Many(metas) => metas,
        })
    }

    /// Warn about keys the model does not recognize.
    pub fn warn_unknown_keys(&self) {
        for key in self.extra.keys() {
            log::warn!("meta '{}': unknown key '{}'", self.name, key);
        }
    }

    /// Number of timesteps the run executes: one fewer than the trace
    /// length, so every entered timestep has a trace entry.
    pub fn run_steps(&self) -> usize {
        self.timestep_number.saturating_sub(1)
    }

    /// Convert into a core configuration.
    pub fn to_config(&self) -> Result<SarcomereConfig> {
        if self.timestep_number < 2 {
            return Err(MetaError::TooFewTimesteps {
                name: self.name.clone(),
                found: self.timestep_number,
            });
        }
        self.warn_unknown_keys();

        let mut td = TimeDependence::default();
        let mut initial_ls = None;
        let mut initial_z = None;
        let mut initial_pca = None;
        if let Some(knob) = &self.lattice_spacing {
            let (scalar, series) =
                knob.resolve(&self.name, "lattice_spacing", self.timestep_number)?;
            initial_ls = scalar;
            td.lattice_spacing = series;
        }
        if let Some(knob) = &self.z_line {
            let (scalar, series) = knob.resolve(&self.name, "z_line", self.timestep_number)?;
            initial_z = scalar;
            td.z_line = series;
        }
        if let Some(knob) = &self.p_ca {
            let (scalar, series) = knob.resolve(&self.name, "pCa", self.timestep_number)?;
            initial_pca = scalar;
            td.p_ca = series;
        }

        let head = HeadConfig {
            params: HeadParams {
                c_ks: self.mh_c_ks,
                c_kw: self.mh_c_kw,
                c_rw: self.mh_c_rw,
                c_rs: self.mh_c_rs,
                g_ks: self.mh_g_ks,
                g_kw: self.mh_g_kw,
                g_rw: self.mh_g_rw,
                g_rs: self.mh_g_rs,
                br: self.mh_br,
                dr: self.mh_dr,
            },
            iso: self.mh_iso.clone(),
            cluster: self.mh_cluster.clone(),
        };

        Ok(SarcomereConfig {
            lattice_spacing: initial_ls,
            z_line: initial_z,
            poisson_ratio: self.poisson_ratio,
            p_ca: initial_pca,
            timestep_len: self.timestep_length,
            time_dependence: if td.is_empty() { None } else { Some(td) },
            starts: self.starts.clone(),
            titin_params: self.titin_params,
            head,
            seed: self.seed,
        })
    }
}
