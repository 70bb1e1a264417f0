//! Versioned state snapshots of a half-sarcomere.
//!
//! A [`Snapshot`] is a value tree mirroring the component hierarchy: run
//! constants (starts, titin parameters, head configuration, seed, time
//! dependence) plus the mutable state of every entity. Restoring builds
//! a fresh half-sarcomere from the constants and overlays the state,
//! validating addresses and link topology along the way. The random
//! stream position is not persisted; the seed is.
//!
//! A version mismatch on load is a warning, not an error: the loader
//! proceeds best effort. Topology violations (misplaced entities,
//! dangling links, doubly-claimed sites) are fatal.

use crate::address::{Address, SiteId};
use crate::config::{HeadConfig, SarcomereConfig, TimeDependence};
use crate::error::{Result, SarcomereError};
use crate::head::HeadState;
use crate::sarcomere::HalfSarcomere;
use crate::spring::TwoStateSpring;
use crate::tropomyosin::TmState;
use serde::{Deserialize, Serialize};

/// Snapshot format version.
pub const SNAPSHOT_VERSION: f64 = 1.4;

/// Mutable state of one crossbridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XbSnapshot {
    pub address: Address,
    pub state: HeadState,
    pub bound_to: Option<Address>,
    pub thin_face: Address,
    pub converter: TwoStateSpring,
    pub globular: TwoStateSpring,
}

/// State of one thick face: its crossbridges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThickFaceSnapshot {
    pub address: Address,
    pub xbs: Vec<XbSnapshot>,
}

/// State of one thick filament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThickSnapshot {
    pub address: Address,
    pub axial: Vec<f64>,
    pub faces: Vec<ThickFaceSnapshot>,
}

/// State of one tropomyosin site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmSiteSnapshot {
    pub address: Address,
    pub state: TmState,
    pub subject_to_cooperativity: bool,
}

/// State of one tropomyosin strand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmSnapshot {
    pub address: Address,
    pub sites: Vec<TmSiteSnapshot>,
}

/// State of one thin filament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinSnapshot {
    pub address: Address,
    pub axial: Vec<f64>,
    pub tm: Vec<TmSnapshot>,
}

/// Complete half-sarcomere state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: f64,
    pub seed: u64,
    pub timestep_len: f64,
    pub current_timestep: usize,
    pub z_line: f64,
    pub lattice_spacing: f64,
    pub p_ca: f64,
    pub initial_z_line: f64,
    pub initial_lattice_spacing: f64,
    pub poisson_ratio: f64,
    pub hiding_line: f64,
    pub titin_params: Option<(f64, f64)>,
    pub time_dependence: Option<TimeDependence>,
    pub thin_starts: Vec<u32>,
    pub thick_starts: Vec<u32>,
    pub head_config: HeadConfig,
    pub thick: Vec<ThickSnapshot>,
    pub thin: Vec<ThinSnapshot>,
}

impl HalfSarcomere {
    /// Capture the full model state.
    pub fn to_snapshot(&self) -> Snapshot {
        let thick = self
            .thick
            .iter()
            .map(|fil| ThickSnapshot {
                address: fil.address,
                axial: fil.axial.clone(),
                faces: fil
                    .faces
                    .iter()
                    .map(|face| ThickFaceSnapshot {
                        address: face.address,
                        xbs: face
                            .xbs
                            .iter()
                            .map(|xb| XbSnapshot {
                                address: xb.address,
                                state: xb.head.state,
                                bound_to: xb.bound_to.map(|s| s.address()),
                                thin_face: xb.thin_face.address(),
                                converter: xb.head.converter.clone(),
                                globular: xb.head.globular.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        let thin = self
            .thin
            .iter()
            .map(|fil| ThinSnapshot {
                address: fil.address,
                axial: fil.axial.clone(),
                tm: fil
                    .tm
                    .iter()
                    .map(|strand| TmSnapshot {
                        address: strand.address,
                        sites: strand
                            .sites
                            .iter()
                            .map(|site| TmSiteSnapshot {
                                address: site.address,
                                state: site.state,
                                subject_to_cooperativity: site.subject_to_cooperativity,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Snapshot {
            version: SNAPSHOT_VERSION,
            seed: self.seed,
            timestep_len: self.timestep_len,
            current_timestep: self.current_timestep,
            z_line: self.z_line,
            lattice_spacing: self.lattice_spacing,
            p_ca: self.p_ca,
            initial_z_line: self.initial_z_line,
            initial_lattice_spacing: self.initial_lattice_spacing,
            poisson_ratio: self.poisson_ratio,
            hiding_line: self.hiding_line,
            titin_params: self.titin_params,
            time_dependence: self.time_dependence.clone(),
            thin_starts: self.thin_starts.clone(),
            thick_starts: self.thick_starts.clone(),
            head_config: self.head_config.clone(),
            thick,
            thin,
        }
    }

    /// Rebuild a half-sarcomere from a snapshot.
    ///
    /// The lattice is reconstructed from the run constants, then every
    /// entity's state is overlaid. Addresses must match the rebuilt
    /// structure; crossbridge ↔ site links are restored pairwise and a
    /// doubly-claimed site is fatal.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            log::warn!(
                "version mismatch, reading {} into {}",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }
        let config = SarcomereConfig {
            lattice_spacing: Some(snapshot.initial_lattice_spacing),
            z_line: Some(snapshot.initial_z_line),
            poisson_ratio: Some(snapshot.poisson_ratio),
            p_ca: Some(snapshot.p_ca),
            timestep_len: snapshot.timestep_len,
            time_dependence: snapshot.time_dependence.clone(),
            starts: Some((snapshot.thin_starts.clone(), snapshot.thick_starts.clone())),
            titin_params: snapshot.titin_params,
            head: snapshot.head_config.clone(),
            seed: Some(snapshot.seed),
        };
        let mut hs = HalfSarcomere::new(config)?;

        if snapshot.thick.len() != hs.thick.len() || snapshot.thin.len() != hs.thin.len() {
            return Err(SarcomereError::Corrupt(format!(
                "expected {}/{} filaments, snapshot has {}/{}",
                hs.thick.len(),
                hs.thin.len(),
                snapshot.thick.len(),
                snapshot.thin.len()
            )));
        }

        // Thick filaments: positions, head state and springs, links.
        for (fil, fil_snap) in hs.thick.iter_mut().zip(&snapshot.thick) {
            check_address(fil.address, fil_snap.address)?;
            if fil_snap.axial.len() != fil.axial.len() {
                return Err(SarcomereError::Corrupt(format!(
                    "{} has {} crowns, snapshot has {}",
                    fil.address,
                    fil.axial.len(),
                    fil_snap.axial.len()
                )));
            }
            fil.axial.clone_from(&fil_snap.axial);
            for (face, face_snap) in fil.faces.iter_mut().zip(&fil_snap.faces) {
                check_address(face.address, face_snap.address)?;
                if face_snap.xbs.len() != face.xbs.len() {
                    return Err(SarcomereError::Corrupt(format!(
                        "{} has {} crossbridges, snapshot has {}",
                        face.address,
                        face.xbs.len(),
                        face_snap.xbs.len()
                    )));
                }
                for (xb, xb_snap) in face.xbs.iter_mut().zip(&face_snap.xbs) {
                    check_address(xb.address, xb_snap.address)?;
                    check_address(xb.thin_face.address(), xb_snap.thin_face)?;
                    xb.head.state = xb_snap.state;
                    xb.head.converter = xb_snap.converter.clone();
                    xb.head.globular = xb_snap.globular.clone();
                    xb.bound_to = match xb_snap.bound_to {
                        None => None,
                        Some(Address::Bs { fil: thin_fil, site }) => {
                            Some(SiteId { filament: thin_fil, site })
                        }
                        Some(other) => {
                            return Err(SarcomereError::Corrupt(format!(
                                "{} bound to non-site {}",
                                xb.address, other
                            )))
                        }
                    };
                    if !xb.link_is_consistent() {
                        return Err(SarcomereError::Corrupt(format!(
                            "{} state {:?} conflicts with its binding link",
                            xb.address, xb_snap.state
                        )));
                    }
                }
            }
        }

        // Thin filaments: positions and tropomyosin state.
        for (fil, fil_snap) in hs.thin.iter_mut().zip(&snapshot.thin) {
            check_address(fil.address, fil_snap.address)?;
            if fil_snap.axial.len() != fil.axial.len() {
                return Err(SarcomereError::Corrupt(format!(
                    "{} has {} sites, snapshot has {}",
                    fil.address,
                    fil.axial.len(),
                    fil_snap.axial.len()
                )));
            }
            fil.axial.clone_from(&fil_snap.axial);
            for (strand, strand_snap) in fil.tm.iter_mut().zip(&fil_snap.tm) {
                check_address(strand.address, strand_snap.address)?;
                for (site, site_snap) in strand.sites.iter_mut().zip(&strand_snap.sites) {
                    check_address(site.address, site_snap.address)?;
                    site.state = site_snap.state;
                    site.subject_to_cooperativity = site_snap.subject_to_cooperativity;
                }
            }
        }

        // Rebuild the inverse site → crossbridge references, refusing
        // double claims and dangling endpoints.
        let mut links = Vec::new();
        for fil in &hs.thick {
            for face in &fil.faces {
                for xb in &face.xbs {
                    if let Some(site) = xb.bound_to {
                        let xb_id = crate::address::XbId {
                            filament: fil.index,
                            face: face.index,
                            index: xb.index,
                        };
                        links.push((site, xb_id));
                    }
                }
            }
        }
        for (site, xb_id) in links {
            let fil = hs
                .thin
                .get_mut(site.filament)
                .ok_or(SarcomereError::UnresolvableAddress(site.address()))?;
            if site.site >= fil.sites.len() {
                return Err(SarcomereError::UnresolvableAddress(site.address()));
            }
            if !fil.bind(site.site, xb_id) {
                return Err(SarcomereError::SiteOccupied(site.address()));
            }
        }

        hs.current_timestep = snapshot.current_timestep;
        hs.z_line = snapshot.z_line;
        hs.lattice_spacing = snapshot.lattice_spacing;
        hs.p_ca = snapshot.p_ca;
        hs.hiding_line = snapshot.hiding_line;
        hs.update_volume();
        hs.update_concentrations();
        Ok(hs)
    }

    /// Serialize the state to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    /// Restore a half-sarcomere from a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }
}

fn check_address(expected: Address, found: Address) -> Result<()> {
    if expected != found {
        return Err(SarcomereError::AddressMismatch { expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sarcomere::{N_THICK, N_THIN};

    fn run_briefly() -> HalfSarcomere {
        let config = SarcomereConfig {
            seed: Some(99),
            starts: Some((vec![3; N_THIN], vec![2; N_THICK])),
            timestep_len: 0.5,
            ..Default::default()
        };
        let mut hs = HalfSarcomere::new(config).unwrap();
        for _ in 0..30 {
            hs.timestep().unwrap();
        }
        hs
    }

    #[test]
    fn roundtrip_is_exact() {
        let hs = run_briefly();
        let snapshot = hs.to_snapshot();
        let restored = HalfSarcomere::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.to_snapshot(), snapshot);
        assert!(restored.links_are_consistent());
        assert_eq!(restored.current_timestep(), hs.current_timestep());
    }

    #[test]
    fn json_roundtrip_preserves_the_tree() {
        let hs = run_briefly();
        let json = hs.to_json().unwrap();
        let restored = HalfSarcomere::from_json(&json).unwrap();
        assert_eq!(restored.to_snapshot(), hs.to_snapshot());
    }

    #[test]
    fn version_mismatch_is_tolerated() {
        let hs = run_briefly();
        let mut snapshot = hs.to_snapshot();
        snapshot.version = 1.3;
        // Warns, proceeds.
        let restored = HalfSarcomere::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.z_line(), hs.z_line());
    }

    #[test]
    fn misplaced_entity_is_fatal() {
        let hs = run_briefly();
        let mut snapshot = hs.to_snapshot();
        snapshot.thick[0].faces[0].xbs[0].address = Address::Xb { fil: 2, face: 0, xb: 0 };
        let err = HalfSarcomere::from_snapshot(&snapshot).unwrap_err();
        assert!(matches!(err, SarcomereError::AddressMismatch { .. }));
    }

    #[test]
    fn double_claimed_site_is_fatal() {
        let hs = run_briefly();
        let mut snapshot = hs.to_snapshot();
        // Point two loose crossbridges at the same site.
        let site = Address::Bs { fil: 0, site: 30 };
        let face = &mut snapshot.thick[0].faces[0];
        face.xbs[0].state = HeadState::Loose;
        face.xbs[0].bound_to = Some(site);
        face.xbs[1].state = HeadState::Loose;
        face.xbs[1].bound_to = Some(site);
        let err = HalfSarcomere::from_snapshot(&snapshot).unwrap_err();
        assert!(matches!(err, SarcomereError::SiteOccupied(_)));
    }

    #[test]
    fn inconsistent_bound_state_is_fatal() {
        let hs = run_briefly();
        let mut snapshot = hs.to_snapshot();
        // A free head claiming a site violates the link invariant.
        snapshot.thick[0].faces[0].xbs[0].state = HeadState::Free;
        snapshot.thick[0].faces[0].xbs[0].bound_to = Some(Address::Bs { fil: 0, site: 30 });
        let err = HalfSarcomere::from_snapshot(&snapshot).unwrap_err();
        assert!(matches!(err, SarcomereError::Corrupt(_)));
    }

    #[test]
    fn restored_model_continues_running() {
        let hs = run_briefly();
        let snapshot = hs.to_snapshot();
        let mut restored = HalfSarcomere::from_snapshot(&snapshot).unwrap();
        let (obs, outcome) = restored.run(10, None);
        assert!(outcome.is_completed());
        assert_eq!(obs.len(), 10);
        assert!(restored.links_are_consistent());
    }
}
