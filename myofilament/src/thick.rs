//! Thick (myosin) filament: crowns, faces, crossbridges.
//!
//! A thick filament is a chain of 60 crown nodes anchored to the M-line
//! (x = 0) through a spring whose rest length is the bare zone. Every
//! crown carries three myosin heads; crowns alternate between the even
//! faces {0, 2, 4} and the odd faces {1, 3, 5} by parity, offset by the
//! filament's polymer start, so each of the six faces collects a head
//! from every other crown. Faces are projections: crossbridges live on
//! them, axial positions live on the filament.

use crate::address::{Address, SiteId, ThinFaceId};
use crate::config::HeadConfig;
use crate::constants::{
    CROWN_SPACING, HEADS_PER_CROWN, THICK_BARE_ZONE, THICK_CROWNS, THICK_FACES, THICK_K,
};
use crate::crossbridge::Crossbridge;
use crate::error::{Result, SarcomereError};
use crate::head::{Head, HeadState};
use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A face of a thick filament: the crossbridges oriented toward one
/// neighboring thin filament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThickFace {
    /// Face index, 0..6.
    pub index: usize,
    /// Address of this face.
    pub address: Address,
    /// The opposing thin face.
    pub thin_face: ThinFaceId,
    /// Crown index of each crossbridge on this face.
    pub crown_indices: Vec<usize>,
    /// The crossbridges, ordered along the filament.
    pub xbs: Vec<Crossbridge>,
}

impl ThickFace {
    /// Crown axial location for a crossbridge index, via the parent's
    /// axial array.
    pub fn get_axial_location(&self, xb_index: usize, parent_axial: &[f64]) -> f64 {
        parent_axial[self.crown_indices[xb_index]]
    }
}

/// A thick filament: 60 crowns, 6 faces, 180 crossbridges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThickFilament {
    /// Filament index, 0..4.
    pub index: usize,
    /// Address of this filament.
    pub address: Address,
    /// Axial location of every crown (nm), increasing with index away
    /// from the M-line.
    pub axial: Vec<f64>,
    /// Backbone spring constant between crowns (pN/nm).
    pub k: f64,
    /// Rest length between crowns (nm).
    pub crown_spacing: f64,
    /// Rest length of the M-line anchor segment (nm).
    pub bare_zone: f64,
    /// Polymer start, 1..=3; offsets the crown face parity.
    pub start: u32,
    /// The six faces.
    pub faces: Vec<ThickFace>,
}

impl ThickFilament {
    /// Build a thick filament with the given polymer start, opposing
    /// thin faces, and head configuration. `rng` drives per-crossbridge
    /// isoform sampling when the configuration carries profiles.
    pub fn new<R: Rng + ?Sized>(
        index: usize,
        start: u32,
        thin_faces: [ThinFaceId; THICK_FACES],
        head_config: &HeadConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let axial: Vec<f64> = (0..THICK_CROWNS)
            .map(|i| THICK_BARE_ZONE + i as f64 * CROWN_SPACING)
            .collect();
        let mut faces = Vec::with_capacity(THICK_FACES);
        for f in 0..THICK_FACES {
            // Crowns whose parity (offset by the start) matches the face
            // parity contribute one head each.
            let crown_indices: Vec<usize> = (0..THICK_CROWNS)
                .filter(|c| (c + start as usize) % 2 == f % 2)
                .collect();
            let mut xbs = Vec::with_capacity(crown_indices.len());
            for xb_index in 0..crown_indices.len() {
                let head = build_head(head_config, xb_index, rng)?;
                xbs.push(Crossbridge::new(
                    xb_index,
                    Address::Xb { fil: index, face: f, xb: xb_index },
                    thin_faces[f],
                    head,
                ));
            }
            faces.push(ThickFace {
                index: f,
                address: Address::ThickFace { fil: index, face: f },
                thin_face: thin_faces[f],
                crown_indices,
                xbs,
            });
        }
        Ok(Self {
            index,
            address: Address::ThickFil { fil: index },
            axial,
            k: THICK_K,
            crown_spacing: CROWN_SPACING,
            bare_zone: THICK_BARE_ZONE,
            start,
            faces,
        })
    }

    /// Axial location of a crown.
    pub fn get_axial_location(&self, crown: usize) -> f64 {
        self.axial[crown]
    }

    /// Axial location of the filament tip (the last crown).
    pub fn tip_axial(&self) -> f64 {
        *self.axial.last().expect("a thick filament always has crowns")
    }

    /// Force the filament exerts on the M-line: the anchor segment
    /// tension, positive when the filament is pulled toward the z-line.
    pub fn effective_axial_force(&self) -> f64 {
        self.k * (self.axial[0] - self.bare_zone)
    }

    /// Net backbone force on every crown (pN), positive toward the
    /// z-line.
    pub fn backbone_forces(&self) -> Vec<f64> {
        let n = self.axial.len();
        let mut forces = vec![0.0; n];
        for i in 0..n {
            let (mward_x, mward_rest) = if i == 0 {
                (0.0, self.bare_zone)
            } else {
                (self.axial[i - 1], self.crown_spacing)
            };
            // M-line-side segment pulls toward the M-line when stretched.
            let toward_m = self.k * (self.axial[i] - mward_x - mward_rest);
            let toward_z = if i + 1 < n {
                self.k * (self.axial[i + 1] - self.axial[i] - self.crown_spacing)
            } else {
                0.0
            };
            forces[i] = toward_z - toward_m;
        }
        forces
    }

    /// Crown positions balancing the backbone against the given external
    /// loads (pN, positive toward the z-line).
    pub fn equilibrium_axial(&self, external: &[f64]) -> Vec<f64> {
        let n = self.axial.len();
        // tension[i]: M-line-side segment of crown i; a stretched anchor
        // carries the whole filament's load.
        let mut tension = vec![0.0; n];
        let mut carried = 0.0;
        for i in (0..n).rev() {
            carried += external[i];
            tension[i] = carried;
        }
        let mut eq = vec![0.0; n];
        let mut x = 0.0;
        for i in 0..n {
            let rest = if i == 0 { self.bare_zone } else { self.crown_spacing };
            x = x + rest + tension[i] / self.k;
            eq[i] = x;
        }
        eq
    }

    /// One relaxation pass toward balance under the given external
    /// loads; returns the largest pre-move net force magnitude.
    pub fn settle_step(&mut self, external: &[f64], factor: f64) -> f64 {
        let mut residual = 0.0f64;
        for (backbone, ext) in self.backbone_forces().iter().zip(external) {
            residual = residual.max((backbone + ext).abs());
        }
        let eq = self.equilibrium_axial(external);
        for (x, target) in self.axial.iter_mut().zip(eq) {
            *x += factor * (target - *x);
        }
        residual
    }

    /// Kinetic state of every crossbridge, nested by face.
    pub fn get_states(&self) -> Vec<Vec<HeadState>> {
        self.faces
            .iter()
            .map(|face| face.xbs.iter().map(Crossbridge::state).collect())
            .collect()
    }

    /// Radial tension: the summed radial force of bound crossbridges,
    /// given each bound crossbridge's site axial position.
    pub fn radial_tension<F>(&self, site_axial: F, lattice_spacing: f64) -> f64
    where
        F: Fn(SiteId) -> f64,
    {
        let mut total = 0.0;
        for face in &self.faces {
            for (xi, xb) in face.xbs.iter().enumerate() {
                if let Some(site) = xb.bound_to {
                    let crown_x = self.axial[face.crown_indices[xi]];
                    total += xb.radial_force(crown_x, site_axial(site), lattice_spacing);
                }
            }
        }
        total
    }

    /// Radial force resultant as a (y, z) vector: each face's radial
    /// force directed along that face's lattice angle.
    pub fn radial_force_vector<F>(&self, site_axial: F, lattice_spacing: f64) -> Vector2<f64>
    where
        F: Fn(SiteId) -> f64,
    {
        let mut resultant = Vector2::zeros();
        for face in &self.faces {
            let angle = face.index as f64 * std::f64::consts::FRAC_PI_3;
            let direction = Vector2::new(angle.cos(), angle.sin());
            for (xi, xb) in face.xbs.iter().enumerate() {
                if let Some(site) = xb.bound_to {
                    let crown_x = self.axial[face.crown_indices[xi]];
                    let f_y = xb.radial_force(crown_x, site_axial(site), lattice_spacing);
                    resultant += direction * f_y;
                }
            }
        }
        resultant
    }
}

/// Resolve the head parameters for one crossbridge: cluster assignment
/// wins over isoform sampling, which wins over the base overrides.
fn build_head<R: Rng + ?Sized>(
    config: &HeadConfig,
    xb_index: usize,
    rng: &mut R,
) -> Result<Head> {
    if let Some(cluster) = &config.cluster {
        let profiles = config.iso.as_ref().ok_or(SarcomereError::ClusterWithoutProfiles)?;
        let target = cluster
            .get(xb_index)
            .copied()
            .ok_or(SarcomereError::IsoformIndex { index: xb_index, len: cluster.len() })?;
        let profile = profiles
            .get(target)
            .ok_or(SarcomereError::IsoformIndex { index: target, len: profiles.len() })?;
        return Head::from_params(&config.params.merged_with(&profile.params));
    }
    if let Some(profiles) = &config.iso {
        let roll: f64 = rng.gen();
        let mut cumulative = 0.0;
        for profile in profiles {
            cumulative += profile.iso_p;
            if roll < cumulative {
                return Head::from_params(&config.params.merged_with(&profile.params));
            }
        }
        // Probabilities that sum short of 1 fall back to the last
        // profile; the reference would index out of bounds here.
        if let Some(last) = profiles.last() {
            return Head::from_params(&config.params.merged_with(&last.params));
        }
    }
    Head::from_params(&config.params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeadParams, IsoProfile};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn thin_faces() -> [ThinFaceId; THICK_FACES] {
        [
            ThinFaceId { filament: 0, face: 1 },
            ThinFaceId { filament: 1, face: 2 },
            ThinFaceId { filament: 2, face: 2 },
            ThinFaceId { filament: 6, face: 0 },
            ThinFaceId { filament: 5, face: 0 },
            ThinFaceId { filament: 4, face: 1 },
        ]
    }

    fn fil() -> ThickFilament {
        let mut rng = StdRng::seed_from_u64(1);
        ThickFilament::new(0, 1, thin_faces(), &HeadConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn construction_distributes_heads_over_faces() {
        let fil = fil();
        assert_eq!(fil.axial.len(), THICK_CROWNS);
        assert_eq!(fil.faces.len(), THICK_FACES);
        let per_face = THICK_CROWNS / 2;
        let mut total = 0;
        for face in &fil.faces {
            assert_eq!(face.xbs.len(), per_face);
            assert_eq!(face.crown_indices.len(), per_face);
            total += face.xbs.len();
        }
        assert_eq!(total, THICK_CROWNS * HEADS_PER_CROWN);
        // Start parity 1: crown 0 serves the odd faces.
        assert_eq!(fil.faces[1].crown_indices[0], 0);
        assert_eq!(fil.faces[0].crown_indices[0], 1);
    }

    #[test]
    fn crown_positions_follow_the_bare_zone() {
        let fil = fil();
        assert_relative_eq!(fil.axial[0], THICK_BARE_ZONE);
        assert_relative_eq!(fil.axial[1] - fil.axial[0], CROWN_SPACING);
        assert_relative_eq!(fil.tip_axial(), THICK_BARE_ZONE + 59.0 * CROWN_SPACING);
    }

    #[test]
    fn at_rest_the_filament_is_force_free() {
        let fil = fil();
        assert_relative_eq!(fil.effective_axial_force(), 0.0, epsilon = 1e-9);
        for f in fil.backbone_forces() {
            assert_relative_eq!(f, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn tip_load_is_carried_to_the_anchor() {
        let fil = fil();
        let mut external = vec![0.0; THICK_CROWNS];
        external[THICK_CROWNS - 1] = 3.0;
        let eq = fil.equilibrium_axial(&external);
        // Every segment (anchor included) stretches by f/k.
        assert_relative_eq!(eq[0], THICK_BARE_ZONE + 3.0 / fil.k, epsilon = 1e-12);
        assert_relative_eq!(
            *eq.last().unwrap(),
            fil.tip_axial() + 60.0 * 3.0 / fil.k,
            epsilon = 1e-9
        );
    }

    #[test]
    fn settle_converges_after_a_tip_pull() {
        let mut fil = fil();
        let mut external = vec![0.0; THICK_CROWNS];
        external[THICK_CROWNS - 1] = 3.0;
        let mut residual = f64::INFINITY;
        let mut passes = 0;
        while residual > 0.12 {
            residual = fil.settle_step(&external, 0.95);
            passes += 1;
            assert!(passes < 50, "relaxation did not converge");
        }
        assert_relative_eq!(fil.effective_axial_force(), 3.0, epsilon = 0.05);
    }

    #[test]
    fn face_delegates_axial_lookup_to_the_parent() {
        let fil = fil();
        let face = &fil.faces[2];
        let x = face.get_axial_location(4, &fil.axial);
        assert_relative_eq!(x, fil.axial[face.crown_indices[4]]);
    }

    #[test]
    fn cluster_assignment_picks_profiles_deterministically() {
        let mut rng = StdRng::seed_from_u64(2);
        let slow = IsoProfile {
            iso_p: 0.5,
            params: HeadParams { br: Some(0.25), ..Default::default() },
        };
        let fast = IsoProfile {
            iso_p: 0.5,
            params: HeadParams { br: Some(4.0), ..Default::default() },
        };
        let config = HeadConfig {
            params: HeadParams::default(),
            iso: Some(vec![slow, fast]),
            cluster: Some((0..30).map(|i| i % 2).collect()),
        };
        let fil = ThickFilament::new(0, 1, thin_faces(), &config, &mut rng).unwrap();
        // Even crossbridges on every face got the slow isoform; a
        // direct probe of the binding rate separates the two.
        let tip = (13.0, 13.0);
        let bs = (13.0, 13.0);
        let slow_rate = fil.faces[0].xbs[0].head.bind_rate(bs, tip);
        let fast_rate = fil.faces[0].xbs[1].head.bind_rate(bs, tip);
        assert_relative_eq!(fast_rate / slow_rate, 16.0, epsilon = 1e-9);
    }

    #[test]
    fn cluster_without_profiles_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = HeadConfig {
            params: HeadParams::default(),
            iso: None,
            cluster: Some(vec![0; 30]),
        };
        assert!(ThickFilament::new(0, 1, thin_faces(), &config, &mut rng).is_err());
    }
}
