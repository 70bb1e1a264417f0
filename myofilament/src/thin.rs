//! Thin (actin) filament: binding sites, faces, tropomyosin strands.
//!
//! A thin filament is a chain of 90 axial nodes, one per binding site,
//! anchored at the z-line through a spring whose rest length is the
//! filament's polymer start offset. Sites project round-robin onto three
//! faces, so consecutive sites on one face sit a full 37.3 nm repeat
//! apart. Each face is regulated by one tropomyosin strand whose j-th
//! site gates the face's j-th binding site.

use crate::address::{Address, ThickFaceId, XbId};
use crate::constants::{THIN_FACES, THIN_K, THIN_NODE_SPACING, THIN_SITES, THIN_START_STEPS};
use crate::tropomyosin::TmStrand;
use serde::{Deserialize, Serialize};

/// An actin binding site: an axial node with a regulatory gate and an
/// optional crossbridge back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSite {
    /// Index along the filament.
    pub index: usize,
    /// Address of this site.
    pub address: Address,
    /// Face this site projects onto.
    pub face: usize,
    /// The crossbridge holding this site, if any (inverse of the
    /// crossbridge's `bound_to`).
    pub bound_to: Option<XbId>,
}

/// A face of a thin filament: the ordered subset of sites oriented
/// toward one thick filament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinFace {
    /// Face index, 0..3.
    pub index: usize,
    /// Address of this face.
    pub address: Address,
    /// The opposing thick face.
    pub thick_face: ThickFaceId,
    /// Filament-level indices of this face's sites, ordered from the
    /// z-line outward.
    pub site_indices: Vec<usize>,
}

/// A thin filament: 90 sites on 3 faces with tropomyosin regulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinFilament {
    /// Filament index, 0..8.
    pub index: usize,
    /// Address of this filament.
    pub address: Address,
    /// Axial location of every site (nm), decreasing with index: site 0
    /// sits nearest the z-line.
    pub axial: Vec<f64>,
    /// Backbone spring constant between sites (pN/nm).
    pub k: f64,
    /// Rest length between consecutive sites (nm).
    pub node_spacing: f64,
    /// Rest length of the z-line anchor spring (nm).
    pub rest_offset: f64,
    /// Polymer start offset, 0..25.
    pub start: u32,
    /// The binding sites.
    pub sites: Vec<BindingSite>,
    /// The three faces.
    pub faces: Vec<ThinFace>,
    /// One tropomyosin strand per face.
    pub tm: Vec<TmStrand>,
}

impl ThinFilament {
    /// Build a thin filament anchored at `z_line` with the given polymer
    /// start and face wiring.
    pub fn new(index: usize, start: u32, z_line: f64, thick_faces: [ThickFaceId; THIN_FACES]) -> Self {
        let rest_offset =
            f64::from(start % THIN_START_STEPS) * THIN_NODE_SPACING / f64::from(THIN_START_STEPS);
        let axial: Vec<f64> = (0..THIN_SITES)
            .map(|i| z_line - rest_offset - i as f64 * THIN_NODE_SPACING)
            .collect();
        let sites: Vec<BindingSite> = (0..THIN_SITES)
            .map(|i| BindingSite {
                index: i,
                address: Address::Bs { fil: index, site: i },
                face: i % THIN_FACES,
                bound_to: None,
            })
            .collect();
        let faces: Vec<ThinFace> = (0..THIN_FACES)
            .map(|f| ThinFace {
                index: f,
                address: Address::ThinFace { fil: index, face: f },
                thick_face: thick_faces[f],
                site_indices: (0..THIN_SITES).filter(|i| i % THIN_FACES == f).collect(),
            })
            .collect();
        let sites_per_face = THIN_SITES / THIN_FACES;
        let tm: Vec<TmStrand> =
            (0..THIN_FACES).map(|f| TmStrand::new(index, f, sites_per_face)).collect();
        Self {
            index,
            address: Address::ThinFil { fil: index },
            axial,
            k: THIN_K,
            node_spacing: THIN_NODE_SPACING,
            rest_offset,
            start,
            sites,
            faces,
            tm,
        }
    }

    /// Axial location of a site.
    pub fn axial_location(&self, site: usize) -> f64 {
        self.axial[site]
    }

    /// The site on `face` nearest to axial position `x`, skipping sites
    /// hidden below the hiding line. Returns the filament-level index.
    pub fn nearest_visible(&self, face: usize, x: f64, hiding_line: f64) -> Option<usize> {
        self.faces[face]
            .site_indices
            .iter()
            .copied()
            .filter(|&i| self.axial[i] >= hiding_line)
            .min_by(|&a, &b| {
                let da = (self.axial[a] - x).abs();
                let db = (self.axial[b] - x).abs();
                da.partial_cmp(&db).expect("site distances are finite")
            })
    }

    /// Binding permissiveness of a site: 1 iff its tropomyosin site is
    /// open.
    pub fn permissiveness(&self, site: usize) -> f64 {
        let face = site % THIN_FACES;
        self.tm[face].sites[site / THIN_FACES].permissiveness()
    }

    /// Mean permissiveness across the filament.
    pub fn mean_permissiveness(&self) -> f64 {
        let total: f64 = (0..self.sites.len()).map(|i| self.permissiveness(i)).sum();
        total / self.sites.len() as f64
    }

    /// Claim a site for a crossbridge. Fails (returning false) when the
    /// site is already held.
    pub fn bind(&mut self, site: usize, xb: XbId) -> bool {
        if self.sites[site].bound_to.is_some() {
            return false;
        }
        self.sites[site].bound_to = Some(xb);
        true
    }

    /// Release a site.
    pub fn unbind(&mut self, site: usize) {
        self.sites[site].bound_to = None;
    }

    /// Net backbone force on every site (pN): anchor and neighbor spring
    /// tensions, positive toward the z-line.
    pub fn backbone_forces(&self, z_line: f64) -> Vec<f64> {
        let n = self.axial.len();
        let mut forces = vec![0.0; n];
        for i in 0..n {
            // Spring toward the z-line side: the anchor for site 0.
            let (zward_x, zward_rest) = if i == 0 {
                (z_line, self.rest_offset)
            } else {
                (self.axial[i - 1], self.node_spacing)
            };
            let toward_z = self.k * (zward_x - self.axial[i] - zward_rest);
            // Spring toward the tip side, absent for the last site.
            let toward_tip = if i + 1 < n {
                self.k * (self.axial[i] - self.axial[i + 1] - self.node_spacing)
            } else {
                0.0
            };
            forces[i] = toward_z - toward_tip;
        }
        forces
    }

    /// Site positions balancing the backbone against the given external
    /// loads (pN, positive toward the z-line).
    ///
    /// The chain hangs off the z-line, so the tension of the segment on
    /// the z-line side of site `i` carries every load from `i` outward.
    pub fn equilibrium_axial(&self, external: &[f64], z_line: f64) -> Vec<f64> {
        let n = self.axial.len();
        // tension[i]: z-line-side segment of site i, positive stretched.
        let mut tension = vec![0.0; n];
        let mut carried = 0.0;
        for i in (0..n).rev() {
            carried -= external[i];
            tension[i] = carried;
        }
        let mut eq = vec![0.0; n];
        let mut x = z_line;
        for i in 0..n {
            let rest = if i == 0 { self.rest_offset } else { self.node_spacing };
            x = x - rest - tension[i] / self.k;
            eq[i] = x;
        }
        eq
    }

    /// One relaxation pass: move every site by `factor` of the way to
    /// the balanced configuration for the given external loads. Returns
    /// the largest pre-move net force magnitude.
    pub fn settle_step(&mut self, external: &[f64], z_line: f64, factor: f64) -> f64 {
        let mut residual = 0.0f64;
        for (backbone, ext) in self.backbone_forces(z_line).iter().zip(external) {
            residual = residual.max((backbone + ext).abs());
        }
        let eq = self.equilibrium_axial(external, z_line);
        for (x, target) in self.axial.iter_mut().zip(eq) {
            *x += factor * (target - *x);
        }
        residual
    }

    /// Number of sites whose tropomyosin is out of the blocked state.
    pub fn calcium_bound_sites(&self) -> usize {
        self.tm
            .iter()
            .flat_map(|strand| strand.sites.iter())
            .filter(|site| site.state.index() != 0)
            .count()
    }

    /// Total tropomyosin sites on this filament.
    pub fn total_tm_sites(&self) -> usize {
        self.tm.iter().map(|strand| strand.sites.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fil() -> ThinFilament {
        let faces = [
            ThickFaceId { filament: 0, face: 0 },
            ThickFaceId { filament: 1, face: 2 },
            ThickFaceId { filament: 2, face: 4 },
        ];
        ThinFilament::new(0, 0, 1250.0, faces)
    }

    #[test]
    fn construction_lays_out_ninety_sites() {
        let fil = fil();
        assert_eq!(fil.axial.len(), THIN_SITES);
        assert_eq!(fil.sites.len(), THIN_SITES);
        assert_eq!(fil.faces.len(), THIN_FACES);
        assert_eq!(fil.tm.len(), THIN_FACES);
        for face in &fil.faces {
            assert_eq!(face.site_indices.len(), THIN_SITES / THIN_FACES);
        }
        // Site 0 sits at the z-line minus the (zero) start offset.
        assert_relative_eq!(fil.axial[0], 1250.0);
        // Consecutive sites on one face sit a full repeat apart.
        let f0 = &fil.faces[0].site_indices;
        assert_relative_eq!(
            fil.axial[f0[0]] - fil.axial[f0[1]],
            3.0 * THIN_NODE_SPACING,
            epsilon = 1e-9
        );
    }

    #[test]
    fn start_offset_shifts_the_polymer() {
        let faces = [
            ThickFaceId { filament: 0, face: 0 },
            ThickFaceId { filament: 1, face: 2 },
            ThickFaceId { filament: 2, face: 4 },
        ];
        let shifted = ThinFilament::new(0, 5, 1250.0, faces);
        let expected = 5.0 * THIN_NODE_SPACING / 25.0;
        assert_relative_eq!(1250.0 - shifted.axial[0], expected, epsilon = 1e-9);
    }

    #[test]
    fn nearest_visible_minimizes_axial_distance() {
        let fil = fil();
        let x = fil.axial[33] + 2.0;
        let found = fil.nearest_visible(0, x, f64::NEG_INFINITY).unwrap();
        assert_eq!(found, 33);
        // Site 33 projects onto face 0 (33 % 3 == 0).
        assert_eq!(fil.sites[found].face, 0);
    }

    #[test]
    fn hiding_line_excludes_low_sites() {
        let fil = fil();
        let tip = *fil.axial.last().unwrap();
        // Hide everything below the midpoint, then ask for a site near
        // the hidden tip: the nearest visible one sits at the line.
        let line = fil.axial[45];
        let found = fil.nearest_visible(0, tip, line).unwrap();
        assert!(fil.axial[found] >= line);
    }

    #[test]
    fn double_bind_is_refused() {
        let mut fil = fil();
        let xb_a = XbId { filament: 0, face: 0, index: 4 };
        let xb_b = XbId { filament: 1, face: 3, index: 9 };
        assert!(fil.bind(12, xb_a));
        assert!(!fil.bind(12, xb_b));
        assert_eq!(fil.sites[12].bound_to, Some(xb_a));
        fil.unbind(12);
        assert!(fil.bind(12, xb_b));
    }

    #[test]
    fn permissiveness_follows_tropomyosin() {
        use crate::tropomyosin::TmState;
        let mut fil = fil();
        assert_eq!(fil.permissiveness(12), 0.0);
        // Site 12 is face 0, strand position 4.
        fil.tm[0].sites[4].state = TmState::Open;
        assert_eq!(fil.permissiveness(12), 1.0);
        assert!(fil.mean_permissiveness() > 0.0);
    }

    #[test]
    fn backbone_is_at_rest_on_construction() {
        let fil = fil();
        for f in fil.backbone_forces(1250.0) {
            assert_relative_eq!(f, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn displaced_site_relaxes_back() {
        let mut fil = fil();
        fil.axial[40] += 1.0;
        let external = vec![0.0; THIN_SITES];
        let mut residual = f64::INFINITY;
        let mut passes = 0;
        while residual > 0.12 {
            residual = fil.settle_step(&external, 1250.0, 0.95);
            passes += 1;
            assert!(passes < 50, "relaxation did not converge");
        }
        assert_relative_eq!(fil.axial[40], 1250.0 - 40.0 * THIN_NODE_SPACING, epsilon = 1e-3);
    }

    #[test]
    fn external_load_stretches_the_anchor_segment() {
        let fil = fil();
        let mut external = vec![0.0; THIN_SITES];
        // A crossbridge pulling the tip site toward the M-line loads
        // every segment between it and the z-line.
        external[THIN_SITES - 1] = -5.0;
        let eq = fil.equilibrium_axial(&external, 1250.0);
        assert_relative_eq!(1250.0 - eq[0], fil.rest_offset + 5.0 / fil.k, epsilon = 1e-9);
        // The tip moves 90 segment-stretches away.
        let stretch = 5.0 / fil.k * THIN_SITES as f64;
        assert_relative_eq!(
            eq[THIN_SITES - 1],
            1250.0 - fil.rest_offset - 89.0 * THIN_NODE_SPACING - stretch,
            epsilon = 1e-9
        );
    }
}
