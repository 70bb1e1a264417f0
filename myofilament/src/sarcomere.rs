//! The half-sarcomere: four thick and eight thin filaments on a fixed
//! hexagonal lattice, 24 titin tethers, and the timestep driver.
//!
//! The half-sarcomere owns every filament and titin; faces are index
//! projections into their parents and all cross-structure links are
//! id-based. Per timestep the driver (1) applies the boundary-condition
//! traces, (2) lets every crossbridge attempt a kinetic transition
//! against its nearest or bound site, (3) refreshes the regulatory
//! species concentrations, (4) runs the cooperative tropomyosin cycle,
//! (5) relaxes the spring network to force balance, and (6) emits the
//! observation report.
//!
//! Lattice arrangement (actin around myosin):
//!
//! ```text
//! |      a1      a3          |
//! |  a0      a2      a0      |
//! |      M0      M1          |
//! |  a4      a6      a4      |
//! |      a5      a7      a5  |
//! |          M2      M3      |
//! ```

use crate::address::{Address, SiteId, ThickFaceId, ThinFaceId, XbId};
use crate::config::{HeadConfig, SarcomereConfig, TimeDependence};
use crate::constants::{
    CONVERGE_LIMIT, DEFAULT_LATTICE_SPACING, DEFAULT_PCA, DEFAULT_Z_LINE, LATTICE_BETA,
    LITERS_PER_NM3, RELAX_FACTOR, SETTLE_MAX_PASSES, THICK_FACES, THICK_RODS, THICK_ROD_VOLUME,
    THIN_FACES, THIN_RODS, THIN_ROD_VOLUME, THIN_START_STEPS,
};
use crate::crossbridge::Crossbridge;
use crate::error::{Result, SarcomereError};
use crate::head::{HeadState, HeadTransition};
use crate::report::{Observations, Report, RunOutcome};
use crate::thick::{ThickFace, ThickFilament};
use crate::thin::{BindingSite, ThinFace, ThinFilament};
use crate::titin::Titin;
use crate::tropomyosin::{TmSite, TmStrand};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};

/// Number of thick filaments.
pub const N_THICK: usize = 4;
/// Number of thin filaments.
pub const N_THIN: usize = 8;
/// Number of titin tethers.
pub const N_TITIN: usize = 24;

/// For each thick filament, the (thin filament, thin face) opposite each
/// of its six faces.
const THICK_TO_THIN: [[(usize, usize); THICK_FACES]; N_THICK] = [
    [(0, 1), (1, 2), (2, 2), (6, 0), (5, 0), (4, 1)],
    [(2, 1), (3, 2), (0, 2), (4, 0), (7, 0), (6, 1)],
    [(5, 1), (6, 2), (7, 2), (3, 0), (2, 0), (1, 1)],
    [(7, 1), (4, 2), (5, 2), (1, 0), (0, 0), (3, 1)],
];

/// For each thin filament, the (thick filament, thick face) opposite
/// each of its three faces. Must stay the mutual inverse of
/// [`THICK_TO_THIN`].
const THIN_TO_THICK: [[(usize, usize); THIN_FACES]; N_THIN] = [
    [(3, 4), (0, 0), (1, 2)],
    [(3, 3), (2, 5), (0, 1)],
    [(2, 4), (1, 0), (0, 2)],
    [(2, 3), (3, 5), (1, 1)],
    [(1, 3), (0, 5), (3, 1)],
    [(0, 4), (2, 0), (3, 2)],
    [(0, 3), (1, 5), (2, 1)],
    [(1, 4), (3, 0), (2, 2)],
];

/// Titin endpoints: ((thick filament, thick face), (thin filament, thin
/// face)), six tethers per thick filament.
const TITIN_ENDPOINTS: [((usize, usize), (usize, usize)); N_TITIN] = [
    ((0, 0), (0, 1)),
    ((0, 1), (1, 2)),
    ((0, 2), (2, 2)),
    ((1, 0), (2, 1)),
    ((1, 1), (3, 2)),
    ((1, 2), (0, 2)),
    ((0, 5), (4, 1)),
    ((0, 4), (5, 0)),
    ((0, 3), (6, 0)),
    ((1, 5), (6, 1)),
    ((1, 4), (7, 0)),
    ((1, 3), (4, 0)),
    ((2, 0), (5, 1)),
    ((2, 1), (6, 2)),
    ((2, 2), (7, 2)),
    ((3, 0), (7, 1)),
    ((3, 1), (4, 2)),
    ((3, 2), (5, 2)),
    ((2, 5), (1, 1)),
    ((2, 4), (2, 0)),
    ((2, 3), (3, 0)),
    ((3, 5), (3, 1)),
    ((3, 4), (0, 0)),
    ((3, 3), (1, 0)),
];

/// A reference to any addressable entity.
#[derive(Debug)]
pub enum Entity<'a> {
    ThinFil(&'a ThinFilament),
    ThinFace(&'a ThinFace),
    Bs(&'a BindingSite),
    Tm(&'a TmStrand),
    TmSite(&'a TmSite),
    ThickFil(&'a ThickFilament),
    Crown { filament: &'a ThickFilament, crown: usize },
    ThickFace(&'a ThickFace),
    Xb(&'a Crossbridge),
}

/// A single half-sarcomere and everything it owns.
#[derive(Debug)]
pub struct HalfSarcomere {
    /// The four thick filaments.
    pub thick: Vec<ThickFilament>,
    /// The eight thin filaments.
    pub thin: Vec<ThinFilament>,
    /// The 24 titin tethers.
    pub titin: Vec<Titin>,
    pub(crate) lattice_spacing: f64,
    pub(crate) z_line: f64,
    pub(crate) p_ca: f64,
    pub(crate) timestep_len: f64,
    pub(crate) current_timestep: usize,
    pub(crate) hiding_line: f64,
    pub(crate) initial_z_line: f64,
    pub(crate) initial_lattice_spacing: f64,
    pub(crate) poisson_ratio: f64,
    pub(crate) volume: f64,
    pub(crate) c_tn: f64,
    pub(crate) c_ca: f64,
    pub(crate) c_tnca: f64,
    pub(crate) time_dependence: Option<TimeDependence>,
    pub(crate) thin_starts: Vec<u32>,
    pub(crate) thick_starts: Vec<u32>,
    pub(crate) titin_params: Option<(f64, f64)>,
    pub(crate) head_config: HeadConfig,
    pub(crate) seed: u64,
    pub(crate) rng: StdRng,
}

impl HalfSarcomere {
    /// Build a half-sarcomere from a run configuration.
    pub fn new(config: SarcomereConfig) -> Result<Self> {
        if !(config.timestep_len > 0.0) {
            return Err(SarcomereError::InvalidParameter {
                parameter: "timestep_len".to_string(),
                value: config.timestep_len,
                reason: "must be positive".to_string(),
            });
        }

        // The first entry of each trace overrides the initial value.
        let mut lattice_spacing = config.lattice_spacing;
        let mut z_line = config.z_line;
        let mut p_ca = config.p_ca;
        if let Some(td) = &config.time_dependence {
            if let Some(trace) = &td.lattice_spacing {
                lattice_spacing = Some(first_entry(trace, "lattice_spacing")?);
            }
            if let Some(trace) = &td.z_line {
                z_line = Some(first_entry(trace, "z_line")?);
            }
            if let Some(trace) = &td.p_ca {
                p_ca = Some(first_entry(trace, "pCa")?);
            }
        }
        let lattice_spacing = lattice_spacing.unwrap_or(DEFAULT_LATTICE_SPACING);
        let z_line = z_line.unwrap_or(DEFAULT_Z_LINE);
        let p_ca = p_ca.unwrap_or(DEFAULT_PCA);
        let poisson_ratio = config.poisson_ratio.unwrap_or(0.0);

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        // Polymer starts: drawn when not pinned by the configuration.
        let (thin_starts, thick_starts) = match &config.starts {
            Some((thin, thick)) => {
                if thin.len() != N_THIN {
                    return Err(SarcomereError::StartCount {
                        which: "thin",
                        expected: N_THIN,
                        found: thin.len(),
                    });
                }
                if thick.len() != N_THICK {
                    return Err(SarcomereError::StartCount {
                        which: "thick",
                        expected: N_THICK,
                        found: thick.len(),
                    });
                }
                (thin.clone(), thick.clone())
            }
            None => {
                let thin = (0..N_THIN).map(|_| rng.gen_range(0..THIN_START_STEPS)).collect();
                let thick = (0..N_THICK).map(|_| rng.gen_range(1..4u32)).collect();
                (thin, thick)
            }
        };

        let thin: Vec<ThinFilament> = (0..N_THIN)
            .map(|i| {
                let faces: [ThickFaceId; THIN_FACES] = std::array::from_fn(|f| {
                    let (filament, face) = THIN_TO_THICK[i][f];
                    ThickFaceId { filament, face }
                });
                ThinFilament::new(i, thin_starts[i], z_line, faces)
            })
            .collect();

        let mut thick = Vec::with_capacity(N_THICK);
        for i in 0..N_THICK {
            let faces: [ThinFaceId; THICK_FACES] = std::array::from_fn(|f| {
                let (filament, face) = THICK_TO_THIN[i][f];
                ThinFaceId { filament, face }
            });
            thick.push(ThickFilament::new(
                i,
                thick_starts[i],
                faces,
                &config.head,
                &mut rng,
            )?);
        }

        let titin: Vec<Titin> = TITIN_ENDPOINTS
            .iter()
            .enumerate()
            .map(|(i, &((mf, mface), (af, aface)))| {
                Titin::new(
                    i,
                    ThickFaceId { filament: mf, face: mface },
                    ThinFaceId { filament: af, face: aface },
                    config.titin_params,
                )
            })
            .collect();

        let mut hs = Self {
            thick,
            thin,
            titin,
            lattice_spacing,
            z_line,
            p_ca,
            timestep_len: config.timestep_len,
            current_timestep: 0,
            hiding_line: 0.0,
            initial_z_line: z_line,
            initial_lattice_spacing: lattice_spacing,
            poisson_ratio,
            volume: 0.0,
            c_tn: 0.0,
            c_ca: 0.0,
            c_tnca: 0.0,
            time_dependence: config.time_dependence,
            thin_starts,
            thick_starts,
            titin_params: config.titin_params,
            head_config: config.head,
            seed,
            rng,
        };
        hs.update_hiding_line();
        hs.update_volume();
        hs.update_concentrations();
        Ok(hs)
    }

    // ## Boundary conditions

    /// Current z-line position (half-sarcomere length, nm).
    pub fn z_line(&self) -> f64 {
        self.z_line
    }

    /// Set the z-line, updating the lattice spacing through the Poisson
    /// ratio and refreshing the fluid volume.
    pub fn set_z_line(&mut self, z_line: f64) {
        self.z_line = z_line;
        self.update_ls_from_poisson_ratio();
        self.update_volume();
    }

    /// Current face-to-face lattice spacing (nm).
    pub fn lattice_spacing(&self) -> f64 {
        self.lattice_spacing
    }

    /// Assign a lattice spacing directly.
    pub fn set_lattice_spacing(&mut self, lattice_spacing: f64) {
        self.lattice_spacing = lattice_spacing;
    }

    /// Current pCa.
    pub fn p_ca(&self) -> f64 {
        self.p_ca
    }

    /// Assign a new pCa.
    pub fn set_p_ca(&mut self, p_ca: f64) {
        self.p_ca = p_ca;
    }

    /// Timestep length (ms).
    pub fn timestep_len(&self) -> f64 {
        self.timestep_len
    }

    /// Index of the last entered timestep.
    pub fn current_timestep(&self) -> usize {
        self.current_timestep
    }

    /// Axial coordinate below which binding sites are hidden by overlap.
    pub fn hiding_line(&self) -> f64 {
        self.hiding_line
    }

    /// RNG seed of this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Poisson ratio.
    pub fn poisson_ratio(&self) -> f64 {
        self.poisson_ratio
    }

    /// Lattice fluid volume (liters).
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Free calcium concentration, 10^(−pCa) (M).
    pub fn c_ca(&self) -> f64 {
        self.c_ca
    }

    /// Free troponin concentration (count per liter).
    pub fn c_tn(&self) -> f64 {
        self.c_tn
    }

    /// Calcium-bound troponin concentration (count per liter).
    pub fn c_tnca(&self) -> f64 {
        self.c_tnca
    }

    /// Mean binding permissiveness of each thin filament.
    pub fn actin_permissiveness(&self) -> Vec<f64> {
        self.thin.iter().map(ThinFilament::mean_permissiveness).collect()
    }

    /// Update the lattice spacing from the Poisson ratio, the initial
    /// lattice spacing, and the z-line excursion:
    /// `ls = (ls₀ + β)·(z₀/(z₀ + Δz))^ν − β` with β = 12.5 nm.
    pub fn update_ls_from_poisson_ratio(&mut self) {
        let ls_0 = self.initial_lattice_spacing;
        let z_0 = self.initial_z_line;
        let dz = self.z_line - z_0;
        self.lattice_spacing =
            (ls_0 + LATTICE_BETA) * (z_0 / (z_0 + dz)).powf(self.poisson_ratio) - LATTICE_BETA;
    }

    /// Update the line below which actin sites are hidden by overlap
    /// with the adjacent half-sarcomere.
    pub fn update_hiding_line(&mut self) {
        let farthest = self
            .thin
            .iter()
            .flat_map(|fil| fil.axial.iter().copied())
            .fold(f64::INFINITY, f64::min);
        self.hiding_line = -farthest;
    }

    /// Recompute the lattice fluid volume (liters) from the hexagonal
    /// unit cells minus the filament rods.
    pub fn update_volume(&mut self) {
        let edge = 0.5 * 9.0 + 0.5 * 16.0 + self.lattice_spacing;
        let area = 4.0 * 1.5 * 3.0f64.sqrt() * edge * edge;
        let filament_volume = THIN_RODS * std::f64::consts::PI * THIN_ROD_VOLUME
            + THICK_RODS * std::f64::consts::PI * THICK_ROD_VOLUME;
        self.volume = (area * self.z_line - filament_volume) * LITERS_PER_NM3;
    }

    /// Refresh the regulatory species pool: free calcium from pCa, free
    /// and bound troponin from the tropomyosin states.
    pub fn update_concentrations(&mut self) {
        let bound: usize = self.thin.iter().map(ThinFilament::calcium_bound_sites).sum();
        let total: usize = self.thin.iter().map(ThinFilament::total_tm_sites).sum();
        self.c_ca = 10f64.powf(-self.p_ca);
        self.c_tn = (total - bound) as f64 / self.volume;
        self.c_tnca = bound as f64 / self.volume;
    }

    /// Face-to-face lattice spacing to d10 spacing (nm).
    pub fn ls_to_d10(face_dist: f64) -> f64 {
        1.5 * (face_dist + LATTICE_BETA)
    }

    /// d10 spacing to face-to-face lattice spacing (nm).
    pub fn d10_to_ls(d10: f64) -> f64 {
        d10 * 2.0 / 3.0 - LATTICE_BETA
    }

    // ## Forces

    /// Sum of each thick filament's axial force on the M-line (pN).
    pub fn axial_force(&self) -> f64 {
        self.thick.iter().map(ThickFilament::effective_axial_force).sum()
    }

    /// Sum of the thick filaments' radial tensions (pN).
    pub fn radial_tension(&self) -> f64 {
        let ls = self.lattice_spacing;
        self.thick
            .iter()
            .map(|fil| fil.radial_tension(|site| self.thin[site.filament].axial[site.site], ls))
            .sum()
    }

    /// Resultant radial force as a (y, z) vector (pN).
    pub fn radial_force(&self) -> Vector2<f64> {
        let ls = self.lattice_spacing;
        self.thick
            .iter()
            .map(|fil| {
                fil.radial_force_vector(|site| self.thin[site.filament].axial[site.site], ls)
            })
            .fold(Vector2::zeros(), |acc, v| acc + v)
    }

    /// Fraction of crossbridges in each kinetic state (free, loose,
    /// tight).
    pub fn fraction_in_states(&self) -> [f64; 3] {
        let mut counts = [0usize; 3];
        let mut total = 0usize;
        for fil in &self.thick {
            for face in &fil.faces {
                for xb in &face.xbs {
                    counts[xb.state().index()] += 1;
                    total += 1;
                }
            }
        }
        [
            counts[0] as f64 / total as f64,
            counts[1] as f64 / total as f64,
            counts[2] as f64 / total as f64,
        ]
    }

    // ## Timestep driver

    /// Advance one timestep.
    pub fn timestep(&mut self) -> Result<()> {
        self.timestep_at(self.current_timestep + 1)
    }

    /// Advance the model through timestep `index`: apply the boundary
    /// conditions, run the kinetic phases, and settle the lattice.
    pub fn timestep_at(&mut self, index: usize) -> Result<()> {
        self.enter_timestep(index)?;
        self.tick_crossbridges();
        self.update_concentrations();
        self.tick_tropomyosin();
        self.settle();
        Ok(())
    }

    /// Set the current timestep, refreshing the hiding line and applying
    /// the time-dependence traces at that index.
    pub fn enter_timestep(&mut self, index: usize) -> Result<()> {
        self.update_hiding_line();
        let mut new_ls = None;
        let mut new_z = None;
        let mut new_pca = None;
        if let Some(td) = &self.time_dependence {
            if let Some(trace) = &td.lattice_spacing {
                new_ls = Some(trace_entry(trace, index, "lattice_spacing")?);
            }
            if let Some(trace) = &td.z_line {
                new_z = Some(trace_entry(trace, index, "z_line")?);
            }
            if let Some(trace) = &td.p_ca {
                new_pca = Some(trace_entry(trace, index, "pCa")?);
            }
        }
        if let Some(ls) = new_ls {
            self.set_lattice_spacing(ls);
        }
        if let Some(z) = new_z {
            self.set_z_line(z);
        }
        if let Some(p_ca) = new_pca {
            self.set_p_ca(p_ca);
        }
        self.current_timestep = index;
        Ok(())
    }

    /// Kinetic phase: every crossbridge attempts one transition. Free
    /// heads court the nearest visible site on their opposing thin face;
    /// bound heads are evaluated against their site. A refused bind
    /// reverts to free.
    fn tick_crossbridges(&mut self) {
        let ls = self.lattice_spacing;
        let ts = self.current_timestep;
        let dt = self.timestep_len;
        let hiding = self.hiding_line;
        let Self { thick, thin, rng, .. } = self;
        let mut transitions = 0usize;
        for fil in thick.iter_mut() {
            let fil_index = fil.index;
            for fi in 0..fil.faces.len() {
                for xi in 0..fil.faces[fi].xbs.len() {
                    let crown = fil.faces[fi].crown_indices[xi];
                    let crown_x = fil.axial[crown];
                    let thin_face = fil.faces[fi].xbs[xi].thin_face;
                    match fil.faces[fi].xbs[xi].bound_to {
                        None => {
                            let tip_x = fil.faces[fi].xbs[xi]
                                .head
                                .unbound_tip(ls, ts, rng)
                                .0;
                            let target = crown_x + tip_x;
                            let fil_thin = &thin[thin_face.filament];
                            let Some(site) =
                                fil_thin.nearest_visible(thin_face.face, target, hiding)
                            else {
                                continue;
                            };
                            let site_x = fil_thin.axial[site];
                            let ap = fil_thin.permissiveness(site);
                            let bs = (site_x - crown_x, ls);
                            let attempted = fil.faces[fi].xbs[xi]
                                .head
                                .transition(bs, ap, ls, ts, dt, rng);
                            if attempted == Some(HeadTransition::Bind) {
                                let xb_id =
                                    XbId { filament: fil_index, face: fi, index: xi };
                                if thin[thin_face.filament].bind(site, xb_id) {
                                    fil.faces[fi].xbs[xi].bound_to =
                                        Some(SiteId { filament: thin_face.filament, site });
                                    transitions += 1;
                                } else {
                                    // Claimed earlier this step; back off.
                                    fil.faces[fi].xbs[xi].head.state = HeadState::Free;
                                    log::debug!(
                                        "bs[{}][{}] refused xb[{}][{}][{}]",
                                        thin_face.filament,
                                        site,
                                        fil_index,
                                        fi,
                                        xi
                                    );
                                }
                            }
                        }
                        Some(site_id) => {
                            let site_x = thin[site_id.filament].axial[site_id.site];
                            let ap = thin[site_id.filament].permissiveness(site_id.site);
                            let bs = (site_x - crown_x, ls);
                            match fil.faces[fi].xbs[xi]
                                .head
                                .transition(bs, ap, ls, ts, dt, rng)
                            {
                                Some(HeadTransition::Unbind) | Some(HeadTransition::Release) => {
                                    fil.faces[fi].xbs[xi].bound_to = None;
                                    thin[site_id.filament].unbind(site_id.site);
                                    transitions += 1;
                                }
                                Some(_) => transitions += 1,
                                None => {}
                            }
                        }
                    }
                }
            }
        }
        log::trace!("timestep {ts}: {transitions} crossbridge transitions");
    }

    /// Regulatory phase: every tropomyosin strand refreshes its
    /// cooperativity flags and lets each site attempt one transition.
    fn tick_tropomyosin(&mut self) {
        let c_ca = self.c_ca;
        let dt = self.timestep_len;
        let Self { thin, rng, .. } = self;
        let mut open = 0usize;
        let mut total = 0usize;
        for fil in thin.iter_mut() {
            for strand in fil.tm.iter_mut() {
                let (o, t) = strand.transition(c_ca, dt, rng);
                open += o;
                total += t;
            }
        }
        log::trace!(
            "timestep {}: tropomyosin open fraction {:.3}",
            self.current_timestep,
            open as f64 / total as f64
        );
    }

    /// External (non-backbone) axial loads on a thick filament's crowns:
    /// bound crossbridges plus titin at the tip.
    fn thick_external_forces(&self, index: usize) -> Vec<f64> {
        let fil = &self.thick[index];
        let ls = self.lattice_spacing;
        let mut external = vec![0.0; fil.axial.len()];
        for face in &fil.faces {
            for (xi, xb) in face.xbs.iter().enumerate() {
                if let Some(site) = xb.bound_to {
                    let crown = face.crown_indices[xi];
                    let site_x = self.thin[site.filament].axial[site.site];
                    external[crown] += xb.axial_force(fil.axial[crown], site_x, ls);
                }
            }
        }
        let tip = fil.axial.len() - 1;
        for titin in &self.titin {
            if titin.thick_face.filament == index {
                external[tip] += titin.axial_force(self.titin_span(titin));
            }
        }
        external
    }

    /// External axial loads on a thin filament's sites: reactions from
    /// bound crossbridges plus titin at each face's z-line end.
    fn thin_external_forces(&self, index: usize) -> Vec<f64> {
        let fil = &self.thin[index];
        let ls = self.lattice_spacing;
        let mut external = vec![0.0; fil.axial.len()];
        for site in &fil.sites {
            if let Some(xb_id) = site.bound_to {
                let thick_fil = &self.thick[xb_id.filament];
                let face = &thick_fil.faces[xb_id.face];
                let crown_x = thick_fil.axial[face.crown_indices[xb_id.index]];
                let xb = &face.xbs[xb_id.index];
                external[site.index] -= xb.axial_force(crown_x, fil.axial[site.index], ls);
            }
        }
        for titin in &self.titin {
            if titin.thin_face.filament == index {
                // Titin holds the face's z-line-side site.
                external[titin.thin_face.face] -= titin.axial_force(self.titin_span(titin));
            }
        }
        external
    }

    /// End-to-end span of a titin tether: from the thick filament tip to
    /// the z-line-side site of the tethered thin face.
    fn titin_span(&self, titin: &Titin) -> f64 {
        let tip_x = self.thick[titin.thick_face.filament].tip_axial();
        // Site `face` is the z-line-nearest site of that face.
        let anchor_x = self.thin[titin.thin_face.filament].axial[titin.thin_face.face];
        anchor_x - tip_x
    }

    /// One relaxation pass over every filament; returns the largest
    /// pre-move residual force (pN).
    fn single_settle(&mut self, factor: f64) -> f64 {
        let mut residual = 0.0f64;
        for i in 0..self.thick.len() {
            let external = self.thick_external_forces(i);
            residual = residual.max(self.thick[i].settle_step(&external, factor));
        }
        let z_line = self.z_line;
        for i in 0..self.thin.len() {
            let external = self.thin_external_forces(i);
            residual = residual.max(self.thin[i].settle_step(&external, z_line, factor));
        }
        residual
    }

    /// Relax the spring network until the largest residual node force
    /// drops to [`CONVERGE_LIMIT`]. Reports (and tolerates)
    /// non-convergence past the pass cap, preserving the partial state.
    pub fn settle(&mut self) -> f64 {
        let mut residual = self.single_settle(RELAX_FACTOR);
        let mut passes = 1;
        while residual > CONVERGE_LIMIT {
            if passes >= SETTLE_MAX_PASSES {
                log::warn!(
                    "settle did not converge after {passes} passes (residual {residual:.3} pN) \
                     at timestep {}",
                    self.current_timestep
                );
                break;
            }
            residual = self.single_settle(RELAX_FACTOR);
            passes += 1;
        }
        residual
    }

    // ## Observation

    /// Assemble the default per-timestep report.
    pub fn report(&self) -> Report {
        let mut rate_sums = [0.0f64; 6];
        let mut coop = 0usize;
        let mut count = 0usize;
        for fil in &self.thin {
            for strand in &fil.tm {
                for site in &strand.sites {
                    if site.subject_to_cooperativity {
                        coop += 1;
                    }
                    rate_sums[0] += site.rates.r_12;
                    rate_sums[1] += site.rates.r_21;
                    rate_sums[2] += site.rates.r_23;
                    rate_sums[3] += site.rates.r_32;
                    rate_sums[4] += site.rates.r_31;
                    rate_sums[5] += site.rates.r_13;
                    count += 1;
                }
            }
        }
        let n = count as f64;
        let fracs = self.fraction_in_states();
        Report {
            axial_force: self.axial_force(),
            coop: coop as f64 / n,
            ca: self.c_ca,
            xb_fraction_free: fracs[0],
            xb_fraction_loose: fracs[1],
            xb_fraction_tight: fracs[2],
            r_12: rate_sums[0] / n,
            r_21: rate_sums[1] / n,
            r_23: rate_sums[2] / n,
            r_32: rate_sums[3] / n,
            r_31: rate_sums[4] / n,
            r_13: rate_sums[5] / n,
            free_tm: self.c_tn,
            free_ca: self.c_ca,
            bound_tm: self.c_tnca,
        }
    }

    /// Run for `time_steps` timesteps, collecting the default report
    /// after each. Cancellation (cooperative, through `cancel`) and
    /// internal errors return the observations accumulated so far.
    pub fn run(
        &mut self,
        time_steps: usize,
        cancel: Option<&AtomicBool>,
    ) -> (Observations, RunOutcome) {
        let mut observations = Observations::default();
        for _ in 0..time_steps {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return (observations, RunOutcome::Cancelled);
                }
            }
            match self.timestep() {
                Ok(()) => observations.push(&self.report()),
                Err(err) => return (observations, RunOutcome::Failed(err)),
            }
        }
        (observations, RunOutcome::Completed)
    }

    // ## Addressing

    /// Resolve an address to the entity it names.
    pub fn resolve(&self, address: &Address) -> Result<Entity<'_>> {
        let missing = || SarcomereError::UnresolvableAddress(*address);
        match *address {
            Address::ThinFil { fil } => {
                self.thin.get(fil).map(Entity::ThinFil).ok_or_else(missing)
            }
            Address::ThinFace { fil, face } => self
                .thin
                .get(fil)
                .and_then(|f| f.faces.get(face))
                .map(Entity::ThinFace)
                .ok_or_else(missing),
            Address::Bs { fil, site } => self
                .thin
                .get(fil)
                .and_then(|f| f.sites.get(site))
                .map(Entity::Bs)
                .ok_or_else(missing),
            Address::Tm { fil, strand } => self
                .thin
                .get(fil)
                .and_then(|f| f.tm.get(strand))
                .map(Entity::Tm)
                .ok_or_else(missing),
            Address::TmSite { fil, strand, site } => self
                .thin
                .get(fil)
                .and_then(|f| f.tm.get(strand))
                .and_then(|s| s.sites.get(site))
                .map(Entity::TmSite)
                .ok_or_else(missing),
            Address::ThickFil { fil } => {
                self.thick.get(fil).map(Entity::ThickFil).ok_or_else(missing)
            }
            Address::Crown { fil, crown } => {
                let filament = self.thick.get(fil).ok_or_else(missing)?;
                if crown < filament.axial.len() {
                    Ok(Entity::Crown { filament, crown })
                } else {
                    Err(missing())
                }
            }
            Address::ThickFace { fil, face } => self
                .thick
                .get(fil)
                .and_then(|f| f.faces.get(face))
                .map(Entity::ThickFace)
                .ok_or_else(missing),
            Address::Xb { fil, face, xb } => self
                .thick
                .get(fil)
                .and_then(|f| f.faces.get(face))
                .and_then(|f| f.xbs.get(xb))
                .map(Entity::Xb)
                .ok_or_else(missing),
        }
    }

    /// Check the crossbridge ↔ binding-site link invariants: bound state
    /// iff a site is held, sites held by at most one crossbridge, and
    /// mutual back-references.
    pub fn links_are_consistent(&self) -> bool {
        for fil in &self.thick {
            for face in &fil.faces {
                for xb in &face.xbs {
                    if !xb.link_is_consistent() {
                        return false;
                    }
                    if let Some(site) = xb.bound_to {
                        let back = self.thin[site.filament].sites[site.site].bound_to;
                        let expected =
                            XbId { filament: fil.index, face: face.index, index: xb.index };
                        if back != Some(expected) {
                            return false;
                        }
                    }
                }
            }
        }
        for fil in &self.thin {
            for site in &fil.sites {
                if let Some(xb_id) = site.bound_to {
                    let xb = &self.thick[xb_id.filament].faces[xb_id.face].xbs[xb_id.index];
                    let expected = SiteId { filament: fil.index, site: site.index };
                    if xb.bound_to != Some(expected) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn first_entry(trace: &[f64], key: &str) -> Result<f64> {
    trace.first().copied().ok_or_else(|| SarcomereError::TimeDependenceLength {
        key: key.to_string(),
        expected: 1,
        found: 0,
    })
}

fn trace_entry(trace: &[f64], index: usize, key: &str) -> Result<f64> {
    trace.get(index).copied().ok_or_else(|| SarcomereError::TimeDependenceLength {
        key: key.to_string(),
        expected: index + 1,
        found: trace.len(),
    })
}
