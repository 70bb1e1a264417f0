//! Physical constants and filament geometry for the half-sarcomere model.
//!
//! Mechanical quantities are expressed in pN and nm, angles in radians,
//! time in ms, energies in pN·nm (numerically equal to kT units after
//! dividing by [`KT`]).

/// Thermal energy kT at 288 K, in pN·nm.
///
/// 1.381e-23 J/K · 288 K, converted with 1e21 pN·nm per J.
pub const KT: f64 = 1.381e-23 * 288.0 * 1e21;

/// ATP hydrolysis free energy in RT units.
pub const G_ATP: f64 = 13.0;
/// ATP concentration (M).
pub const CONC_ATP: f64 = 5e-3;
/// ADP concentration (M).
pub const CONC_ADP: f64 = 30e-6;
/// Inorganic phosphate concentration (M).
pub const CONC_PI: f64 = 3e-3;

/// Fraction of the hydrolysis energy released entering the loose state.
pub const ALPHA: f64 = 0.28;
/// Fraction of the hydrolysis energy released entering the tight state.
pub const ETA: f64 = 0.68;

/// Magnitude of the ATP hydrolysis free energy at cellular
/// concentrations, |−g_atp − ln([ATP]/([ADP][Pi]))|, in kT.
pub fn hydrolysis_free_energy() -> f64 {
    (-G_ATP - (CONC_ATP / (CONC_ADP * CONC_PI)).ln()).abs()
}

// Myosin head spring defaults. The converter domain is torsional
// (radians, pN·nm/rad²), the globular domain linear (nm, pN/nm).
/// Converter rest angle, weak states (degrees; see [`Head`](crate::head)).
pub const CONVERTER_REST_WEAK_DEG: f64 = 47.16;
/// Converter rest angle, tight state (degrees).
pub const CONVERTER_REST_STRONG_DEG: f64 = 73.20;
/// Converter torsional stiffness (pN·nm/rad²), both states.
pub const CONVERTER_STIFFNESS: f64 = 40.0;
/// Globular rest length, weak states (nm).
pub const GLOBULAR_REST_WEAK: f64 = 19.93;
/// Globular rest length, tight state (nm).
pub const GLOBULAR_REST_STRONG: f64 = 16.47;
/// Globular stiffness (pN/nm), both states.
pub const GLOBULAR_STIFFNESS: f64 = 2.0;

// Thick filament geometry.
/// Crowns per thick filament.
pub const THICK_CROWNS: usize = 60;
/// Myosin heads per crown.
pub const HEADS_PER_CROWN: usize = 3;
/// Faces per thick filament.
pub const THICK_FACES: usize = 6;
/// Axial distance between adjacent crowns (nm).
pub const CROWN_SPACING: f64 = 14.3;
/// Length of the thick filament before the first crown (nm).
pub const THICK_BARE_ZONE: f64 = 58.0;
/// Thick filament backbone stiffness between crowns (pN/nm).
pub const THICK_K: f64 = 2020.0;

// Thin filament geometry.
/// Binding sites per thin filament.
pub const THIN_SITES: usize = 90;
/// Faces per thin filament.
pub const THIN_FACES: usize = 3;
/// Axial repeat of binding sites along one face (nm).
pub const THIN_SITE_SPACING: f64 = 37.3;
/// Axial distance between consecutive sites along the filament (nm).
pub const THIN_NODE_SPACING: f64 = THIN_SITE_SPACING / THIN_FACES as f64;
/// Thin filament backbone stiffness between sites (pN/nm).
pub const THIN_K: f64 = 1743.0;
/// Number of distinct thin polymer start offsets.
pub const THIN_START_STEPS: u32 = 25;

// Lattice geometry.
/// Actin filament diameter (nm).
pub const ACTIN_DIA: f64 = 9.0;
/// Myosin filament diameter (nm).
pub const MYOSIN_DIA: f64 = 16.0;
/// Mean filament radius, 0.5·(dia_actin + dia_myosin) (nm); converts
/// face-to-face spacing to center-to-center distance.
pub const LATTICE_BETA: f64 = 0.5 * (ACTIN_DIA + MYOSIN_DIA);

/// Default face-to-face lattice spacing (nm).
pub const DEFAULT_LATTICE_SPACING: f64 = 14.0;
/// Default z-line position, i.e. half-sarcomere length (nm).
pub const DEFAULT_Z_LINE: f64 = 1250.0;
/// Default pCa.
pub const DEFAULT_PCA: f64 = 4.0;

// Fluid volume bookkeeping (single-filament rod volumes over π).
/// Thin filament rod volume / π: 4.5² nm² radius · 1119 nm length.
pub const THIN_ROD_VOLUME: f64 = 22659.75;
/// Thick filament rod volume / π: 8² nm² radius · 916 nm length.
pub const THICK_ROD_VOLUME: f64 = 58624.0;
/// Thin rods counted against the unit-cell volume.
pub const THIN_RODS: f64 = 10.0;
/// Thick rods counted against the unit-cell volume.
pub const THICK_RODS: f64 = 4.0;
/// Liters per cubic nanometer.
pub const LITERS_PER_NM3: f64 = 1e-24;

// Titin defaults.
/// Titin exponential prefactor (pN).
pub const TITIN_A: f64 = 0.4;
/// Titin exponential length scale (1/nm).
pub const TITIN_B: f64 = 0.015;
/// Titin slack length (nm).
pub const TITIN_REST: f64 = 250.0;

// Relaxation solver.
/// Per-pass relaxation factor used by the settle loop.
pub const RELAX_FACTOR: f64 = 0.95;
/// Residual force threshold for convergence (pN). 95% of thermal forcing
/// events deform the lattice by more than this.
pub const CONVERGE_LIMIT: f64 = 0.12;
/// Hard cap on settle passes before reporting non-convergence.
pub const SETTLE_MAX_PASSES: usize = 5000;
