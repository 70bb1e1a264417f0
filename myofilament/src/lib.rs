//! # Myofilament
//!
//! A spatially explicit, stochastic, mechano-chemical model of a single
//! muscle half-sarcomere: four thick and eight thin filaments on a
//! hexagonal lattice, coupled by titin tethers and a time-varying
//! population of myosin crossbridges.
//!
//! ## Overview
//!
//! The model advances in discrete timesteps under prescribed boundary
//! conditions (half-sarcomere length, lattice spacing, calcium
//! activation) and produces per-timestep observables: axial force on the
//! M-line, crossbridge state fractions, tropomyosin activation
//! statistics, and regulatory transition rates. Three coupled engines do
//! the work:
//!
//! - **Spatial mechanics**: filaments are 1-D chains of axial nodes
//!   connected by linear backbone springs, loaded by attached
//!   crossbridges and titin; a relaxation solver settles residual node
//!   forces below 0.12 pN after every stochastic step.
//! - **Crossbridge kinetics**: each myosin head is a torsional converter
//!   spring in series with a linear globular spring, cycling
//!   Free → Loose → Tight by Monte-Carlo transitions whose rates follow
//!   the spring energies and detailed balance against ATP hydrolysis;
//!   unbound tips diffuse thermally each timestep.
//! - **Thin-filament activation**: every binding site is gated by a
//!   three-state tropomyosin unit (blocked/closed/open) with
//!   calcium-dependent and cooperative transition rates along the
//!   strand.
//!
//! ## Quick start
//!
//! ```rust
//! use myofilament::{HalfSarcomere, SarcomereConfig};
//!
//! # fn main() -> Result<(), myofilament::SarcomereError> {
//! let config = SarcomereConfig {
//!     seed: Some(42),
//!     timestep_len: 0.5,
//!     ..Default::default()
//! };
//! let mut hs = HalfSarcomere::new(config)?;
//!
//! // Advance a few milliseconds and look at the observables.
//! for _ in 0..4 {
//!     hs.timestep()?;
//! }
//! let report = hs.report();
//! let total = report.xb_fraction_free + report.xb_fraction_loose + report.xb_fraction_tight;
//! assert!((total - 1.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Boundary-condition traces
//!
//! ```rust
//! use myofilament::traces;
//!
//! let time = traces::time_trace(0.5, 1000.0);
//! let zline = traces::zline_workloop(1250.0, 25.0, 2.0, &time);
//! assert_eq!(zline.len(), time.len());
//! ```
//!
//! ## Units
//!
//! Forces in pN, lengths in nm, angles in radians, time in ms, energies
//! in pN·nm, concentrations in M (calcium) or counts per liter of
//! lattice fluid (troponin species).
//!
//! ## References
//!
//! - Daniel, Trimble & Chase (1998). Compliant realignment of binding
//!   sites in muscle: transient behavior and mechanical tuning.
//! - Tanner, Daniel & Regnier (2007). Sarcomere lattice geometry
//!   influences cooperative myosin binding in muscle.
//! - Williams, Regnier & Daniel (2010). Axial and radial forces of
//!   cross-bridges depend on lattice spacing.
//! - McKillop & Geeves (1993). Regulation of the interaction between
//!   actin and myosin subfragment 1.
//! - Millman (1998). The filament lattice of striated muscle.

pub mod address;
pub mod config;
pub mod constants;
pub mod crossbridge;
pub mod error;
pub mod head;
pub mod report;
pub mod sarcomere;
pub mod snapshot;
pub mod spring;
pub mod thick;
pub mod thin;
pub mod titin;
pub mod traces;
pub mod tropomyosin;

pub use address::{Address, SiteId, ThickFaceId, ThinFaceId, XbId};
pub use config::{HeadConfig, HeadParams, IsoProfile, SarcomereConfig, TimeDependence};
pub use crossbridge::Crossbridge;
pub use error::{Result, SarcomereError};
pub use head::{Head, HeadState, HeadTransition};
pub use report::{Observations, Report, RunOutcome};
pub use sarcomere::{Entity, HalfSarcomere, N_THICK, N_THIN, N_TITIN};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use spring::{SpringState, TwoStateSpring};
pub use thick::{ThickFace, ThickFilament};
pub use thin::{BindingSite, ThinFace, ThinFilament};
pub use titin::Titin;
pub use tropomyosin::{TmSite, TmState, TmStrand};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
