//! A crossbridge: a myosin head in the context of its thick face.
//!
//! The crossbridge knows its index along the parent face, the thin face
//! it squares off against, and (while bound) the binding site it holds.
//! Cross-structure links are id-based; the half-sarcomere resolves them.

use crate::address::{Address, SiteId, ThinFaceId};
use crate::head::{Head, HeadState};
use serde::{Deserialize, Serialize};

/// A myosin head bound to a position on a thick face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossbridge {
    /// Index along the parent thick face.
    pub index: usize,
    /// Address of this crossbridge.
    pub address: Address,
    /// The opposing thin face.
    pub thin_face: ThinFaceId,
    /// The held binding site, when Loose or Tight.
    pub bound_to: Option<SiteId>,
    /// The mechanical/kinetic head.
    pub head: Head,
}

impl Crossbridge {
    pub fn new(index: usize, address: Address, thin_face: ThinFaceId, head: Head) -> Self {
        Self { index, address, thin_face, bound_to: None, head }
    }

    /// Kinetic state of the head.
    pub fn state(&self) -> HeadState {
        self.head.state
    }

    /// True when a binding site is held.
    pub fn is_bound(&self) -> bool {
        self.bound_to.is_some()
    }

    /// The bound ⇔ {Loose, Tight} invariant.
    pub fn link_is_consistent(&self) -> bool {
        self.bound_to.is_some() == self.head.state.is_bound()
    }

    /// Axial force on the crown (pN); zero when unbound.
    ///
    /// `site_axial − crown_axial` is the axial separation, the lattice
    /// spacing the radial one.
    pub fn axial_force(&self, crown_axial: f64, site_axial: f64, lattice_spacing: f64) -> f64 {
        if self.bound_to.is_none() {
            return 0.0;
        }
        self.head.axial_force((site_axial - crown_axial, lattice_spacing))
    }

    /// Radial force (pN); zero when unbound.
    pub fn radial_force(&self, crown_axial: f64, site_axial: f64, lattice_spacing: f64) -> f64 {
        if self.bound_to.is_none() {
            return 0.0;
        }
        self.head.radial_force((site_axial - crown_axial, lattice_spacing))
    }
}
