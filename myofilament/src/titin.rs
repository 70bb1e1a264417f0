//! Titin: the nonlinear passive spring tethering a thick filament tip to
//! the z-line end of an opposing thin face.
//!
//! The tether is exponential in its extension past slack,
//! `f = a·(exp(b·(span − rest)) − 1)`, which is linear with stiffness
//! `a·b` in the small-extension limit and stiffens under stretch. It
//! contributes axial force only.

use crate::address::{ThickFaceId, ThinFaceId};
use crate::constants::{TITIN_A, TITIN_B, TITIN_REST};
use serde::{Deserialize, Serialize};

/// One titin molecule between a thick face tip and a thin face end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Titin {
    /// Index among the half-sarcomere's 24 titins.
    pub index: usize,
    /// The tethered thick face.
    pub thick_face: ThickFaceId,
    /// The tethered thin face.
    pub thin_face: ThinFaceId,
    /// Exponential prefactor (pN).
    pub a: f64,
    /// Exponential length scale (1/nm).
    pub b: f64,
    /// Slack length (nm).
    pub rest: f64,
}

impl Titin {
    pub fn new(
        index: usize,
        thick_face: ThickFaceId,
        thin_face: ThinFaceId,
        params: Option<(f64, f64)>,
    ) -> Self {
        let (a, b) = params.unwrap_or((TITIN_A, TITIN_B));
        Self { index, thick_face, thin_face, a, b, rest: TITIN_REST }
    }

    /// Tension at the given end-to-end span (pN); positive pulls the
    /// endpoints together.
    pub fn axial_force(&self, span: f64) -> f64 {
        self.a * ((self.b * (span - self.rest)).exp() - 1.0)
    }

    /// Small-extension stiffness, a·b (pN/nm).
    pub fn linear_stiffness(&self) -> f64 {
        self.a * self.b
    }
}
