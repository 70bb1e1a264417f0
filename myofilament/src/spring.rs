//! Two-state linear spring, the mechanical primitive of the myosin head.
//!
//! A spring has a weak-state and a strong-state rest value and stiffness.
//! The weak state covers the Free and Loose kinetic states of the head,
//! the strong state covers Tight. Unbound heads diffuse thermally: free
//! values are drawn from a normal distribution around the weak rest value
//! with standard deviation `sqrt(kT / k_weak)`.

use crate::constants::KT;
use crate::error::{Result, SarcomereError};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Mechanical state selector for a two-state spring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpringState {
    /// Rest value and stiffness of the unbound/loosely-bound head.
    Weak,
    /// Rest value and stiffness of the tightly-bound head.
    Strong,
}

/// A linear spring with distinct weak and strong parameterizations.
///
/// Values are lengths (nm) for the globular domain and angles (radians)
/// for the converter domain; the math is identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoStateSpring {
    /// Rest value in the weak state.
    pub rest_weak: f64,
    /// Rest value in the strong state.
    pub rest_strong: f64,
    /// Stiffness in the weak state.
    pub k_weak: f64,
    /// Stiffness in the strong state.
    pub k_strong: f64,
    /// Thermal standard deviation of the free value, sqrt(kT / k_weak).
    sigma: f64,
}

impl TwoStateSpring {
    /// Create a spring, validating that both stiffnesses are positive
    /// and finite.
    pub fn new(rest_weak: f64, rest_strong: f64, k_weak: f64, k_strong: f64) -> Result<Self> {
        for (name, k) in [("k_weak", k_weak), ("k_strong", k_strong)] {
            if !(k > 0.0) || !k.is_finite() {
                return Err(SarcomereError::InvalidParameter {
                    parameter: name.to_string(),
                    value: k,
                    reason: "stiffness must be positive and finite".to_string(),
                });
            }
        }
        Ok(Self {
            rest_weak,
            rest_strong,
            k_weak,
            k_strong,
            sigma: (KT / k_weak).sqrt(),
        })
    }

    /// Rest value in the given state.
    pub fn rest(&self, state: SpringState) -> f64 {
        match state {
            SpringState::Weak => self.rest_weak,
            SpringState::Strong => self.rest_strong,
        }
    }

    /// Stiffness in the given state.
    pub fn stiffness(&self, state: SpringState) -> f64 {
        match state {
            SpringState::Weak => self.k_weak,
            SpringState::Strong => self.k_strong,
        }
    }

    /// Stored energy at `value` in the given state, 0.5·k·(value − rest)².
    pub fn energy(&self, value: f64, state: SpringState) -> f64 {
        let d = value - self.rest(state);
        0.5 * self.stiffness(state) * d * d
    }

    /// Thermal standard deviation of the free value.
    pub fn thermal_sigma(&self) -> f64 {
        self.sigma
    }

    /// Sample a free (unbound) value from Normal(rest_weak, sigma).
    pub fn sample_free<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        self.rest_weak + self.sigma * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn globular() -> TwoStateSpring {
        TwoStateSpring::new(19.93, 16.47, 2.0, 2.0).unwrap()
    }

    #[test]
    fn rejects_bad_stiffness() {
        assert!(TwoStateSpring::new(1.0, 1.0, 0.0, 1.0).is_err());
        assert!(TwoStateSpring::new(1.0, 1.0, 1.0, -2.0).is_err());
        assert!(TwoStateSpring::new(1.0, 1.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn state_selection() {
        let s = globular();
        assert_relative_eq!(s.rest(SpringState::Weak), 19.93);
        assert_relative_eq!(s.rest(SpringState::Strong), 16.47);
        assert_relative_eq!(s.stiffness(SpringState::Weak), 2.0);
    }

    #[test]
    fn energy_is_quadratic_about_rest() {
        let s = globular();
        assert_relative_eq!(s.energy(19.93, SpringState::Weak), 0.0);
        assert_relative_eq!(s.energy(21.93, SpringState::Weak), 0.5 * 2.0 * 4.0);
        assert_relative_eq!(s.energy(16.47, SpringState::Strong), 0.0);
    }

    #[test]
    fn thermal_sigma_matches_equipartition() {
        let s = globular();
        assert_relative_eq!(s.thermal_sigma(), (KT / 2.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn free_samples_center_on_weak_rest() {
        let s = globular();
        let mut rng = StdRng::seed_from_u64(7);
        let n = 4000;
        let mean: f64 = (0..n).map(|_| s.sample_free(&mut rng)).sum::<f64>() / n as f64;
        // Standard error is sigma/sqrt(n) ≈ 0.022; allow 5 of them.
        assert_relative_eq!(mean, 19.93, epsilon = 0.12);
    }
}
