//! A single myosin head: two springs in series with three-state kinetics.
//!
//! The head is a torsional converter spring (angle θ) in series with a
//! linear globular spring (length g), producing a tip at
//! `(x, y) = (g·cosθ, g·sinθ)` relative to the crown. Kinetics cycle
//! through Free → Loose → Tight with rates set by the spring energies and
//! the geometry of the nearest actin site; reverse rates follow detailed
//! balance against the ATP hydrolysis free energy.
//!
//! Rates are per ms; an event fires during a timestep of length `dt` with
//! probability `1 − exp(−rate·dt)` (Poisson process, at-least-one-event).
//!
//! References: Tanner, Daniel & Regnier 2007 (rate structure); Williams,
//! Regnier & Daniel 2010 (two-spring lattice geometry); Pate & Cooke 1989
//! (free-energy partitioning).

use crate::config::HeadParams;
use crate::constants::{
    ALPHA, CONVERTER_REST_STRONG_DEG, CONVERTER_REST_WEAK_DEG, CONVERTER_STIFFNESS, ETA,
    GLOBULAR_REST_STRONG, GLOBULAR_REST_WEAK, GLOBULAR_STIFFNESS,
};
use crate::constants::hydrolysis_free_energy;
use crate::error::Result;
use crate::spring::{SpringState, TwoStateSpring};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kinetic state of a myosin head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadState {
    /// Unbound, ATP hydrolyzed, tip diffusing.
    Free,
    /// Weakly bound to an actin site.
    Loose,
    /// Strongly bound, post power stroke.
    Tight,
}

impl HeadState {
    /// Numeric state: 0, 1, or 2.
    pub fn index(self) -> usize {
        match self {
            HeadState::Free => 0,
            HeadState::Loose => 1,
            HeadState::Tight => 2,
        }
    }

    /// Spring parameterization used in this state.
    pub fn spring_state(self) -> SpringState {
        match self {
            HeadState::Free | HeadState::Loose => SpringState::Weak,
            HeadState::Tight => SpringState::Strong,
        }
    }

    /// True once the head holds an actin site.
    pub fn is_bound(self) -> bool {
        !matches!(self, HeadState::Free)
    }
}

/// A state change produced by one transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadTransition {
    /// Free → Loose (1→2): attachment to an actin site.
    Bind,
    /// Loose → Free (2→1): detachment before the power stroke.
    Unbind,
    /// Loose → Tight (2→3): the power stroke.
    Stroke,
    /// Tight → Loose (3→2): reversal of the power stroke.
    ReverseStroke,
    /// Tight → Free (3→1): ADP release and ATP-driven detachment.
    Release,
}

/// Per-timestep cache of the diffused unbound tip position.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TipCache {
    x: f64,
    y: f64,
    timestep: usize,
}

/// A myosin head: converter + globular springs plus kinetic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Head {
    /// Kinetic state.
    pub state: HeadState,
    /// Torsional converter spring (radians).
    pub converter: TwoStateSpring,
    /// Linear globular spring (nm).
    pub globular: TwoStateSpring,
    /// Loose-state free-energy offset, α·(−ΔG) (kT).
    alpha_dg: f64,
    /// Tight-state free-energy offset, η·(−ΔG) (kT).
    eta_dg: f64,
    /// Binding rate modifier.
    binding_mod: f64,
    /// Detachment rate modifier.
    detach_mod: f64,
    /// Cached diffused tip, valid for one timestep index.
    #[serde(skip)]
    tip: Option<TipCache>,
}

impl Head {
    /// Build a head from parameter overrides; unset fields take the
    /// standard converter/globular values.
    pub fn from_params(params: &HeadParams) -> Result<Self> {
        let converter = TwoStateSpring::new(
            params.c_rw.unwrap_or_else(|| CONVERTER_REST_WEAK_DEG.to_radians()),
            params.c_rs.unwrap_or_else(|| CONVERTER_REST_STRONG_DEG.to_radians()),
            params.c_kw.unwrap_or(CONVERTER_STIFFNESS),
            params.c_ks.unwrap_or(CONVERTER_STIFFNESS),
        )?;
        let globular = TwoStateSpring::new(
            params.g_rw.unwrap_or(GLOBULAR_REST_WEAK),
            params.g_rs.unwrap_or(GLOBULAR_REST_STRONG),
            params.g_kw.unwrap_or(GLOBULAR_STIFFNESS),
            params.g_ks.unwrap_or(GLOBULAR_STIFFNESS),
        )?;
        let dg = hydrolysis_free_energy();
        Ok(Self {
            state: HeadState::Free,
            converter,
            globular,
            alpha_dg: ALPHA * -dg,
            eta_dg: ETA * -dg,
            binding_mod: params.br.unwrap_or(1.0),
            detach_mod: params.dr.unwrap_or(1.0),
            tip: None,
        })
    }

    /// Head with the standard parameterization.
    pub fn standard() -> Self {
        // The default springs have positive stiffness, so this cannot fail.
        Self::from_params(&HeadParams::default()).expect("default head parameters are valid")
    }

    /// Decompose a tip location into converter angle and globular length.
    pub fn seg_values(tip_location: (f64, f64)) -> (f64, f64) {
        let (x, y) = tip_location;
        (y.atan2(x), x.hypot(y))
    }

    /// Axial force at a tip location in the current state (pN).
    ///
    /// `f_x = k_g·(g − g_s)·cosθ + (1/g)·k_c·(θ − θ_s)·sinθ`
    pub fn axial_force(&self, tip_location: (f64, f64)) -> f64 {
        let (c_ang, g_len) = Self::seg_values(tip_location);
        let s = self.state.spring_state();
        let c_s = self.converter.rest(s);
        let g_s = self.globular.rest(s);
        let c_k = self.converter.stiffness(s);
        let g_k = self.globular.stiffness(s);
        g_k * (g_len - g_s) * c_ang.cos() + 1.0 / g_len * c_k * (c_ang - c_s) * c_ang.sin()
    }

    /// Radial force at a tip location in the current state (pN).
    ///
    /// `f_y = k_g·(g − g_s)·sinθ + (1/g)·k_c·(θ − θ_s)·cosθ`
    pub fn radial_force(&self, tip_location: (f64, f64)) -> f64 {
        let (c_ang, g_len) = Self::seg_values(tip_location);
        let s = self.state.spring_state();
        let c_s = self.converter.rest(s);
        let g_s = self.globular.rest(s);
        let c_k = self.converter.stiffness(s);
        let g_k = self.globular.stiffness(s);
        g_k * (g_len - g_s) * c_ang.sin() + 1.0 / g_len * c_k * (c_ang - c_s) * c_ang.cos()
    }

    /// Stored spring energy at a tip location in the given state (pN·nm).
    pub fn energy(&self, tip_location: (f64, f64), state: HeadState) -> f64 {
        let (ang, dist) = Self::seg_values(tip_location);
        let s = state.spring_state();
        self.converter.energy(ang, s) + self.globular.energy(dist, s)
    }

    /// Free energy at a tip location: 0 when Free, offset plus spring
    /// energy otherwise.
    pub fn free_energy(&self, tip_location: (f64, f64), state: HeadState) -> f64 {
        match state {
            HeadState::Free => 0.0,
            HeadState::Loose => self.alpha_dg + self.energy(tip_location, state),
            HeadState::Tight => self.eta_dg + self.energy(tip_location, state),
        }
    }

    /// Probability that a Poisson event at `rate` (per ms) fires at least
    /// once during a timestep of `dt` ms.
    pub fn prob(rate: f64, dt: f64) -> f64 {
        1.0 - (-rate * dt).exp()
    }

    /// Binding rate toward a site at `bs`, given the diffused tip:
    /// `br·72·exp(−dist²)`.
    pub fn bind_rate(&self, bs: (f64, f64), tip: (f64, f64)) -> f64 {
        let distance = (bs.0 - tip.0).hypot(bs.1 - tip.1);
        self.binding_mod * 72.0 * (-distance * distance).exp()
    }

    /// Loose → Free rate by detailed balance against the binding rate.
    pub fn rate_r21(&self, bs: (f64, f64), tip: (f64, f64)) -> f64 {
        let g_free = self.free_energy(bs, HeadState::Free);
        let g_loose = self.free_energy(bs, HeadState::Loose);
        let denom = (g_free - g_loose).exp();
        if denom == 0.0 {
            1.0
        } else {
            self.bind_rate(bs, tip) / denom
        }
    }

    /// Loose → Tight power-stroke rate,
    /// `0.6·(1 + tanh(6 + 0.2·(E_loose − E_tight)))`.
    pub fn rate_r23(&self, bs: (f64, f64)) -> f64 {
        let loose = self.energy(bs, HeadState::Loose);
        let tight = self.energy(bs, HeadState::Tight);
        0.6 * (1.0 + (6.0 + 0.2 * (loose - tight)).tanh())
    }

    /// Tight → Loose rate by detailed balance against the power stroke.
    pub fn rate_r32(&self, bs: (f64, f64)) -> f64 {
        let g_loose = self.free_energy(bs, HeadState::Loose);
        let g_tight = self.free_energy(bs, HeadState::Tight);
        let denom = (g_loose - g_tight).exp();
        if denom == 0.0 {
            1.0
        } else {
            self.rate_r23(bs) / denom
        }
    }

    /// Tight → Free detachment rate, `dr·(sqrt(0.01·E_tight) + 0.02)`.
    /// A negative square-root argument yields rate 0.
    pub fn rate_r31(&self, bs: (f64, f64)) -> f64 {
        let arg = 0.01 * self.energy(bs, HeadState::Tight);
        if arg < 0.0 {
            0.0
        } else {
            self.detach_mod * (arg.sqrt() + 0.02)
        }
    }

    /// Diffused unbound tip location, resampled once per timestep.
    ///
    /// Samples (θ, g) from the weak-state thermal distributions until the
    /// tip lands strictly between the thick filament surface and the thin
    /// filament, `0 < y ≤ lattice_spacing`.
    pub fn unbound_tip<R: Rng + ?Sized>(
        &mut self,
        lattice_spacing: f64,
        timestep: usize,
        rng: &mut R,
    ) -> (f64, f64) {
        if let Some(cache) = self.tip {
            if cache.timestep == timestep {
                return (cache.x, cache.y);
            }
        }
        loop {
            let c_ang = self.converter.sample_free(rng);
            let g_len = self.globular.sample_free(rng);
            let tip = (g_len * c_ang.cos(), g_len * c_ang.sin());
            if tip.1 > 0.0 && tip.1 <= lattice_spacing {
                self.tip = Some(TipCache { x: tip.0, y: tip.1, timestep });
                return tip;
            }
        }
    }

    /// Attempt one kinetic transition against a site at `bs` (axial
    /// separation, lattice spacing) with permissiveness `ap`.
    ///
    /// A single uniform draw is checked against the branch cascade; the
    /// first matching branch wins. `ap` scales only the binding branch.
    pub fn transition<R: Rng + ?Sized>(
        &mut self,
        bs: (f64, f64),
        ap: f64,
        lattice_spacing: f64,
        timestep: usize,
        dt: f64,
        rng: &mut R,
    ) -> Option<HeadTransition> {
        let check: f64 = rng.gen();
        match self.state {
            // Unbound heads cannot reach Tight directly: the hydrolysis
            // products must be released through the loose state.
            HeadState::Free => {
                let tip = self.unbound_tip(lattice_spacing, timestep, rng);
                if Self::prob(self.bind_rate(bs, tip), dt) * ap > check {
                    self.state = HeadState::Loose;
                    return Some(HeadTransition::Bind);
                }
                None
            }
            HeadState::Loose => {
                if Self::prob(self.rate_r23(bs), dt) > check {
                    self.state = HeadState::Tight;
                    return Some(HeadTransition::Stroke);
                }
                let tip = self.unbound_tip(lattice_spacing, timestep, rng);
                if (1.0 - Self::prob(self.rate_r21(bs, tip), dt)) < check {
                    self.state = HeadState::Free;
                    return Some(HeadTransition::Unbind);
                }
                None
            }
            HeadState::Tight => {
                if Self::prob(self.rate_r31(bs), dt) > check {
                    self.state = HeadState::Free;
                    return Some(HeadTransition::Release);
                }
                if (1.0 - Self::prob(self.rate_r32(bs), dt)) < check {
                    self.state = HeadState::Loose;
                    return Some(HeadTransition::ReverseStroke);
                }
                None
            }
        }
    }
}
