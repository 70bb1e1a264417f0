//! Cooperative three-state tropomyosin/troponin regulation.
//!
//! Each thin face carries one tropomyosin strand whose sites regulate the
//! face's binding sites one-to-one. A site is Blocked, Closed, or Open;
//! only Open sites are permissive for myosin binding. Calcium binding to
//! troponin moves sites out of the blocked state; the closed ↔ open shift
//! is cooperative along the strand, with a site's rates boosted when a
//! neighbor within the cooperativity span is already open.
//!
//! Rates (per ms):
//!
//! | transition | rate |
//! |---|---|
//! | blocked → closed | `K_12 · [Ca²⁺]` |
//! | closed → blocked | `K_21` |
//! | closed → open | `K_23 · γ` |
//! | open → closed | `K_32 / γ` |
//! | blocked → open | `K_13_FRACTION · r_12` |
//! | open → blocked | `K_31` |
//!
//! with `γ = COOP_FACTOR` when the site is subject to cooperativity and 1
//! otherwise. One uniform draw per site per step selects at most one
//! outgoing transition, walking the cumulative distribution in the
//! canonical order 1→2, 2→1, 2→3, 3→2, 1→3, 3→1.

use crate::address::Address;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Calcium association rate into the closed state (per M per ms).
pub const K_12: f64 = 2.0e4;
/// Calcium dissociation rate back to blocked (per ms).
pub const K_21: f64 = 0.12;
/// Closed → open base rate (per ms).
pub const K_23: f64 = 0.04;
/// Open → closed base rate (per ms).
pub const K_32: f64 = 0.25;
/// Direct blocked → open bypass, as a fraction of r_12.
pub const K_13_FRACTION: f64 = 0.01;
/// Direct open → blocked rate (per ms).
pub const K_31: f64 = 0.02;
/// Rate multiplier for sites under cooperativity.
pub const COOP_FACTOR: f64 = 5.0;
/// Cooperativity span: strand neighbors within this distance count.
pub const COOP_SPAN: usize = 2;

/// Regulatory state of a tropomyosin site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TmState {
    /// Myosin binding blocked by tropomyosin.
    Blocked,
    /// Calcium bound, tropomyosin still covering the site.
    Closed,
    /// Tropomyosin shifted, site available for binding.
    Open,
}

impl TmState {
    /// Numeric state: 0, 1, or 2.
    pub fn index(self) -> usize {
        match self {
            TmState::Blocked => 0,
            TmState::Closed => 1,
            TmState::Open => 2,
        }
    }
}

/// The six per-ms rates of a site, cached from the last rate evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TmRates {
    pub r_12: f64,
    pub r_21: f64,
    pub r_23: f64,
    pub r_32: f64,
    pub r_31: f64,
    pub r_13: f64,
}

/// One tropomyosin regulatory unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmSite {
    /// Index along the strand.
    pub index: usize,
    /// Address of this site.
    pub address: Address,
    /// Regulatory state.
    pub state: TmState,
    /// Set when a strand neighbor within [`COOP_SPAN`] is open.
    pub subject_to_cooperativity: bool,
    /// Rates from the last evaluation, for reporting.
    pub rates: TmRates,
}

impl TmSite {
    pub fn new(index: usize, address: Address) -> Self {
        Self {
            index,
            address,
            state: TmState::Blocked,
            subject_to_cooperativity: false,
            rates: TmRates::default(),
        }
    }

    /// Binding permissiveness seen by myosin: 1 when open, else 0.
    pub fn permissiveness(&self) -> f64 {
        if self.state == TmState::Open {
            1.0
        } else {
            0.0
        }
    }

    /// Evaluate and cache the six rates at the given free calcium
    /// concentration (M).
    pub fn compute_rates(&mut self, c_ca: f64) -> TmRates {
        let gamma = if self.subject_to_cooperativity { COOP_FACTOR } else { 1.0 };
        let r_12 = K_12 * c_ca;
        self.rates = TmRates {
            r_12,
            r_21: K_21,
            r_23: K_23 * gamma,
            r_32: K_32 / gamma,
            r_31: K_31,
            r_13: K_13_FRACTION * r_12,
        };
        self.rates
    }

    /// Attempt one transition with a single uniform draw, walking the
    /// outgoing cumulative distribution in canonical order.
    pub fn transition<R: Rng + ?Sized>(&mut self, c_ca: f64, dt: f64, rng: &mut R) {
        let rates = self.compute_rates(c_ca);
        let prob = |rate: f64| 1.0 - (-rate * dt).exp();
        let check: f64 = rng.gen();
        match self.state {
            TmState::Blocked => {
                // Canonical order puts 1→2 before 1→3.
                let p_12 = prob(rates.r_12);
                let p_13 = prob(rates.r_13);
                if check < p_12 {
                    self.state = TmState::Closed;
                } else if check < p_12 + p_13 {
                    self.state = TmState::Open;
                }
            }
            TmState::Closed => {
                let p_21 = prob(rates.r_21);
                let p_23 = prob(rates.r_23);
                if check < p_21 {
                    self.state = TmState::Blocked;
                } else if check < p_21 + p_23 {
                    self.state = TmState::Open;
                }
            }
            TmState::Open => {
                let p_32 = prob(rates.r_32);
                let p_31 = prob(rates.r_31);
                if check < p_32 {
                    self.state = TmState::Closed;
                } else if check < p_32 + p_31 {
                    self.state = TmState::Blocked;
                }
            }
        }
    }
}

/// A tropomyosin strand: the chain of regulatory units along one thin
/// face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmStrand {
    /// Strand index on the parent filament (one per face).
    pub index: usize,
    /// Address of this strand.
    pub address: Address,
    /// Regulatory units, ordered along the face.
    pub sites: Vec<TmSite>,
}

impl TmStrand {
    pub fn new(filament: usize, index: usize, n_sites: usize) -> Self {
        let address = Address::Tm { fil: filament, strand: index };
        let sites = (0..n_sites)
            .map(|site| {
                TmSite::new(site, Address::TmSite { fil: filament, strand: index, site })
            })
            .collect();
        Self { index, address, sites }
    }

    /// Re-scan the strand and flag sites with an open neighbor within
    /// [`COOP_SPAN`].
    pub fn update_cooperativity(&mut self) {
        let n = self.sites.len();
        for i in 0..n {
            let lo = i.saturating_sub(COOP_SPAN);
            let hi = (i + COOP_SPAN).min(n - 1);
            let coop = (lo..=hi)
                .any(|j| j != i && self.sites[j].state == TmState::Open);
            self.sites[i].subject_to_cooperativity = coop;
        }
    }

    /// One regulatory cycle: refresh cooperativity, then let every site
    /// attempt a transition. Returns (open sites, total sites).
    pub fn transition<R: Rng + ?Sized>(
        &mut self,
        c_ca: f64,
        dt: f64,
        rng: &mut R,
    ) -> (usize, usize) {
        self.update_cooperativity();
        for site in &mut self.sites {
            site.transition(c_ca, dt, rng);
        }
        let open = self.sites.iter().filter(|s| s.state == TmState::Open).count();
        (open, self.sites.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strand() -> TmStrand {
        TmStrand::new(0, 0, 30)
    }

    #[test]
    fn rates_scale_with_calcium() {
        let mut site = TmSite::new(0, Address::TmSite { fil: 0, strand: 0, site: 0 });
        let high = site.compute_rates(1e-4); // pCa 4
        let low = site.compute_rates(1e-9); // pCa 9
        assert_relative_eq!(high.r_12, K_12 * 1e-4);
        assert!(low.r_12 < high.r_12 * 1e-4);
        // Dissociation is calcium independent.
        assert_relative_eq!(high.r_21, low.r_21);
    }

    #[test]
    fn cooperativity_boosts_the_open_shift() {
        let mut site = TmSite::new(0, Address::TmSite { fil: 0, strand: 0, site: 0 });
        let solo = site.compute_rates(1e-4);
        site.subject_to_cooperativity = true;
        let coop = site.compute_rates(1e-4);
        assert_relative_eq!(coop.r_23, solo.r_23 * COOP_FACTOR);
        assert_relative_eq!(coop.r_32, solo.r_32 / COOP_FACTOR);
    }

    #[test]
    fn cooperativity_scan_respects_the_span() {
        let mut strand = strand();
        strand.sites[10].state = TmState::Open;
        strand.update_cooperativity();
        for (i, site) in strand.sites.iter().enumerate() {
            let near = i != 10 && (i as isize - 10).unsigned_abs() <= COOP_SPAN;
            assert_eq!(site.subject_to_cooperativity, near, "site {i}");
        }
        // An open site is not its own neighbor.
        assert!(!strand.sites[10].subject_to_cooperativity);
    }

    #[test]
    fn saturating_calcium_activates_the_strand() {
        let mut strand = strand();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..4000 {
            strand.transition(1e-4, 0.5, &mut rng);
        }
        let blocked = strand.sites.iter().filter(|s| s.state == TmState::Blocked).count();
        let (open, total) = {
            let open = strand.sites.iter().filter(|s| s.state == TmState::Open).count();
            (open, strand.sites.len())
        };
        // At pCa 4 nearly nothing stays blocked and the cooperative
        // equilibrium keeps a majority of sites open.
        assert!(blocked < total / 10, "blocked: {blocked}/{total}");
        assert!(open > total / 3, "open: {open}/{total}");
    }

    #[test]
    fn vanishing_calcium_keeps_the_strand_blocked() {
        let mut strand = strand();
        let mut rng = StdRng::seed_from_u64(43);
        for _ in 0..2000 {
            strand.transition(1e-14, 0.5, &mut rng);
        }
        let open = strand.sites.iter().filter(|s| s.state == TmState::Open).count();
        assert_eq!(open, 0);
        let blocked = strand.sites.iter().filter(|s| s.state == TmState::Blocked).count();
        assert!(blocked >= strand.sites.len() - 1);
    }

    #[test]
    fn rates_are_cached_for_reporting() {
        let mut strand = strand();
        let mut rng = StdRng::seed_from_u64(44);
        strand.transition(1e-4, 0.5, &mut rng);
        for site in &strand.sites {
            assert!(site.rates.r_12 > 0.0);
        }
    }
}
