//! End-to-end protocol scenarios: isometric activation, passive stretch,
//! force-velocity shortening, workloop activation, and snapshot
//! continuation. All runs are seeded and use pinned polymer starts.

use myofilament::traces;
use myofilament::{HalfSarcomere, SarcomereConfig, TimeDependence, N_THICK, N_THIN};

fn base_config(seed: u64) -> SarcomereConfig {
    SarcomereConfig {
        seed: Some(seed),
        starts: Some((vec![0; N_THIN], vec![1; N_THICK])),
        timestep_len: 0.5,
        ..Default::default()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Titin-only reference: a run at vanishing calcium.
fn passive_reference(seed: u64, steps: usize) -> Vec<f64> {
    let config = SarcomereConfig { p_ca: Some(12.0), ..base_config(seed) };
    let mut hs = HalfSarcomere::new(config).unwrap();
    let (obs, outcome) = hs.run(steps, None);
    assert!(outcome.is_completed());
    obs.axial_force
}

#[test]
fn scenario_isometric_saturating_calcium() {
    let config = SarcomereConfig { p_ca: Some(4.0), ..base_config(2024) };
    let mut hs = HalfSarcomere::new(config).unwrap();
    let (obs, outcome) = hs.run(999, None);
    assert!(outcome.is_completed());
    assert_eq!(obs.len(), 999);
    assert!(hs.links_are_consistent());

    // After the first 20 ms the force trace stays non-negative.
    let settled = &obs.axial_force[40..];
    let min_force = settled.iter().cloned().fold(f64::INFINITY, f64::min);
    assert!(min_force > -1.0, "force dipped to {min_force} pN");

    // Active force clearly exceeds the passive (titin-only) level.
    let passive = passive_reference(2024, 200);
    let passive_tail = &passive[100..];
    let threshold = mean(passive_tail) + std_dev(passive_tail).max(1.0);
    let active = mean(&obs.axial_force[200..]);
    assert!(
        active > threshold,
        "active force {active} pN not above passive {threshold} pN"
    );

    // A persistent tightly-bound population develops.
    let tight_tail = mean(&obs.xb_fraction_tight[799..]);
    assert!(tight_tail > 0.04, "tight fraction {tight_tail}");
    let free_tail = mean(&obs.xb_fraction_free[799..]);
    assert!(free_tail < 0.95, "free fraction stayed at {free_tail}");

    // State fractions always partition the population.
    for i in 0..obs.len() {
        let total =
            obs.xb_fraction_free[i] + obs.xb_fraction_loose[i] + obs.xb_fraction_tight[i];
        assert!((total - 1.0).abs() < 1e-12);
    }
}

#[test]
fn scenario_passive_stretch() {
    let time = traces::time_trace(0.5, 500.0);
    let n = time.len();
    // Ramp the z-line 1250 → 1350 nm across the run.
    let zline: Vec<f64> =
        (0..n).map(|i| 1250.0 + 100.0 * i as f64 / (n - 1) as f64).collect();
    let td = TimeDependence { z_line: Some(zline), ..Default::default() };
    let config = SarcomereConfig {
        p_ca: Some(9.0),
        time_dependence: Some(td),
        ..base_config(7)
    };
    let mut hs = HalfSarcomere::new(config).unwrap();
    let (obs, outcome) = hs.run(n - 1, None);
    assert!(outcome.is_completed());

    // Essentially no crossbridges cycle at pCa 9.
    for &free in &obs.xb_fraction_free {
        assert!(free >= 0.99, "free fraction fell to {free}");
    }

    // Titin loading grows monotonically with stretch, within the
    // relaxation noise band.
    let windows: Vec<f64> = obs.axial_force.chunks(50).map(mean).collect();
    for pair in windows.windows(2) {
        assert!(
            pair[1] >= pair[0] - 1.5,
            "passive force fell from {} to {}",
            pair[0],
            pair[1]
        );
    }
    let first = obs.axial_force[0];
    let last = *obs.axial_force.last().unwrap();
    assert!(last > first + 50.0, "stretch only raised force {first} → {last}");
}

#[test]
fn scenario_force_velocity() {
    let time = traces::time_trace(0.5, 500.0);
    let zline = traces::zline_forcevelocity(1250.0, 100.0, 1.0, &time);
    assert_eq!(zline.len(), time.len());
    // Isometric hold, then constant-velocity shortening.
    assert!(zline[..200].iter().all(|&z| z == 1250.0));
    assert!(zline[250] < 1250.0);

    let td = TimeDependence { z_line: Some(zline), ..Default::default() };
    let config = SarcomereConfig {
        p_ca: Some(4.0),
        time_dependence: Some(td),
        ..base_config(11)
    };
    let mut hs = HalfSarcomere::new(config).unwrap();
    let (obs, outcome) = hs.run(time.len() - 1, None);
    assert!(outcome.is_completed());

    // Shortening unloads the lattice: force falls promptly from the
    // isometric plateau and keeps falling while overlap is preserved.
    let plateau = mean(&obs.axial_force[150..200]);
    let early_shortening = mean(&obs.axial_force[400..500]);
    let later_shortening = mean(&obs.axial_force[600..700]);
    assert!(
        early_shortening < plateau - 5.0,
        "shortening left force at {early_shortening} pN (plateau {plateau} pN)"
    );
    assert!(
        later_shortening <= early_shortening + 15.0,
        "force rose from {early_shortening} to {later_shortening} during shortening"
    );
}

#[test]
fn scenario_workloop_activation() {
    let time = traces::time_trace(0.5, 500.0);
    let activation =
        traces::actin_permissiveness_workloop(1.0, 0.01, 20.0, 2.0, 50.0, &time, 1.0);
    assert_eq!(activation.len(), time.len());

    let td = TimeDependence { p_ca: Some(activation.clone()), ..Default::default() };
    let config = SarcomereConfig { time_dependence: Some(td), ..base_config(3) };
    let mut hs = HalfSarcomere::new(config).unwrap();
    let steps = 200;
    let (obs, outcome) = hs.run(steps, None);
    assert!(outcome.is_completed());

    // The reported calcium tracks the prescribed pCa trace exactly:
    // report i covers timestep i + 1.
    for i in [0usize, 50, 120, steps - 1] {
        let expected = 10f64.powf(-activation[i + 1]);
        let got = obs.ca[i];
        assert!(
            (got - expected).abs() < 1e-12 * expected.max(1.0),
            "step {i}: ca {got} vs {expected}"
        );
    }
}

#[test]
fn scenario_snapshot_continuation() {
    let config = SarcomereConfig { p_ca: Some(4.0), ..base_config(2024) };
    let mut original = HalfSarcomere::new(config).unwrap();
    let (head, outcome) = original.run(100, None);
    assert!(outcome.is_completed());
    assert_eq!(head.len(), 100);

    let snapshot = original.to_snapshot();
    let mut restored = HalfSarcomere::from_snapshot(&snapshot).unwrap();
    assert_eq!(restored.to_snapshot(), snapshot);
    assert_eq!(restored.current_timestep(), original.current_timestep());

    // Both continuations run on; the restored lattice behaves like the
    // original up to random-stream position.
    let (tail_a, oc_a) = original.run(100, None);
    let (tail_b, oc_b) = restored.run(100, None);
    assert!(oc_a.is_completed() && oc_b.is_completed());
    assert!(restored.links_are_consistent());
    let mean_a = mean(&tail_a.axial_force);
    let mean_b = mean(&tail_b.axial_force);
    let passive = mean(&passive_reference(2024, 100));
    assert!(mean_a > passive && mean_b > passive);
    // Same lattice, same boundary conditions: forces agree in scale.
    assert!((mean_a - mean_b).abs() < 0.5 * mean_a.abs().max(mean_b.abs()));
}
