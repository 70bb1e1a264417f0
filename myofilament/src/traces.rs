//! Boundary-condition trace generators.
//!
//! These produce the per-timestep z-line and calcium-activation traces
//! consumed through [`TimeDependence`](crate::config::TimeDependence):
//! classical workloop (sinusoidal length), force-velocity (hold then
//! ramp), and a stimulus-driven calcium activation profile with logistic
//! influx, exponential decay, and Gaussian smoothing.

/// Time trace in ms: `[0, dt, 2·dt, …)` up to but excluding
/// `duration_ms`.
pub fn time_trace(dt: f64, duration_ms: f64) -> Vec<f64> {
    let mut out = Vec::new();
    let mut i = 0usize;
    loop {
        let t = i as f64 * dt;
        if t >= duration_ms {
            break;
        }
        out.push(t);
        i += 1;
    }
    out
}

/// Sinusoidal workloop length trace: starts at the longest length,
/// `mean + 0.5·amp·cos(2π·t/period)` with `period = 1000/freq`.
///
/// `freq` is in Hz, `time` in ms.
pub fn zline_workloop(mean: f64, amp: f64, freq: f64, time: &[f64]) -> Vec<f64> {
    let period = 1000.0 / freq;
    time.iter()
        .map(|t| mean + 0.5 * amp * (2.0 * std::f64::consts::PI * t / period).cos())
        .collect()
}

/// Force-velocity length trace: hold at `l0` for `hold_time` ms, then
/// shorten linearly at `l0_per_sec` lengths per second.
pub fn zline_forcevelocity(l0: f64, hold_time: f64, l0_per_sec: f64, time: &[f64]) -> Vec<f64> {
    if time.len() < 2 {
        return vec![l0; time.len()];
    }
    let dt = time[1] - time[0];
    let hold_steps = ((hold_time / dt) as usize).min(time.len());
    let shorten_steps = time.len() - hold_steps;
    let nm_per_step = dt / 1000.0 * l0_per_sec * l0;
    let mut zline = vec![l0; hold_steps];
    for _ in 0..shorten_steps {
        let last = zline.last().copied().unwrap_or(l0);
        zline.push(last - nm_per_step);
    }
    zline
}

/// Calcium-activation workloop.
///
/// Per cycle the signal grows logistically for `stim_duration` ms,
/// `x += dt·x·(0.5/influx_time)·(1 − x/max_signal)`, then decays with
/// half-life `half_life` ms. The stimulus is phase-shifted by
/// `period·(phase mod 1)` relative to the longest-length point, the
/// full signal is pre-run for four cycles, convolved with a Gaussian
/// kernel (σ = 1 ms, support ±3 ms), and sliced to the run window.
pub fn actin_permissiveness_workloop(
    freq: f64,
    phase: f64,
    stim_duration: f64,
    influx_time: f64,
    half_life: f64,
    time: &[f64],
    max_signal: f64,
) -> Vec<f64> {
    let n = time.len();
    if n == 0 {
        return Vec::new();
    }
    let period = 1000.0 / freq;
    if n < 2 {
        return vec![0.1; n];
    }
    let dt = time[1] - time[0];
    let cycle_steps = (period / dt) as usize;
    if cycle_steps == 0 {
        return vec![0.1; n];
    }
    let decay_rate = 0.5f64.ln() / half_life;
    let growth_rate = 0.5 / influx_time;

    // Stimulus offset within the cycle.
    let shift = period * phase.rem_euclid(1.0);
    let cycle_time = time_trace(dt, period);
    let steps_before_stim = cycle_time.iter().position(|&t| t >= shift).unwrap_or(0);
    let stim_steps = ((stim_duration / dt) as usize).min(cycle_steps);
    let no_stim_steps = cycle_steps - stim_steps;

    // Generate four warm-up cycles plus the run window.
    let mut out = vec![0.1];
    for _ in 0..steps_before_stim {
        let last = *out.last().expect("signal is never empty");
        out.push(last);
    }
    while out.len() < 4 * cycle_steps + n {
        for _ in 0..stim_steps {
            let x = *out.last().expect("signal is never empty");
            out.push(x + dt * x * growth_rate * (1.0 - x / max_signal));
        }
        for _ in 0..no_stim_steps {
            let x = *out.last().expect("signal is never empty");
            out.push(x + dt * x * decay_rate);
        }
    }

    // Gaussian smoothing window, σ = 1 ms over ±3 ms.
    let window = time_trace(dt, 6.0).iter().map(|t| t - 3.0).collect::<Vec<_>>();
    let mut kernel: Vec<f64> = window.iter().map(|t| (-t * t / 2.0).exp()).collect();
    let norm: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= norm;
    }

    let smooth = convolve_full(&kernel, &out);
    smooth[2 * cycle_steps..2 * cycle_steps + n].to_vec()
}

/// Full discrete convolution, length `a.len() + b.len() − 1`.
fn convolve_full(a: &[f64], b: &[f64]) -> Vec<f64> {
    let n = a.len() + b.len() - 1;
    let mut out = vec![0.0; n];
    for (i, &av) in a.iter().enumerate() {
        for (j, &bv) in b.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn time_trace_excludes_the_duration() {
        let t = time_trace(0.5, 500.0);
        assert_eq!(t.len(), 1000);
        assert_relative_eq!(t[0], 0.0);
        assert_relative_eq!(t[1], 0.5);
        assert_relative_eq!(*t.last().unwrap(), 499.5);
    }

    #[test]
    fn workloop_oscillates_about_the_mean() {
        let t = time_trace(0.5, 2000.0);
        let z = zline_workloop(1250.0, 25.0, 1.0, &t);
        // Starts at the longest length.
        assert_relative_eq!(z[0], 1262.5);
        // Half a period later it bottoms out.
        assert_relative_eq!(z[1000], 1237.5, epsilon = 1e-6);
        let mean = z.iter().sum::<f64>() / z.len() as f64;
        assert_relative_eq!(mean, 1250.0, epsilon = 0.1);
    }

    #[test]
    fn forcevelocity_holds_then_ramps() {
        let t = time_trace(0.5, 500.0);
        let z = zline_forcevelocity(1250.0, 100.0, 1.0, &t);
        assert_eq!(z.len(), t.len());
        // Isometric hold.
        assert!(z[..200].iter().all(|&v| v == 1250.0));
        // Constant-velocity shortening: 0.625 nm per step.
        assert_relative_eq!(z[200], 1250.0 - 0.625, epsilon = 1e-9);
        assert_relative_eq!(z[400] - z[401], 0.625, epsilon = 1e-9);
        assert!(*z.last().unwrap() < 1250.0 - 0.6 * 799.0 * 0.625);
    }

    #[test]
    fn activation_workloop_is_periodic_and_bounded() {
        let t = time_trace(0.5, 3000.0);
        let act = actin_permissiveness_workloop(1.0, 0.01, 20.0, 2.0, 50.0, &t, 1.0);
        assert_eq!(act.len(), t.len());
        assert!(act.iter().all(|&v| v > 0.0 && v <= 1.0 + 1e-9));
        // One activation peak per 1000 ms cycle: count up-crossings of
        // the midline.
        let max = act.iter().cloned().fold(f64::MIN, f64::max);
        let min = act.iter().cloned().fold(f64::MAX, f64::min);
        let mid = 0.5 * (max + min);
        let crossings = act
            .windows(2)
            .filter(|w| w[0] < mid && w[1] >= mid)
            .count();
        assert_eq!(crossings, 3, "expected one peak per cycle over 3 cycles");
        assert!(max > 2.0 * min, "stimulus should clearly rise above the trough");
    }

    #[test]
    fn activation_workloop_phase_shifts_the_stimulus() {
        let t = time_trace(0.5, 2000.0);
        let early = actin_permissiveness_workloop(1.0, 0.0, 20.0, 2.0, 50.0, &t, 1.0);
        let late = actin_permissiveness_workloop(1.0, 0.25, 20.0, 2.0, 50.0, &t, 1.0);
        let argmax = |v: &[f64]| {
            v.iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap()
        };
        let d_early = argmax(&early[..1600]);
        let d_late = argmax(&late[..1600]);
        // A quarter-cycle phase delays the peak by about 500 steps.
        let delta = (d_late as isize - d_early as isize).rem_euclid(2000);
        assert!((400..600).contains(&delta), "peak shift was {delta} steps");
    }
}
