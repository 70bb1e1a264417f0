//! Isometric activation example.
//!
//! This example demonstrates:
//! - Building a half-sarcomere with a fixed seed
//! - Running an isometric protocol at saturating calcium
//! - Reading the per-timestep observables
//! - Comparing against a passive (low-calcium) run

use myofilament::{HalfSarcomere, SarcomereConfig, SarcomereError, N_THICK, N_THIN};

fn main() -> Result<(), SarcomereError> {
    println!("=== Half-Sarcomere Isometric Activation ===\n");

    println!("1. Active run (pCa 4.0)");
    let active = run_protocol(4.0)?;

    println!("\n2. Passive run (pCa 9.0)");
    let passive = run_protocol(9.0)?;

    println!("\nActive steady force:  {:8.1} pN", tail_mean(&active));
    println!("Passive steady force: {:8.1} pN", tail_mean(&passive));
    Ok(())
}

fn run_protocol(p_ca: f64) -> Result<Vec<f64>, SarcomereError> {
    let config = SarcomereConfig {
        seed: Some(42),
        starts: Some((vec![0; N_THIN], vec![1; N_THICK])),
        timestep_len: 0.5,
        p_ca: Some(p_ca),
        ..Default::default()
    };
    let mut hs = HalfSarcomere::new(config)?;

    println!("Time (ms) | Force (pN) | Tight fraction | Open coop fraction");
    println!("----------|------------|----------------|-------------------");

    let mut forces = Vec::new();
    for step in 1..=400 {
        hs.timestep()?;
        let report = hs.report();
        forces.push(report.axial_force);
        if step % 50 == 0 {
            println!(
                "{:8.1}  | {:10.2} | {:14.4} | {:18.4}",
                step as f64 * hs.timestep_len(),
                report.axial_force,
                report.xb_fraction_tight,
                report.coop
            );
        }
    }
    Ok(forces)
}

fn tail_mean(forces: &[f64]) -> f64 {
    let tail = &forces[forces.len() / 2..];
    tail.iter().sum::<f64>() / tail.len() as f64
}
