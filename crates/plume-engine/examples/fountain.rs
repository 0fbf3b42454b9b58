//! Plume fountain: a point emitter under gravity with two planes.
//!
//! Demonstrates:
//!   1. Building a `Description` from stock behaviors
//!   2. Configuring and creating a `Solver`
//!   3. Stepping, reading positions, and inspecting step metrics
//!   4. Resetting the simulation
//!
//! Particles that rise through y = 2 are lifted by 5 units; particles
//! that fall through the ground bounce back up at half speed.
//!
//! Run with:
//!   RUST_LOG=plume_engine=debug cargo run --example fountain

use glam::Vec3;
use plume_behavior::Description;
use plume_behaviors::{BounceAction, Drag, Gravity, OffsetAction, PlaneEvent, PointEmitter};
use plume_engine::{SimulationConfig, Solver};
use tracing_subscriber::EnvFilter;

// ─── Scenario parameters ────────────────────────────────────────

const STEPS: usize = 60;
const DT: f32 = 1.0 / 30.0;
const PER_STEP: usize = 200;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let emitter = PointEmitter::builder()
        .amount(PER_STEP)
        .position(Vec3::ZERO)
        .velocity(Vec3::new(0.0, 6.0, 0.0))
        .spread(1.5)
        .build()?;

    let description = Description::new()
        .add_force(Gravity::default())
        .add_force(Drag::new(0.1)?)
        .add_event(PlaneEvent::rising(2.0), OffsetAction::new(Vec3::new(0.0, 5.0, 0.0)))
        .add_event(PlaneEvent::falling(0.0), BounceAction::new(0.5)?)
        .add_emitter(emitter);
    println!("{description:?}\n");

    let config = SimulationConfig::new(description)
        .with_block_capacity(512)
        .with_max_age(1.5)
        .with_seed(7);
    let mut solver = Solver::new(config)?;

    for _ in 0..STEPS {
        let result = solver.step(DT)?;
        if result.step.0 % 10 == 0 {
            let m = &result.metrics;
            println!(
                "step {:>3} t={:.2}s particles={:>5} blocks={:>2} +{} -{} triggers={} {}us",
                result.step.0,
                solver.seconds_since_start(),
                m.particle_count,
                m.block_count,
                m.born,
                m.died,
                m.event_triggers,
                m.total_us,
            );
        }
    }

    let mut flat = vec![0.0; 3 * solver.particle_amount()];
    solver.get_positions(&mut flat);
    let highest = flat
        .chunks_exact(3)
        .map(|p| p[1])
        .fold(f32::NEG_INFINITY, f32::max);
    println!("\nHighest particle: y = {highest:.2}");

    solver.reset()?;
    println!(
        "Reset: {} particles, t = {}",
        solver.particle_amount(),
        solver.seconds_since_start()
    );
    Ok(())
}
