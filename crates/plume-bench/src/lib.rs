//! Benchmark profiles for the Plume particle simulation.
//!
//! Provides pre-built [`SimulationConfig`] profiles:
//!
//! - [`fountain_profile`]: point emitter under gravity and drag with a
//!   bouncing floor and a lifting plane, the usual steady-state workload
//! - [`free_fall_profile`]: emitter and gravity only, for measuring
//!   integration without events
//! - [`warm_solver`]: a solver already stepped to steady state

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use glam::Vec3;
use plume_behavior::Description;
use plume_behaviors::{BounceAction, Drag, Gravity, OffsetAction, PlaneEvent, PointEmitter};
use plume_engine::{SimulationConfig, Solver};

/// Step size used by every profile.
pub const DT: f32 = 1.0 / 60.0;

fn emitter(per_step: usize, spread: f32) -> PointEmitter {
    PointEmitter::builder()
        .amount(per_step)
        .velocity(Vec3::new(0.0, 8.0, 0.0))
        .spread(spread)
        .build()
        .unwrap()
}

/// Fountain with events: `per_step` particles per step, each living
/// `max_age` seconds.
pub fn fountain_profile(per_step: usize, max_age: f32, seed: u64) -> SimulationConfig {
    let description = Description::new()
        .add_force(Gravity::default())
        .add_force(Drag::new(0.05).unwrap())
        .add_event(
            PlaneEvent::rising(3.0),
            OffsetAction::new(Vec3::new(0.0, 1.0, 0.0)),
        )
        .add_event(PlaneEvent::falling(0.0), BounceAction::new(0.6).unwrap())
        .add_emitter(emitter(per_step, 2.0));
    SimulationConfig::new(description)
        .with_max_age(max_age)
        .with_seed(seed)
}

/// Gravity only, no events.
pub fn free_fall_profile(per_step: usize, max_age: f32, seed: u64) -> SimulationConfig {
    let description = Description::new()
        .add_force(Gravity::default())
        .add_emitter(emitter(per_step, 1.0));
    SimulationConfig::new(description)
        .with_max_age(max_age)
        .with_seed(seed)
}

/// Build a solver from `config` and step it until the population has
/// reached steady state (one full particle lifetime plus a step).
pub fn warm_solver(config: SimulationConfig) -> Solver {
    let steps = (config.max_age / DT).ceil() as usize + 1;
    let mut solver = Solver::new(config).unwrap();
    for _ in 0..steps {
        solver.step(DT).unwrap();
    }
    solver
}
