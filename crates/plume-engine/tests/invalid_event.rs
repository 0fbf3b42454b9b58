//! Integration test: malformed event output aborts the step.
//!
//! An event that reports rows out of order, rows outside its mask, or a
//! time factor outside `(0, 1]` must surface as
//! `StepError::InvalidEventOutput` naming the event, and a failing
//! behavior as `StepError::BehaviorFailed` naming the behavior.

use glam::Vec3;
use plume_behavior::Description;
use plume_core::StepError;
use plume_engine::{SimulationConfig, Solver};
use plume_test_utils::{CountingAction, FailingForce, FixedEmitter, ScriptedEvent};

fn solver_with(script: Vec<(usize, f32)>) -> Solver {
    let particles = vec![(Vec3::ZERO, Vec3::X); 4];
    let description = Description::new()
        .add_event(ScriptedEvent::new(script), CountingAction::new())
        .add_emitter(FixedEmitter::once(particles));
    Solver::new(SimulationConfig::new(description).with_block_capacity(8)).unwrap()
}

fn expect_invalid(script: Vec<(usize, f32)>, needle: &str) {
    let mut solver = solver_with(script);
    match solver.step(0.1) {
        Err(StepError::InvalidEventOutput { event, reason }) => {
            assert_eq!(event, "scripted_event");
            assert!(reason.contains(needle), "unexpected reason: {reason}");
        }
        other => panic!("expected InvalidEventOutput, got {other:?}"),
    }
}

#[test]
fn factor_above_one_is_rejected() {
    expect_invalid(vec![(0, 1.5)], "outside (0, 1]");
}

#[test]
fn zero_factor_is_rejected() {
    expect_invalid(vec![(1, 0.0)], "outside (0, 1]");
}

#[test]
fn nan_factor_is_rejected() {
    expect_invalid(vec![(1, f32::NAN)], "outside (0, 1]");
}

#[test]
fn unordered_rows_are_rejected() {
    expect_invalid(vec![(2, 0.5), (1, 0.5)], "ascending");
}

#[test]
fn rows_outside_mask_are_rejected() {
    expect_invalid(vec![(7, 0.5)], "is not in the mask");
}

#[test]
fn valid_script_is_accepted() {
    // Factor 1 uses up the whole step, so neither row is revisited.
    let mut solver = solver_with(vec![(0, 1.0), (3, 1.0)]);
    let result = solver.step(0.1).unwrap();
    assert_eq!(result.metrics.born, 4);
    assert_eq!(result.metrics.event_triggers, 2);
}

#[test]
fn failing_force_names_itself() {
    let description = Description::new()
        .add_force(FailingForce)
        .add_emitter(FixedEmitter::once(vec![(Vec3::ZERO, Vec3::ZERO)]));
    let mut solver = Solver::new(SimulationConfig::new(description)).unwrap();
    let err = solver.step(0.1).unwrap_err();
    assert!(matches!(err, StepError::BehaviorFailed { ref name, .. } if name == "failing_force"));
    assert!(err.to_string().contains("failing_force"));
}
