//! Event-bounded integration of one slice of particles.
//!
//! [`SliceStepper::step_slice`] advances every row of an
//! [`AttributeArrays`] view by its own duration. Each pass computes
//! semi-implicit Euler offsets for the rows still in flight, lets every
//! event inspect the tentative displacement, and commits either the full
//! offsets or, for triggered rows, the offsets scaled to the moment of
//! the earliest trigger. Triggered rows are handed to the bound action
//! and continue with the time they have left.

use glam::Vec3;
use plume_behavior::{Description, TriggeredRows};
use plume_core::{BehaviorError, StepError};
use plume_storage::AttributeArrays;

use crate::state::CoreAttributes;

/// Every particle has unit mass.
const MASS: f32 = 1.0;

/// Counters from one `step_slice` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SliceStats {
    /// Rows handed to actions, summed over passes.
    pub event_triggers: usize,
    /// Rows finished without events after the pass limit.
    pub exhausted_rows: usize,
    /// Rows whose age exceeded the limit.
    pub expired: usize,
}

impl SliceStats {
    pub fn merge(mut self, other: Self) -> Self {
        self.event_triggers += other.event_triggers;
        self.exhausted_rows += other.exhausted_rows;
        self.expired += other.expired;
        self
    }
}

/// Per-call scratch buffers, aligned with the current worklist.
#[derive(Default)]
struct Scratch {
    forces: Vec<Vec3>,
    velocity_offsets: Vec<Vec3>,
    position_offsets: Vec<Vec3>,
    triggered: TriggeredRows,
    /// Earliest `(time_factor, event_index)` per worklist entry.
    earliest: Vec<Option<(f32, usize)>>,
}

fn behavior_failed(name: &str) -> impl FnOnce(BehaviorError) -> StepError + '_ {
    move |reason| StepError::BehaviorFailed {
        name: name.to_string(),
        reason,
    }
}

fn invalid_output(event: &str, reason: String) -> StepError {
    StepError::InvalidEventOutput {
        event: event.to_string(),
        reason,
    }
}

/// Integrates slices against one description. Shared read-only by every
/// worker during a step.
pub(crate) struct SliceStepper<'d> {
    description: &'d Description,
    ids: CoreAttributes,
    max_age: f32,
    max_event_passes: u32,
}

impl<'d> SliceStepper<'d> {
    pub fn new(
        description: &'d Description,
        ids: CoreAttributes,
        max_age: f32,
        max_event_passes: u32,
    ) -> Self {
        Self {
            description,
            ids,
            max_age,
            max_event_passes,
        }
    }

    /// Advance row `i` of `attributes` by `durations[i]`, honoring
    /// events, then flag rows older than the age limit at time `now`.
    ///
    /// # Panics
    ///
    /// Panics if `durations` is not as long as the view.
    pub fn step_slice(
        &self,
        attributes: &mut AttributeArrays<'_>,
        durations: &[f32],
        now: f32,
    ) -> Result<SliceStats, StepError> {
        assert_eq!(
            durations.len(),
            attributes.len(),
            "one duration per row is required"
        );
        let mut stats = SliceStats::default();
        let mut scratch = Scratch::default();
        let mut rows: Vec<usize> = (0..attributes.len()).collect();
        let mut remaining = durations.to_vec();

        let mut pass = 0;
        while !rows.is_empty() && pass < self.max_event_passes {
            pass += 1;
            self.compute_offsets(attributes, &rows, &remaining, &mut scratch)?;
            self.find_earliest_triggers(attributes, &rows, &mut scratch)?;
            self.commit(attributes, &rows, &scratch);

            let mut next: Vec<(usize, f32)> = Vec::new();
            let mut handled = Vec::new();
            for (event_index, binding) in self.description.events().iter().enumerate() {
                handled.clear();
                for (k, earliest) in scratch.earliest.iter().enumerate() {
                    if matches!(earliest, Some((_, e)) if *e == event_index) {
                        handled.push(k);
                    }
                }
                if handled.is_empty() {
                    continue;
                }
                let handled_rows: Vec<usize> = handled.iter().map(|&k| rows[k]).collect();
                let event = binding.event();
                event
                    .settle(attributes, &handled_rows)
                    .map_err(behavior_failed(event.name()))?;
                let action = binding.action();
                action
                    .execute(attributes, &handled_rows)
                    .map_err(behavior_failed(action.name()))?;
                stats.event_triggers += handled_rows.len();

                if action.halts() {
                    continue;
                }
                for &k in &handled {
                    if let Some((factor, _)) = scratch.earliest[k] {
                        let rest = remaining[k] * (1.0 - factor);
                        if rest > 0.0 && !action.halts_row(attributes, rows[k]) {
                            next.push((rows[k], rest));
                        }
                    }
                }
            }

            next.sort_unstable_by_key(|&(row, _)| row);
            rows = next.iter().map(|&(row, _)| row).collect();
            remaining = next.iter().map(|&(_, rest)| rest).collect();
        }

        if !rows.is_empty() {
            stats.exhausted_rows = rows.len();
            self.step_slice_to_next_event(attributes, &rows, &remaining, &mut scratch)?;
        }

        stats.expired = self.kill_expired(attributes, now);
        Ok(stats)
    }

    /// Advance `rows` by their remaining time, stopping each one at its
    /// earliest trigger. Triggered rows are settled but no action runs and
    /// the rest of their time is dropped.
    fn step_slice_to_next_event(
        &self,
        attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
        remaining: &[f32],
        scratch: &mut Scratch,
    ) -> Result<(), StepError> {
        self.compute_offsets(attributes, rows, remaining, scratch)?;
        self.find_earliest_triggers(attributes, rows, scratch)?;
        self.commit(attributes, rows, scratch);

        for (event_index, binding) in self.description.events().iter().enumerate() {
            let settled: Vec<usize> = rows
                .iter()
                .zip(&scratch.earliest)
                .filter(|(_, earliest)| matches!(earliest, Some((_, e)) if *e == event_index))
                .map(|(&row, _)| row)
                .collect();
            if settled.is_empty() {
                continue;
            }
            let event = binding.event();
            event
                .settle(attributes, &settled)
                .map_err(behavior_failed(event.name()))?;
        }
        Ok(())
    }

    /// Sum every force and derive tentative velocity and position
    /// offsets for each worklist entry.
    fn compute_offsets(
        &self,
        attributes: &AttributeArrays<'_>,
        rows: &[usize],
        durations: &[f32],
        scratch: &mut Scratch,
    ) -> Result<(), StepError> {
        scratch.forces.clear();
        scratch.forces.resize(rows.len(), Vec3::ZERO);
        for force in self.description.forces() {
            force
                .add_force(attributes, rows, &mut scratch.forces)
                .map_err(behavior_failed(force.name()))?;
        }

        let velocities = attributes.float3(self.ids.velocity);
        scratch.velocity_offsets.clear();
        scratch.position_offsets.clear();
        for ((&row, &dt), &force) in rows.iter().zip(durations).zip(&scratch.forces) {
            let dv = dt * force / MASS;
            scratch.velocity_offsets.push(dv);
            scratch.position_offsets.push(dt * (velocities[row] + 0.5 * dv));
        }
        Ok(())
    }

    /// Run every event against the tentative displacement and keep, per
    /// worklist entry, the earliest trigger. Ties go to the earlier event.
    fn find_earliest_triggers(
        &self,
        attributes: &AttributeArrays<'_>,
        rows: &[usize],
        scratch: &mut Scratch,
    ) -> Result<(), StepError> {
        scratch.earliest.clear();
        scratch.earliest.resize(rows.len(), None);

        for (event_index, binding) in self.description.events().iter().enumerate() {
            let event = binding.event();
            scratch.triggered.clear();
            event
                .filter(
                    attributes,
                    rows,
                    &scratch.position_offsets,
                    &mut scratch.triggered,
                )
                .map_err(behavior_failed(event.name()))?;

            // Both `rows` and the output are ascending, so one forward
            // scan maps each triggered row to its worklist entry.
            let mut k = 0;
            let mut previous: Option<usize> = None;
            for (row, factor) in scratch.triggered.iter() {
                if previous.is_some_and(|p| row <= p) {
                    return Err(invalid_output(
                        event.name(),
                        format!("row {row} is not in ascending order"),
                    ));
                }
                previous = Some(row);
                if !(factor.is_finite() && factor > 0.0 && factor <= 1.0) {
                    return Err(invalid_output(
                        event.name(),
                        format!("time factor {factor} for row {row} is outside (0, 1]"),
                    ));
                }
                while k < rows.len() && rows[k] < row {
                    k += 1;
                }
                if k == rows.len() || rows[k] != row {
                    return Err(invalid_output(
                        event.name(),
                        format!("row {row} is not in the mask"),
                    ));
                }
                match scratch.earliest[k] {
                    Some((best, _)) if best <= factor => {}
                    _ => scratch.earliest[k] = Some((factor, event_index)),
                }
            }
        }
        Ok(())
    }

    /// Apply offsets: in full for untriggered entries, scaled by the time
    /// factor for triggered ones.
    fn commit(&self, attributes: &mut AttributeArrays<'_>, rows: &[usize], scratch: &Scratch) {
        let scale = |k: usize| scratch.earliest[k].map_or(1.0, |(factor, _)| factor);

        let positions = attributes.float3_mut(self.ids.position);
        for (k, &row) in rows.iter().enumerate() {
            positions[row] += scratch.position_offsets[k] * scale(k);
        }
        let velocities = attributes.float3_mut(self.ids.velocity);
        for (k, &row) in rows.iter().enumerate() {
            velocities[row] += scratch.velocity_offsets[k] * scale(k);
        }
    }

    /// Set Kill State on every row older than the age limit. Returns the
    /// number of newly flagged rows.
    fn kill_expired(&self, attributes: &mut AttributeArrays<'_>, now: f32) -> usize {
        let expired: Vec<usize> = attributes
            .float(self.ids.birth)
            .iter()
            .enumerate()
            .filter(|&(_, &birth)| now - birth > self.max_age)
            .map(|(row, _)| row)
            .collect();
        let kill = attributes.byte_mut(self.ids.kill);
        let mut flagged = 0;
        for row in expired {
            if kill[row] != 1 {
                kill[row] = 1;
                flagged += 1;
            }
        }
        flagged
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use plume_behaviors::{OffsetAction, PlaneEvent, StopAction};
    use plume_core::names;
    use plume_storage::ParticlesBlock;
    use plume_test_utils::{
        approx_eq, approx_eq_vec, block_in, info_with_bytes, ConstantForce, CountingAction,
        MarkingAction, ScriptedEvent, UniformEvent,
    };

    fn block(positions: &[Vec3], velocities: &[Vec3]) -> ParticlesBlock {
        block_in(Arc::new(info_with_bytes(&["Mark"])), positions, velocities)
    }

    fn ids(block: &ParticlesBlock) -> CoreAttributes {
        CoreAttributes::resolve(block.info()).unwrap()
    }

    fn run(
        description: &Description,
        block: &mut ParticlesBlock,
        dt: f32,
    ) -> Result<SliceStats, StepError> {
        let stepper = SliceStepper::new(description, ids(block), 5.0, 8);
        let durations = vec![dt; block.active_amount()];
        stepper.step_slice(&mut block.slice_active(), &durations, 0.0)
    }

    fn position(block: &ParticlesBlock, row: usize) -> Vec3 {
        block.active_float3(ids(block).position)[row]
    }

    fn velocity(block: &ParticlesBlock, row: usize) -> Vec3 {
        block.active_float3(ids(block).velocity)[row]
    }

    #[test]
    fn no_behaviors_moves_at_constant_velocity() {
        let description = Description::new();
        let mut block = block(&[Vec3::ZERO, Vec3::ONE], &[Vec3::ZERO, Vec3::X]);
        run(&description, &mut block, 0.5).unwrap();
        assert_eq!(position(&block, 0), Vec3::ZERO);
        assert_eq!(position(&block, 1), Vec3::new(1.5, 1.0, 1.0));
        assert_eq!(velocity(&block, 1), Vec3::X);
    }

    #[test]
    fn constant_force_offsets() {
        let f = Vec3::new(0.0, -2.0, 4.0);
        let description = Description::new().add_force(ConstantForce(f));
        let v = Vec3::new(1.0, 0.0, 0.0);
        let mut block = block(&[Vec3::ZERO], &[v]);
        let dt = 0.5;
        run(&description, &mut block, dt).unwrap();

        let dv = dt * f;
        assert!(approx_eq_vec(velocity(&block, 0), v + dv));
        assert!(approx_eq_vec(position(&block, 0), dt * (v + 0.5 * dv)));
    }

    #[test]
    fn forces_are_summed() {
        let description = Description::new()
            .add_force(ConstantForce(Vec3::X))
            .add_force(ConstantForce(Vec3::X));
        let mut block = block(&[Vec3::ZERO], &[Vec3::ZERO]);
        run(&description, &mut block, 1.0).unwrap();
        assert!(approx_eq_vec(velocity(&block, 0), Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn crossing_at_half_step_then_offset_action() {
        let description = Description::new().add_event(
            PlaneEvent::rising(2.0),
            OffsetAction::new(Vec3::new(0.0, 5.0, 0.0)),
        );
        let mut block = block(&[Vec3::new(0.0, 1.0, 0.0)], &[Vec3::new(0.0, 2.0, 0.0)]);
        let stats = run(&description, &mut block, 1.0).unwrap();

        // Reaches y = 2 at factor 0.5, jumps to 7, then moves the remaining
        // half step at 2 units/s.
        assert!(approx_eq(position(&block, 0).y, 8.0));
        assert_eq!(stats.event_triggers, 1);
        assert_eq!(stats.exhausted_rows, 0);
    }

    #[test]
    fn halting_action_stops_integration() {
        let description = Description::new()
            .add_force(ConstantForce(Vec3::new(0.0, -10.0, 0.0)))
            .add_event(PlaneEvent::falling(0.0), StopAction::new().with_floor(0.0));
        let mut block = block(&[Vec3::new(0.0, 0.1, 0.0)], &[Vec3::new(0.0, -1.0, 0.0)]);
        run(&description, &mut block, 1.0).unwrap();
        assert!(approx_eq(position(&block, 0).y, 0.0));
        assert!(position(&block, 0).y >= 0.0);
        assert_eq!(velocity(&block, 0), Vec3::ZERO);

        // Resting on the floor it stays there.
        run(&description, &mut block, 1.0).unwrap();
        assert!(approx_eq(position(&block, 0).y, 0.0));
        assert!(position(&block, 0).y >= 0.0);
        assert_eq!(velocity(&block, 0), Vec3::ZERO);
    }

    #[test]
    fn earliest_trigger_wins_across_events() {
        let late = CountingAction::new();
        let early = CountingAction::halting();
        let description = Description::new()
            .add_event(UniformEvent::new("late", 0.75), late.clone())
            .add_event(UniformEvent::new("early", 0.25), early.clone());
        let mut block = block(&[Vec3::ZERO], &[Vec3::X]);
        run(&description, &mut block, 1.0).unwrap();

        assert_eq!(late.calls(), 0);
        assert_eq!(early.rows(), 1);
        assert!(approx_eq(position(&block, 0).x, 0.25));
    }

    #[test]
    fn ties_go_to_earlier_event() {
        let first = CountingAction::halting();
        let second = CountingAction::halting();
        let description = Description::new()
            .add_event(UniformEvent::new("first", 0.5), first.clone())
            .add_event(UniformEvent::new("second", 0.5), second.clone());
        let mut block = block(&[Vec3::ZERO], &[Vec3::X]);
        run(&description, &mut block, 1.0).unwrap();
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[test]
    fn pass_limit_stops_rows_at_next_trigger() {
        // Triggers on every pass and never halts, so the pass limit is hit.
        let action = CountingAction::new();
        let description =
            Description::new().add_event(UniformEvent::new("always", 0.5), action.clone());
        let mut block = block(&[Vec3::ZERO], &[Vec3::X]);
        let stats = run(&description, &mut block, 1.0).unwrap();

        assert_eq!(action.calls(), 8);
        assert_eq!(stats.exhausted_rows, 1);
        // Eight halvings, then one more up to the next trigger.
        assert!(approx_eq(position(&block, 0).x, 1.0 - 0.5f32.powi(9)));
    }

    #[test]
    fn pass_limit_never_carries_rows_through_a_plane() {
        // The action leaves the particle pushing into the floor, so it
        // retriggers on every pass; the leftover time must not sink it.
        let description = Description::new()
            .add_force(ConstantForce(Vec3::new(0.0, -10.0, 0.0)))
            .add_event(PlaneEvent::falling(0.0), CountingAction::new());
        let mut block = block(&[Vec3::new(0.0, 0.05, 0.0)], &[Vec3::new(0.0, -1.0, 0.0)]);
        let stats = run(&description, &mut block, 0.5).unwrap();

        assert_eq!(stats.exhausted_rows, 1);
        assert_eq!(position(&block, 0).y, 0.0);
    }

    #[test]
    fn crossing_lands_exactly_on_plane() {
        let description = Description::new()
            .add_force(ConstantForce(Vec3::new(0.0, -9.81, 0.0)))
            .add_event(PlaneEvent::falling(0.0), StopAction::new());
        let mut block = block(&[Vec3::new(0.0, 0.3, 0.0)], &[Vec3::new(0.0, -0.7, 0.0)]);
        run(&description, &mut block, 0.5).unwrap();
        assert_eq!(position(&block, 0).y, 0.0);

        // Resting on the plane with gravity pulling it down.
        run(&description, &mut block, 0.1).unwrap();
        assert_eq!(position(&block, 0).y, 0.0);
        assert_eq!(velocity(&block, 0), Vec3::ZERO);
    }

    #[test]
    fn actions_see_only_triggered_rows() {
        let description = Description::new().add_event(
            PlaneEvent::rising(1.0),
            MarkingAction::new("Mark", StopAction::new()),
        );
        let mut block = block(
            &[Vec3::ZERO, Vec3::ZERO, Vec3::ZERO],
            &[Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0)],
        );
        run(&description, &mut block, 1.0).unwrap();
        let mark = block.info().byte_id("Mark").unwrap();
        assert_eq!(block.active_byte(mark), &[1, 0, 1]);
        assert!(approx_eq(position(&block, 0).y, 1.0));
        assert!(approx_eq(position(&block, 2).y, 1.0));
    }

    #[test]
    fn rejects_row_outside_mask() {
        let description = Description::new()
            .add_event(ScriptedEvent::new(vec![(7, 0.5)]), CountingAction::new());
        let mut block = block(&[Vec3::ZERO], &[Vec3::X]);
        match run(&description, &mut block, 1.0) {
            Err(StepError::InvalidEventOutput { reason, .. }) => {
                assert!(reason.contains("not in the mask"));
            }
            other => panic!("expected InvalidEventOutput, got {other:?}"),
        }
    }

    #[test]
    fn rejects_factor_out_of_range() {
        for factor in [0.0, 1.5, f32::NAN] {
            let description = Description::new()
                .add_event(ScriptedEvent::new(vec![(0, factor)]), CountingAction::new());
            let mut block = block(&[Vec3::ZERO], &[Vec3::X]);
            assert!(matches!(
                run(&description, &mut block, 1.0),
                Err(StepError::InvalidEventOutput { .. })
            ));
        }
    }

    #[test]
    fn rejects_unordered_rows() {
        let description = Description::new().add_event(
            ScriptedEvent::new(vec![(1, 0.5), (0, 0.5)]),
            CountingAction::new(),
        );
        let mut block = block(&[Vec3::ZERO; 2], &[Vec3::X; 2]);
        assert!(matches!(
            run(&description, &mut block, 1.0),
            Err(StepError::InvalidEventOutput { .. })
        ));
    }

    #[test]
    fn behavior_failure_is_named() {
        let description = Description::new().add_force(plume_test_utils::FailingForce);
        let mut block = block(&[Vec3::ZERO], &[Vec3::X]);
        match run(&description, &mut block, 1.0) {
            Err(StepError::BehaviorFailed { name, .. }) => assert_eq!(name, "failing_force"),
            other => panic!("expected BehaviorFailed, got {other:?}"),
        }
    }

    #[test]
    fn old_particles_are_flagged() {
        let description = Description::new();
        let mut block = block(&[Vec3::ZERO; 3], &[Vec3::ZERO; 3]);
        let ids = ids(&block);
        {
            let mut view = block.slice_active();
            view.float_mut(ids.birth).copy_from_slice(&[0.0, 4.0, 6.0]);
        }
        let stepper = SliceStepper::new(&description, ids, 5.0, 8);
        let stats = stepper
            .step_slice(&mut block.slice_active(), &[0.1; 3], 10.0)
            .unwrap();
        assert_eq!(stats.expired, 2);
        assert_eq!(block.active_byte(ids.kill), &[1, 1, 0]);
        assert_eq!(block.info().byte_name(ids.kill), names::KILL_STATE);
    }
}
