//! Emission of new particles at the end of a step.
//!
//! Each emitter writes into freshly allocated blocks through an
//! [`EmitterHelper`]. The solver then initialises what the emitter did
//! not declare, back-dates every new particle to a random moment within
//! the step, integrates it up to the present, and only then makes the
//! rows live.

use plume_behavior::{Description, EmitterHelper, EmitterInfo};
use plume_core::{AttributeType, AttributesInfo, StepError};
use plume_storage::AttributeArrays;
use rand::Rng;

use crate::integrate::{SliceStats, SliceStepper};
use crate::state::{CoreAttributes, SimulationState};

/// Counters from one emission stage.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct EmissionStats {
    pub born: usize,
    pub slice: SliceStats,
}

/// Zero every attribute of `view` that `declared` does not list.
fn zero_undeclared(view: &mut AttributeArrays<'_>, info: &AttributesInfo, declared: &EmitterInfo) {
    for id in info.byte_ids() {
        if !declared.declares(info.byte_name(id), AttributeType::Byte) {
            view.zero_byte(id);
        }
    }
    for id in info.float_ids() {
        if !declared.declares(info.float_name(id), AttributeType::Float) {
            view.zero_float(id);
        }
    }
    for id in info.float3_ids() {
        if !declared.declares(info.float3_name(id), AttributeType::Float3) {
            view.zero_float3(id);
        }
    }
}

/// Run every emitter in order and activate what they emitted.
pub(crate) fn emit_all(
    description: &Description,
    declarations: &[EmitterInfo],
    stepper: &SliceStepper<'_>,
    ids: CoreAttributes,
    state: &mut SimulationState,
    elapsed: f32,
) -> Result<EmissionStats, StepError> {
    let now = state.seconds_since_start;
    let mut stats = EmissionStats::default();

    for (emitter, declared) in description.emitters().iter().zip(declarations) {
        let granted = {
            let mut helper = EmitterHelper::new(&mut state.container, &mut state.rng, elapsed, now);
            emitter
                .emit(&mut helper)
                .map_err(|reason| StepError::BehaviorFailed {
                    name: emitter.name().to_string(),
                    reason,
                })?;
            helper.into_granted()
        };

        for (block_id, amount) in granted {
            if amount == 0 {
                continue;
            }
            let births: Vec<f32> = (0..amount)
                .map(|_| now - elapsed * state.rng.random::<f32>())
                .collect();
            let durations: Vec<f32> = births.iter().map(|birth| now - birth).collect();

            let block = state
                .container
                .block_mut(block_id)
                .expect("granted block is registered");
            let info = std::sync::Arc::clone(block.info());
            {
                let mut view = block.slice_all().take_front(amount);
                zero_undeclared(&mut view, &info, declared);
                view.float_mut(ids.birth).copy_from_slice(&births);
                let slice = stepper.step_slice(&mut view, &durations, now)?;
                stats.slice = stats.slice.merge(slice);
            }
            block.set_active_amount(amount);
            stats.born += amount;
        }
    }
    Ok(stats)
}
