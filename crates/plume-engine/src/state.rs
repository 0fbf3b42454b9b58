//! Simulation state owned by the solver, and schema assembly.

use std::sync::Arc;

use plume_behavior::EmitterInfo;
use plume_core::{
    names, AttributeError, AttributeSet, AttributesInfo, ByteAttrId, Float3AttrId, FloatAttrId,
    StepId,
};
use plume_storage::{ParticlesContainer, StorageError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Assemble the solver schema: the well-known attributes plus the union
/// of every emitter's declarations.
///
/// # Errors
///
/// Returns [`AttributeError::KindConflict`] if a name is declared with
/// two different types, including a clash with a well-known attribute.
pub fn schema_for(emitters: &[EmitterInfo]) -> Result<AttributesInfo, AttributeError> {
    let mut byte: AttributeSet = [names::KILL_STATE].into_iter().collect();
    let mut float: AttributeSet = [names::BIRTH_TIME].into_iter().collect();
    let mut float3: AttributeSet = [names::POSITION, names::VELOCITY].into_iter().collect();
    for info in emitters {
        byte.add_all(info.byte());
        float.add_all(info.float());
        float3.add_all(info.float3());
    }
    AttributesInfo::new(byte, float, float3)
}

/// IDs of the attributes the solver itself reads and writes.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CoreAttributes {
    pub kill: ByteAttrId,
    pub birth: FloatAttrId,
    pub position: Float3AttrId,
    pub velocity: Float3AttrId,
}

impl CoreAttributes {
    pub fn resolve(info: &AttributesInfo) -> Result<Self, AttributeError> {
        Ok(Self {
            kill: info.require_byte(names::KILL_STATE)?,
            birth: info.require_float(names::BIRTH_TIME)?,
            position: info.require_float3(names::POSITION)?,
            velocity: info.require_float3(names::VELOCITY)?,
        })
    }
}

/// Everything that changes as the simulation advances.
///
/// Created by the solver, mutated only by `step()`. Dropping it releases
/// every block.
pub struct SimulationState {
    pub(crate) container: ParticlesContainer,
    pub(crate) seconds_since_start: f32,
    pub(crate) step: StepId,
    pub(crate) rng: ChaCha8Rng,
}

impl SimulationState {
    /// Fresh state at time zero with no particles.
    pub fn new(
        info: Arc<AttributesInfo>,
        block_capacity: usize,
        seed: u64,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            container: ParticlesContainer::new(info, block_capacity)?,
            seconds_since_start: 0.0,
            step: StepId(0),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// The particle storage.
    pub fn container(&self) -> &ParticlesContainer {
        &self.container
    }

    /// Simulation time, in seconds.
    pub fn seconds_since_start(&self) -> f32 {
        self.seconds_since_start
    }

    /// Number of completed steps.
    pub fn step(&self) -> StepId {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_behavior::EmitterInfoBuilder;
    use plume_core::AttributeType;

    #[test]
    fn schema_always_has_core_attributes() {
        let info = schema_for(&[]).unwrap();
        assert!(CoreAttributes::resolve(&info).is_ok());
        assert_eq!(info.len(), 4);
    }

    #[test]
    fn schema_is_union_of_declarations() {
        let mut a = EmitterInfoBuilder::new();
        a.use_float("Size").use_float3(names::POSITION);
        let mut b = EmitterInfoBuilder::new();
        b.use_float("Size").use_byte("Flag");
        let info = schema_for(&[a.build(), b.build()]).unwrap();
        assert_eq!(info.float_count(), 2);
        assert_eq!(info.byte_count(), 2);
        assert_eq!(info.float3_count(), 2);
        assert!(info.float_id("Size").is_some());
    }

    #[test]
    fn schema_rejects_conflicting_kinds() {
        let mut a = EmitterInfoBuilder::new();
        a.use_float3(names::BIRTH_TIME);
        match schema_for(&[a.build()]) {
            Err(AttributeError::KindConflict { first, second, .. }) => {
                assert_ne!(first, second);
                assert!([first, second].contains(&AttributeType::Float3));
            }
            other => panic!("expected KindConflict, got {other:?}"),
        }
    }

    #[test]
    fn new_state_starts_empty_at_zero() {
        let state = SimulationState::new(Arc::new(schema_for(&[]).unwrap()), 8, 1).unwrap();
        assert_eq!(state.seconds_since_start(), 0.0);
        assert_eq!(state.step(), StepId(0));
        assert_eq!(state.container().particle_amount(), 0);
    }
}
