//! Test utilities and fixture behaviors for Plume development.
//!
//! Provides schema and block builders for unit tests plus a set of
//! deterministic behaviors (see [`fixtures`]) for driving the solver in
//! integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use glam::Vec3;
use plume_core::{names, AttributeSet, AttributesInfo, BlockId};
use plume_storage::ParticlesBlock;

pub use fixtures::{
    ConstantForce, CountingAction, FailingForce, FixedEmitter, MarkingAction, ScriptedEvent,
    UniformEvent,
};

/// The schema every solver uses: Kill State, Birth Time, Position,
/// Velocity.
pub fn standard_info() -> AttributesInfo {
    info_with_bytes(&[])
}

/// The standard schema plus extra byte attributes.
pub fn info_with_bytes(extra: &[&str]) -> AttributesInfo {
    let mut bytes: AttributeSet = [names::KILL_STATE].into_iter().collect();
    for name in extra {
        bytes.add(*name);
    }
    AttributesInfo::new(
        bytes,
        [names::BIRTH_TIME].into_iter().collect(),
        [names::POSITION, names::VELOCITY].into_iter().collect(),
    )
    .unwrap()
}

/// A block with the standard schema, one live row per position.
///
/// `velocities` must be as long as `positions`.
pub fn block_with(positions: &[Vec3], velocities: &[Vec3]) -> ParticlesBlock {
    block_in(Arc::new(standard_info()), positions, velocities)
}

/// Like [`block_with`], for an explicit schema containing Position and
/// Velocity.
pub fn block_in(
    info: Arc<AttributesInfo>,
    positions: &[Vec3],
    velocities: &[Vec3],
) -> ParticlesBlock {
    assert_eq!(positions.len(), velocities.len());
    let position = info.float3_id(names::POSITION).unwrap();
    let velocity = info.float3_id(names::VELOCITY).unwrap();
    let mut block = ParticlesBlock::new(BlockId(0), info, positions.len().max(1));
    block.set_active_amount(positions.len());
    {
        let mut view = block.slice_active();
        view.float3_mut(position).copy_from_slice(positions);
        view.float3_mut(velocity).copy_from_slice(velocities);
    }
    block
}

/// Absolute-tolerance float comparison for assertions.
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4
}

/// Component-wise [`approx_eq`].
pub fn approx_eq_vec(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}
