//! Linear velocity damping.

use glam::Vec3;
use plume_behavior::Force;
use plume_core::{names, BehaviorError};
use plume_storage::AttributeArrays;

/// Force opposing motion, proportional to velocity: `F = -k * v`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
    coefficient: f32,
}

impl Drag {
    /// Create a drag force.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `coefficient` is negative or not finite.
    pub fn new(coefficient: f32) -> Result<Self, String> {
        if !coefficient.is_finite() || coefficient < 0.0 {
            return Err(format!(
                "drag coefficient must be finite and >= 0, got {coefficient}"
            ));
        }
        Ok(Self { coefficient })
    }

    /// The damping coefficient `k`.
    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }
}

impl Force for Drag {
    fn name(&self) -> &str {
        "Drag"
    }

    fn add_force(
        &self,
        attributes: &AttributeArrays<'_>,
        rows: &[usize],
        dst: &mut [Vec3],
    ) -> Result<(), BehaviorError> {
        let velocities = attributes.float3_by_name(names::VELOCITY)?;
        for (f, &row) in dst.iter_mut().zip(rows) {
            *f -= self.coefficient * velocities[row];
        }
        Ok(())
    }
}
