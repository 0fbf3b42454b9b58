//! Constant gravitational acceleration.

use glam::Vec3;
use plume_behavior::Force;
use plume_core::BehaviorError;
use plume_storage::AttributeArrays;

/// Standard gravity at the Earth's surface, in m/s² along -y.
pub const STANDARD_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Adds the same acceleration to every particle.
///
/// Particles have unit mass, so the acceleration is also the force.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gravity {
    acceleration: Vec3,
}

impl Gravity {
    /// Gravity pulling along `acceleration`.
    pub fn new(acceleration: Vec3) -> Self {
        Self { acceleration }
    }

    /// The configured acceleration.
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(STANDARD_GRAVITY)
    }
}

impl Force for Gravity {
    fn name(&self) -> &str {
        "Gravity"
    }

    fn add_force(
        &self,
        _attributes: &AttributeArrays<'_>,
        _rows: &[usize],
        dst: &mut [Vec3],
    ) -> Result<(), BehaviorError> {
        for f in dst {
            *f += self.acceleration;
        }
        Ok(())
    }
}
