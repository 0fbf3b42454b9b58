//! Reference actions run on the rows an event triggered on.

use glam::Vec3;
use plume_behavior::Action;
use plume_core::{names, BehaviorError};
use plume_storage::AttributeArrays;

use crate::plane::Axis;

/// Moves handled particles by a fixed offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetAction {
    offset: Vec3,
}

impl OffsetAction {
    /// Move by `offset`.
    pub fn new(offset: Vec3) -> Self {
        Self { offset }
    }
}

impl Action for OffsetAction {
    fn name(&self) -> &str {
        "OffsetAction"
    }

    fn execute(
        &self,
        attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
    ) -> Result<(), BehaviorError> {
        let positions = attributes.float3_by_name_mut(names::POSITION)?;
        for &row in rows {
            positions[row] += self.offset;
        }
        Ok(())
    }
}

/// Brings handled particles to rest for the remainder of the step.
///
/// With a floor, positions below it along the floor's axis are lifted
/// back onto it, so resting particles never sink through.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StopAction {
    floor: Option<(Axis, f32)>,
}

impl StopAction {
    /// Zero velocity only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also clamp y to at least `height`.
    pub fn with_floor(self, height: f32) -> Self {
        self.with_floor_on(Axis::Y, height)
    }

    /// Also clamp the `axis` component to at least `height`.
    pub fn with_floor_on(mut self, axis: Axis, height: f32) -> Self {
        self.floor = Some((axis, height));
        self
    }
}

impl Action for StopAction {
    fn name(&self) -> &str {
        "StopAction"
    }

    fn execute(
        &self,
        attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
    ) -> Result<(), BehaviorError> {
        let velocities = attributes.float3_by_name_mut(names::VELOCITY)?;
        for &row in rows {
            velocities[row] = Vec3::ZERO;
        }
        if let Some((axis, height)) = self.floor {
            let a = axis.index();
            let positions = attributes.float3_by_name_mut(names::POSITION)?;
            for &row in rows {
                positions[row][a] = positions[row][a].max(height);
            }
        }
        Ok(())
    }

    fn halts(&self) -> bool {
        true
    }
}

/// Reflects the velocity component along an axis, scaled by a
/// restitution coefficient.
///
/// The surface faces the positive axis direction, like a floor. A
/// particle approaching it slower than the rest speed, or already moving
/// away from it when triggered, does not bounce: its component is zeroed
/// and it stays on the surface for the rest of the step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BounceAction {
    axis: Axis,
    restitution: f32,
    rest_speed: f32,
}

/// Approach speed at or below which a [`BounceAction`] comes to rest.
pub const DEFAULT_REST_SPEED: f32 = 1e-3;

impl BounceAction {
    /// Bounce along y.
    ///
    /// # Errors
    ///
    /// Returns `Err` unless `restitution` is finite and in `(0, 1]`. A
    /// restitution of zero is a [`StopAction`].
    pub fn new(restitution: f32) -> Result<Self, String> {
        if !restitution.is_finite() || restitution <= 0.0 || restitution > 1.0 {
            return Err(format!(
                "restitution must be in (0, 1], got {restitution}"
            ));
        }
        Ok(Self {
            axis: Axis::Y,
            restitution,
            rest_speed: DEFAULT_REST_SPEED,
        })
    }

    /// Rest instead of bouncing when approaching at `speed` or slower.
    ///
    /// # Errors
    ///
    /// Returns `Err` unless `speed` is finite and non-negative.
    pub fn with_rest_speed(mut self, speed: f32) -> Result<Self, String> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(format!("rest speed must be finite and >= 0, got {speed}"));
        }
        self.rest_speed = speed;
        Ok(self)
    }

    /// Bounce along `axis` instead of y.
    pub fn on_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }
}

impl Action for BounceAction {
    fn name(&self) -> &str {
        "BounceAction"
    }

    fn execute(
        &self,
        attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
    ) -> Result<(), BehaviorError> {
        let a = self.axis.index();
        let velocities = attributes.float3_by_name_mut(names::VELOCITY)?;
        for &row in rows {
            let v = velocities[row][a];
            velocities[row][a] = if v < -self.rest_speed {
                -v * self.restitution
            } else {
                0.0
            };
        }
        Ok(())
    }

    fn halts_row(&self, attributes: &AttributeArrays<'_>, row: usize) -> bool {
        attributes
            .float3_by_name(names::VELOCITY)
            .is_ok_and(|v| v[row][self.axis.index()] == 0.0)
    }
}

/// Marks handled particles for removal at the end of the step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KillAction;

impl Action for KillAction {
    fn name(&self) -> &str {
        "KillAction"
    }

    fn execute(
        &self,
        attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
    ) -> Result<(), BehaviorError> {
        let kill = attributes.byte_by_name_mut(names::KILL_STATE)?;
        for &row in rows {
            kill[row] = 1;
        }
        Ok(())
    }

    fn halts(&self) -> bool {
        true
    }
}
