//! Axis-aligned plane crossing detection.
//!
//! A [`PlaneEvent`] fires when a particle's tentative displacement
//! carries it across the plane `position[axis] == height`. The time
//! factor is found by linear interpolation along the axis, and the
//! particle is then settled exactly onto the plane before the bound
//! action runs, so rounding never leaves it on the far side.

use glam::Vec3;
use plume_behavior::{Event, TriggeredRows};
use plume_core::{names, BehaviorError};
use plume_storage::AttributeArrays;

/// A coordinate axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis (up).
    #[default]
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// Component index into a [`Vec3`].
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Which crossing direction triggers the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// From below: `p < h` and `p + d >= h`.
    Rising,
    /// From above: `p >= h` and `p + d < h`.
    Falling,
}

/// Fires when a particle crosses an axis-aligned plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneEvent {
    axis: Axis,
    height: f32,
    crossing: Crossing,
}

impl PlaneEvent {
    /// Fires on particles crossing `height` upward along y.
    pub fn rising(height: f32) -> Self {
        Self {
            axis: Axis::Y,
            height,
            crossing: Crossing::Rising,
        }
    }

    /// Fires on particles crossing `height` downward along y.
    pub fn falling(height: f32) -> Self {
        Self {
            axis: Axis::Y,
            height,
            crossing: Crossing::Falling,
        }
    }

    /// Measure along `axis` instead of y.
    pub fn on_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Position of the plane along its axis.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// The axis the plane is perpendicular to.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// The triggering direction.
    pub fn crossing(&self) -> Crossing {
        self.crossing
    }

    /// Time factor at which a particle at `p` moving by `d` reaches the
    /// plane, or `None` if it does not cross in the configured direction.
    fn crossing_factor(&self, p: f32, d: f32) -> Option<f32> {
        let h = self.height;
        let factor = match self.crossing {
            Crossing::Rising if p < h && p + d >= h => (h - p) / d,
            Crossing::Falling if p >= h && p + d < h => (p - h) / -d,
            // Resting within rounding distance below the plane and still
            // pushing into it: catch it at once so it is settled back on.
            Crossing::Falling if p < h && d < 0.0 && h - p <= contact_tolerance(h) => 0.0,
            _ => return None,
        };
        // A particle resting exactly on the plane still has to trigger.
        Some(factor.clamp(f32::MIN_POSITIVE, 1.0))
    }
}

/// How far below a falling plane a particle still counts as resting on it.
fn contact_tolerance(height: f32) -> f32 {
    1e-5 * height.abs().max(1.0)
}

impl Event for PlaneEvent {
    fn name(&self) -> &str {
        "PlaneEvent"
    }

    fn filter(
        &self,
        attributes: &AttributeArrays<'_>,
        rows: &[usize],
        displacement: &[Vec3],
        triggered: &mut TriggeredRows,
    ) -> Result<(), BehaviorError> {
        let positions = attributes.float3_by_name(names::POSITION)?;
        let a = self.axis.index();
        for (&row, d) in rows.iter().zip(displacement) {
            if let Some(factor) = self.crossing_factor(positions[row][a], d[a]) {
                triggered.push(row, factor);
            }
        }
        Ok(())
    }

    fn settle(
        &self,
        attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
    ) -> Result<(), BehaviorError> {
        let positions = attributes.float3_by_name_mut(names::POSITION)?;
        let a = self.axis.index();
        for &row in rows {
            positions[row][a] = self.height;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_test_utils::block_with;

    fn filter(event: PlaneEvent, positions: &[Vec3], displacement: &[Vec3]) -> TriggeredRows {
        let mut block = block_with(positions, &vec![Vec3::ZERO; positions.len()]);
        let rows: Vec<usize> = (0..positions.len()).collect();
        let mut triggered = TriggeredRows::new();
        event
            .filter(&block.slice_active(), &rows, displacement, &mut triggered)
            .unwrap();
        triggered
    }

    #[test]
    fn rising_crossing_interpolates_factor() {
        let t = filter(
            PlaneEvent::rising(2.0),
            &[Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            &[Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 0.5, 0.0)],
        );
        assert_eq!(t.rows(), &[0]);
        assert_eq!(t.factors(), &[0.5]);
    }

    #[test]
    fn rising_ignores_downward_motion() {
        let t = filter(
            PlaneEvent::rising(2.0),
            &[Vec3::new(0.0, 3.0, 0.0)],
            &[Vec3::new(0.0, -2.0, 0.0)],
        );
        assert!(t.is_empty());
    }

    #[test]
    fn falling_crossing_interpolates_factor() {
        let t = filter(
            PlaneEvent::falling(0.0),
            &[Vec3::new(0.0, 1.0, 0.0)],
            &[Vec3::new(0.0, -4.0, 0.0)],
        );
        assert_eq!(t.factors(), &[0.25]);
    }

    #[test]
    fn resting_on_plane_triggers_with_positive_factor() {
        let t = filter(
            PlaneEvent::falling(0.0),
            &[Vec3::ZERO],
            &[Vec3::new(0.0, -0.1, 0.0)],
        );
        assert_eq!(t.rows(), &[0]);
        assert!(t.factors()[0] > 0.0);
    }

    #[test]
    fn just_below_plane_and_sinking_still_triggers() {
        let t = filter(
            PlaneEvent::falling(0.0),
            &[Vec3::new(0.0, -5.7e-40, 0.0), Vec3::new(0.0, -1.0, 0.0)],
            &[Vec3::new(0.0, -0.05, 0.0), Vec3::new(0.0, -0.05, 0.0)],
        );
        assert_eq!(t.rows(), &[0]);
        assert!(t.factors()[0] > 0.0);
    }

    #[test]
    fn settle_places_rows_on_plane() {
        let mut block = block_with(
            &[Vec3::new(1.0, -5.7e-40, 2.0), Vec3::new(0.0, 3.0, 0.0)],
            &[Vec3::ZERO, Vec3::ZERO],
        );
        PlaneEvent::falling(0.0)
            .settle(&mut block.slice_active(), &[0])
            .unwrap();
        let id = block.info().float3_id(names::POSITION).unwrap();
        assert_eq!(block.active_float3(id)[0], Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(block.active_float3(id)[1], Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn other_axes_are_supported() {
        let t = filter(
            PlaneEvent::rising(1.0).on_axis(Axis::X),
            &[Vec3::ZERO, Vec3::ZERO],
            &[Vec3::new(0.0, 5.0, 0.0), Vec3::new(4.0, 0.0, 0.0)],
        );
        assert_eq!(t.rows(), &[1]);
        assert_eq!(t.factors(), &[0.25]);
    }
}
