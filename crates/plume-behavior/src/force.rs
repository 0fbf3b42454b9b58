//! The [`Force`] trait.

use glam::Vec3;
use plume_core::BehaviorError;
use plume_storage::AttributeArrays;

/// An acceleration source evaluated once per integration pass.
///
/// # Contract
///
/// - `add_force()` ADDS into `dst`; it never overwrites. The solver
///   zeroes the accumulator before the first force and sums every
///   registered force into it.
/// - `dst` is aligned with `rows`: `dst[i]` belongs to row `rows[i]` of
///   `attributes`.
/// - `&self`: forces are shared by every worker thread during a step.
///
/// # Examples
///
/// A force pulling every particle along +x:
///
/// ```
/// use std::sync::Arc;
/// use glam::Vec3;
/// use plume_behavior::Force;
/// use plume_core::{AttributesInfo, BehaviorError, BlockId};
/// use plume_storage::{AttributeArrays, ParticlesBlock};
///
/// struct Wind;
///
/// impl Force for Wind {
///     fn name(&self) -> &str { "wind" }
///
///     fn add_force(
///         &self,
///         _attributes: &AttributeArrays<'_>,
///         _rows: &[usize],
///         dst: &mut [Vec3],
///     ) -> Result<(), BehaviorError> {
///         for f in dst {
///             *f += Vec3::X;
///         }
///         Ok(())
///     }
/// }
///
/// let mut block = ParticlesBlock::new(BlockId(0), Arc::new(AttributesInfo::default()), 2);
/// let mut acc = [Vec3::ZERO; 2];
/// Wind.add_force(&block.slice_all(), &[0, 1], &mut acc).unwrap();
/// assert_eq!(acc, [Vec3::X; 2]);
/// ```
pub trait Force: Send + Sync + 'static {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Add this force's contribution for each masked row into `dst`.
    fn add_force(
        &self,
        attributes: &AttributeArrays<'_>,
        rows: &[usize],
        dst: &mut [Vec3],
    ) -> Result<(), BehaviorError>;
}
