//! The [`Event`] trait, its output buffer [`TriggeredRows`], and the
//! [`EventBinding`] pairing an event with its action.

use glam::Vec3;
use plume_core::BehaviorError;
use plume_storage::AttributeArrays;

use crate::action::Action;

/// Rows an event triggered on, each with the fraction of the remaining
/// time at which the trigger happens.
///
/// Reused across passes; the solver clears it before each `filter()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriggeredRows {
    rows: Vec<usize>,
    factors: Vec<f32>,
}

impl TriggeredRows {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trigger on `row` after `time_factor` of the remaining time.
    ///
    /// Rows must be pushed in ascending order, and `time_factor` must lie
    /// in `(0, 1]`. The solver rejects output violating either rule.
    pub fn push(&mut self, row: usize, time_factor: f32) {
        self.rows.push(row);
        self.factors.push(time_factor);
    }

    /// Remove every recorded trigger.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.factors.clear();
    }

    /// Number of triggered rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing triggered.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Triggered rows in push order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Time factors aligned with [`rows`](Self::rows).
    pub fn factors(&self) -> &[f32] {
        &self.factors
    }

    /// Iterate over `(row, time_factor)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.rows.iter().copied().zip(self.factors.iter().copied())
    }
}

/// A condition checked against each particle's tentative displacement.
///
/// # Contract
///
/// - `filter()` is pure: it reads `attributes` and never mutates them.
/// - `displacement` is aligned with `rows`.
/// - Output rows are a subset of `rows`, pushed in ascending order, each
///   with a time factor in `(0, 1]`.
/// - `settle()` runs on the rows this event won, after they were advanced
///   by their time factor and before the bound action. It may only write
///   those rows.
///
/// # Examples
///
/// An event that fires halfway through every step:
///
/// ```
/// use glam::Vec3;
/// use plume_behavior::{Event, TriggeredRows};
/// use plume_core::BehaviorError;
/// use plume_storage::AttributeArrays;
///
/// struct Halfway;
///
/// impl Event for Halfway {
///     fn name(&self) -> &str { "halfway" }
///
///     fn filter(
///         &self,
///         _attributes: &AttributeArrays<'_>,
///         rows: &[usize],
///         _displacement: &[Vec3],
///         triggered: &mut TriggeredRows,
///     ) -> Result<(), BehaviorError> {
///         for &row in rows {
///             triggered.push(row, 0.5);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Event: Send + Sync + 'static {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Push every row of `rows` that triggers within its displacement.
    fn filter(
        &self,
        attributes: &AttributeArrays<'_>,
        rows: &[usize],
        displacement: &[Vec3],
        triggered: &mut TriggeredRows,
    ) -> Result<(), BehaviorError>;

    /// Place freshly triggered `rows` exactly on the trigger surface.
    ///
    /// Advancing a row by a time factor lands it on the surface only up to
    /// rounding. Events with a geometric surface override this so that the
    /// row cannot end up on the wrong side. The default does nothing.
    fn settle(
        &self,
        _attributes: &mut AttributeArrays<'_>,
        _rows: &[usize],
    ) -> Result<(), BehaviorError> {
        Ok(())
    }
}

/// An event together with the action run on the rows it triggers.
pub struct EventBinding {
    event: Box<dyn Event>,
    action: Box<dyn Action>,
}

impl EventBinding {
    /// Bind `action` to `event`.
    pub fn new(event: impl Event, action: impl Action) -> Self {
        Self {
            event: Box::new(event),
            action: Box::new(action),
        }
    }

    /// The bound event.
    pub fn event(&self) -> &dyn Event {
        &*self.event
    }

    /// The action run on triggered rows.
    pub fn action(&self) -> &dyn Action {
        &*self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggered_rows_keep_pairs_aligned() {
        let mut t = TriggeredRows::new();
        t.push(2, 0.25);
        t.push(5, 1.0);
        assert_eq!(t.rows(), &[2, 5]);
        assert_eq!(t.factors(), &[0.25, 1.0]);
        assert_eq!(t.iter().collect::<Vec<_>>(), vec![(2, 0.25), (5, 1.0)]);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.factors().len(), 0);
    }
}
