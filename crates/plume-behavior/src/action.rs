//! The [`Action`] trait.

use plume_core::BehaviorError;
use plume_storage::AttributeArrays;

/// A mutation applied to the rows an [`Event`](crate::Event) triggered on.
///
/// When an action runs, the particles have already been advanced to the
/// moment of the event. After it returns, the solver continues
/// integrating them for the rest of the step unless
/// [`halts`](Action::halts) or, per row, [`halts_row`](Action::halts_row)
/// returns `true`.
pub trait Action: Send + Sync + 'static {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Mutate exactly the given rows. `rows` is ascending.
    fn execute(&self, attributes: &mut AttributeArrays<'_>, rows: &[usize])
        -> Result<(), BehaviorError>;

    /// Whether handled particles spend the rest of the step at rest.
    ///
    /// Default: `false`.
    fn halts(&self) -> bool {
        false
    }

    /// Whether the particle in `row`, just handled by
    /// [`execute`](Action::execute), spends the rest of the step at rest.
    ///
    /// Default: [`halts`](Action::halts).
    fn halts_row(&self, _attributes: &AttributeArrays<'_>, _row: usize) -> bool {
        self.halts()
    }
}
