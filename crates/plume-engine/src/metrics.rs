//! Per-step performance metrics for the solver.
//!
//! [`StepMetrics`] captures timing, population, and memory data for a
//! single step.

/// Timing, population, and memory metrics collected during one step.
///
/// All durations are in microseconds. The solver populates these fields
/// after each `step()` call and keeps the most recent set as
/// [`Solver::last_metrics`](crate::Solver::last_metrics).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Time spent integrating existing blocks, in microseconds.
    pub integrate_us: u64,
    /// Time spent removing dead particles, in microseconds.
    pub death_us: u64,
    /// Time spent emitting and integrating new particles, in microseconds.
    pub emit_us: u64,
    /// Time spent compacting blocks, in microseconds.
    pub compact_us: u64,
    /// Live particles after the step.
    pub particle_count: usize,
    /// Registered blocks after the step.
    pub block_count: usize,
    /// Particles emitted this step.
    pub born: usize,
    /// Particles removed this step.
    pub died: usize,
    /// Rows moved by compaction.
    pub moved_rows: usize,
    /// Blocks released by compaction.
    pub released_blocks: usize,
    /// Event triggers handled by actions this step.
    pub event_triggers: usize,
    /// Rows that ran out of event passes and finished without events.
    pub exhausted_rows: usize,
    /// Memory used by block storage after the step, in bytes.
    pub memory_bytes: usize,
}
