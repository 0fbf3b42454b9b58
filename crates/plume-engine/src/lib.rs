//! Solver orchestrating Plume particle simulations.
//!
//! [`Solver`] owns the simulation state and advances it one step at a
//! time. Each [`step()`](Solver::step) runs a fixed pipeline:
//!
//! 1. Every block present at step start is integrated over the elapsed
//!    time, in parallel on the solver's worker pool. Integration is
//!    bounded by events: particles that trigger an event are advanced
//!    to the moment of the event, handled by its action, and then
//!    continue for the rest of the step.
//! 2. Particles flagged by Kill State are removed.
//! 3. Emitters create new particles, which are back-dated to a random
//!    birth time within the step and integrated up to the present.
//! 4. Blocks are compacted and empty blocks released.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
mod emission;
mod integrate;
pub mod metrics;
pub mod solver;
pub mod state;

pub use config::{ConfigError, SimulationConfig};
pub use metrics::StepMetrics;
pub use solver::{Solver, StepResult};
pub use state::{schema_for, SimulationState};
