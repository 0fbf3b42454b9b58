//! Behavior traits for the Plume particle solver.
//!
//! A simulation is described by four kinds of pluggable collaborators,
//! all stateless (`&self`) and shared read-only across worker threads:
//!
//! - [`Force`]: adds an acceleration contribution per particle.
//! - [`Event`]: detects, against a tentative displacement, whether and
//!   when within the remaining time a particle hits a condition.
//! - [`Action`]: mutates the particles an event triggered on.
//! - [`Emitter`]: creates new particles once per step.
//!
//! A [`Description`] bundles the ordered collaborators handed to the
//! solver.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod description;
pub mod emitter;
pub mod event;
pub mod force;

pub use action::Action;
pub use description::Description;
pub use emitter::{Emitter, EmitterHelper, EmitterInfo, EmitterInfoBuilder, EmitterTarget};
pub use event::{Event, EventBinding, TriggeredRows};
pub use force::Force;
