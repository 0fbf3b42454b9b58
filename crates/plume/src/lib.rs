//! Plume: block-based particle simulation with event-bounded integration.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Plume sub-crates. For most users, adding `plume` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use glam::Vec3;
//! use plume::prelude::*;
//!
//! let emitter = PointEmitter::builder()
//!     .amount(100)
//!     .velocity(Vec3::new(0.0, 5.0, 0.0))
//!     .build()
//!     .unwrap();
//! let description = Description::new()
//!     .add_force(Gravity::default())
//!     .add_event(PlaneEvent::falling(0.0), StopAction::new().with_floor(0.0))
//!     .add_emitter(emitter);
//!
//! let mut solver = Solver::new(SimulationConfig::new(description).with_seed(1)).unwrap();
//! for _ in 0..10 {
//!     solver.step(0.1).unwrap();
//! }
//! assert_eq!(solver.particle_amount(), 1000);
//! assert!(solver.positions().iter().all(|p| p.y >= 0.0));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `plume-core` | Attribute schema, IDs, error types |
//! | [`storage`] | `plume-storage` | Blocks, attribute views, the container |
//! | [`behavior`] | `plume-behavior` | Force, event, action, and emitter traits |
//! | [`behaviors`] | `plume-behaviors` | Stock forces, planes, actions, emitters |
//! | [`engine`] | `plume-engine` | The solver, configuration, and metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Attribute schema, IDs, and error types (`plume-core`).
pub use plume_core as types;

/// Particle storage (`plume-storage`).
///
/// [`storage::ParticlesBlock`] holds fixed-capacity columns;
/// [`storage::AttributeArrays`] is the row view behaviors operate on.
pub use plume_storage as storage;

/// Behavior traits and the simulation description (`plume-behavior`).
///
/// [`behavior::Force`], [`behavior::Event`], [`behavior::Action`], and
/// [`behavior::Emitter`] are the extension points for user-defined
/// behavior.
pub use plume_behavior as behavior;

/// Stock behaviors (`plume-behaviors`).
pub use plume_behaviors as behaviors;

/// The solver (`plume-engine`).
pub use plume_engine as engine;

/// Common imports for typical Plume usage.
///
/// ```rust
/// use plume::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use plume_core::{names, AttributeType, AttributesInfo};

    // Errors
    pub use plume_core::{AttributeError, BehaviorError, StepError};

    // Storage
    pub use plume_storage::AttributeArrays;

    // Behavior traits
    pub use plume_behavior::{
        Action, Description, Emitter, EmitterHelper, EmitterInfoBuilder, Event, Force,
        TriggeredRows,
    };

    // Stock behaviors
    pub use plume_behaviors::{
        Axis, BounceAction, Drag, Gravity, KillAction, OffsetAction, PlaneEvent, PointEmitter,
        StopAction,
    };

    // Engine
    pub use plume_engine::{ConfigError, SimulationConfig, Solver, StepMetrics, StepResult};
}
