//! Reference behaviors for the Plume particle solver.
//!
//! Small, composable building blocks that cover the common cases:
//!
//! - Forces: [`Gravity`], [`Drag`].
//! - Events: [`PlaneEvent`] (axis-aligned plane crossing, either
//!   direction).
//! - Actions: [`OffsetAction`], [`StopAction`], [`BounceAction`],
//!   [`KillAction`].
//! - Emitters: [`PointEmitter`].
//!
//! A classic fountain: particles leave a point upward, fall under
//! gravity, and come to rest on the ground.
//!
//! ```
//! use glam::Vec3;
//! use plume_behavior::Description;
//! use plume_behaviors::{Gravity, PlaneEvent, PointEmitter, StopAction};
//!
//! let description = Description::new()
//!     .add_force(Gravity::default())
//!     .add_event(PlaneEvent::falling(0.0), StopAction::new().with_floor(0.0))
//!     .add_emitter(
//!         PointEmitter::builder()
//!             .amount(10)
//!             .velocity(Vec3::new(0.0, 5.0, 0.0))
//!             .build()
//!             .unwrap(),
//!     );
//! assert_eq!(description.forces().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod actions;
pub mod drag;
pub mod gravity;
pub mod plane;
pub mod point_emitter;

pub use actions::{BounceAction, KillAction, OffsetAction, StopAction, DEFAULT_REST_SPEED};
pub use drag::Drag;
pub use gravity::Gravity;
pub use plane::{Axis, Crossing, PlaneEvent};
pub use point_emitter::{PointEmitter, PointEmitterBuilder};
