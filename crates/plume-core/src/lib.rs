//! Core types for the Plume particle solver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental vocabulary shared by the rest of the workspace:
//! typed attribute IDs, the attribute schema, well-known attribute
//! names, and the error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attribute;
pub mod error;
pub mod id;

pub use attribute::{names, AttributeSet, AttributeType, AttributesInfo};
pub use error::{AttributeError, BehaviorError, StepError};
pub use id::{BlockId, ByteAttrId, Float3AttrId, FloatAttrId, StepId};
