//! Block-based columnar particle storage for the Plume particle solver.
//!
//! Particles live in fixed-capacity blocks. Each block owns one column
//! per schema attribute; a row index addresses the same particle in
//! every column.
//!
//! # Architecture
//!
//! ```text
//! ParticlesContainer (owner, block registry)
//! ├── Arc<AttributesInfo> (schema, shared by every block)
//! └── ParticlesBlock[] (fixed capacity, rows [0, active_amount) live)
//!     ├── Vec<u8>   per byte attribute
//!     ├── Vec<f32>  per float attribute
//!     └── Vec<Vec3> per float3 attribute
//!
//! AttributeArrays<'a> (non-owning row-range view over one block)
//! ```
//!
//! All storage is safe `Vec`-backed and zero-initialised.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arrays;
pub mod block;
pub mod container;
pub mod error;

pub use arrays::AttributeArrays;
pub use block::ParticlesBlock;
pub use container::{CompactionStats, ParticlesContainer};
pub use error::StorageError;
