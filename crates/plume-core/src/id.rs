//! Strongly-typed identifiers.

use std::fmt;

/// Index of a byte attribute within an [`AttributesInfo`](crate::AttributesInfo).
///
/// `ByteAttrId(n)` is the n-th byte attribute in schema order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteAttrId(pub u32);

/// Index of a float attribute within an [`AttributesInfo`](crate::AttributesInfo).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloatAttrId(pub u32);

/// Index of a float3 attribute within an [`AttributesInfo`](crate::AttributesInfo).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Float3AttrId(pub u32);

/// Identifies a block within one particles container.
///
/// Allocated monotonically by the container; a released block's ID is
/// never handed out again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

/// Monotonically increasing step counter.
///
/// Incremented each time the solver completes one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

macro_rules! impl_id_traits {
    ($ty:ident, $inner:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $ty {
            fn from(v: $inner) -> Self {
                Self(v)
            }
        }
    };
}

impl_id_traits!(ByteAttrId, u32);
impl_id_traits!(FloatAttrId, u32);
impl_id_traits!(Float3AttrId, u32);
impl_id_traits!(BlockId, u64);
impl_id_traits!(StepId, u64);

impl ByteAttrId {
    /// Position of this attribute's column in block storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FloatAttrId {
    /// Position of this attribute's column in block storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Float3AttrId {
    /// Position of this attribute's column in block storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
