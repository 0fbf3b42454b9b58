//! Attribute definitions, the [`AttributeSet`] name set, and the
//! [`AttributesInfo`] schema.

use indexmap::IndexSet;

use crate::error::AttributeError;
use crate::id::{ByteAttrId, Float3AttrId, FloatAttrId};

/// Names of the attributes every particle carries.
pub mod names {
    /// Byte attribute: `1` marks the particle for removal after the step.
    pub const KILL_STATE: &str = "Kill State";
    /// Float attribute: simulation time at which the particle was born.
    pub const BIRTH_TIME: &str = "Birth Time";
    /// Float3 attribute: world-space position.
    pub const POSITION: &str = "Position";
    /// Float3 attribute: world-space velocity.
    pub const VELOCITY: &str = "Velocity";
}

/// Classification of an attribute's per-particle storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// One `u8` per particle.
    Byte,
    /// One `f32` per particle.
    Float,
    /// Three `f32` components per particle.
    Float3,
}

impl AttributeType {
    /// Size in bytes of one particle's value.
    pub fn size_of(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Float => 4,
            Self::Float3 => 12,
        }
    }
}

/// An ordered set of attribute names.
///
/// Keeps first-insertion order and silently drops duplicates. Used to
/// assemble schemas and emitter declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeSet {
    names: IndexSet<String>,
}

impl AttributeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name. Returns `false` if it was already present.
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Insert every name from `other`, keeping the order of first insertion.
    pub fn add_all(&mut self, other: &AttributeSet) {
        for name in other.iter() {
            self.names.insert(name.to_string());
        }
    }

    /// Whether `name` is in the set.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of names in the set.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set has no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over the names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.add(name);
        }
        set
    }
}

/// Immutable attribute schema shared by all blocks of one container.
///
/// Holds three ordered, name-unique lists (byte, float, float3). An
/// attribute's position in its list is its stable ID. A name may appear
/// in at most one of the three lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributesInfo {
    byte: AttributeSet,
    float: AttributeSet,
    float3: AttributeSet,
}

impl AttributesInfo {
    /// Build a schema from the three name sets.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::KindConflict`] if a name is used by more
    /// than one attribute type.
    pub fn new(
        byte: AttributeSet,
        float: AttributeSet,
        float3: AttributeSet,
    ) -> Result<Self, AttributeError> {
        let info = Self {
            byte,
            float,
            float3,
        };
        for (name, kind) in info.iter() {
            for other in [AttributeType::Byte, AttributeType::Float, AttributeType::Float3] {
                if other != kind && info.set_of(other).contains(name) {
                    return Err(AttributeError::KindConflict {
                        name: name.to_string(),
                        first: kind,
                        second: other,
                    });
                }
            }
        }
        Ok(info)
    }

    fn set_of(&self, kind: AttributeType) -> &AttributeSet {
        match kind {
            AttributeType::Byte => &self.byte,
            AttributeType::Float => &self.float,
            AttributeType::Float3 => &self.float3,
        }
    }

    /// Look up a byte attribute by name.
    pub fn byte_id(&self, name: &str) -> Option<ByteAttrId> {
        self.byte.names.get_index_of(name).map(|i| ByteAttrId(i as u32))
    }

    /// Look up a float attribute by name.
    pub fn float_id(&self, name: &str) -> Option<FloatAttrId> {
        self.float.names.get_index_of(name).map(|i| FloatAttrId(i as u32))
    }

    /// Look up a float3 attribute by name.
    pub fn float3_id(&self, name: &str) -> Option<Float3AttrId> {
        self.float3
            .names
            .get_index_of(name)
            .map(|i| Float3AttrId(i as u32))
    }

    /// Like [`byte_id`](Self::byte_id), but fails with [`AttributeError::Unknown`].
    pub fn require_byte(&self, name: &str) -> Result<ByteAttrId, AttributeError> {
        self.byte_id(name)
            .ok_or_else(|| AttributeError::unknown(name, AttributeType::Byte))
    }

    /// Like [`float_id`](Self::float_id), but fails with [`AttributeError::Unknown`].
    pub fn require_float(&self, name: &str) -> Result<FloatAttrId, AttributeError> {
        self.float_id(name)
            .ok_or_else(|| AttributeError::unknown(name, AttributeType::Float))
    }

    /// Like [`float3_id`](Self::float3_id), but fails with [`AttributeError::Unknown`].
    pub fn require_float3(&self, name: &str) -> Result<Float3AttrId, AttributeError> {
        self.float3_id(name)
            .ok_or_else(|| AttributeError::unknown(name, AttributeType::Float3))
    }

    /// Name of a byte attribute. Panics if `id` is not in this schema.
    pub fn byte_name(&self, id: ByteAttrId) -> &str {
        &self.byte.names[id.index()]
    }

    /// Name of a float attribute. Panics if `id` is not in this schema.
    pub fn float_name(&self, id: FloatAttrId) -> &str {
        &self.float.names[id.index()]
    }

    /// Name of a float3 attribute. Panics if `id` is not in this schema.
    pub fn float3_name(&self, id: Float3AttrId) -> &str {
        &self.float3.names[id.index()]
    }

    /// All byte attribute IDs in schema order.
    pub fn byte_ids(&self) -> impl Iterator<Item = ByteAttrId> {
        (0..self.byte.len() as u32).map(ByteAttrId)
    }

    /// All float attribute IDs in schema order.
    pub fn float_ids(&self) -> impl Iterator<Item = FloatAttrId> {
        (0..self.float.len() as u32).map(FloatAttrId)
    }

    /// All float3 attribute IDs in schema order.
    pub fn float3_ids(&self) -> impl Iterator<Item = Float3AttrId> {
        (0..self.float3.len() as u32).map(Float3AttrId)
    }

    /// Number of byte attributes.
    pub fn byte_count(&self) -> usize {
        self.byte.len()
    }

    /// Number of float attributes.
    pub fn float_count(&self) -> usize {
        self.float.len()
    }

    /// Number of float3 attributes.
    pub fn float3_count(&self) -> usize {
        self.float3.len()
    }

    /// Total number of attributes across all types.
    pub fn len(&self) -> usize {
        self.byte.len() + self.float.len() + self.float3.len()
    }

    /// Whether the schema has no attributes at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes of storage one particle occupies across all columns.
    pub fn bytes_per_particle(&self) -> usize {
        self.byte.len() * AttributeType::Byte.size_of()
            + self.float.len() * AttributeType::Float.size_of()
            + self.float3.len() * AttributeType::Float3.size_of()
    }

    /// Iterate over `(name, type)` for every attribute: bytes, then
    /// floats, then float3s.
    pub fn iter(&self) -> impl Iterator<Item = (&str, AttributeType)> {
        self.byte
            .iter()
            .map(|n| (n, AttributeType::Byte))
            .chain(self.float.iter().map(|n| (n, AttributeType::Float)))
            .chain(self.float3.iter().map(|n| (n, AttributeType::Float3)))
    }
}
