//! Row-range views over a block's attribute columns.

use glam::Vec3;
use plume_core::{AttributeError, AttributesInfo, ByteAttrId, Float3AttrId, FloatAttrId};
use smallvec::SmallVec;

type Columns<'a, T> = SmallVec<[&'a mut [T]; 4]>;

/// A mutable view over every attribute column of one block, restricted
/// to a contiguous row range.
///
/// Does not own storage: it aliases the columns of the
/// [`ParticlesBlock`](crate::ParticlesBlock) it was sliced from, so the
/// block stays mutably borrowed while the view is alive. Row `0` of the
/// view is the first row of the range.
pub struct AttributeArrays<'a> {
    info: &'a AttributesInfo,
    len: usize,
    bytes: Columns<'a, u8>,
    floats: Columns<'a, f32>,
    float3s: Columns<'a, Vec3>,
}

fn front<T>(column: &mut [T], n: usize) -> &mut [T] {
    &mut column[..n]
}

impl<'a> AttributeArrays<'a> {
    pub(crate) fn new(
        info: &'a AttributesInfo,
        len: usize,
        bytes: Columns<'a, u8>,
        floats: Columns<'a, f32>,
        float3s: Columns<'a, Vec3>,
    ) -> Self {
        debug_assert_eq!(bytes.len(), info.byte_count());
        debug_assert_eq!(floats.len(), info.float_count());
        debug_assert_eq!(float3s.len(), info.float3_count());
        Self {
            info,
            len,
            bytes,
            floats,
            float3s,
        }
    }

    /// The schema of the underlying block.
    pub fn info(&self) -> &'a AttributesInfo {
        self.info
    }

    /// Number of rows in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view has no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Narrow the view to its first `n` rows.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`len`](Self::len).
    pub fn take_front(self, n: usize) -> Self {
        assert!(
            n <= self.len,
            "take_front({n}) on a view of {} rows",
            self.len
        );
        Self {
            info: self.info,
            len: n,
            bytes: self.bytes.into_iter().map(|c| front(c, n)).collect(),
            floats: self.floats.into_iter().map(|c| front(c, n)).collect(),
            float3s: self.float3s.into_iter().map(|c| front(c, n)).collect(),
        }
    }

    /// Byte column by ID.
    pub fn byte(&self, id: ByteAttrId) -> &[u8] {
        &self.bytes[id.index()][..]
    }

    /// Mutable byte column by ID.
    pub fn byte_mut(&mut self, id: ByteAttrId) -> &mut [u8] {
        &mut self.bytes[id.index()][..]
    }

    /// Float column by ID.
    pub fn float(&self, id: FloatAttrId) -> &[f32] {
        &self.floats[id.index()][..]
    }

    /// Mutable float column by ID.
    pub fn float_mut(&mut self, id: FloatAttrId) -> &mut [f32] {
        &mut self.floats[id.index()][..]
    }

    /// Float3 column by ID.
    pub fn float3(&self, id: Float3AttrId) -> &[Vec3] {
        &self.float3s[id.index()][..]
    }

    /// Mutable float3 column by ID.
    pub fn float3_mut(&mut self, id: Float3AttrId) -> &mut [Vec3] {
        &mut self.float3s[id.index()][..]
    }

    /// Reset a byte column to zero over the whole view.
    pub fn zero_byte(&mut self, id: ByteAttrId) {
        self.byte_mut(id).fill(0);
    }

    /// Reset a float column to zero over the whole view.
    pub fn zero_float(&mut self, id: FloatAttrId) {
        self.float_mut(id).fill(0.0);
    }

    /// Reset a float3 column to zero over the whole view.
    pub fn zero_float3(&mut self, id: Float3AttrId) {
        self.float3_mut(id).fill(Vec3::ZERO);
    }

    /// Byte column by name.
    pub fn byte_by_name(&self, name: &str) -> Result<&[u8], AttributeError> {
        let id = self.info.require_byte(name)?;
        Ok(self.byte(id))
    }

    /// Mutable byte column by name.
    pub fn byte_by_name_mut(&mut self, name: &str) -> Result<&mut [u8], AttributeError> {
        let id = self.info.require_byte(name)?;
        Ok(self.byte_mut(id))
    }

    /// Float column by name.
    pub fn float_by_name(&self, name: &str) -> Result<&[f32], AttributeError> {
        let id = self.info.require_float(name)?;
        Ok(self.float(id))
    }

    /// Mutable float column by name.
    pub fn float_by_name_mut(&mut self, name: &str) -> Result<&mut [f32], AttributeError> {
        let id = self.info.require_float(name)?;
        Ok(self.float_mut(id))
    }

    /// Float3 column by name.
    pub fn float3_by_name(&self, name: &str) -> Result<&[Vec3], AttributeError> {
        let id = self.info.require_float3(name)?;
        Ok(self.float3(id))
    }

    /// Mutable float3 column by name.
    pub fn float3_by_name_mut(&mut self, name: &str) -> Result<&mut [Vec3], AttributeError> {
        let id = self.info.require_float3(name)?;
        Ok(self.float3_mut(id))
    }
}
