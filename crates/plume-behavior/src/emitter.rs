//! The [`Emitter`] trait and the types an emitter works through:
//! [`EmitterInfoBuilder`]/[`EmitterInfo`] for attribute declaration and
//! [`EmitterHelper`]/[`EmitterTarget`] for writing new particles.

use plume_core::{AttributeSet, AttributeType, BehaviorError, BlockId};
use plume_storage::{AttributeArrays, ParticlesContainer};
use rand_chacha::ChaCha8Rng;

/// Attributes one emitter declared it writes.
///
/// Every declared attribute becomes part of the solver's schema. On
/// emitted rows, attributes the emitter did not declare are zeroed by
/// the solver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmitterInfo {
    byte: AttributeSet,
    float: AttributeSet,
    float3: AttributeSet,
}

impl EmitterInfo {
    /// Declared byte attributes.
    pub fn byte(&self) -> &AttributeSet {
        &self.byte
    }

    /// Declared float attributes.
    pub fn float(&self) -> &AttributeSet {
        &self.float
    }

    /// Declared float3 attributes.
    pub fn float3(&self) -> &AttributeSet {
        &self.float3
    }

    /// Whether `name` was declared with type `kind`.
    pub fn declares(&self, name: &str, kind: AttributeType) -> bool {
        match kind {
            AttributeType::Byte => self.byte.contains(name),
            AttributeType::Float => self.float.contains(name),
            AttributeType::Float3 => self.float3.contains(name),
        }
    }
}

/// Collects an emitter's attribute declarations.
#[derive(Debug, Default)]
pub struct EmitterInfoBuilder {
    info: EmitterInfo,
}

impl EmitterInfoBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a byte attribute.
    pub fn use_byte(&mut self, name: impl Into<String>) -> &mut Self {
        self.info.byte.add(name);
        self
    }

    /// Declare a float attribute.
    pub fn use_float(&mut self, name: impl Into<String>) -> &mut Self {
        self.info.float.add(name);
        self
    }

    /// Declare a float3 attribute.
    pub fn use_float3(&mut self, name: impl Into<String>) -> &mut Self {
        self.info.float3.add(name);
        self
    }

    /// Finish declaring.
    pub fn build(self) -> EmitterInfo {
        self.info
    }
}

/// A fresh, not yet activated block handed to an emitter.
///
/// Rows written here become live only after the solver has initialised
/// and integrated them, and only up to the emitted amount.
pub struct EmitterTarget<'h> {
    attributes: AttributeArrays<'h>,
    emitted: &'h mut usize,
}

impl<'h> EmitterTarget<'h> {
    /// Writable view over every row of the target.
    pub fn attributes(&mut self) -> &mut AttributeArrays<'h> {
        &mut self.attributes
    }

    /// Maximum number of particles this target can take.
    pub fn capacity(&self) -> usize {
        self.attributes.len()
    }

    /// Number of rows, starting at row 0, that hold new particles.
    pub fn emitted_amount(&self) -> usize {
        *self.emitted
    }

    /// Declare how many rows, starting at row 0, hold new particles.
    ///
    /// # Panics
    ///
    /// Panics if `amount` exceeds [`capacity`](Self::capacity).
    pub fn set_emitted_amount(&mut self, amount: usize) {
        assert!(
            amount <= self.capacity(),
            "emitted amount {amount} exceeds target capacity {}",
            self.capacity()
        );
        *self.emitted = amount;
    }
}

/// Grants emitters access to new storage, the step clock, and the
/// simulation's seeded random source.
pub struct EmitterHelper<'a> {
    container: &'a mut ParticlesContainer,
    rng: &'a mut ChaCha8Rng,
    elapsed_seconds: f32,
    seconds_since_start: f32,
    granted: Vec<(BlockId, usize)>,
}

impl<'a> EmitterHelper<'a> {
    /// Create a helper for one emitter's call in the current step.
    pub fn new(
        container: &'a mut ParticlesContainer,
        rng: &'a mut ChaCha8Rng,
        elapsed_seconds: f32,
        seconds_since_start: f32,
    ) -> Self {
        Self {
            container,
            rng,
            elapsed_seconds,
            seconds_since_start,
            granted: Vec::new(),
        }
    }

    /// Allocate a new block and return it as an emission target.
    ///
    /// May be called any number of times; each call yields a whole new
    /// block of [`block_capacity`](Self::block_capacity) rows.
    pub fn request_target(&mut self) -> EmitterTarget<'_> {
        let block = self.container.new_block();
        let index = self.granted.len();
        self.granted.push((block.id(), 0));
        EmitterTarget {
            attributes: block.slice_all(),
            emitted: &mut self.granted[index].1,
        }
    }

    /// Rows per target.
    pub fn block_capacity(&self) -> usize {
        self.container.block_capacity()
    }

    /// Duration of the current step.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    /// Simulation time at the end of the current step.
    pub fn seconds_since_start(&self) -> f32 {
        self.seconds_since_start
    }

    /// The simulation's seeded random source.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut *self.rng
    }

    /// Blocks handed out so far, each with its emitted amount.
    pub fn into_granted(self) -> Vec<(BlockId, usize)> {
        self.granted
    }
}

/// A source of new particles, called once per step.
///
/// # Contract
///
/// - `info()` is called once at solver construction to declare the
///   attributes the emitter writes.
/// - `emit()` requests targets from the helper, writes rows starting at
///   row 0, and sets each target's emitted amount. Requested targets
///   left at amount 0 are released by the solver.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use plume_behavior::{Emitter, EmitterHelper, EmitterInfoBuilder};
/// use plume_core::{names, BehaviorError};
///
/// struct Origin;
///
/// impl Emitter for Origin {
///     fn name(&self) -> &str { "origin" }
///
///     fn info(&self, builder: &mut EmitterInfoBuilder) {
///         builder.use_float3(names::POSITION);
///     }
///
///     fn emit(&self, helper: &mut EmitterHelper<'_>) -> Result<(), BehaviorError> {
///         let mut target = helper.request_target();
///         target.attributes().float3_by_name_mut(names::POSITION)?[0] = Vec3::ZERO;
///         target.set_emitted_amount(1);
///         Ok(())
///     }
/// }
/// ```
pub trait Emitter: Send + Sync + 'static {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Declare the attributes this emitter writes.
    fn info(&self, builder: &mut EmitterInfoBuilder);

    /// Create this step's particles.
    fn emit(&self, helper: &mut EmitterHelper<'_>) -> Result<(), BehaviorError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use glam::Vec3;
    use plume_core::{names, AttributesInfo};
    use rand::SeedableRng;

    fn container() -> ParticlesContainer {
        let info = AttributesInfo::new(
            [names::KILL_STATE].into_iter().collect(),
            AttributeSet::new(),
            [names::POSITION].into_iter().collect(),
        )
        .unwrap();
        ParticlesContainer::new(Arc::new(info), 4).unwrap()
    }

    #[test]
    fn builder_collects_declarations() {
        let mut builder = EmitterInfoBuilder::new();
        builder.use_byte("Flag").use_float3(names::POSITION);
        let info = builder.build();
        assert!(info.declares("Flag", AttributeType::Byte));
        assert!(!info.declares("Flag", AttributeType::Float));
        assert_eq!(info.float3().len(), 1);
        assert!(info.float().is_empty());
    }

    #[test]
    fn each_request_grants_a_new_block() {
        let mut container = container();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut helper = EmitterHelper::new(&mut container, &mut rng, 0.1, 1.0);
        {
            let mut target = helper.request_target();
            assert_eq!(target.capacity(), 4);
            target.attributes().float3_by_name_mut(names::POSITION).unwrap()[0] = Vec3::Y;
            target.set_emitted_amount(1);
        }
        helper.request_target().set_emitted_amount(4);
        let granted = helper.into_granted();

        assert_eq!(granted.len(), 2);
        assert_eq!(granted[0].1, 1);
        assert_eq!(granted[1].1, 4);
        assert_ne!(granted[0].0, granted[1].0);
        // Targets are not activated by the helper.
        assert_eq!(container.block_count(), 2);
        assert_eq!(container.particle_amount(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds target capacity")]
    fn emitted_amount_is_bounded() {
        let mut container = container();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut helper = EmitterHelper::new(&mut container, &mut rng, 0.1, 1.0);
        helper.request_target().set_emitted_amount(5);
    }
}
