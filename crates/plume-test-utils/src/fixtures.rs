//! Reusable behavior fixtures.
//!
//! - [`ConstantForce`] adds the same acceleration to every particle.
//! - [`FailingForce`] always fails.
//! - [`UniformEvent`] triggers every masked row at one time factor.
//! - [`ScriptedEvent`] reports a fixed list of triggers, masked or not.
//! - [`CountingAction`] counts calls and handled rows.
//! - [`MarkingAction`] sets a byte attribute, then delegates.
//! - [`FixedEmitter`] emits a fixed particle list, every step or once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec3;
use plume_behavior::{
    Action, Emitter, EmitterHelper, EmitterInfoBuilder, Event, Force, TriggeredRows,
};
use plume_core::{names, BehaviorError};
use plume_storage::AttributeArrays;

/// Adds a constant acceleration.
pub struct ConstantForce(pub Vec3);

impl Force for ConstantForce {
    fn name(&self) -> &str {
        "constant_force"
    }

    fn add_force(
        &self,
        _attributes: &AttributeArrays<'_>,
        _rows: &[usize],
        dst: &mut [Vec3],
    ) -> Result<(), BehaviorError> {
        for f in dst {
            *f += self.0;
        }
        Ok(())
    }
}

/// Fails on every call.
pub struct FailingForce;

impl Force for FailingForce {
    fn name(&self) -> &str {
        "failing_force"
    }

    fn add_force(
        &self,
        _attributes: &AttributeArrays<'_>,
        _rows: &[usize],
        _dst: &mut [Vec3],
    ) -> Result<(), BehaviorError> {
        Err(BehaviorError::ExecutionFailed {
            reason: "deliberate failure".to_string(),
        })
    }
}

/// Triggers every masked row that moves at all, at `factor`.
pub struct UniformEvent {
    pub name: String,
    pub factor: f32,
}

impl UniformEvent {
    pub fn new(name: impl Into<String>, factor: f32) -> Self {
        Self {
            name: name.into(),
            factor,
        }
    }
}

impl Event for UniformEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn filter(
        &self,
        _attributes: &AttributeArrays<'_>,
        rows: &[usize],
        displacement: &[Vec3],
        triggered: &mut TriggeredRows,
    ) -> Result<(), BehaviorError> {
        for (&row, d) in rows.iter().zip(displacement) {
            if *d != Vec3::ZERO {
                triggered.push(row, self.factor);
            }
        }
        Ok(())
    }
}

/// Reports the same `(row, time_factor)` list on every call, ignoring
/// the mask. Used to check that broken event output is rejected.
pub struct ScriptedEvent {
    pub script: Vec<(usize, f32)>,
}

impl ScriptedEvent {
    pub fn new(script: Vec<(usize, f32)>) -> Self {
        Self { script }
    }
}

impl Event for ScriptedEvent {
    fn name(&self) -> &str {
        "scripted_event"
    }

    fn filter(
        &self,
        _attributes: &AttributeArrays<'_>,
        _rows: &[usize],
        _displacement: &[Vec3],
        triggered: &mut TriggeredRows,
    ) -> Result<(), BehaviorError> {
        for &(row, factor) in &self.script {
            triggered.push(row, factor);
        }
        Ok(())
    }
}

/// Counts executions and handled rows without touching attributes.
///
/// The counters are shared, so a clone kept by the test observes calls
/// made through the solver.
#[derive(Clone, Default)]
pub struct CountingAction {
    calls: Arc<AtomicUsize>,
    rows: Arc<AtomicUsize>,
    halts: bool,
}

impl CountingAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// A counting action that also halts handled particles.
    pub fn halting() -> Self {
        Self {
            halts: true,
            ..Self::default()
        }
    }

    /// How many times `execute()` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Total rows handled across calls.
    pub fn rows(&self) -> usize {
        self.rows.load(Ordering::Relaxed)
    }
}

impl Action for CountingAction {
    fn name(&self) -> &str {
        "counting_action"
    }

    fn execute(
        &self,
        _attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
    ) -> Result<(), BehaviorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.rows.fetch_add(rows.len(), Ordering::Relaxed);
        Ok(())
    }

    fn halts(&self) -> bool {
        self.halts
    }
}

/// Sets byte attribute `attribute` to 1 on handled rows, then runs
/// `inner`.
pub struct MarkingAction<A> {
    pub attribute: String,
    pub inner: A,
}

impl<A: Action> MarkingAction<A> {
    pub fn new(attribute: impl Into<String>, inner: A) -> Self {
        Self {
            attribute: attribute.into(),
            inner,
        }
    }
}

impl<A: Action> Action for MarkingAction<A> {
    fn name(&self) -> &str {
        "marking_action"
    }

    fn execute(
        &self,
        attributes: &mut AttributeArrays<'_>,
        rows: &[usize],
    ) -> Result<(), BehaviorError> {
        let marks = attributes.byte_by_name_mut(&self.attribute)?;
        for &row in rows {
            marks[row] = 1;
        }
        self.inner.execute(attributes, rows)
    }

    fn halts(&self) -> bool {
        self.inner.halts()
    }

    fn halts_row(&self, attributes: &AttributeArrays<'_>, row: usize) -> bool {
        self.inner.halts_row(attributes, row)
    }
}

/// Emits a fixed list of `(position, velocity)` particles.
///
/// Optionally declares one extra byte attribute and writes `value` into
/// it for every emitted particle.
pub struct FixedEmitter {
    particles: Vec<(Vec3, Vec3)>,
    byte: Option<(String, u8)>,
    once: bool,
    done: AtomicBool,
}

impl FixedEmitter {
    /// Emit `particles` on every step.
    pub fn new(particles: Vec<(Vec3, Vec3)>) -> Self {
        Self {
            particles,
            byte: None,
            once: false,
            done: AtomicBool::new(false),
        }
    }

    /// Emit `particles` on the first step only.
    pub fn once(particles: Vec<(Vec3, Vec3)>) -> Self {
        Self {
            once: true,
            ..Self::new(particles)
        }
    }

    /// Also declare byte attribute `name` and set it to `value`.
    pub fn with_byte(mut self, name: impl Into<String>, value: u8) -> Self {
        self.byte = Some((name.into(), value));
        self
    }
}

impl Emitter for FixedEmitter {
    fn name(&self) -> &str {
        "fixed_emitter"
    }

    fn info(&self, builder: &mut EmitterInfoBuilder) {
        builder
            .use_float3(names::POSITION)
            .use_float3(names::VELOCITY);
        if let Some((name, _)) = &self.byte {
            builder.use_byte(name.as_str());
        }
    }

    fn emit(&self, helper: &mut EmitterHelper<'_>) -> Result<(), BehaviorError> {
        if self.once && self.done.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        let mut rest = &self.particles[..];
        while !rest.is_empty() {
            let mut target = helper.request_target();
            let n = rest.len().min(target.capacity());
            let (chunk, tail) = rest.split_at(n);
            let attributes = target.attributes();
            let positions = attributes.float3_by_name_mut(names::POSITION)?;
            for (dst, (p, _)) in positions.iter_mut().zip(chunk) {
                *dst = *p;
            }
            let velocities = attributes.float3_by_name_mut(names::VELOCITY)?;
            for (dst, (_, v)) in velocities.iter_mut().zip(chunk) {
                *dst = *v;
            }
            if let Some((name, value)) = &self.byte {
                attributes.byte_by_name_mut(name)?[..n].fill(*value);
            }
            target.set_emitted_amount(n);
            rest = tail;
        }
        Ok(())
    }
}
