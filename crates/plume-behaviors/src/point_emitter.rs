//! Emits a fixed number of particles per step from a single point.
//!
//! Constructed via the builder pattern: [`PointEmitter::builder`].
//!
//! With a non-zero spread, each particle's position is jittered by a
//! uniform offset in `[-spread, spread]` per component, drawn from the
//! simulation's seeded random source, so runs with the same seed emit
//! identical particles.

use glam::Vec3;
use plume_behavior::{Emitter, EmitterHelper, EmitterInfoBuilder};
use plume_core::{names, BehaviorError};
use rand::Rng;

/// Emits `amount` particles per step at one point with one velocity.
#[derive(Clone, Debug, PartialEq)]
pub struct PointEmitter {
    amount: usize,
    position: Vec3,
    velocity: Vec3,
    spread: f32,
}

/// Builder for [`PointEmitter`].
///
/// Required field: `amount`.
pub struct PointEmitterBuilder {
    amount: Option<usize>,
    position: Vec3,
    velocity: Vec3,
    spread: f32,
}

impl PointEmitter {
    /// Create a new builder for configuring a `PointEmitter`.
    pub fn builder() -> PointEmitterBuilder {
        PointEmitterBuilder {
            amount: None,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            spread: 0.0,
        }
    }

    /// Particles emitted per step.
    pub fn amount(&self) -> usize {
        self.amount
    }

    fn jitter(&self, helper: &mut EmitterHelper<'_>, n: usize) -> Vec<Vec3> {
        if self.spread == 0.0 {
            return vec![self.position; n];
        }
        let rng = helper.rng();
        (0..n)
            .map(|_| {
                let u = Vec3::new(rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>());
                self.position + (u * 2.0 - Vec3::ONE) * self.spread
            })
            .collect()
    }
}

impl PointEmitterBuilder {
    /// Set the number of particles emitted per step.
    pub fn amount(mut self, amount: usize) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the emission point (default: origin).
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the initial velocity (default: zero).
    pub fn velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the per-component position jitter (default: 0). Must be >= 0.
    pub fn spread(mut self, spread: f32) -> Self {
        self.spread = spread;
        self
    }

    /// Build the emitter, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `amount` is not set
    /// - `position` or `velocity` has a non-finite component
    /// - `spread` is negative or not finite
    pub fn build(self) -> Result<PointEmitter, String> {
        let amount = self.amount.ok_or_else(|| "amount is required".to_string())?;

        if !self.position.is_finite() || !self.velocity.is_finite() {
            return Err("position and velocity must be finite".to_string());
        }

        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(format!(
                "spread must be finite and >= 0, got {}",
                self.spread
            ));
        }

        Ok(PointEmitter {
            amount,
            position: self.position,
            velocity: self.velocity,
            spread: self.spread,
        })
    }
}

impl Emitter for PointEmitter {
    fn name(&self) -> &str {
        "PointEmitter"
    }

    fn info(&self, builder: &mut EmitterInfoBuilder) {
        builder
            .use_float3(names::POSITION)
            .use_float3(names::VELOCITY);
    }

    fn emit(&self, helper: &mut EmitterHelper<'_>) -> Result<(), BehaviorError> {
        let mut remaining = self.amount;
        while remaining > 0 {
            let n = remaining.min(helper.block_capacity());
            let positions = self.jitter(helper, n);

            let mut target = helper.request_target();
            let attributes = target.attributes();
            attributes.float3_by_name_mut(names::POSITION)?[..n].copy_from_slice(&positions);
            attributes.float3_by_name_mut(names::VELOCITY)?[..n].fill(self.velocity);
            target.set_emitted_amount(n);

            remaining -= n;
        }
        Ok(())
    }
}
