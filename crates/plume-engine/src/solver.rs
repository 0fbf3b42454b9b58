//! The solver: owns the simulation and runs the step pipeline.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use plume_behavior::EmitterInfo;
use plume_core::{AttributeError, AttributesInfo, StepError, StepId};
use rayon::prelude::*;

use crate::config::{ConfigError, SimulationConfig};
use crate::emission::emit_all;
use crate::integrate::{SliceStats, SliceStepper};
use crate::metrics::StepMetrics;
use crate::state::{schema_for, CoreAttributes, SimulationState};

// ── StepResult ───────────────────────────────────────────────────

/// Result of a successful [`Solver::step()`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// Number of the completed step, starting at 1.
    pub step: StepId,
    /// Performance metrics for this step.
    pub metrics: StepMetrics,
}

// ── Solver ───────────────────────────────────────────────────────

/// Owns a particle simulation and advances it step by step.
///
/// Block integration runs on a dedicated worker pool; every other stage
/// runs on the calling thread.
///
/// # Examples
///
/// ```
/// use plume_behavior::Description;
/// use plume_engine::{SimulationConfig, Solver};
///
/// let mut solver = Solver::new(SimulationConfig::new(Description::new())).unwrap();
/// solver.step(0.1).unwrap();
/// assert_eq!(solver.particle_amount(), 0);
/// assert!((solver.seconds_since_start() - 0.1).abs() < 1e-6);
/// ```
pub struct Solver {
    config: SimulationConfig,
    info: Arc<AttributesInfo>,
    declarations: Vec<EmitterInfo>,
    ids: CoreAttributes,
    state: SimulationState,
    pool: rayon::ThreadPool,
    last_metrics: StepMetrics,
}

impl Solver {
    /// Validate `config`, assemble the schema, and create empty state.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let declarations = config.description.emitter_infos();
        let info = Arc::new(schema_for(&declarations)?);
        let ids = CoreAttributes::resolve(&info)?;
        let state = SimulationState::new(Arc::clone(&info), config.block_capacity, config.seed)?;

        let workers = config.resolved_worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("plume-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool {
                reason: e.to_string(),
            })?;

        tracing::debug!(
            workers,
            attributes = info.len(),
            block_capacity = config.block_capacity,
            "solver initialised"
        );

        Ok(Self {
            config,
            info,
            declarations,
            ids,
            state,
            pool,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Advance the simulation by `elapsed_seconds`.
    ///
    /// On error the step is abandoned part-way; the state should be
    /// [`reset`](Self::reset) or the solver discarded.
    pub fn step(&mut self, elapsed_seconds: f32) -> Result<StepResult, StepError> {
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(StepError::InvalidElapsed {
                value: elapsed_seconds,
            });
        }
        let step_start = Instant::now();
        self.state.seconds_since_start += elapsed_seconds;
        let now = self.state.seconds_since_start;

        let stepper = SliceStepper::new(
            &self.config.description,
            self.ids,
            self.config.max_age,
            self.config.max_event_passes,
        );

        // 1. Integrate every block present at step start.
        let integrate_start = Instant::now();
        let blocks = self.state.container.blocks_mut();
        let slice = self.pool.install(|| {
            blocks
                .par_iter_mut()
                .map(|block| {
                    let durations = vec![elapsed_seconds; block.active_amount()];
                    stepper.step_slice(&mut block.slice_active(), &durations, now)
                })
                .try_reduce(SliceStats::default, |a, b| Ok(a.merge(b)))
        })?;
        let integrate_us = integrate_start.elapsed().as_micros() as u64;

        // 2. Remove dead particles. No block has been added since 1.
        let death_start = Instant::now();
        let kill = self.ids.kill;
        let died: usize = self
            .state
            .container
            .blocks_mut()
            .iter_mut()
            .map(|block| block.remove_flagged(kill))
            .sum();
        let death_us = death_start.elapsed().as_micros() as u64;

        // 3. Emit.
        let emit_start = Instant::now();
        let emission = emit_all(
            &self.config.description,
            &self.declarations,
            &stepper,
            self.ids,
            &mut self.state,
            elapsed_seconds,
        )?;
        let emit_us = emit_start.elapsed().as_micros() as u64;

        // 4. Compact.
        let compact_start = Instant::now();
        let compaction = self.state.container.compact();
        let compact_us = compact_start.elapsed().as_micros() as u64;

        self.state.step = StepId(self.state.step.0 + 1);
        let exhausted_rows = slice.exhausted_rows + emission.slice.exhausted_rows;
        let metrics = StepMetrics {
            total_us: step_start.elapsed().as_micros() as u64,
            integrate_us,
            death_us,
            emit_us,
            compact_us,
            particle_count: self.state.container.particle_amount(),
            block_count: self.state.container.block_count(),
            born: emission.born,
            died,
            moved_rows: compaction.moved_rows,
            released_blocks: compaction.released_blocks,
            event_triggers: slice.event_triggers + emission.slice.event_triggers,
            exhausted_rows,
            memory_bytes: self.state.container.memory_bytes(),
        };

        if exhausted_rows > 0 {
            tracing::warn!(
                step = %self.state.step,
                rows = exhausted_rows,
                passes = self.config.max_event_passes,
                "event pass limit reached; remaining time integrated without events"
            );
        }
        tracing::debug!(
            step = %self.state.step,
            particles = metrics.particle_count,
            blocks = metrics.block_count,
            born = metrics.born,
            died = metrics.died,
            "step complete"
        );

        self.last_metrics = metrics.clone();
        Ok(StepResult {
            step: self.state.step,
            metrics,
        })
    }

    /// Discard every particle and restart the clock and random source.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        self.state = SimulationState::new(
            Arc::clone(&self.info),
            self.config.block_capacity,
            self.config.seed,
        )?;
        self.last_metrics = StepMetrics::default();
        Ok(())
    }

    /// Live particles across all blocks.
    pub fn particle_amount(&self) -> usize {
        self.state.container.particle_amount()
    }

    /// Copy every live particle's position into `dst` as consecutive
    /// `x, y, z` triples, block by block.
    ///
    /// # Panics
    ///
    /// Panics unless `dst.len() == 3 * particle_amount()`.
    pub fn get_positions(&self, dst: &mut [f32]) {
        let expected = 3 * self.particle_amount();
        assert_eq!(
            dst.len(),
            expected,
            "position buffer holds {} floats, expected {expected}",
            dst.len()
        );
        let mut chunks = dst.chunks_exact_mut(3);
        for block in self.state.container.active_blocks() {
            for (p, out) in block
                .active_float3(self.ids.position)
                .iter()
                .zip(&mut chunks)
            {
                out.copy_from_slice(&p.to_array());
            }
        }
    }

    /// Every live particle's position, block by block.
    pub fn positions(&self) -> Vec<Vec3> {
        self.state
            .container
            .active_blocks()
            .flat_map(|b| b.active_float3(self.ids.position).iter().copied())
            .collect()
    }

    /// A float3 attribute of every live particle, in the order of
    /// [`positions`](Self::positions).
    pub fn read_float3(&self, name: &str) -> Result<Vec<Vec3>, AttributeError> {
        let id = self.info.require_float3(name)?;
        Ok(self
            .state
            .container
            .active_blocks()
            .flat_map(|b| b.active_float3(id).iter().copied())
            .collect())
    }

    /// A float attribute of every live particle, in the order of
    /// [`positions`](Self::positions).
    pub fn read_float(&self, name: &str) -> Result<Vec<f32>, AttributeError> {
        let id = self.info.require_float(name)?;
        Ok(self
            .state
            .container
            .active_blocks()
            .flat_map(|b| b.active_float(id).iter().copied())
            .collect())
    }

    /// A byte attribute of every live particle, in the order of
    /// [`positions`](Self::positions).
    pub fn read_byte(&self, name: &str) -> Result<Vec<u8>, AttributeError> {
        let id = self.info.require_byte(name)?;
        Ok(self
            .state
            .container
            .active_blocks()
            .flat_map(|b| b.active_byte(id).iter().copied())
            .collect())
    }

    /// Simulation time, in seconds.
    pub fn seconds_since_start(&self) -> f32 {
        self.state.seconds_since_start
    }

    /// Number of registered blocks.
    pub fn block_count(&self) -> usize {
        self.state.container.block_count()
    }

    /// Metrics from the most recent successful step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The attribute schema.
    pub fn attributes(&self) -> &AttributesInfo {
        &self.info
    }

    /// The simulation state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The configuration the solver was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("config", &self.config)
            .field("attributes", &self.info.len())
            .field("particles", &self.particle_amount())
            .field("blocks", &self.block_count())
            .field("seconds_since_start", &self.state.seconds_since_start)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_behavior::Description;
    use plume_core::names;
    use plume_test_utils::{approx_eq, ConstantForce, FailingForce, FixedEmitter};

    fn solver(description: Description) -> Solver {
        Solver::new(
            SimulationConfig::new(description)
                .with_seed(7)
                .with_worker_count(2),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_elapsed() {
        let mut s = solver(Description::new());
        for value in [-0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                s.step(value),
                Err(StepError::InvalidElapsed { .. })
            ));
        }
        assert_eq!(s.seconds_since_start(), 0.0);
    }

    #[test]
    fn zero_elapsed_is_allowed() {
        let mut s = solver(Description::new().add_emitter(FixedEmitter::new(vec![(
            Vec3::ZERO,
            Vec3::X,
        )])));
        s.step(0.0).unwrap();
        assert_eq!(s.particle_amount(), 1);
        assert_eq!(s.positions(), vec![Vec3::ZERO]);
    }

    #[test]
    fn step_counter_and_metrics() {
        let mut s = solver(Description::new().add_emitter(FixedEmitter::new(vec![
            (Vec3::ZERO, Vec3::ZERO);
            3
        ])));
        let first = s.step(0.1).unwrap();
        let second = s.step(0.1).unwrap();
        assert_eq!(first.step, StepId(1));
        assert_eq!(second.step, StepId(2));
        assert_eq!(second.metrics.born, 3);
        assert_eq!(second.metrics.particle_count, 6);
        assert_eq!(s.last_metrics(), &second.metrics);
        assert!(s.last_metrics().memory_bytes > 0);
    }

    #[test]
    fn get_positions_flattens_in_block_order() {
        let mut s = solver(Description::new().add_emitter(FixedEmitter::once(vec![
            (Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO),
            (Vec3::new(4.0, 5.0, 6.0), Vec3::ZERO),
        ])));
        s.step(0.1).unwrap();
        let mut buf = vec![0.0; 6];
        s.get_positions(&mut buf);
        let mut triples: Vec<[f32; 3]> = buf.chunks(3).map(|c| [c[0], c[1], c[2]]).collect();
        triples.sort_by(|a, b| a[0].total_cmp(&b[0]));
        assert_eq!(triples, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    #[should_panic(expected = "position buffer")]
    fn get_positions_checks_length() {
        let mut s = solver(Description::new().add_emitter(FixedEmitter::once(vec![(
            Vec3::ZERO,
            Vec3::ZERO,
        )])));
        s.step(0.1).unwrap();
        let mut buf = vec![0.0; 2];
        s.get_positions(&mut buf);
    }

    #[test]
    fn behavior_failure_aborts_step() {
        let mut s = solver(
            Description::new()
                .add_force(FailingForce)
                .add_emitter(FixedEmitter::new(vec![(Vec3::ZERO, Vec3::ZERO)])),
        );
        // The first step only emits, and emitted particles are integrated too.
        match s.step(0.1) {
            Err(StepError::BehaviorFailed { name, .. }) => assert_eq!(name, "failing_force"),
            other => panic!("expected BehaviorFailed, got {other:?}"),
        }
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut s = solver(
            Description::new()
                .add_force(ConstantForce(Vec3::X))
                .add_emitter(FixedEmitter::new(vec![(Vec3::ZERO, Vec3::ZERO)])),
        );
        s.step(0.1).unwrap();
        s.step(0.1).unwrap();
        s.reset().unwrap();
        assert_eq!(s.particle_amount(), 0);
        assert_eq!(s.block_count(), 0);
        assert_eq!(s.seconds_since_start(), 0.0);
        assert_eq!(s.state().step(), StepId(0));
        assert_eq!(s.last_metrics(), &StepMetrics::default());
    }

    #[test]
    fn reads_attributes_by_name() {
        let mut s = solver(Description::new().add_emitter(
            FixedEmitter::once(vec![(Vec3::ZERO, Vec3::Y)]).with_byte("Tag", 3),
        ));
        s.step(0.5).unwrap();
        assert_eq!(s.read_byte("Tag").unwrap(), vec![3]);
        assert_eq!(s.read_float3(names::VELOCITY).unwrap(), vec![Vec3::Y]);
        let birth = s.read_float(names::BIRTH_TIME).unwrap()[0];
        assert!((0.0..=0.5).contains(&birth));
        assert!(s.read_float("Missing").is_err());
        assert!(approx_eq(s.positions()[0].y, 0.5 - birth));
    }
}
