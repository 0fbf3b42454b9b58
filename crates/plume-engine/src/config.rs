//! Simulation configuration, validation, and error types.
//!
//! [`SimulationConfig`] is the builder-input for constructing a
//! [`Solver`](crate::Solver). [`validate()`](SimulationConfig::validate)
//! checks structural invariants at startup.

use std::error::Error;
use std::fmt;

use plume_behavior::Description;
use plume_core::AttributeError;
use plume_storage::StorageError;

use crate::state::schema_for;

/// Rows per block unless configured otherwise.
pub const DEFAULT_BLOCK_CAPACITY: usize = 1000;
/// Seconds a particle lives unless configured otherwise.
pub const DEFAULT_MAX_AGE: f32 = 5.0;
/// Event passes per slice before events are ignored for the rest of
/// the step, unless configured otherwise.
pub const DEFAULT_MAX_EVENT_PASSES: u32 = 8;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SimulationConfig::validate()`] or solver
/// construction.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// `block_capacity` is zero.
    ZeroBlockCapacity,
    /// `max_age` is NaN, infinite, zero, or negative.
    InvalidMaxAge {
        /// The invalid value.
        value: f32,
    },
    /// `max_event_passes` is zero.
    ZeroEventPasses,
    /// Emitter declarations do not form a valid schema.
    Schema(AttributeError),
    /// Block storage could not be created.
    Storage(StorageError),
    /// The worker thread pool could not be built.
    ThreadPool {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockCapacity => write!(f, "block_capacity must be at least 1"),
            Self::InvalidMaxAge { value } => {
                write!(f, "max_age must be finite and positive, got {value}")
            }
            Self::ZeroEventPasses => write!(f, "max_event_passes must be at least 1"),
            Self::Schema(e) => write!(f, "schema: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::ThreadPool { reason } => write!(f, "worker pool: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AttributeError> for ConfigError {
    fn from(e: AttributeError) -> Self {
        Self::Schema(e)
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Complete configuration for constructing a [`Solver`](crate::Solver).
#[derive(Debug)]
pub struct SimulationConfig {
    /// Forces, events with their actions, and emitters.
    pub description: Description,
    /// Rows per block. Default: 1000.
    pub block_capacity: usize,
    /// Particles older than this many seconds are killed. Default: 5.0.
    pub max_age: f32,
    /// Event passes per slice before the remaining time is integrated
    /// without events. Default: 8.
    pub max_event_passes: u32,
    /// Seed for the simulation's random source.
    pub seed: u64,
    /// Block-stepping worker threads. `None` = auto-detect
    /// (`available_parallelism`, clamped to `[1, 64]`).
    pub worker_count: Option<usize>,
}

impl SimulationConfig {
    /// Configuration with default limits for `description`.
    pub fn new(description: Description) -> Self {
        Self {
            description,
            block_capacity: DEFAULT_BLOCK_CAPACITY,
            max_age: DEFAULT_MAX_AGE,
            max_event_passes: DEFAULT_MAX_EVENT_PASSES,
            seed: 0,
            worker_count: None,
        }
    }

    /// Set the block capacity.
    pub fn with_block_capacity(mut self, block_capacity: usize) -> Self {
        self.block_capacity = block_capacity;
        self
    }

    /// Set the maximum particle age.
    pub fn with_max_age(mut self, max_age: f32) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the event pass limit.
    pub fn with_max_event_passes(mut self, passes: u32) -> Self {
        self.max_event_passes = passes;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the worker count.
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = Some(workers);
        self
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_capacity == 0 {
            return Err(ConfigError::ZeroBlockCapacity);
        }
        if !self.max_age.is_finite() || self.max_age <= 0.0 {
            return Err(ConfigError::InvalidMaxAge {
                value: self.max_age,
            });
        }
        if self.max_event_passes == 0 {
            return Err(ConfigError::ZeroEventPasses);
        }
        schema_for(&self.description.emitter_infos())?;
        Ok(())
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 64),
        }
    }
}
