//! Error types for the Plume particle solver, organized by subsystem:
//! attribute schema, behavior execution, and solver stepping.

use std::error::Error;
use std::fmt;

use crate::attribute::AttributeType;

/// Errors from building or querying an attribute schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeError {
    /// No attribute of the requested type has this name.
    Unknown {
        /// The name that was looked up.
        name: String,
        /// The attribute type that was expected.
        kind: AttributeType,
    },
    /// The same name was declared with two different attribute types.
    KindConflict {
        /// The conflicting name.
        name: String,
        /// The type the name was first declared with.
        first: AttributeType,
        /// The other type using the same name.
        second: AttributeType,
    },
}

impl AttributeError {
    pub(crate) fn unknown(name: &str, kind: AttributeType) -> Self {
        Self::Unknown {
            name: name.to_string(),
            kind,
        }
    }
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name, kind } => write!(f, "unknown {kind:?} attribute '{name}'"),
            Self::KindConflict {
                name,
                first,
                second,
            } => write!(
                f,
                "attribute '{name}' declared as both {first:?} and {second:?}"
            ),
        }
    }
}

impl Error for AttributeError {}

/// Errors reported by forces, events, actions, and emitters.
///
/// Returned from the behavior traits and wrapped in
/// [`StepError::BehaviorFailed`] by the solver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BehaviorError {
    /// The behavior needs an attribute the schema does not provide.
    MissingAttribute(AttributeError),
    /// The behavior failed for another reason.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for BehaviorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute(e) => write!(f, "missing attribute: {e}"),
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
        }
    }
}

impl Error for BehaviorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingAttribute(e) => Some(e),
            Self::ExecutionFailed { .. } => None,
        }
    }
}

impl From<AttributeError> for BehaviorError {
    fn from(e: AttributeError) -> Self {
        Self::MissingAttribute(e)
    }
}

/// Errors from the solver during `step()`.
///
/// A failed step leaves the simulation state partially advanced; callers
/// should reset the solver or discard the session.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// `elapsed_seconds` was negative, NaN, or infinite.
    InvalidElapsed {
        /// The rejected value.
        value: f32,
    },
    /// A force, event, action, or emitter returned an error.
    BehaviorFailed {
        /// Name of the failing behavior.
        name: String,
        /// The underlying behavior error.
        reason: BehaviorError,
    },
    /// An event broke its output contract (row outside the mask, rows out
    /// of order, or a time factor outside `(0, 1]`).
    InvalidEventOutput {
        /// Name of the offending event.
        event: String,
        /// Description of the violation.
        reason: String,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidElapsed { value } => {
                write!(f, "elapsed_seconds must be finite and >= 0, got {value}")
            }
            Self::BehaviorFailed { name, reason } => {
                write!(f, "behavior '{name}' failed: {reason}")
            }
            Self::InvalidEventOutput { event, reason } => {
                write!(f, "event '{event}' produced invalid output: {reason}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BehaviorFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behavior_failure_chains_source() {
        let err = StepError::BehaviorFailed {
            name: "gravity".to_string(),
            reason: BehaviorError::ExecutionFailed {
                reason: "boom".to_string(),
            },
        };
        assert!(err.to_string().contains("gravity"));
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_attribute_wraps_lookup_error() {
        let err: BehaviorError = AttributeError::Unknown {
            name: "Mass".to_string(),
            kind: AttributeType::Float,
        }
        .into();
        assert!(err.to_string().contains("Mass"));
        assert!(err.source().is_some());
    }
}
