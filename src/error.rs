//! Pond-specific error types.
//!
//! Frame phases never fail: degenerate geometry is treated as "no effect" and a
//! malformed entity is skipped.  Errors surface only from configuration loading
//! and from registry calls that address an entity by id.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use koi_pond::error::PondResult;
//!
//! fn release(pond: &mut Pond, id: EntityId) -> PondResult<()> {
//!     pond.remove(id)?;
//!     Ok(())
//! }
//! ```

use std::fmt;

use crate::entity::EntityId;

/// Top-level error enum for the pond simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum PondError {
    /// A configuration value is outside its supported range.
    InvalidConfig {
        /// Dotted TOML key, e.g. `physics.damping`.
        key: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },

    /// `assets/pond.toml` could not be parsed.
    ConfigParse {
        /// Parser message, including the offending line where available.
        message: String,
    },

    /// An id was referenced that the registry no longer (or never) held.
    EntityNotFound {
        id: EntityId,
        /// Human-readable description of where the lookup occurred.
        context: &'static str,
    },

    /// An operation that needs a lily pad or flower was handed another kind.
    NotFloating { id: EntityId },
}

impl fmt::Display for PondError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PondError::InvalidConfig {
                key,
                value,
                expected,
            } => write!(
                f,
                "config value '{}' = {} is outside supported range {}",
                key, value, expected
            ),
            PondError::ConfigParse { message } => {
                write!(f, "could not parse pond config: {}", message)
            }
            PondError::EntityNotFound { id, context } => {
                write!(f, "entity {} not found during '{}'", id, context)
            }
            PondError::NotFloating { id } => {
                write!(f, "entity {} is not a floating object", id)
            }
        }
    }
}

impl std::error::Error for PondError {}

/// Convenience alias: a `Result` using `PondError` as the error type.
pub type PondResult<T> = Result<T, PondError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_key() {
        let err = PondError::InvalidConfig {
            key: "feed.radius",
            value: -1.0,
            expected: "(0.0, ∞)",
        };
        let text = err.to_string();
        assert!(text.contains("feed.radius"), "got: {text}");
        assert!(text.contains("-1"), "got: {text}");
    }

    #[test]
    fn display_reports_missing_entity_context() {
        let err = PondError::EntityNotFound {
            id: EntityId(42),
            context: "drag",
        };
        assert_eq!(err.to_string(), "entity #42 not found during 'drag'");
    }
}
