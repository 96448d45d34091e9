//! Error types.
//!
//! Aggregation passes never fail as a whole. These errors describe the
//! column-scoped problems that are logged and degraded to a `null` aggregate,
//! plus configuration parse failures surfaced to the caller.

use thiserror::Error;

/// Errors raised by the aggregation engine.
#[derive(Error, Debug)]
pub enum CanopyError {
    /// An aggregation function name that the registry does not know.
    #[error("unrecognised aggregation function {0}")]
    UnknownAggFunc(String),

    /// A column asked to aggregate without any aggregation function.
    #[error("no aggregation function configured for column {0}")]
    MissingAggFunc(String),

    /// Grid options could not be parsed.
    #[error("invalid grid options: {0}")]
    Config(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, CanopyError>;
