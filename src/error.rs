//! Error types for table configuration and introspection.

use thiserror::Error;

use crate::config::MAXIMUM_CAPACITY;

/// Rejected `TableConfig` values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial capacity must be non-zero")]
    ZeroCapacity,

    #[error("initial capacity {0} exceeds the maximum of {}", MAXIMUM_CAPACITY)]
    CapacityTooLarge(usize),

    #[error("initial capacity {0} is not a power of two")]
    CapacityNotPowerOfTwo(usize),

    #[error("load factor must be positive and finite, got {0}")]
    InvalidLoadFactor(f32),

    #[error("treeify threshold must be at least 2, got {0}")]
    TreeifyThreshold(usize),

    #[error("untreeify threshold {untreeify} must be below the treeify threshold {treeify}")]
    UntreeifyThreshold { untreeify: usize, treeify: usize },

    #[error("minimum treeify capacity must be a power of two, got {0}")]
    MinTreeifyCapacity(usize),
}

/// Failure to read a table's internal layout.
///
/// Inspection is best effort: callers treat an error as "unknown" for the
/// current observation and carry on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InspectError {
    #[error("bucket index {index} is out of range for a bucket array of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("table internals unavailable: {reason}")]
    Unavailable { reason: String },
}
