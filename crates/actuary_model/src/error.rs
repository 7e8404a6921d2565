//! Error types for cost model construction and evaluation.

use actuary_config::ConfigError;

/// The result type for fallible cost model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building entities or evaluating costs.
///
/// None of these are transient: a failing computation fails as a whole and
/// the error propagates straight to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A referenced process node or technology is missing from the parameter table.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The operation has no meaning for this package variant.
    #[error("{operation} is not supported by {variant} packages")]
    UnsupportedOperation {
        /// The operation that was requested.
        operation: &'static str,
        /// The package variant it was requested on.
        variant: &'static str,
    },

    /// Amortization over zero units: no package with positive volume uses the entity.
    #[error("no production volume consumes {entity}")]
    InvalidVolume {
        /// Description of the entity whose cost could not be amortized.
        entity: String,
    },

    /// An area or geometric input is outside the physically meaningful range.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}
