//! Error types for parameter file loading and validation.

/// Errors that can occur when loading, validating, or querying cost parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the parameter file.
    #[error("failed to read parameters: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse parameters: {0}")]
    ParseError(String),

    /// A referenced process node has no entry in the parameter table.
    #[error("unknown process node '{0}'")]
    UnknownNode(String),

    /// A parameter value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
