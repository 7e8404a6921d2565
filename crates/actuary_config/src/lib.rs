//! Parsing, validation, and resolution of packaging cost parameter files.
//!
//! This crate reads a `parameters.toml` file describing per-node wafer and
//! NRE costs, defect densities, wafer geometry, and per-technology packaging
//! constants, and resolves it into an immutable [`ParameterTable`] that the
//! cost model consumes.
//!
//! ```
//! let table = actuary_config::default_parameters().unwrap();
//! assert!(table.node("7").is_ok());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{default_parameters, load_parameters, load_parameters_from_str, DEFAULT_PARAMETERS};
pub use resolve::{
    resolve_parameters, InterposerParams, NodeParams, OrganicParams, ParameterTable,
};
pub use types::*;
