//! Parameter file loading and validation.

use crate::error::ConfigError;
use crate::resolve::{resolve_parameters, ParameterTable};
use crate::types::ParameterFile;
use std::path::Path;

/// The bundled reference parameter set.
pub const DEFAULT_PARAMETERS: &str = include_str!("../data/default_parameters.toml");

/// Loads, validates, and resolves a parameter file from disk.
pub fn load_parameters(path: &Path) -> Result<ParameterTable, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    tracing::debug!("loaded parameter file {}", path.display());
    load_parameters_from_str(&content)
}

/// Parses, validates, and resolves a parameter file from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_parameters_from_str(content: &str) -> Result<ParameterTable, ConfigError> {
    let file: ParameterFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_parameters(&file)?;
    resolve_parameters(&file)
}

/// Resolves the bundled reference parameter set.
pub fn default_parameters() -> Result<ParameterTable, ConfigError> {
    load_parameters_from_str(DEFAULT_PARAMETERS)
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be positive, got {value}")))
    }
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be non-negative, got {value}")))
    }
}

fn require_yield(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be in (0, 1], got {value}")))
    }
}

/// Checks physical plausibility of every value before anything is derived from it.
fn validate_parameters(file: &ParameterFile) -> Result<(), ConfigError> {
    let shares = file.nre;
    require_non_negative("nre.module", shares.module)?;
    require_non_negative("nre.chip", shares.chip)?;
    if shares.module + shares.chip > 1.0 {
        return Err(invalid(format!(
            "nre.module + nre.chip must not exceed 1, got {}",
            shares.module + shares.chip
        )));
    }

    let m = file.manufacture;
    require_positive("manufacture.wafer_diameter", m.wafer_diameter)?;
    require_non_negative("manufacture.scribe_lane", m.scribe_lane)?;
    require_non_negative("manufacture.edge_loss", m.edge_loss)?;
    require_positive("manufacture.critical_level", m.critical_level)?;
    if m.edge_loss >= m.wafer_diameter / 2.0 {
        return Err(invalid(format!(
            "manufacture.edge_loss ({}) leaves no usable wafer radius",
            m.edge_loss
        )));
    }

    if file.nodes.is_empty() {
        return Err(invalid("no process nodes defined".to_string()));
    }
    for (name, node) in &file.nodes {
        require_non_negative(&format!("nodes.{name}.nre"), node.nre)?;
        require_non_negative(&format!("nodes.{name}.defect_density"), node.defect_density)?;
        require_positive(&format!("nodes.{name}.wafer_cost"), node.wafer_cost)?;
    }

    let os = file.os;
    require_non_negative("os.nre_cost_factor", os.nre_cost_factor)?;
    require_non_negative("os.nre_cost_fixed", os.nre_cost_fixed)?;
    require_non_negative("os.re_cost_factor", os.re_cost_factor)?;
    require_non_negative("os.bump_cost_factor", os.bump_cost_factor)?;
    require_positive("os.area_scale_factor", os.area_scale_factor)?;
    require_yield("os.bonding_yield", os.bonding_yield)?;

    let fo = file.fo;
    require_non_negative("fo.nre", fo.nre)?;
    require_positive("fo.wafer_cost", fo.wafer_cost)?;
    require_non_negative("fo.defect_density", fo.defect_density)?;
    require_positive("fo.critical_level", fo.critical_level)?;
    require_yield("fo.bonding_yield", fo.bonding_yield)?;
    require_positive("fo.area_scale_factor", fo.area_scale_factor)?;

    let si = &file.si;
    require_non_negative("si.defect_density", si.defect_density)?;
    require_positive("si.critical_level", si.critical_level)?;
    require_yield("si.bonding_yield", si.bonding_yield)?;
    require_positive("si.area_scale_factor", si.area_scale_factor)?;
    require_non_negative("si.bump_cost_factor", si.bump_cost_factor)?;
    require_positive("si.nre_scale", si.nre_scale)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_parameters_resolve() {
        let table = default_parameters().unwrap();
        assert_eq!(table.nodes().count(), 9);
        assert_eq!(table.manufacture.wafer_diameter, 300.0);
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_parameters_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn bonding_yield_above_one_rejected() {
        let text = DEFAULT_PARAMETERS.replace("bonding_yield = 0.99\n\n[fo]", "bonding_yield = 1.5\n\n[fo]");
        let err = load_parameters_from_str(&text).unwrap_err();
        match err {
            ConfigError::ValidationError(msg) => assert!(msg.contains("os.bonding_yield")),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn nre_shares_over_one_rejected() {
        let text = DEFAULT_PARAMETERS.replace("chip = 0.25", "chip = 0.75");
        let err = load_parameters_from_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn edge_loss_consuming_wafer_rejected() {
        let text = DEFAULT_PARAMETERS.replace("edge_loss = 5.0", "edge_loss = 150.0");
        let err = load_parameters_from_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn negative_wafer_cost_rejected() {
        let text = DEFAULT_PARAMETERS.replace("wafer_cost = 9346.0", "wafer_cost = -1.0");
        let err = load_parameters_from_str(&text).unwrap_err();
        match err {
            ConfigError::ValidationError(msg) => assert!(msg.contains("nodes.7.wafer_cost")),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEFAULT_PARAMETERS.as_bytes()).unwrap();
        let table = load_parameters(file.path()).unwrap();
        assert!(table.node("55").is_ok());
    }

    #[test]
    fn io_error_from_nonexistent_path() {
        let err = load_parameters(Path::new("/nonexistent/parameters.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
