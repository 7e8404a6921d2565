//! Resolution of a parameter file into the immutable table the cost model reads.

use crate::error::ConfigError;
use crate::types::{ManufactureParams, ParameterFile};
use serde::Serialize;
use std::collections::BTreeMap;

/// Reference die area (mm²) that a node's total NRE figure is quoted for.
const REFERENCE_DIE_AREA: f64 = 300.0;

/// Fully derived constants for one process node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeParams {
    /// Module design NRE per mm².
    pub module_nre_factor: f64,
    /// Chip integration NRE per mm² of die.
    pub chip_nre_factor: f64,
    /// Fixed NRE charged to every chip taped out at this node.
    pub chip_nre_fixed: f64,
    /// Defect density in defects per cm².
    pub defect_density: f64,
    /// Processed wafer cost.
    pub wafer_cost: f64,
}

/// Organic substrate constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrganicParams {
    /// NRE per mm² of substrate.
    pub nre_cost_factor: f64,
    /// Fixed substrate design NRE.
    pub nre_cost_fixed: f64,
    /// Recurring substrate cost per mm².
    pub re_cost_factor: f64,
    /// C4 bump cost per mm² of die.
    pub bump_cost_factor: f64,
    /// Substrate area relative to the silicon (or interposer) it carries.
    pub area_scale_factor: f64,
    /// Yield of a single bond onto the substrate.
    pub bonding_yield: f64,
}

/// Constants of an interposer-class technology (fan-out RDL or silicon).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterposerParams {
    /// Interposer NRE per mm².
    pub nre_cost_factor: f64,
    /// Fixed interposer design NRE.
    pub nre_cost_fixed: f64,
    /// Interposer wafer cost.
    pub wafer_cost: f64,
    /// Interposer defect density in defects per cm².
    pub defect_density: f64,
    /// Critical level of the interposer yield model.
    pub critical_level: f64,
    /// Yield of a single die-to-interposer bond.
    pub bonding_yield: f64,
    /// Interposer area relative to the silicon it carries.
    pub area_scale_factor: f64,
    /// Micro-bump cost per mm² of die.
    pub micro_bump_cost_factor: f64,
}

/// The resolved, immutable parameter table.
///
/// Constructed once and handed to every entity constructor; nothing in the
/// model reads parameters from anywhere else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterTable {
    /// Wafer geometry and die critical level.
    pub manufacture: ManufactureParams,
    nodes: BTreeMap<String, NodeParams>,
    /// Organic substrate technology.
    pub organic: OrganicParams,
    /// Fan-out RDL technology.
    pub fan_out: InterposerParams,
    /// Silicon interposer technology.
    pub silicon: InterposerParams,
}

impl ParameterTable {
    /// Looks up the constants for a process node.
    pub fn node(&self, name: &str) -> Result<&NodeParams, ConfigError> {
        self.nodes
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNode(name.to_string()))
    }

    /// Iterates over all nodes in key order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeParams)> {
        self.nodes.iter().map(|(name, params)| (name.as_str(), params))
    }
}

/// Derives per-node NRE factors and interposer constants from a parsed file.
///
/// Node NRE figures are quoted for a reference die; the module and chip
/// shares scale per mm² of that die and the remainder is fixed per tape-out.
/// The silicon interposer is fabricated on `si.base_node` and inherits its
/// wafer cost and chip NRE factors, marked up by `si.nre_scale`.
pub fn resolve_parameters(file: &ParameterFile) -> Result<ParameterTable, ConfigError> {
    let shares = file.nre;
    let nodes: BTreeMap<String, NodeParams> = file
        .nodes
        .iter()
        .map(|(name, node)| {
            let params = NodeParams {
                module_nre_factor: shares.module * node.nre / REFERENCE_DIE_AREA,
                chip_nre_factor: shares.chip * node.nre / REFERENCE_DIE_AREA,
                chip_nre_fixed: (1.0 - shares.module - shares.chip) * node.nre,
                defect_density: node.defect_density,
                wafer_cost: node.wafer_cost,
            };
            (name.clone(), params)
        })
        .collect();

    let base = nodes
        .get(&file.si.base_node)
        .copied()
        .ok_or_else(|| ConfigError::UnknownNode(file.si.base_node.clone()))?;

    let organic = OrganicParams {
        nre_cost_factor: file.os.nre_cost_factor,
        nre_cost_fixed: file.os.nre_cost_fixed,
        re_cost_factor: file.os.re_cost_factor,
        bump_cost_factor: file.os.bump_cost_factor,
        area_scale_factor: file.os.area_scale_factor,
        bonding_yield: file.os.bonding_yield,
    };

    let fo_nre = 0.5 * file.fo.nre / REFERENCE_DIE_AREA;
    let fan_out = InterposerParams {
        nre_cost_factor: fo_nre,
        nre_cost_fixed: fo_nre,
        wafer_cost: file.fo.wafer_cost,
        defect_density: file.fo.defect_density,
        critical_level: file.fo.critical_level,
        bonding_yield: file.fo.bonding_yield,
        area_scale_factor: file.fo.area_scale_factor,
        micro_bump_cost_factor: file.si.bump_cost_factor,
    };

    let silicon = InterposerParams {
        nre_cost_factor: base.chip_nre_factor * file.si.nre_scale,
        nre_cost_fixed: base.chip_nre_fixed * file.si.nre_scale,
        wafer_cost: base.wafer_cost,
        defect_density: file.si.defect_density,
        critical_level: file.si.critical_level,
        bonding_yield: file.si.bonding_yield,
        area_scale_factor: file.si.area_scale_factor,
        micro_bump_cost_factor: file.si.bump_cost_factor,
    };

    tracing::debug!(
        nodes = nodes.len(),
        si_base_node = %file.si.base_node,
        "resolved parameter table"
    );

    Ok(ParameterTable {
        manufacture: file.manufacture,
        nodes,
        organic,
        fan_out,
        silicon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_parameters_from_str, DEFAULT_PARAMETERS};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn node_factors_split_nre() {
        let table = load_parameters_from_str(DEFAULT_PARAMETERS).unwrap();
        let n7 = table.node("7").unwrap();
        assert!(close(n7.module_nre_factor, 0.4 * 297_000_000.0 / 300.0));
        assert!(close(n7.chip_nre_factor, 0.25 * 297_000_000.0 / 300.0));
        assert!(close(n7.chip_nre_fixed, 0.35 * 297_000_000.0));
        assert_eq!(n7.wafer_cost, 9346.0);
    }

    #[test]
    fn unknown_node_lookup() {
        let table = load_parameters_from_str(DEFAULT_PARAMETERS).unwrap();
        let err = table.node("2").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNode(ref n) if n == "2"));
    }

    #[test]
    fn fan_out_nre_split_evenly() {
        let table = load_parameters_from_str(DEFAULT_PARAMETERS).unwrap();
        assert!(close(table.fan_out.nre_cost_factor, 0.5 * 9_000_000.0 / 300.0));
        assert_eq!(table.fan_out.nre_cost_factor, table.fan_out.nre_cost_fixed);
        assert_eq!(table.fan_out.micro_bump_cost_factor, 0.01);
    }

    #[test]
    fn silicon_inherits_base_node() {
        let table = load_parameters_from_str(DEFAULT_PARAMETERS).unwrap();
        let n55 = *table.node("55").unwrap();
        assert_eq!(table.silicon.wafer_cost, n55.wafer_cost);
        assert!(close(table.silicon.nre_cost_factor, n55.chip_nre_factor * 1.2));
        assert!(close(table.silicon.nre_cost_fixed, n55.chip_nre_fixed * 1.2));
    }

    #[test]
    fn missing_base_node_is_unknown_node() {
        let text = DEFAULT_PARAMETERS.replace("base_node = \"55\"", "base_node = \"65\"");
        let err = load_parameters_from_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNode(ref n) if n == "65"));
    }

    #[test]
    fn nodes_iterate_in_key_order() {
        let table = load_parameters_from_str(DEFAULT_PARAMETERS).unwrap();
        let names: Vec<&str> = table.nodes().map(|(name, _)| name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
