//! Parameter file types deserialized from `parameters.toml`.
//!
//! These mirror the file layout one-to-one. Derived quantities (per-node NRE
//! factors, interposer NRE factors) are computed later by
//! [`resolve_parameters`](crate::resolve_parameters).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The top-level parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterFile {
    /// How a node's tape-out NRE splits between module and chip design.
    pub nre: NreShares,
    /// Wafer geometry and the die yield model's critical level.
    pub manufacture: ManufactureParams,
    /// Per-process-node constants, keyed by node name (e.g. `"7"`).
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeSection>,
    /// Organic substrate packaging constants.
    pub os: OrganicSection,
    /// Fan-out (RDL) packaging constants.
    pub fo: FanOutSection,
    /// Silicon interposer packaging constants.
    pub si: SiliconSection,
}

/// Fractions of a node's total NRE attributed to module and chip design.
///
/// Whatever is left over (`1 - module - chip`) is charged to every chip as a
/// fixed tape-out cost.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NreShares {
    /// Share of NRE that scales with module area.
    pub module: f64,
    /// Share of NRE that scales with die area.
    pub chip: f64,
}

/// Wafer geometry shared by dies and interposers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManufactureParams {
    /// Wafer diameter in mm.
    pub wafer_diameter: f64,
    /// Scribe lane width between dies in mm.
    pub scribe_lane: f64,
    /// Unusable ring at the wafer edge in mm.
    pub edge_loss: f64,
    /// Critical level of the die yield model.
    pub critical_level: f64,
}

/// Raw per-node entry.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NodeSection {
    /// Total tape-out NRE for a reference design at this node (USD).
    pub nre: f64,
    /// Defect density in defects per cm².
    pub defect_density: f64,
    /// Processed wafer cost (USD).
    pub wafer_cost: f64,
}

/// Raw `[os]` section.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrganicSection {
    /// NRE per mm² of substrate.
    pub nre_cost_factor: f64,
    /// Fixed substrate design NRE.
    pub nre_cost_fixed: f64,
    /// Recurring substrate cost per mm².
    pub re_cost_factor: f64,
    /// C4 bump cost per mm² of die.
    pub bump_cost_factor: f64,
    /// Substrate area relative to the silicon it carries.
    pub area_scale_factor: f64,
    /// Yield of a single die-to-substrate bond.
    pub bonding_yield: f64,
}

/// Raw `[fo]` section.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FanOutSection {
    /// Total RDL design NRE.
    pub nre: f64,
    /// RDL carrier wafer cost.
    pub wafer_cost: f64,
    /// RDL defect density in defects per cm².
    pub defect_density: f64,
    /// Critical level of the RDL yield model.
    pub critical_level: f64,
    /// Yield of a single die-to-RDL bond.
    pub bonding_yield: f64,
    /// RDL area relative to the silicon it carries.
    pub area_scale_factor: f64,
}

/// Raw `[si]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SiliconSection {
    /// Interposer defect density in defects per cm².
    pub defect_density: f64,
    /// Critical level of the interposer yield model.
    pub critical_level: f64,
    /// Yield of a single die-to-interposer bond.
    pub bonding_yield: f64,
    /// Interposer area relative to the silicon it carries.
    pub area_scale_factor: f64,
    /// Micro-bump cost per mm² of die, charged on all advanced packages.
    pub bump_cost_factor: f64,
    /// Mature node whose wafers and design costs the interposer reuses.
    #[serde(default = "default_base_node")]
    pub base_node: String,
    /// Interposer NRE markup over a base-node chip.
    #[serde(default = "default_nre_scale")]
    pub nre_scale: f64,
}

fn default_base_node() -> String {
    "55".to_string()
}

fn default_nre_scale() -> f64 {
    1.2
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[nre]
module = 0.4
chip = 0.25

[manufacture]
wafer_diameter = 300.0
scribe_lane = 0.2
edge_loss = 5.0
critical_level = 10.0

[os]
nre_cost_factor = 1.0
nre_cost_fixed = 2.0
re_cost_factor = 0.005
bump_cost_factor = 0.005
area_scale_factor = 4.0
bonding_yield = 0.99

[fo]
nre = 9000000.0
wafer_cost = 1500.0
defect_density = 0.09
critical_level = 3.0
bonding_yield = 0.99
area_scale_factor = 1.1

[si]
defect_density = 0.06
critical_level = 6.0
bonding_yield = 0.99
area_scale_factor = 1.1
bump_cost_factor = 0.01
"#;

    #[test]
    fn si_defaults_applied() {
        let file: ParameterFile = toml::from_str(MINIMAL).unwrap();
        assert_eq!(file.si.base_node, "55");
        assert_eq!(file.si.nre_scale, 1.2);
        assert!(file.nodes.is_empty());
    }

    #[test]
    fn node_keys_are_strings() {
        let text = format!(
            "{MINIMAL}\n[nodes.\"7\"]\nnre = 1.0\ndefect_density = 0.09\nwafer_cost = 9346.0\n"
        );
        let file: ParameterFile = toml::from_str(&text).unwrap();
        assert_eq!(file.nodes["7"].wafer_cost, 9346.0);
    }

    #[test]
    fn missing_section_rejected() {
        let text = MINIMAL.replace("[fo]", "[unused]");
        assert!(toml::from_str::<ParameterFile>(&text).is_err());
    }
}
