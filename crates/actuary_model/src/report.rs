//! Per-package cost summaries for reports.

use crate::package::{CostBreakdown, Package};
use serde::Serialize;
use std::fmt;

/// How the dies of a package are integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
    /// One die design.
    Soc,
    /// Several distinct die designs on one carrier.
    MultiDie,
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integration::Soc => f.write_str("SoC"),
            Integration::MultiDie => f.write_str("2.5D Integration"),
        }
    }
}

/// One die design placed in a package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DieLine {
    /// Die name.
    pub name: String,
    /// Process node; `None` for dummy silicon.
    pub node: Option<String>,
    /// Die area in mm².
    pub area: f64,
    /// Cost of one known-good die.
    pub cost_kgd: f64,
    /// Instances in the package.
    pub count: u32,
}

/// One module placed on the die of an SoC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleLine {
    /// Module name.
    pub name: String,
    /// Process node.
    pub node: String,
    /// Module area in mm².
    pub area: f64,
    /// Instances on the die.
    pub count: u32,
}

/// Snapshot of a package's composition and recurring cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageSummary {
    /// Package name.
    pub name: String,
    /// SoC or multi-die.
    pub integration: Integration,
    /// Packaging technology label.
    pub packaging: &'static str,
    /// Die placements.
    pub dies: Vec<DieLine>,
    /// Module lines of the single die; empty for multi-die packages.
    pub modules: Vec<ModuleLine>,
    /// Outer package area in mm².
    pub package_area: f64,
    /// Carrier cost ignoring yield.
    pub raw_package_cost: f64,
    /// Total recurring cost of one system.
    pub total_cost: f64,
    /// Recurring cost split by cause.
    pub breakdown: CostBreakdown,
}

impl PackageSummary {
    /// Summarizes `package`.
    pub fn from_package(package: &Package) -> Self {
        let dies: Vec<DieLine> = package
            .chips()
            .iter()
            .map(|(chip, count)| DieLine {
                name: chip.name().to_string(),
                node: chip.node().map(str::to_string),
                area: chip.area(),
                cost_kgd: chip.cost_kgd(),
                count: *count,
            })
            .collect();

        let (integration, modules) = match package.chips() {
            [(chip, _)] => (
                Integration::Soc,
                chip.modules()
                    .iter()
                    .map(|(m, count)| ModuleLine {
                        name: m.name().to_string(),
                        node: m.node().to_string(),
                        area: m.area(),
                        count: *count,
                    })
                    .collect(),
            ),
            _ => (Integration::MultiDie, Vec::new()),
        };

        let breakdown = package.cost_re();
        Self {
            name: package.name().to_string(),
            integration,
            packaging: package.kind().label(),
            dies,
            modules,
            package_area: package.area(),
            raw_package_cost: package.cost_raw_package(),
            total_cost: breakdown.total(),
            breakdown,
        }
    }
}

impl fmt::Display for PackageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "  Type: {}", self.integration)?;
        match self.integration {
            Integration::Soc => {
                for (i, m) in self.modules.iter().enumerate() {
                    writeln!(
                        f,
                        "  module_{i:02}: {:<10} node: {:>2}nm  area: {:>6.1}mm2  num: {}",
                        m.name, m.node, m.area, m.count
                    )?;
                }
                if let Some(die) = self.dies.first() {
                    writeln!(f, "  Die cost: {:.1}$", die.cost_kgd)?;
                }
            }
            Integration::MultiDie => {
                for (i, d) in self.dies.iter().enumerate() {
                    let node = d.node.as_deref().unwrap_or("-");
                    writeln!(
                        f,
                        "  chiplet_{i:02}: {:<10} node: {:>2}nm  area: {:>6.1}mm2  die cost: {:>6.1}$  num: {}",
                        d.name, node, d.area, d.cost_kgd, d.count
                    )?;
                }
            }
        }
        writeln!(f, "  {}", self.packaging)?;
        writeln!(f, "  Package area: {:.1}mm2", self.package_area)?;
        writeln!(f, "  Raw package cost: {:.1}$", self.raw_package_cost)?;
        write!(f, "  Total manufacturing cost: {:.1}$", self.total_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Chip;
    use crate::module::Module;
    use crate::package::PackageKind;
    use std::sync::Arc;

    #[test]
    fn soc_summary_lists_modules() {
        let params = actuary_config::default_parameters().unwrap();
        let cpu = Arc::new(Module::new("cpu", "7", 60.0, &params).unwrap());
        let gpu = Arc::new(Module::new("gpu", "7", 40.0, &params).unwrap());
        let pkg = Package::soc(
            "phone",
            "7",
            [(cpu, 2), (gpu, 1)],
            PackageKind::OrganicSubstrate,
            &params,
        )
        .unwrap();
        let summary = PackageSummary::from_package(&pkg);
        assert_eq!(summary.integration, Integration::Soc);
        assert_eq!(summary.modules.len(), 2);
        assert_eq!(summary.dies[0].area, 160.0);
        let text = summary.to_string();
        assert!(text.contains("Type: SoC"));
        assert!(text.contains("module_01: gpu"));
        assert!(text.contains("Organic Substrate Packaging (Chip-Last)"));
    }

    #[test]
    fn multi_die_summary_serializes() {
        let params = actuary_config::default_parameters().unwrap();
        let cpu = Arc::new(Module::new("cpu", "5", 50.0, &params).unwrap());
        let io = Arc::new(Module::new("io", "14", 20.0, &params).unwrap());
        let a = Arc::new(Chip::chiplet(cpu, 2.0, &params).unwrap());
        let b = Arc::new(Chip::new("io_die", "14", [(io, 1)], &params).unwrap());
        let filler = Arc::new(Chip::dummy(10.0, &params).unwrap());
        let pkg = Package::silicon_interposer("server", [(a, 4), (b, 1), (filler, 1)], &params)
            .unwrap();
        let summary = PackageSummary::from_package(&pkg);
        assert_eq!(summary.integration, Integration::MultiDie);
        assert!(summary.modules.is_empty());
        assert!(summary.to_string().contains("chiplet_02: dummy"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["integration"], "multi_die");
        assert_eq!(json["dies"].as_array().unwrap().len(), 3);
        assert_eq!(json["dies"][2]["node"], serde_json::Value::Null);
        assert!(json["total_cost"].as_f64().unwrap() > 0.0);
    }
}
