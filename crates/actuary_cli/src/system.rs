//! System description files: the modules, dies, and products to cost.
//!
//! A system file names every design once and refers to it by key, so a
//! module or die shared between products is a single shared design:
//!
//! ```toml
//! [modules.cpu]
//! node = "7"
//! area = 60.0
//!
//! [chiplets.cpu_die]
//! module = "cpu"
//! d2d_area = 4.0
//!
//! [packages.desktop]
//! kind = "fo"
//! assembly = "chip_first"
//! chips = { cpu_die = 2 }
//! volume = 500000
//! ```

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use actuary_config::ParameterTable;
use actuary_model::{AssemblyOrder, Chip, Module, Package, PackageKind, Portfolio};
use serde::Deserialize;

/// Top-level structure of a system description file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemFile {
    /// IP modules by key.
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSpec>,
    /// Monolithic dies by key.
    #[serde(default)]
    pub chips: BTreeMap<String, ChipSpec>,
    /// Single-module chiplets by key.
    #[serde(default)]
    pub chiplets: BTreeMap<String, ChipletSpec>,
    /// Dummy filler dies by key.
    #[serde(default)]
    pub dummies: BTreeMap<String, DummySpec>,
    /// Products by name.
    pub packages: BTreeMap<String, PackageSpec>,
}

/// An IP module.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    /// Process node key.
    pub node: String,
    /// Area in mm².
    pub area: f64,
    /// Known design NRE replacing the area-based estimate.
    pub nre: Option<f64>,
    /// NRE per mm² replacing the node default.
    pub factor: Option<f64>,
}

/// A monolithic die.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChipSpec {
    /// Process node key.
    pub node: String,
    /// Module keys with instance counts.
    pub modules: BTreeMap<String, u32>,
    /// Known integration NRE.
    pub nre: Option<f64>,
    /// Integration NRE per mm² replacing the node default.
    pub factor: Option<f64>,
    /// Fixed tape-out NRE replacing the node default.
    pub fixed: Option<f64>,
}

/// A chiplet wrapping one module.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChipletSpec {
    /// Module key.
    pub module: String,
    /// Die-to-die PHY area in mm².
    pub d2d_area: f64,
}

/// Dummy filler silicon.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DummySpec {
    /// Area in mm².
    pub area: f64,
}

/// Packaging technology of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindSpec {
    /// Organic substrate.
    Os,
    /// Integrated fan-out.
    Fo,
    /// Silicon interposer.
    Si,
}

/// Die attach order of a fan-out product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSpec {
    /// Dies go onto a finished RDL.
    #[default]
    ChipLast,
    /// The RDL is built around the dies.
    ChipFirst,
}

/// A product: either dies by key, or an SoC described by its modules.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
    /// Packaging technology.
    pub kind: KindSpec,
    /// Assembly order; only meaningful for fan-out.
    pub assembly: Option<OrderSpec>,
    /// Die keys with instance counts.
    pub chips: Option<BTreeMap<String, u32>>,
    /// SoC process node.
    pub node: Option<String>,
    /// SoC module keys with instance counts.
    pub modules: Option<BTreeMap<String, u32>>,
    /// Units produced.
    pub volume: u64,
}

impl PackageSpec {
    fn package_kind(&self, name: &str) -> PackageKind {
        let order = match self.assembly.unwrap_or_default() {
            OrderSpec::ChipLast => AssemblyOrder::ChipLast,
            OrderSpec::ChipFirst => AssemblyOrder::ChipFirst,
        };
        if self.assembly.is_some() && self.kind != KindSpec::Fo {
            tracing::warn!("package '{}': assembly order only applies to fan-out", name);
        }
        match self.kind {
            KindSpec::Os => PackageKind::OrganicSubstrate,
            KindSpec::Fo => PackageKind::FanOut(order),
            KindSpec::Si => PackageKind::SiliconInterposer,
        }
    }
}

/// Reads and builds a system description file.
pub fn load_system(path: &Path, params: &ParameterTable) -> Result<Portfolio, Box<dyn Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), "loading system description");
    parse_system(&content, params)
}

/// Parses and builds a system description from a TOML string.
pub fn parse_system(content: &str, params: &ParameterTable) -> Result<Portfolio, Box<dyn Error>> {
    let file: SystemFile = toml::from_str(content)?;
    build_system(&file, params)
}

/// Instantiates every design in `file` and collects the products.
pub fn build_system(file: &SystemFile, params: &ParameterTable) -> Result<Portfolio, Box<dyn Error>> {
    let mut modules: BTreeMap<&str, Arc<Module>> = BTreeMap::new();
    for (key, spec) in &file.modules {
        let module = Module::new(key.as_str(), spec.node.as_str(), spec.area, params)?;
        if let Some(factor) = spec.factor {
            module.set_factor(factor);
        }
        if let Some(nre) = spec.nre {
            module.set_nre(nre);
        }
        modules.insert(key, Arc::new(module));
    }

    let mut chips: BTreeMap<&str, Arc<Chip>> = BTreeMap::new();
    for (key, spec) in &file.chips {
        let placed = lookup_modules(&modules, &spec.modules, key)?;
        let chip = Chip::new(key.as_str(), spec.node.as_str(), placed, params)?;
        if let Some(factor) = spec.factor {
            chip.set_factor(factor);
        }
        if let Some(fixed) = spec.fixed {
            chip.set_fixed(fixed);
        }
        if let Some(nre) = spec.nre {
            chip.set_nre(nre);
        }
        insert_die(&mut chips, key, chip)?;
    }
    for (key, spec) in &file.chiplets {
        let module = modules
            .get(spec.module.as_str())
            .ok_or_else(|| format!("chiplet '{key}' references unknown module '{}'", spec.module))?;
        let chip = Chip::chiplet(Arc::clone(module), spec.d2d_area, params)?;
        insert_die(&mut chips, key, chip)?;
    }
    for (key, spec) in &file.dummies {
        insert_die(&mut chips, key, Chip::dummy(spec.area, params)?)?;
    }

    let mut portfolio = Portfolio::new();
    for (name, spec) in &file.packages {
        let kind = spec.package_kind(name);
        let package = match (&spec.chips, &spec.node, &spec.modules) {
            (Some(dies), None, None) => {
                let mut placed = Vec::with_capacity(dies.len());
                for (key, count) in dies {
                    let chip = chips.get(key.as_str()).ok_or_else(|| {
                        format!("package '{name}' references unknown die '{key}'")
                    })?;
                    placed.push((Arc::clone(chip), *count));
                }
                Package::new(name.as_str(), kind, placed, params)?
            }
            (None, Some(node), Some(soc_modules)) => {
                let placed = lookup_modules(&modules, soc_modules, name)?;
                Package::soc(name.as_str(), node.as_str(), placed, kind, params)?
            }
            _ => {
                return Err(format!(
                    "package '{name}' needs either `chips` or both `node` and `modules`"
                )
                .into())
            }
        };
        portfolio.insert(Arc::new(package), spec.volume);
    }

    tracing::debug!(packages = portfolio.len(), "built system");
    Ok(portfolio)
}

fn lookup_modules(
    modules: &BTreeMap<&str, Arc<Module>>,
    wanted: &BTreeMap<String, u32>,
    owner: &str,
) -> Result<Vec<(Arc<Module>, u32)>, Box<dyn Error>> {
    wanted
        .iter()
        .map(|(key, count)| {
            modules
                .get(key.as_str())
                .map(|m| (Arc::clone(m), *count))
                .ok_or_else(|| {
                    Box::<dyn Error>::from(format!("'{owner}' references unknown module '{key}'"))
                })
        })
        .collect()
}

fn insert_die<'a>(
    chips: &mut BTreeMap<&'a str, Arc<Chip>>,
    key: &'a str,
    chip: Chip,
) -> Result<(), Box<dyn Error>> {
    if chips.insert(key, Arc::new(chip)).is_some() {
        return Err(format!("die key '{key}' is defined twice").into());
    }
    Ok(())
}
