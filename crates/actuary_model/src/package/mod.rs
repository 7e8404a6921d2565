//! Packages: dies assembled on an organic substrate, fan-out RDL, or silicon interposer.
//!
//! A [`Package`] with a single die is a monolithic SoC; with several it is a
//! multi-die system. The [`PackageKind`] selects how area, yield, and the
//! recurring cost breakdown are composed:
//!
//! - [`organic`]: dies flip-chip bonded straight onto a laminate substrate
//! - [`advanced`]: dies on an interposer (fan-out RDL or silicon) which in
//!   turn sits on a laminate substrate

mod advanced;
mod organic;

use crate::chip::Chip;
use crate::error::{ModelError, ModelResult};
use crate::module::Module;
use crate::yield_model::{check_area, checked_dies_per_wafer};
use actuary_config::{InterposerParams, ManufactureParams, OrganicParams, ParameterTable};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Whether dies are attached before or after the carrier is known good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyOrder {
    /// The carrier is built around the dies; its yield loss scraps them.
    ChipFirst,
    /// Dies are bonded onto a finished carrier.
    ChipLast,
}

/// The closed set of packaging technologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    /// Organic substrate (flip-chip on laminate).
    OrganicSubstrate,
    /// Integrated fan-out on a redistribution layer.
    FanOut(AssemblyOrder),
    /// 2.5D silicon interposer.
    SiliconInterposer,
}

impl PackageKind {
    /// Short technology tag (`"OS"`, `"FO"`, `"SI"`).
    pub fn tag(&self) -> &'static str {
        match self {
            PackageKind::OrganicSubstrate => "OS",
            PackageKind::FanOut(_) => "FO",
            PackageKind::SiliconInterposer => "SI",
        }
    }

    /// Which yield-stacking branch the recurring cost model applies.
    ///
    /// Silicon interposers are costed with the bonded-yield (chip-last)
    /// stacking even though they are labelled chip-first.
    pub fn assembly_order(&self) -> AssemblyOrder {
        match self {
            PackageKind::OrganicSubstrate | PackageKind::SiliconInterposer => {
                AssemblyOrder::ChipLast
            }
            PackageKind::FanOut(order) => *order,
        }
    }

    /// Human-readable packaging description.
    pub fn label(&self) -> &'static str {
        match self {
            PackageKind::OrganicSubstrate => "Organic Substrate Packaging (Chip-Last)",
            PackageKind::FanOut(AssemblyOrder::ChipLast) => {
                "Integrated Fanout Packaging (Chip-Last)"
            }
            PackageKind::FanOut(AssemblyOrder::ChipFirst) => {
                "Integrated Fanout Packaging (Chip-First)"
            }
            PackageKind::SiliconInterposer => "Silicon Interposer Packaging (Chip-First)",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recurring cost of one packaged system, split by cause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Dies (and their bumps) at raw wafer cost.
    pub raw_chips: f64,
    /// Extra die cost from wafer yield loss.
    pub defect_chips: f64,
    /// Carrier (substrate and interposer) at raw cost.
    pub raw_package: f64,
    /// Extra carrier cost from carrier and bonding yield loss.
    pub defect_package: f64,
    /// Known-good dies scrapped in failed assemblies.
    pub wasted_kgd: f64,
}

impl CostBreakdown {
    /// Die-side cost: raw plus defect.
    pub fn chips(&self) -> f64 {
        self.raw_chips + self.defect_chips
    }

    /// Package-side cost: raw carrier, carrier defect, and wasted dies.
    pub fn package(&self) -> f64 {
        self.raw_package + self.defect_package + self.wasted_kgd
    }

    /// Total recurring cost.
    pub fn total(&self) -> f64 {
        self.chips() + self.package()
    }

    /// `(raw_chips, defect_chips, raw_package, defect_package, wasted_kgd)`.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64, f64) {
        (
            self.raw_chips,
            self.defect_chips,
            self.raw_package,
            self.defect_package,
            self.wasted_kgd,
        )
    }
}

/// Dies assembled into one package.
///
/// Identity is structural over (kind, name, area). The kind includes the
/// assembly order, so fan-out chip-first and chip-last builds of one die set
/// are different packages.
#[derive(Debug)]
pub struct Package {
    name: String,
    kind: PackageKind,
    chips: Vec<(Arc<Chip>, u32)>,
    organic: OrganicParams,
    interposer: Option<InterposerParams>,
    manufacture: ManufactureParams,
}

impl Package {
    /// Assembles `(chip, count)` placements into a package of `kind`.
    ///
    /// Equal chips are merged and zero counts dropped.
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` if no die is placed or an interposer would not fit
    /// on a wafer.
    pub fn new(
        name: impl Into<String>,
        kind: PackageKind,
        chips: impl IntoIterator<Item = (Arc<Chip>, u32)>,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        let name = name.into();
        let mut placed: Vec<(Arc<Chip>, u32)> = Vec::new();
        for (chip, count) in chips {
            if count == 0 {
                continue;
            }
            match placed.iter_mut().find(|(c, _)| **c == *chip) {
                Some((_, n)) => *n += count,
                None => placed.push((chip, count)),
            }
        }
        if placed.is_empty() {
            return Err(ModelError::InvalidGeometry(format!(
                "package '{name}' has no dies"
            )));
        }
        if placed.iter().all(|(c, _)| c.is_dummy()) {
            tracing::warn!("package '{}' contains only dummy silicon", name);
        }

        let interposer = match kind {
            PackageKind::OrganicSubstrate => None,
            PackageKind::FanOut(_) => Some(params.fan_out),
            PackageKind::SiliconInterposer => Some(params.silicon),
        };

        let package = Self {
            name,
            kind,
            chips: placed,
            organic: params.organic,
            interposer,
            manufacture: params.manufacture,
        };
        check_area(&format!("package '{}'", package.name), package.total_module_area())?;
        if let Some(ip) = &package.interposer {
            checked_dies_per_wafer(advanced::interposer_area(&package, ip), &package.manufacture)?;
        }

        tracing::debug!(
            package = %package.name,
            kind = package.kind.tag(),
            dies = package.chip_count(),
            "built package"
        );
        Ok(package)
    }

    /// Organic substrate package.
    pub fn organic(
        name: impl Into<String>,
        chips: impl IntoIterator<Item = (Arc<Chip>, u32)>,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        Self::new(name, PackageKind::OrganicSubstrate, chips, params)
    }

    /// Integrated fan-out package with the given assembly order.
    pub fn fan_out(
        name: impl Into<String>,
        chips: impl IntoIterator<Item = (Arc<Chip>, u32)>,
        order: AssemblyOrder,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        Self::new(name, PackageKind::FanOut(order), chips, params)
    }

    /// Silicon interposer package.
    pub fn silicon_interposer(
        name: impl Into<String>,
        chips: impl IntoIterator<Item = (Arc<Chip>, u32)>,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        Self::new(name, PackageKind::SiliconInterposer, chips, params)
    }

    /// A monolithic SoC: one die holding `modules`, packaged as `kind`.
    ///
    /// The die and the package share `name`.
    pub fn soc(
        name: impl Into<String>,
        node: impl Into<String>,
        modules: impl IntoIterator<Item = (Arc<Module>, u32)>,
        kind: PackageKind,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        let name = name.into();
        let chip = Arc::new(Chip::new(name.clone(), node, modules, params)?);
        Self::new(name, kind, [(chip, 1)], params)
    }

    /// Returns the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the packaging technology.
    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// Returns the die placements.
    pub fn chips(&self) -> &[(Arc<Chip>, u32)] {
        &self.chips
    }

    /// Total number of dies in the package.
    pub fn chip_count(&self) -> u32 {
        self.chips.iter().map(|(_, n)| n).sum()
    }

    /// Number of instances of `chip` in the package.
    pub fn chip_instances(&self, chip: &Chip) -> u32 {
        self.chips
            .iter()
            .find(|(c, _)| **c == *chip)
            .map_or(0, |(_, n)| *n)
    }

    /// Total silicon area of all dies; the driver of every carrier area.
    pub fn total_module_area(&self) -> f64 {
        self.chips
            .iter()
            .map(|(chip, n)| chip.area() * f64::from(*n))
            .sum()
    }

    /// Instances of `module` across all dies, weighted by die count.
    pub fn module_count(&self, module: &Module) -> u64 {
        self.chips
            .iter()
            .map(|(chip, n)| u64::from(chip.module_count(module)) * u64::from(*n))
            .sum()
    }

    /// Outer organic substrate area in mm².
    pub fn area(&self) -> f64 {
        match &self.interposer {
            None => organic::area(self),
            Some(ip) => advanced::area(self, ip),
        }
    }

    fn require_interposer(&self, operation: &'static str) -> ModelResult<&InterposerParams> {
        self.interposer
            .as_ref()
            .ok_or(ModelError::UnsupportedOperation {
                operation,
                variant: self.kind.tag(),
            })
    }

    /// Interposer (or RDL) area in mm².
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` on organic substrate packages.
    pub fn interposer_area(&self) -> ModelResult<f64> {
        let ip = self.require_interposer("interposer_area")?;
        Ok(advanced::interposer_area(self, ip))
    }

    /// Substrate routing-layer multiplier of an organic package.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` on interposer packages.
    pub fn layer_multiplier(&self) -> ModelResult<f64> {
        match self.interposer {
            None => Ok(organic::layer_multiplier(self)),
            Some(_) => Err(ModelError::UnsupportedOperation {
                operation: "layer_multiplier",
                variant: self.kind.tag(),
            }),
        }
    }

    /// Yield of the interposer itself.
    pub fn package_yield(&self) -> ModelResult<f64> {
        let ip = self.require_interposer("package_yield")?;
        Ok(advanced::package_yield(self, ip))
    }

    /// Gross interposers per interposer wafer.
    pub fn interposers_per_wafer(&self) -> ModelResult<f64> {
        let ip = self.require_interposer("interposers_per_wafer")?;
        Ok(advanced::interposers_per_wafer(self, ip))
    }

    /// Raw cost of one interposer including its C4 bumps.
    pub fn cost_interposer(&self) -> ModelResult<f64> {
        let ip = self.require_interposer("cost_interposer")?;
        Ok(advanced::cost_interposer(self, ip))
    }

    /// Raw cost of the outer substrate under the interposer.
    pub fn cost_substrate(&self) -> ModelResult<f64> {
        let ip = self.require_interposer("cost_substrate")?;
        Ok(advanced::cost_substrate(self, ip))
    }

    /// Package design NRE, excluding chip and module design.
    pub fn nre(&self) -> f64 {
        match &self.interposer {
            None => organic::nre(self),
            Some(ip) => advanced::nre(self, ip),
        }
    }

    /// Carrier cost ignoring yield.
    pub fn cost_raw_package(&self) -> f64 {
        match &self.interposer {
            None => organic::cost_raw_package(self),
            Some(ip) => advanced::cost_interposer(self, ip) + advanced::cost_substrate(self, ip),
        }
    }

    /// Full recurring cost breakdown.
    pub fn cost_re(&self) -> CostBreakdown {
        match &self.interposer {
            None => organic::cost_re(self),
            Some(ip) => advanced::cost_re(self, ip),
        }
    }

    /// Die-side recurring cost.
    pub fn cost_chips(&self) -> f64 {
        self.cost_re().chips()
    }

    /// Package-side recurring cost.
    pub fn cost_package(&self) -> f64 {
        self.cost_re().package()
    }

    /// Total recurring cost of one packaged system.
    pub fn cost_total_system(&self) -> f64 {
        self.cost_chips() + self.cost_package()
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.area().to_bits() == other.area().to_bits()
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
        self.area().to_bits().hash(state);
    }
}
