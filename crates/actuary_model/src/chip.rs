//! Dies: modules fabricated together, with yield and per-die cost.

use crate::error::{ModelError, ModelResult};
use crate::module::Module;
use crate::overrides::OverrideCell;
use crate::yield_model::{check_area, checked_dies_per_wafer, die_yield, dies_per_wafer};
use actuary_config::{ManufactureParams, NodeParams, ParameterTable};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What a [`Chip`] represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChipKind {
    /// A die carrying any mix of modules.
    Monolithic,
    /// A die wrapping one module plus its die-to-die PHY.
    Chiplet {
        /// Area spent on the die-to-die PHY in mm².
        d2d_area: f64,
    },
    /// Known-good filler silicon: occupies package area, costs nothing.
    Dummy,
}

impl ChipKind {
    fn tag(&self) -> u8 {
        match self {
            ChipKind::Monolithic => 0,
            ChipKind::Chiplet { .. } => 1,
            ChipKind::Dummy => 2,
        }
    }
}

/// A die made of modules placed on it.
///
/// The area is the sum of `module.area × count` and is fixed at construction.
/// Identity is structural over (kind, name, node, area).
#[derive(Debug)]
pub struct Chip {
    name: String,
    node: Option<String>,
    kind: ChipKind,
    modules: Vec<(Arc<Module>, u32)>,
    area: f64,
    node_params: Option<NodeParams>,
    manufacture: ManufactureParams,
    cost_factor: OverrideCell,
    cost_fixed: OverrideCell,
    known_nre: OverrideCell,
}

impl Chip {
    /// Creates a die from `(module, count)` placements fabricated at `node`.
    ///
    /// Equal modules are merged and zero counts dropped.
    ///
    /// # Errors
    ///
    /// `Configuration` if `node` is unknown; `InvalidGeometry` if the die has
    /// no area or is too large to fit on a wafer.
    pub fn new(
        name: impl Into<String>,
        node: impl Into<String>,
        modules: impl IntoIterator<Item = (Arc<Module>, u32)>,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        Self::build(name.into(), node.into(), ChipKind::Monolithic, modules, params)
    }

    /// Creates a chiplet wrapping `module` and a `d2d_area` mm² PHY.
    pub fn chiplet(module: Arc<Module>, d2d_area: f64, params: &ParameterTable) -> ModelResult<Self> {
        let node = module.node().to_string();
        let phy = Arc::new(Module::d2d_phy(node.clone(), d2d_area, params)?);
        let name = format!("{}_chiplet", module.name());
        Self::build(
            name,
            node,
            ChipKind::Chiplet { d2d_area },
            [(module, 1), (phy, 1)],
            params,
        )
    }

    /// Creates dummy filler silicon of `area` mm².
    pub fn dummy(area: f64, params: &ParameterTable) -> ModelResult<Self> {
        check_area("dummy die", area)?;
        Ok(Self {
            name: "dummy".to_string(),
            node: None,
            kind: ChipKind::Dummy,
            modules: Vec::new(),
            area,
            node_params: None,
            manufacture: params.manufacture,
            cost_factor: OverrideCell::new(0.0),
            cost_fixed: OverrideCell::new(0.0),
            known_nre: OverrideCell::new(0.0),
        })
    }

    fn build(
        name: String,
        node: String,
        kind: ChipKind,
        modules: impl IntoIterator<Item = (Arc<Module>, u32)>,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        let node_params = *params.node(&node)?;

        let mut placed: Vec<(Arc<Module>, u32)> = Vec::new();
        for (module, count) in modules {
            if count == 0 {
                continue;
            }
            if module.node() != node {
                tracing::warn!(
                    "module '{}' ({}) placed on chip '{}' at node {}",
                    module.name(),
                    module.node(),
                    name,
                    node
                );
            }
            match placed.iter_mut().find(|(m, _)| **m == *module) {
                Some((_, n)) => *n += count,
                None => placed.push((module, count)),
            }
        }

        if placed.is_empty() {
            return Err(ModelError::InvalidGeometry(format!(
                "chip '{name}' has no modules"
            )));
        }
        let area: f64 = placed.iter().map(|(m, n)| m.area() * f64::from(*n)).sum();
        checked_dies_per_wafer(area, &params.manufacture)?;

        tracing::debug!(chip = %name, node = %node, area, "built chip");

        Ok(Self {
            name,
            node: Some(node),
            kind,
            modules: placed,
            area,
            node_params: Some(node_params),
            manufacture: params.manufacture,
            cost_factor: OverrideCell::new(node_params.chip_nre_factor),
            cost_fixed: OverrideCell::new(node_params.chip_nre_fixed),
            known_nre: OverrideCell::new(0.0),
        })
    }

    /// Returns the chip name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the process node, or `None` for dummy silicon.
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    /// Returns the chip kind.
    pub fn kind(&self) -> ChipKind {
        self.kind
    }

    /// Returns `true` for dummy filler silicon.
    pub fn is_dummy(&self) -> bool {
        self.kind == ChipKind::Dummy
    }

    /// Returns the die-to-die PHY area of a chiplet.
    pub fn d2d_area(&self) -> Option<f64> {
        match self.kind {
            ChipKind::Chiplet { d2d_area } => Some(d2d_area),
            _ => None,
        }
    }

    /// Returns the die area in mm².
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Returns the module placements on this die.
    pub fn modules(&self) -> &[(Arc<Module>, u32)] {
        &self.modules
    }

    /// Number of instances of `module` placed on this die.
    pub fn module_count(&self, module: &Module) -> u32 {
        self.modules
            .iter()
            .find(|(m, _)| **m == *module)
            .map_or(0, |(_, n)| *n)
    }

    /// Die area that receives bumps; dummy silicon is never bumped.
    pub fn bumped_area(&self) -> f64 {
        if self.is_dummy() {
            0.0
        } else {
            self.area
        }
    }

    /// Integration NRE: the override if set, otherwise `area × factor + fixed`.
    pub fn nre(&self) -> f64 {
        if self.is_dummy() {
            return 0.0;
        }
        let known = self.known_nre.get();
        if known != 0.0 {
            return known;
        }
        self.area * self.cost_factor.get() + self.cost_fixed.get()
    }

    /// Fixes the integration NRE to `nre`. Setting zero clears the override.
    pub fn set_nre(&self, nre: f64) {
        self.known_nre.set(nre);
    }

    /// Replaces the NRE cost per mm² of die.
    pub fn set_factor(&self, factor: f64) {
        self.cost_factor.set(factor);
    }

    /// Replaces the fixed tape-out NRE.
    pub fn set_fixed(&self, fixed: f64) {
        self.cost_fixed.set(fixed);
    }

    /// Fraction of dies free of killer defects. Dummy silicon is pre-tested.
    pub fn die_yield(&self) -> f64 {
        match &self.node_params {
            Some(node) => die_yield(
                self.area,
                node.defect_density,
                self.manufacture.critical_level,
            ),
            None => 1.0,
        }
    }

    /// Gross dies per wafer.
    pub fn dies_per_wafer(&self) -> f64 {
        dies_per_wafer(self.area, &self.manufacture)
    }

    /// Dies per wafer that pass test.
    pub fn known_good_dies_per_wafer(&self) -> f64 {
        self.dies_per_wafer() * self.die_yield()
    }

    fn wafer_cost(&self) -> f64 {
        self.node_params.map_or(0.0, |node| node.wafer_cost)
    }

    /// Wafer cost spread over all dies, ignoring yield.
    pub fn cost_raw_die(&self) -> f64 {
        if self.is_dummy() {
            return 0.0;
        }
        self.wafer_cost() / self.dies_per_wafer()
    }

    /// Wafer cost spread over good dies only.
    pub fn cost_kgd(&self) -> f64 {
        if self.is_dummy() {
            return 0.0;
        }
        self.wafer_cost() / self.known_good_dies_per_wafer()
    }

    /// Share of the known-good-die cost caused by yield loss.
    pub fn cost_defect(&self) -> f64 {
        self.cost_kgd() - self.cost_raw_die()
    }

    /// `(raw, defect)` recurring cost per die.
    pub fn cost_re(&self) -> (f64, f64) {
        (self.cost_raw_die(), self.cost_defect())
    }
}

impl PartialEq for Chip {
    fn eq(&self, other: &Self) -> bool {
        self.kind.tag() == other.kind.tag()
            && self.name == other.name
            && self.node == other.node
            && self.area.to_bits() == other.area.to_bits()
    }
}

impl Eq for Chip {}

impl Hash for Chip {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.tag().hash(state);
        self.name.hash(state);
        self.node.hash(state);
        self.area.to_bits().hash(state);
    }
}
