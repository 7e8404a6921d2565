//! IP modules: the smallest unit of design reuse.

use crate::error::ModelResult;
use crate::overrides::OverrideCell;
use crate::yield_model::check_area;
use actuary_config::ParameterTable;
use std::hash::{Hash, Hasher};

/// Design area (mm²) that a die-to-die PHY's NRE is quoted for.
pub const D2D_REFERENCE_AREA: f64 = 20.0;

/// What kind of block a [`Module`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// A regular IP block whose design NRE scales with its own area.
    Ip,
    /// A die-to-die interface PHY. Its design NRE is that of a
    /// [`D2D_REFERENCE_AREA`] block however much area each chiplet spends on
    /// it, and its area is placement only.
    D2dPhy,
}

/// An IP block with an area and a process node.
///
/// Identity is structural over (kind, name, node, area): two modules built
/// from equal inputs are the same design and are charged NRE once. A D2D PHY
/// is identified by (kind, name, node) alone, so every chiplet on a node shares
/// one PHY design whatever area it places. The cost
/// factor and NRE override are metadata; changing them affects every chip and
/// package sharing this module, but never its identity.
#[derive(Debug)]
pub struct Module {
    name: String,
    node: String,
    area: f64,
    kind: ModuleKind,
    cost_factor: OverrideCell,
    known_nre: OverrideCell,
}

impl Module {
    /// Creates an IP module, looking up its NRE factor for `node`.
    ///
    /// # Errors
    ///
    /// `Configuration` if `node` is not in the table, `InvalidGeometry` if
    /// the area is not positive.
    pub fn new(
        name: impl Into<String>,
        node: impl Into<String>,
        area: f64,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        Self::with_kind(name.into(), node.into(), area, ModuleKind::Ip, params)
    }

    /// Creates the die-to-die PHY for `node`, occupying `area` mm² of its die.
    pub fn d2d_phy(node: impl Into<String>, area: f64, params: &ParameterTable) -> ModelResult<Self> {
        let node = node.into();
        Self::with_kind(format!("d2d_{node}"), node, area, ModuleKind::D2dPhy, params)
    }

    fn with_kind(
        name: String,
        node: String,
        area: f64,
        kind: ModuleKind,
        params: &ParameterTable,
    ) -> ModelResult<Self> {
        check_area(&format!("module '{name}'"), area)?;
        let factor = params.node(&node)?.module_nre_factor;
        Ok(Self {
            name,
            node,
            area,
            kind,
            cost_factor: OverrideCell::new(factor),
            known_nre: OverrideCell::new(0.0),
        })
    }

    /// Returns the module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the process node name.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Returns the area in mm².
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Returns the module kind.
    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Returns the current NRE cost per mm².
    pub fn cost_factor(&self) -> f64 {
        self.cost_factor.get()
    }

    /// Design NRE: the override if one is set, otherwise area times cost factor.
    pub fn nre(&self) -> f64 {
        let known = self.known_nre.get();
        if known != 0.0 {
            return known;
        }
        match self.kind {
            ModuleKind::Ip => self.cost_factor() * self.area,
            ModuleKind::D2dPhy => self.cost_factor() * D2D_REFERENCE_AREA,
        }
    }

    /// Fixes the design NRE to `nre`. Setting zero clears the override.
    pub fn set_nre(&self, nre: f64) {
        self.known_nre.set(nre);
    }

    /// Replaces the NRE cost per mm².
    pub fn set_factor(&self, factor: f64) {
        self.cost_factor.set(factor);
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.node == other.node
            && (self.kind == ModuleKind::D2dPhy
                || self.area.to_bits() == other.area.to_bits())
    }
}

// Areas are validated finite and positive, so bitwise comparison is total.
impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
        self.node.hash(state);
        if self.kind == ModuleKind::Ip {
            self.area.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use std::collections::HashSet;

    fn table() -> ParameterTable {
        actuary_config::default_parameters().unwrap()
    }

    #[test]
    fn nre_is_area_times_factor() {
        let params = table();
        let m = Module::new("cpu", "7", 100.0, &params).unwrap();
        let factor = params.node("7").unwrap().module_nre_factor;
        assert_eq!(m.cost_factor(), factor);
        assert_eq!(m.nre(), 100.0 * factor);
    }

    #[test]
    fn factor_override_scenario() {
        let m = Module::new("cpu", "7", 100.0, &table()).unwrap();
        m.set_factor(0.01);
        assert_eq!(m.nre(), 1.0);
    }

    #[test]
    fn nre_override_wins_until_cleared() {
        let m = Module::new("cpu", "7", 100.0, &table()).unwrap();
        let derived = m.nre();
        m.set_nre(5.0e6);
        assert_eq!(m.nre(), 5.0e6);
        m.set_nre(0.0);
        assert_eq!(m.nre(), derived);
    }

    #[test]
    fn d2d_nre_uses_reference_area() {
        let params = table();
        let phy = Module::d2d_phy("7", 3.5, &params).unwrap();
        assert_eq!(phy.name(), "d2d_7");
        assert_eq!(phy.area(), 3.5);
        assert_eq!(phy.nre(), phy.cost_factor() * D2D_REFERENCE_AREA);
    }

    #[test]
    fn unknown_node_fails_at_construction() {
        let err = Module::new("cpu", "2", 10.0, &table()).unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn zero_area_rejected() {
        let err = Module::new("cpu", "7", 0.0, &table()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidGeometry(_)));
    }

    #[test]
    fn structural_identity() {
        let params = table();
        let a = Module::new("cpu", "7", 10.0, &params).unwrap();
        let b = Module::new("cpu", "7", 10.0, &params).unwrap();
        let c = Module::new("cpu", "5", 10.0, &params).unwrap();
        b.set_nre(42.0);
        assert_eq!(a, b, "overrides are not part of identity");
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn phy_never_equals_ip_with_same_fields() {
        let params = table();
        let phy = Module::d2d_phy("7", 2.0, &params).unwrap();
        let ip = Module::new("d2d_7", "7", 2.0, &params).unwrap();
        assert_ne!(phy, ip);
    }

    #[test]
    fn phys_on_one_node_share_a_design() {
        let params = table();
        let narrow = Module::d2d_phy("7", 4.0, &params).unwrap();
        let wide = Module::d2d_phy("7", 6.0, &params).unwrap();
        let other_node = Module::d2d_phy("5", 4.0, &params).unwrap();
        assert_eq!(narrow, wide);
        assert_eq!(wide.area(), 6.0);
        assert_ne!(narrow, other_node);

        let set: HashSet<Module> = [narrow, wide, other_node].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn repeated_reads_identical() {
        let m = Module::new("gpu", "5", 37.3, &table()).unwrap();
        assert_eq!(m.nre().to_bits(), m.nre().to_bits());
    }
}
