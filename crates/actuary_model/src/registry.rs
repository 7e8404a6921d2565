//! Deduplicated registry of the designs a set of packages references.
//!
//! Reuse economics hinge on charging each distinct design once. The
//! [`DesignRegistry`] walks packages down to their chips and modules and
//! keeps the first occurrence of every structurally distinct design. Keys are
//! tagged by entity type, so a chip and a module can never be confused even
//! when their name, node, and area coincide.

use crate::chip::Chip;
use crate::module::Module;
use crate::package::Package;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A shared reference to any design entity, compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DesignKey {
    /// An IP module.
    Module(Arc<Module>),
    /// A die.
    Chip(Arc<Chip>),
    /// A package.
    Package(Arc<Package>),
}

impl DesignKey {
    /// Design NRE of the referenced entity.
    pub fn nre(&self) -> f64 {
        match self {
            DesignKey::Module(m) => m.nre(),
            DesignKey::Chip(c) => c.nre(),
            DesignKey::Package(p) => p.nre(),
        }
    }

    /// Name of the referenced entity.
    pub fn name(&self) -> &str {
        match self {
            DesignKey::Module(m) => m.name(),
            DesignKey::Chip(c) => c.name(),
            DesignKey::Package(p) => p.name(),
        }
    }
}

impl fmt::Display for DesignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            DesignKey::Module(_) => "module",
            DesignKey::Chip(_) => "chip",
            DesignKey::Package(_) => "package",
        };
        write!(f, "{kind} '{}'", self.name())
    }
}

/// Distinct designs in first-seen order.
#[derive(Debug, Default)]
pub struct DesignRegistry {
    entries: Vec<DesignKey>,
    index: HashMap<DesignKey, usize>,
}

impl DesignRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every package together with all chips and modules it uses.
    pub fn from_packages<'a>(packages: impl IntoIterator<Item = &'a Arc<Package>>) -> Self {
        let mut registry = Self::new();
        for package in packages {
            registry.add_package(package);
        }
        tracing::debug!(
            packages = registry.packages().count(),
            chips = registry.chips().count(),
            modules = registry.modules().count(),
            "built design registry"
        );
        registry
    }

    /// Registers a package and everything below it.
    pub fn add_package(&mut self, package: &Arc<Package>) {
        self.insert(DesignKey::Package(Arc::clone(package)));
        for (chip, _) in package.chips() {
            self.insert(DesignKey::Chip(Arc::clone(chip)));
            for (module, _) in chip.modules() {
                self.insert(DesignKey::Module(Arc::clone(module)));
            }
        }
    }

    /// Inserts a design, returning `false` if an equal one is already present.
    pub fn insert(&mut self, design: DesignKey) -> bool {
        if self.index.contains_key(&design) {
            return false;
        }
        self.index.insert(design.clone(), self.entries.len());
        self.entries.push(design);
        true
    }

    /// Returns `true` if an equal design is registered.
    pub fn contains(&self, design: &DesignKey) -> bool {
        self.index.contains_key(design)
    }

    /// Returns the number of distinct designs of all kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all designs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &DesignKey> {
        self.entries.iter()
    }

    /// Distinct packages.
    pub fn packages(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.entries.iter().filter_map(|d| match d {
            DesignKey::Package(p) => Some(p),
            _ => None,
        })
    }

    /// Distinct chips.
    pub fn chips(&self) -> impl Iterator<Item = &Arc<Chip>> {
        self.entries.iter().filter_map(|d| match d {
            DesignKey::Chip(c) => Some(c),
            _ => None,
        })
    }

    /// Distinct modules.
    pub fn modules(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.entries.iter().filter_map(|d| match d {
            DesignKey::Module(m) => Some(m),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuary_config::ParameterTable;

    fn table() -> ParameterTable {
        actuary_config::default_parameters().unwrap()
    }

    #[test]
    fn shared_designs_counted_once() {
        let params = table();
        let cpu = Arc::new(Module::new("cpu", "7", 40.0, &params).unwrap());
        let io = Arc::new(Module::new("io", "7", 10.0, &params).unwrap());
        let chiplet = Arc::new(Chip::chiplet(cpu.clone(), 3.0, &params).unwrap());
        let io_die = Arc::new(Chip::new("io_die", "7", [(io, 1)], &params).unwrap());

        let small = Arc::new(
            Package::organic("small", [(chiplet.clone(), 1), (io_die.clone(), 1)], &params)
                .unwrap(),
        );
        let large = Arc::new(
            Package::organic("large", [(chiplet.clone(), 4), (io_die, 1)], &params).unwrap(),
        );

        let registry = DesignRegistry::from_packages([&small, &large]);
        assert_eq!(registry.packages().count(), 2);
        assert_eq!(registry.chips().count(), 2);
        // cpu, d2d phy, io
        assert_eq!(registry.modules().count(), 3);
        assert_eq!(registry.len(), 7);
        assert!(registry.contains(&DesignKey::Module(cpu)));
    }

    #[test]
    fn chip_and_module_never_collide() {
        let params = table();
        let m = Arc::new(Module::new("x", "7", 10.0, &params).unwrap());
        let c = Arc::new(Chip::new("x", "7", [(m.clone(), 1)], &params).unwrap());
        let mut registry = DesignRegistry::new();
        assert!(registry.insert(DesignKey::Module(m.clone())));
        assert!(registry.insert(DesignKey::Chip(c)));
        assert!(!registry.insert(DesignKey::Module(m)));
        assert_eq!(registry.len(), 2);
        assert_ne!(
            registry.iter().next().unwrap(),
            registry.iter().nth(1).unwrap()
        );
    }

    #[test]
    fn display_names_kind() {
        let params = table();
        let m = Arc::new(Module::new("cpu", "7", 10.0, &params).unwrap());
        assert_eq!(DesignKey::Module(m).to_string(), "module 'cpu'");
    }
}
