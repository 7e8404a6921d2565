//! NRE aggregation and amortization over a portfolio of products.
//!
//! Every distinct design is charged its NRE exactly once. Its amortized unit
//! cost divides that NRE across every produced unit that contains it,
//! weighted by how many instances each unit places.

use crate::chip::Chip;
use crate::error::{ModelError, ModelResult};
use crate::module::Module;
use crate::package::Package;
use crate::registry::{DesignKey, DesignRegistry};
use serde::Serialize;
use std::sync::Arc;

/// Packages with their production volumes, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    entries: Vec<(Arc<Package>, u64)>,
}

impl Portfolio {
    /// Creates an empty portfolio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product, returning the previous volume if an equal package was
    /// already present (its volume is replaced).
    pub fn insert(&mut self, package: Arc<Package>, volume: u64) -> Option<u64> {
        match self.entries.iter_mut().find(|(p, _)| **p == *package) {
            Some((_, v)) => Some(std::mem::replace(v, volume)),
            None => {
                self.entries.push((package, volume));
                None
            }
        }
    }

    /// Production volume of `package`, if it is in the portfolio.
    pub fn volume(&self, package: &Package) -> Option<u64> {
        self.entries
            .iter()
            .find(|(p, _)| **p == *package)
            .map(|(_, v)| *v)
    }

    /// Iterates over `(package, volume)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<Package>, u64)> {
        self.entries.iter().map(|(p, v)| (p, *v))
    }

    /// Iterates over the packages.
    pub fn packages(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.entries.iter().map(|(p, _)| p)
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the portfolio holds no products.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry of every distinct design the portfolio references.
    pub fn registry(&self) -> DesignRegistry {
        DesignRegistry::from_packages(self.packages())
    }

    /// Units produced that contain `design`, weighted by instances per unit.
    /// `None` if the count does not fit in a `u64`.
    pub fn weighted_volume(&self, design: &DesignKey) -> Option<u64> {
        self.iter().try_fold(0u64, |acc, (p, volume)| {
            acc.checked_add(instances(p, design).checked_mul(volume)?)
        })
    }
}

impl FromIterator<(Arc<Package>, u64)> for Portfolio {
    fn from_iter<I: IntoIterator<Item = (Arc<Package>, u64)>>(iter: I) -> Self {
        let mut portfolio = Self::new();
        for (package, volume) in iter {
            portfolio.insert(package, volume);
        }
        portfolio
    }
}

fn instances(package: &Package, design: &DesignKey) -> u64 {
    match design {
        DesignKey::Module(m) => package.module_count(m),
        DesignKey::Chip(c) => u64::from(package.chip_instances(c)),
        DesignKey::Package(p) => u64::from(**p == *package),
    }
}

/// Distinct packages across `packages`.
pub fn distinct_packages<'a>(
    packages: impl IntoIterator<Item = &'a Arc<Package>>,
) -> Vec<Arc<Package>> {
    DesignRegistry::from_packages(packages)
        .packages()
        .cloned()
        .collect()
}

/// Distinct chips referenced by `packages`.
pub fn distinct_chips<'a>(packages: impl IntoIterator<Item = &'a Arc<Package>>) -> Vec<Arc<Chip>> {
    DesignRegistry::from_packages(packages)
        .chips()
        .cloned()
        .collect()
}

/// Distinct modules referenced by `packages`.
pub fn distinct_modules<'a>(
    packages: impl IntoIterator<Item = &'a Arc<Package>>,
) -> Vec<Arc<Module>> {
    DesignRegistry::from_packages(packages)
        .modules()
        .cloned()
        .collect()
}

/// NRE of every distinct module, each charged once.
pub fn total_module_nre<'a>(packages: impl IntoIterator<Item = &'a Arc<Package>>) -> f64 {
    DesignRegistry::from_packages(packages)
        .modules()
        .map(|m| m.nre())
        .sum()
}

/// NRE of every distinct chip, each charged once.
pub fn total_chip_nre<'a>(packages: impl IntoIterator<Item = &'a Arc<Package>>) -> f64 {
    DesignRegistry::from_packages(packages)
        .chips()
        .map(|c| c.nre())
        .sum()
}

/// NRE of every distinct package, each charged once.
pub fn total_package_nre<'a>(packages: impl IntoIterator<Item = &'a Arc<Package>>) -> f64 {
    DesignRegistry::from_packages(packages)
        .packages()
        .map(|p| p.nre())
        .sum()
}

/// Module, chip, and package NRE of all distinct designs combined.
pub fn total_nre<'a>(packages: impl IntoIterator<Item = &'a Arc<Package>>) -> f64 {
    DesignRegistry::from_packages(packages)
        .iter()
        .map(DesignKey::nre)
        .sum()
}

/// NRE of `design` per unit that contains it.
///
/// # Errors
///
/// `InvalidVolume` if no unit in the portfolio contains the design, or if
/// the weighted volume overflows a `u64`.
pub fn amortized_unit_cost(design: &DesignKey, portfolio: &Portfolio) -> ModelResult<f64> {
    match portfolio.weighted_volume(design) {
        Some(volume) if volume > 0 => Ok(design.nre() / volume as f64),
        _ => Err(ModelError::InvalidVolume {
            entity: design.to_string(),
        }),
    }
}

/// Amortized NRE per instance of `module`.
pub fn module_amortized_unit_cost(module: &Arc<Module>, portfolio: &Portfolio) -> ModelResult<f64> {
    amortized_unit_cost(&DesignKey::Module(Arc::clone(module)), portfolio)
}

/// Amortized NRE per instance of `chip`.
pub fn chip_amortized_unit_cost(chip: &Arc<Chip>, portfolio: &Portfolio) -> ModelResult<f64> {
    amortized_unit_cost(&DesignKey::Chip(Arc::clone(chip)), portfolio)
}

/// Amortized NRE per unit of `package`.
pub fn package_amortized_unit_cost(
    package: &Arc<Package>,
    portfolio: &Portfolio,
) -> ModelResult<f64> {
    amortized_unit_cost(&DesignKey::Package(Arc::clone(package)), portfolio)
}

/// Per package: amortized module NRE carried by one unit.
pub fn module_amortized_cost(portfolio: &Portfolio) -> ModelResult<Vec<(Arc<Package>, f64)>> {
    portfolio
        .packages()
        .map(|p| Ok((Arc::clone(p), apportion_modules(p, portfolio)?)))
        .collect()
}

/// Per package: amortized chip NRE carried by one unit.
pub fn chip_amortized_cost(portfolio: &Portfolio) -> ModelResult<Vec<(Arc<Package>, f64)>> {
    portfolio
        .packages()
        .map(|p| Ok((Arc::clone(p), apportion_chips(p, portfolio)?)))
        .collect()
}

/// Per package: its own amortized package NRE.
pub fn package_amortized_cost(portfolio: &Portfolio) -> ModelResult<Vec<(Arc<Package>, f64)>> {
    portfolio
        .packages()
        .map(|p| Ok((Arc::clone(p), package_amortized_unit_cost(p, portfolio)?)))
        .collect()
}

fn apportion_modules(package: &Arc<Package>, portfolio: &Portfolio) -> ModelResult<f64> {
    let mut own = DesignRegistry::new();
    own.add_package(package);
    let share = own.modules().try_fold(0.0, |acc, m| {
        let unit = module_amortized_unit_cost(m, portfolio)?;
        Ok(acc + unit * package.module_count(m) as f64)
    });
    share
}

fn apportion_chips(package: &Arc<Package>, portfolio: &Portfolio) -> ModelResult<f64> {
    package.chips().iter().try_fold(0.0, |acc, (chip, n)| {
        let unit = chip_amortized_unit_cost(chip, portfolio)?;
        Ok(acc + unit * f64::from(*n))
    })
}

/// Amortized NRE carried by one unit of a package, split by design layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApportionedNre {
    /// Share of module design NRE.
    pub module: f64,
    /// Share of chip design NRE.
    pub chip: f64,
    /// Share of package design NRE.
    pub package: f64,
}

impl ApportionedNre {
    /// Sum of all three shares.
    pub fn total(&self) -> f64 {
        self.module + self.chip + self.package
    }
}

/// Apportioned NRE per unit for every package in the portfolio.
///
/// # Errors
///
/// `InvalidVolume` if any package has zero volume: its own package NRE has
/// no units to spread over, even when all of its dies are produced elsewhere.
pub fn system_total_apportioned_nre(
    portfolio: &Portfolio,
) -> ModelResult<Vec<(Arc<Package>, ApportionedNre)>> {
    portfolio
        .packages()
        .map(|p| {
            let share = ApportionedNre {
                module: apportion_modules(p, portfolio)?,
                chip: apportion_chips(p, portfolio)?,
                package: package_amortized_unit_cost(p, portfolio)?,
            };
            tracing::debug!(
                package = p.name(),
                module = share.module,
                chip = share.chip,
                package_nre = share.package,
                "apportioned nre"
            );
            Ok((Arc::clone(p), share))
        })
        .collect()
}
