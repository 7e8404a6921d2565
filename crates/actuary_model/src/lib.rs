//! Recurring and non-recurring cost model for monolithic and multi-die systems.
//!
//! Designs compose bottom-up: a [`Module`] is a block of IP at a process
//! node, a [`Chip`] is a die holding modules, and a [`Package`] assembles
//! dies on an organic substrate, a fan-out RDL, or a silicon interposer.
//! Recurring cost follows from wafer geometry and defect yield; design NRE
//! is deduplicated across a [`Portfolio`] of products and amortized over
//! their volumes.
//!
//! ```
//! use actuary_model::{Chip, Module, Package};
//! use std::sync::Arc;
//!
//! let params = actuary_config::default_parameters().unwrap();
//! let cpu = Arc::new(Module::new("cpu", "7", 80.0, &params).unwrap());
//! let chiplet = Arc::new(Chip::chiplet(cpu, 5.0, &params).unwrap());
//! let package = Package::organic("quad", [(chiplet, 4)], &params).unwrap();
//! assert!(package.cost_total_system() > 0.0);
//! ```

#![warn(missing_docs)]

pub mod amortize;
pub mod chip;
pub mod error;
pub mod module;
mod overrides;
pub mod package;
pub mod phy;
pub mod registry;
pub mod report;
pub mod yield_model;

pub use amortize::{
    amortized_unit_cost, chip_amortized_cost, chip_amortized_unit_cost, distinct_chips,
    distinct_modules, distinct_packages, module_amortized_cost, module_amortized_unit_cost,
    package_amortized_cost, package_amortized_unit_cost, system_total_apportioned_nre,
    total_chip_nre, total_module_nre, total_nre, total_package_nre, ApportionedNre, Portfolio,
};
pub use chip::{Chip, ChipKind};
pub use error::{ModelError, ModelResult};
pub use module::{Module, ModuleKind};
pub use package::{AssemblyOrder, CostBreakdown, Package, PackageKind};
pub use phy::{phy_area, DEFAULT_BUMP_PITCH, DEFAULT_PHY_DEPTH};
pub use registry::{DesignKey, DesignRegistry};
pub use report::{DieLine, Integration, ModuleLine, PackageSummary};
pub use yield_model::{die_yield, dies_per_wafer, normalized_cost_per_area};
