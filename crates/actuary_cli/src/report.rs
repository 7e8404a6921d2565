//! `actuary report`: per-package cost and apportioned NRE of a system.

use std::error::Error;

use actuary_model::{
    system_total_apportioned_nre, total_chip_nre, total_module_nre, total_nre,
    total_package_nre, ApportionedNre, ModelResult, PackageSummary, Portfolio,
};
use serde::Serialize;

use crate::{GlobalArgs, ReportArgs, ReportFormat};

/// One product of the report.
#[derive(Debug, Serialize)]
pub struct ProductReport {
    /// Composition and recurring cost.
    #[serde(flatten)]
    pub summary: PackageSummary,
    /// Units produced.
    pub volume: u64,
    /// Amortized NRE carried by one unit.
    pub nre: ApportionedNre,
}

/// Design NRE of the whole portfolio, each distinct design charged once.
#[derive(Debug, Serialize)]
pub struct NreTotals {
    /// Module design NRE.
    pub module: f64,
    /// Chip design NRE.
    pub chip: f64,
    /// Package design NRE.
    pub package: f64,
    /// All design NRE.
    pub total: f64,
}

/// The complete report.
#[derive(Debug, Serialize)]
pub struct SystemReport {
    /// Products in file order.
    pub products: Vec<ProductReport>,
    /// Portfolio NRE.
    pub nre: NreTotals,
}

impl SystemReport {
    /// Costs every product of `portfolio`.
    pub fn build(portfolio: &Portfolio) -> ModelResult<Self> {
        let products = system_total_apportioned_nre(portfolio)?
            .into_iter()
            .map(|(package, nre)| ProductReport {
                summary: PackageSummary::from_package(&package),
                volume: portfolio.volume(&package).unwrap_or(0),
                nre,
            })
            .collect();
        let nre = NreTotals {
            module: total_module_nre(portfolio.packages()),
            chip: total_chip_nre(portfolio.packages()),
            package: total_package_nre(portfolio.packages()),
            total: total_nre(portfolio.packages()),
        };
        Ok(Self { products, nre })
    }

    /// Renders the report as terminal text.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for product in &self.products {
            out.push_str(&product.summary.to_string());
            out.push('\n');
            out.push_str(&format!("  Volume: {}\n", product.volume));
            out.push_str(&format!(
                "  Amortized NRE per unit: module {:.2}$  chip {:.2}$  package {:.2}$  total {:.2}$\n",
                product.nre.module,
                product.nre.chip,
                product.nre.package,
                product.nre.total()
            ));
            out.push_str(&format!(
                "  Unit cost incl. NRE: {:.2}$\n\n",
                product.summary.total_cost + product.nre.total()
            ));
        }
        out.push_str(&format!(
            "Total NRE: {:.1}$ (module {:.1}$, chip {:.1}$, package {:.1}$)\n",
            self.nre.total, self.nre.module, self.nre.chip, self.nre.package
        ));
        out
    }
}

/// Runs the `actuary report` command.
pub fn run(args: &ReportArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let params = global.parameters()?;
    let portfolio = crate::system::load_system(&args.system, &params)?;

    if !global.quiet {
        eprintln!(
            "   Costing {} package(s) from {}",
            portfolio.len(),
            args.system.display()
        );
    }

    let report = SystemReport::build(&portfolio)?;
    match args.format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(0)
}
