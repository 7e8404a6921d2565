//! Interposer-class cost rules shared by fan-out RDL and silicon interposers.
//!
//! The interposer sits on an outer organic substrate, so three yields stack:
//! the interposer's own defect yield `y1`, die-to-interposer bonding over all
//! dies `y2`, and the interposer-to-substrate bond `y3`. Which of them a
//! failure scraps depends on the assembly order.

use super::{AssemblyOrder, CostBreakdown, Package};
use crate::yield_model::{die_yield, dies_per_wafer};
use actuary_config::InterposerParams;

pub(super) fn interposer_area(package: &Package, ip: &InterposerParams) -> f64 {
    package.total_module_area() * ip.area_scale_factor
}

pub(super) fn area(package: &Package, ip: &InterposerParams) -> f64 {
    interposer_area(package, ip) * package.organic.area_scale_factor
}

pub(super) fn nre(package: &Package, ip: &InterposerParams) -> f64 {
    interposer_area(package, ip) * ip.nre_cost_factor
        + ip.nre_cost_fixed
        + area(package, ip) * package.organic.re_cost_factor
}

pub(super) fn package_yield(package: &Package, ip: &InterposerParams) -> f64 {
    die_yield(
        interposer_area(package, ip),
        ip.defect_density,
        ip.critical_level,
    )
}

pub(super) fn interposers_per_wafer(package: &Package, ip: &InterposerParams) -> f64 {
    dies_per_wafer(interposer_area(package, ip), &package.manufacture)
}

pub(super) fn cost_interposer(package: &Package, ip: &InterposerParams) -> f64 {
    ip.wafer_cost / interposers_per_wafer(package, ip)
        + interposer_area(package, ip) * package.organic.bump_cost_factor
}

pub(super) fn cost_substrate(package: &Package, ip: &InterposerParams) -> f64 {
    area(package, ip) * package.organic.re_cost_factor
}

pub(super) fn cost_re(package: &Package, ip: &InterposerParams) -> CostBreakdown {
    let mut raw_chips = 0.0;
    let mut defect_chips = 0.0;
    for (chip, n) in &package.chips {
        let n = f64::from(*n);
        // Micro-bumps are charged once per distinct die, not per instance.
        raw_chips += chip.cost_raw_die() * n + chip.bumped_area() * ip.micro_bump_cost_factor;
        defect_chips += chip.cost_defect() * n;
    }

    let y1 = package_yield(package, ip);
    let y2 = ip.bonding_yield.powf(f64::from(package.chip_count()));
    let y3 = package.organic.bonding_yield;

    let interposer = cost_interposer(package, ip);
    let substrate = cost_substrate(package, ip);
    let substrate_loss = substrate * (1.0 / y3 - 1.0);

    let (defect_package, wasted_kgd) = match package.kind.assembly_order() {
        AssemblyOrder::ChipLast => (
            interposer * (1.0 / (y1 * y2 * y3) - 1.0) + substrate_loss,
            (raw_chips + defect_chips) * (1.0 / (y2 * y3) - 1.0),
        ),
        AssemblyOrder::ChipFirst => (
            interposer * (1.0 / (y1 * y3) - 1.0) + substrate_loss,
            (raw_chips + defect_chips) * (1.0 / (y1 * y3) - 1.0),
        ),
    };

    CostBreakdown {
        raw_chips,
        defect_chips,
        raw_package: interposer + substrate,
        defect_package,
        wasted_kgd,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{die, table};
    use super::super::PackageKind;
    use super::*;

    #[test]
    fn assembly_order_changes_breakdown() {
        let params = table();
        let chips = [(die("a", 80.0, &params), 2), (die("b", 30.0, &params), 1)];
        let last = Package::fan_out("fo", chips.clone(), AssemblyOrder::ChipLast, &params).unwrap();
        let first = Package::fan_out("fo", chips, AssemblyOrder::ChipFirst, &params).unwrap();
        let (a, b) = (last.cost_re(), first.cost_re());
        assert_eq!(a.raw_chips, b.raw_chips);
        assert_eq!(a.raw_package, b.raw_package);
        assert_ne!(a.as_tuple(), b.as_tuple());
        assert_ne!(a.defect_package, b.defect_package);
    }

    #[test]
    fn chip_last_stacking_formula() {
        let params = table();
        let pkg = Package::fan_out(
            "fo",
            [(die("a", 80.0, &params), 3)],
            AssemblyOrder::ChipLast,
            &params,
        )
        .unwrap();
        let re = pkg.cost_re();
        let y1 = pkg.package_yield().unwrap();
        let y2 = params.fan_out.bonding_yield.powi(3);
        let y3 = params.organic.bonding_yield;
        let ci = pkg.cost_interposer().unwrap();
        let cs = pkg.cost_substrate().unwrap();
        let expected = ci * (1.0 / (y1 * y2 * y3) - 1.0) + cs * (1.0 / y3 - 1.0);
        assert!((re.defect_package - expected).abs() < 1e-9);
        let wasted = (re.raw_chips + re.defect_chips) * (1.0 / (y2 * y3) - 1.0);
        assert!((re.wasted_kgd - wasted).abs() < 1e-9);
    }

    #[test]
    fn chip_first_stacking_formula() {
        let params = table();
        let pkg = Package::fan_out(
            "fo",
            [(die("a", 80.0, &params), 3)],
            AssemblyOrder::ChipFirst,
            &params,
        )
        .unwrap();
        let re = pkg.cost_re();
        let y1 = pkg.package_yield().unwrap();
        let y3 = params.organic.bonding_yield;
        let ci = pkg.cost_interposer().unwrap();
        let cs = pkg.cost_substrate().unwrap();
        let expected = ci * (1.0 / (y1 * y3) - 1.0) + cs * (1.0 / y3 - 1.0);
        assert!((re.defect_package - expected).abs() < 1e-9);
        let wasted = (re.raw_chips + re.defect_chips) * (1.0 / (y1 * y3) - 1.0);
        assert!((re.wasted_kgd - wasted).abs() < 1e-9);
    }

    #[test]
    fn silicon_uses_bonded_stacking() {
        let params = table();
        let chips = [(die("a", 80.0, &params), 2)];
        let si = Package::silicon_interposer("si", chips, &params).unwrap();
        assert_eq!(si.kind(), PackageKind::SiliconInterposer);
        let re = si.cost_re();
        let y2 = params.silicon.bonding_yield.powi(2);
        let y3 = params.organic.bonding_yield;
        let wasted = (re.raw_chips + re.defect_chips) * (1.0 / (y2 * y3) - 1.0);
        assert!((re.wasted_kgd - wasted).abs() < 1e-9);
    }

    #[test]
    fn interposer_cost_terms() {
        let params = table();
        let pkg = Package::silicon_interposer("si", [(die("a", 100.0, &params), 2)], &params)
            .unwrap();
        let ip_area = pkg.interposer_area().unwrap();
        let expected = params.silicon.wafer_cost / pkg.interposers_per_wafer().unwrap()
            + ip_area * params.organic.bump_cost_factor;
        assert_eq!(pkg.cost_interposer().unwrap(), expected);
        assert!(
            (pkg.cost_substrate().unwrap() - pkg.area() * params.organic.re_cost_factor).abs()
                < 1e-12
        );
        let y = pkg.package_yield().unwrap();
        assert!(y > 0.0 && y <= 1.0);
    }

    #[test]
    fn nre_terms() {
        let params = table();
        let pkg = Package::fan_out(
            "fo",
            [(die("a", 50.0, &params), 2)],
            AssemblyOrder::ChipLast,
            &params,
        )
        .unwrap();
        let fo = params.fan_out;
        let expected = pkg.interposer_area().unwrap() * fo.nre_cost_factor
            + fo.nre_cost_fixed
            + pkg.area() * params.organic.re_cost_factor;
        assert_eq!(pkg.nre(), expected);
    }
}
