//! Organic substrate cost rules.

use super::{CostBreakdown, Package};

/// Substrates above this area (30 × 30 mm) need the most routing layers.
const LARGE_SUBSTRATE_AREA: f64 = 30.0 * 30.0;
/// Substrates above this area (17 × 17 mm) need extra routing layers.
const MEDIUM_SUBSTRATE_AREA: f64 = 17.0 * 17.0;

pub(super) fn area(package: &Package) -> f64 {
    package.total_module_area() * package.organic.area_scale_factor
}

/// Extra substrate layers for routing die-to-die links; a lone die needs none.
pub(super) fn layer_multiplier(package: &Package) -> f64 {
    if package.chip_count() == 1 {
        return 1.0;
    }
    let area = area(package);
    if area > LARGE_SUBSTRATE_AREA {
        2.0
    } else if area > MEDIUM_SUBSTRATE_AREA {
        1.75
    } else {
        1.5
    }
}

pub(super) fn nre(package: &Package) -> f64 {
    let os = &package.organic;
    area(package) * os.nre_cost_factor * layer_multiplier(package) + os.nre_cost_fixed
}

pub(super) fn cost_raw_package(package: &Package) -> f64 {
    area(package) * package.organic.re_cost_factor * layer_multiplier(package)
}

/// Every bond must succeed: assembly loss is charged once against the
/// substrate and once against the dies scrapped with it.
pub(super) fn cost_re(package: &Package) -> CostBreakdown {
    let os = &package.organic;
    let mut raw_chips = 0.0;
    let mut defect_chips = 0.0;
    for (chip, n) in &package.chips {
        let n = f64::from(*n);
        raw_chips += (chip.cost_raw_die() + chip.bumped_area() * os.bump_cost_factor) * n;
        defect_chips += chip.cost_defect() * n;
    }

    let bond_loss = 1.0 / os.bonding_yield.powf(f64::from(package.chip_count())) - 1.0;
    let raw_package = cost_raw_package(package);

    CostBreakdown {
        raw_chips,
        defect_chips,
        raw_package,
        defect_package: raw_package * bond_loss,
        wasted_kgd: (raw_chips + defect_chips) * bond_loss,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{die, table};
    use super::*;
    use actuary_config::ParameterTable;

    fn with_os_scale(scale: f64) -> ParameterTable {
        let text = actuary_config::DEFAULT_PARAMETERS
            .replace("area_scale_factor = 4.0", &format!("area_scale_factor = {scale:?}"));
        actuary_config::load_parameters_from_str(&text).unwrap()
    }

    #[test]
    fn single_die_never_gets_extra_layers() {
        let params = table();
        let pkg = Package::organic("big", [(die("a", 600.0, &params), 1)], &params).unwrap();
        assert!(area(&pkg) > LARGE_SUBSTRATE_AREA);
        assert_eq!(layer_multiplier(&pkg), 1.0);
    }

    #[test]
    fn five_dies_multiplier_follows_area() {
        for (scale, expected) in [(1.0, 1.5), (1.2, 1.75), (4.0, 2.0)] {
            let params = with_os_scale(scale);
            let d = die("a", 50.0, &params);
            let pkg = Package::organic("five", [(d, 5)], &params).unwrap();
            assert_eq!(pkg.total_module_area(), 250.0);
            assert_eq!(pkg.layer_multiplier().unwrap(), expected, "scale {scale}");
            let os = params.organic;
            assert_eq!(
                pkg.nre(),
                pkg.area() * os.nre_cost_factor * expected + os.nre_cost_fixed
            );
        }
    }

    #[test]
    fn bond_loss_hits_package_and_dies() {
        let params = table();
        let pkg = Package::organic("pair", [(die("a", 60.0, &params), 2)], &params).unwrap();
        let re = pkg.cost_re();
        let loss = 1.0 / params.organic.bonding_yield.powi(2) - 1.0;
        assert!((re.defect_package - re.raw_package * loss).abs() < 1e-12);
        assert!((re.wasted_kgd - (re.raw_chips + re.defect_chips) * loss).abs() < 1e-9);
    }

    #[test]
    fn raw_chips_include_c4_bumps() {
        let params = table();
        let d = die("a", 60.0, &params);
        let pkg = Package::organic("pair", [(d.clone(), 2)], &params).unwrap();
        let expected = (d.cost_raw_die() + 60.0 * params.organic.bump_cost_factor) * 2.0;
        assert_eq!(pkg.cost_re().raw_chips, expected);
    }
}
