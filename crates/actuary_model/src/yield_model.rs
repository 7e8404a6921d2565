//! Defect yield and wafer utilization formulas shared by dies and interposers.

use crate::error::{ModelError, ModelResult};
use actuary_config::ManufactureParams;
use std::f64::consts::PI;

/// Negative-binomial (Murphy/Poisson style) yield for a part of `area` mm².
///
/// `defect_density` is in defects per cm², hence the division by 100.
/// `critical_level` is the clustering parameter: the number of critical
/// layers whose defects combine multiplicatively.
pub fn die_yield(area: f64, defect_density: f64, critical_level: f64) -> f64 {
    (1.0 + defect_density / 100.0 * area / critical_level).powf(-critical_level)
}

/// Gross number of `area` mm² parts on one wafer.
///
/// Each part is padded by the scribe lane into an effective square footprint
/// `A'`; the count is the usable wafer disk divided by `A'` minus the
/// circumference correction for partial parts at the edge.
pub fn dies_per_wafer(area: f64, manufacture: &ManufactureParams) -> f64 {
    let scribe = manufacture.scribe_lane;
    let footprint = area + 2.0 * scribe * area.sqrt() + scribe * scribe;
    let usable_radius = manufacture.wafer_diameter / 2.0 - manufacture.edge_loss;
    PI * usable_radius * usable_radius / footprint
        - PI * (manufacture.wafer_diameter - 2.0 * manufacture.edge_loss) / (2.0 * footprint).sqrt()
}

/// Silicon cost per mm² of good area, relative to a wafer costing its own area.
///
/// Used to compare technologies independently of absolute wafer prices.
pub fn normalized_cost_per_area(
    area: f64,
    defect_density: f64,
    critical_level: f64,
    manufacture: &ManufactureParams,
) -> ModelResult<f64> {
    let count = checked_dies_per_wafer(area, manufacture)?;
    let radius = manufacture.wafer_diameter / 2.0;
    Ok(PI * radius * radius / (count * area) / die_yield(area, defect_density, critical_level))
}

/// Rejects zero, negative, and non-finite areas.
pub(crate) fn check_area(what: &str, area: f64) -> ModelResult<()> {
    if area.is_finite() && area > 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidGeometry(format!(
            "{what} area must be positive, got {area}"
        )))
    }
}

/// [`dies_per_wafer`], failing when not a single part fits.
pub(crate) fn checked_dies_per_wafer(area: f64, manufacture: &ManufactureParams) -> ModelResult<f64> {
    check_area("die", area)?;
    let count = dies_per_wafer(area, manufacture);
    if count > 0.0 {
        Ok(count)
    } else {
        Err(ModelError::InvalidGeometry(format!(
            "{area} mm² does not fit on a {} mm wafer",
            manufacture.wafer_diameter
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wafer() -> ManufactureParams {
        ManufactureParams {
            wafer_diameter: 300.0,
            scribe_lane: 0.2,
            edge_loss: 5.0,
            critical_level: 10.0,
        }
    }

    #[test]
    fn yield_is_one_without_defects() {
        assert_eq!(die_yield(400.0, 0.0, 10.0), 1.0);
    }

    #[test]
    fn yield_decreases_with_area() {
        let small = die_yield(10.0, 0.1, 10.0);
        let large = die_yield(500.0, 0.1, 10.0);
        assert!(small > large);
        assert!(large > 0.0 && small <= 1.0);
    }

    #[test]
    fn yield_matches_closed_form() {
        // (1 + 0.1/100 * 100 / 10)^-10 = 1.01^-10
        let y = die_yield(100.0, 0.1, 10.0);
        assert!((y - 1.01f64.powi(-10)).abs() < 1e-12);
    }

    #[test]
    fn dies_per_wafer_closed_form() {
        let w = wafer();
        let area: f64 = 100.0;
        let a = area + 2.0 * 0.2 * 10.0 + 0.04;
        let expected = PI * 145.0 * 145.0 / a - PI * 290.0 / (2.0 * a).sqrt();
        assert!((dies_per_wafer(area, &w) - expected).abs() < 1e-9);
    }

    #[test]
    fn oversized_die_rejected() {
        let err = checked_dies_per_wafer(80_000.0, &wafer()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidGeometry(_)));
    }

    #[test]
    fn non_positive_area_rejected() {
        assert!(check_area("die", 0.0).is_err());
        assert!(check_area("die", -3.0).is_err());
        assert!(check_area("die", f64::NAN).is_err());
        assert!(check_area("die", 1.0).is_ok());
    }

    #[test]
    fn cost_per_area_grows_with_defects() {
        let w = wafer();
        let clean = normalized_cost_per_area(100.0, 0.0, 10.0, &w).unwrap();
        let dirty = normalized_cost_per_area(100.0, 0.2, 10.0, &w).unwrap();
        assert!(dirty > clean);
        assert!(clean > 1.0, "scribe and edge loss make good area dearer than raw wafer area");
    }
}
