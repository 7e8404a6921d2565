//! Die-to-die PHY sizing from bump count.

use crate::error::{ModelError, ModelResult};

/// Default micro-bump pitch in mm.
pub const DEFAULT_BUMP_PITCH: f64 = 0.055;
/// Default PHY depth (edge-normal extent) in mm.
pub const DEFAULT_PHY_DEPTH: f64 = 1.0;

/// Silicon area in mm² of a PHY with `pin_count` bumps on a hexagonal grid.
///
/// Rows are staggered, so the row pitch is `pitch·√3/2`. The PHY spans as
/// many columns as needed to fit every pin, plus one column of margin.
///
/// # Errors
///
/// `InvalidGeometry` if pitch or depth is not positive, or the depth cannot
/// hold a single row of bumps.
pub fn phy_area(pin_count: u32, pitch: f64, depth: f64) -> ModelResult<f64> {
    if !(pitch > 0.0 && pitch.is_finite() && depth > 0.0 && depth.is_finite()) {
        return Err(ModelError::InvalidGeometry(format!(
            "phy pitch {pitch} and depth {depth} must be positive"
        )));
    }
    let row_pitch = pitch * 3f64.sqrt() / 2.0;
    let depth_pads = (depth / row_pitch).floor();
    if depth_pads < 1.0 {
        return Err(ModelError::InvalidGeometry(format!(
            "phy depth {depth} mm holds no row at pitch {pitch} mm"
        )));
    }
    let width_pads = (f64::from(pin_count) / depth_pads).ceil();
    Ok((width_pads + 1.0) * pitch * depth)
}
