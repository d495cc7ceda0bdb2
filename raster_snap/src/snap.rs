use glam::{DMat2, DVec2, DVec3};

use crate::basis::SnapBasis;
use crate::error::SnapError;

/// Determinants at or below this are treated as singular.
const DETERMINANT_EPSILON: f64 = 1e-12;

/// Rounding budget, in ulps of the position's extent, granted to the trip
/// through basis space and back before flooring.
const ROUND_TRIP_ULPS: f64 = 64.0;

/// Snap `world_position` onto the raster grid described by `basis`.
///
/// The XZ position is moved into basis space, floored to whole pixel steps and
/// moved back. Y passes through untouched. Snapping an already snapped
/// position returns it unchanged.
pub fn snap(world_position: DVec3, basis: &SnapBasis) -> Result<DVec3, SnapError> {
    let snap_to_world = DMat2::from_cols(basis.right, basis.up);
    let determinant = snap_to_world.determinant();
    if !determinant.is_finite() || determinant.abs() <= DETERMINANT_EPSILON {
        return Err(SnapError::DegenerateBasis { determinant });
    }
    if !is_step(basis.right_magnitude) || !is_step(basis.up_magnitude) {
        return Err(SnapError::DegenerateBasis { determinant });
    }
    let world_to_snap = snap_to_world.inverse();

    let world_xz = DVec2::new(world_position.x, world_position.z);
    let snap_position = world_to_snap * world_xz;
    // Rounding error through M and its inverse grows with the position's
    // distance from the origin, not with each basis coordinate.
    let reach = world_xz.length() / determinant.abs();
    let snapped = DVec2::new(
        floor_to_step(snap_position.x, basis.right_magnitude, reach),
        floor_to_step(snap_position.y, basis.up_magnitude, reach),
    );
    let snapped_world = snap_to_world * snapped;

    Ok(DVec3::new(snapped_world.x, world_position.y, snapped_world.y))
}

fn is_step(magnitude: f64) -> bool {
    magnitude.is_finite() && magnitude > 0.0
}

/// Floor `value` to a multiple of `step`, letting values a few ulps of `reach`
/// below a grid line count as on it.
fn floor_to_step(value: f64, step: f64, reach: f64) -> f64 {
    let cells = value / step;
    let slack = ROUND_TRIP_ULPS * f64::EPSILON * (reach / step).max(1.0);
    (cells + slack).floor() * step
}
