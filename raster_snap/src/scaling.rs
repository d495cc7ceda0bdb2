//! Height correction for upright sprites viewed by a tilted camera.
//!
//! A billboard standing on the ground appears shorter the further the camera
//! pitches down. Stretching it along Y by the inverse cosine (or sine, for
//! sprites lying along Z) of the projection angle restores its authored
//! proportions on screen.

use glam::DVec3;
use serde::Deserialize;

use crate::error::{Precondition, SnapError};

/// World axis the sprite's face is aligned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAxis {
    #[default]
    Up,
    Right,
    Forward,
}

/// Scale to apply to a sprite aligned with `axis` under a camera pitched
/// `projection_angle_degrees` below the horizon.
pub fn projection_scale(
    axis: ScalingAxis,
    projection_angle_degrees: f64,
) -> Result<DVec3, SnapError> {
    let angle = projection_angle_degrees.to_radians();
    let divisor = match axis {
        ScalingAxis::Up | ScalingAxis::Right => angle.cos(),
        ScalingAxis::Forward => angle.sin(),
    };
    if !divisor.is_finite() || divisor.abs() <= f64::EPSILON {
        return Err(Precondition::DegenerateProjectionAngle {
            degrees: projection_angle_degrees,
        }
        .into());
    }
    Ok(DVec3::new(1.0, 1.0 + (1.0 - divisor) / divisor, 1.0))
}
