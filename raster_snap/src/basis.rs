//! Derives the world-space step covered by one raster pixel on the XZ plane.
//!
//! Three pixels (the bottom-left corner, one pixel up, one pixel right) are
//! unprojected onto the near plane. The right step is already horizontal for
//! a roll-free camera; the up step is tilted with the camera, so it is laid
//! onto the ground plane and stretched until it projects back onto the same
//! screen-space step.

use glam::{DMat4, DVec2, DVec3, DVec4};
use serde::Deserialize;

use crate::camera::CameraState;
use crate::error::{Precondition, SnapError};

/// Thresholds for deciding a camera is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapTolerances {
    /// Largest accepted vertical slope of the one-pixel right step.
    pub roll: f64,
    /// Smallest accepted cosine between the up step and the ground plane, and
    /// the smallest downward component of the view direction.
    pub horizon: f64,
}

impl Default for SnapTolerances {
    fn default() -> Self {
        Self {
            roll: 1e-5,
            horizon: 1e-9,
        }
    }
}

impl SnapTolerances {
    /// Both thresholds must be finite and non-negative; a negative horizon
    /// would let sky-facing cameras through.
    pub fn is_valid(&self) -> bool {
        self.roll.is_finite()
            && self.roll >= 0.0
            && self.horizon.is_finite()
            && self.horizon >= 0.0
    }
}

/// Unit directions on the world XZ plane for one pixel step right/up in
/// raster space, with the world length of each step stored beside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapBasis {
    /// World (x, z) direction of one pixel to the right.
    pub right: DVec2,
    /// World (x, z) direction of one pixel up the screen.
    pub up: DVec2,
    pub right_magnitude: f64,
    pub up_magnitude: f64,
}

impl SnapBasis {
    pub fn new(right: DVec2, up: DVec2, right_magnitude: f64, up_magnitude: f64) -> Self {
        Self {
            right,
            up,
            right_magnitude,
            up_magnitude,
        }
    }

    /// Basis aligned with world X/Z using the given cell sizes.
    pub fn axis_aligned(right_magnitude: f64, up_magnitude: f64) -> Self {
        Self::new(DVec2::X, DVec2::Y, right_magnitude, up_magnitude)
    }
}

/// Compute the snap basis for `camera`.
///
/// Fails when the camera has roll, looks at or above the horizon, or its
/// projection cannot be inverted. Callers normally skip snapping for that
/// frame and keep the previous basis; see [`crate::CachedSnapper`].
pub fn compute_snap_basis(
    camera: &CameraState,
    tolerances: &SnapTolerances,
) -> Result<SnapBasis, SnapError> {
    if !tolerances.is_valid() {
        return Err(Precondition::InvalidTolerances {
            roll: tolerances.roll,
            horizon: tolerances.horizon,
        }
        .into());
    }
    let clip_to_world = camera.clip_to_world()?;

    let bottom_left = unproject(&clip_to_world, camera.pixel_to_clip(DVec2::ZERO));
    let one_px_up = unproject(&clip_to_world, camera.pixel_to_clip(DVec2::Y));
    let one_px_right = unproject(&clip_to_world, camera.pixel_to_clip(DVec2::X));

    let snap_right = one_px_right - bottom_left;
    let snap_up = one_px_up - bottom_left;

    let right_magnitude = snap_right.length();
    if !right_magnitude.is_finite() || right_magnitude <= 0.0 {
        return Err(Precondition::SingularProjection.into());
    }
    let slope = snap_right.y / right_magnitude;
    if slope.abs() > tolerances.roll {
        return Err(Precondition::CameraRoll { slope }.into());
    }

    let pitch_degrees = camera.projection_angle_degrees();
    if camera.forward().y > -tolerances.horizon {
        return Err(Precondition::AboveHorizon { pitch_degrees }.into());
    }

    //            snap_up
    //              /|
    //           a / |
    //            /  |
    //           /t  |
    //   o------------------>  ground
    //            b
    let up_direction = snap_up.normalize_or_zero();
    let ground_direction = DVec3::new(snap_up.x, 0.0, snap_up.z).normalize_or_zero();
    let cos_theta = up_direction.dot(ground_direction);
    if cos_theta.is_nan() || cos_theta <= tolerances.horizon {
        return Err(Precondition::AboveHorizon { pitch_degrees }.into());
    }
    let snap_up = ground_direction * (snap_up.length() / cos_theta);
    let up_magnitude = snap_up.length();

    let snap_right = snap_right / right_magnitude;
    let snap_up = snap_up / up_magnitude;
    debug_assert!(snap_right.y.abs() <= tolerances.roll);
    debug_assert!(snap_up.y == 0.0);

    let basis = SnapBasis::new(
        DVec2::new(snap_right.x, snap_right.z),
        DVec2::new(snap_up.x, snap_up.z),
        right_magnitude,
        up_magnitude,
    );
    log::debug!(
        "snap basis right={} ({:e}) up={} ({:e})",
        basis.right,
        basis.right_magnitude,
        basis.up,
        basis.up_magnitude
    );
    Ok(basis)
}

fn unproject(clip_to_world: &DMat4, clip: DVec4) -> DVec3 {
    let world = *clip_to_world * clip;
    world.truncate() / world.w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{rotation_from_degrees, Lens, Viewport};

    fn camera_with(yaw: f64, pitch: f64, roll: f64) -> CameraState {
        CameraState::new(
            DVec3::new(3.0, 8.0, -4.0),
            rotation_from_degrees(yaw, pitch, roll),
            Lens::default(),
            Viewport::new(1920, 1080),
        )
    }

    fn canonical_camera() -> CameraState {
        CameraState::look_at(
            DVec3::new(0.0, 10.0, -10.0),
            DVec3::ZERO,
            Lens::default(),
            Viewport::new(1920, 1080),
        )
        .expect("distinct eye and target")
    }

    #[test]
    fn canonical_camera_yields_orthogonal_ground_basis() {
        let camera = canonical_camera();
        let basis = compute_snap_basis(&camera, &SnapTolerances::default()).expect("basis");

        assert!(basis.right_magnitude.is_finite() && basis.right_magnitude > 0.0);
        assert!(basis.up_magnitude.is_finite() && basis.up_magnitude > 0.0);
        assert!(basis.right_magnitude < 1.0 && basis.up_magnitude < 1.0);
        assert!((basis.right.length() - 1.0).abs() <= 1e-9);
        assert!((basis.up.length() - 1.0).abs() <= 1e-9);
        assert!(basis.right.dot(basis.up).abs() <= 1e-6);

        // Screen-up runs away from the camera along +Z on the ground.
        assert!(basis.up.y > 0.999);
    }

    #[test]
    fn magnitudes_follow_near_plane_pixel_size() {
        let camera = canonical_camera();
        let basis = compute_snap_basis(&camera, &SnapTolerances::default()).expect("basis");

        let lens = camera.lens;
        let pixel = 2.0 * lens.near_clip * (lens.fov_y_degrees.to_radians() / 2.0).tan() / 1080.0;
        assert!((basis.right_magnitude - pixel).abs() <= pixel * 1e-6);

        // Pitched 45 degrees down, the up step stretches by 1 / cos(45).
        let stretched = pixel * 2.0f64.sqrt();
        assert!((basis.up_magnitude - stretched).abs() <= stretched * 1e-6);
    }

    #[test]
    fn yawed_camera_rotates_the_basis() {
        let basis = compute_snap_basis(&camera_with(90.0, 30.0, 0.0), &SnapTolerances::default())
            .expect("basis");
        // Looking along -X: screen right is -Z, screen up runs along -X.
        assert!((basis.right - DVec2::new(0.0, -1.0)).length() <= 1e-9);
        assert!((basis.up - DVec2::new(-1.0, 0.0)).length() <= 1e-9);
    }

    #[test]
    fn rolled_camera_is_rejected() {
        let err = compute_snap_basis(&camera_with(0.0, 45.0, 10.0), &SnapTolerances::default())
            .expect_err("roll must be rejected");
        assert!(matches!(
            err,
            SnapError::Precondition(Precondition::CameraRoll { .. })
        ));
        assert!(err.is_precondition());
    }

    #[test]
    fn level_camera_is_rejected() {
        let err = compute_snap_basis(&camera_with(25.0, 0.0, 0.0), &SnapTolerances::default())
            .expect_err("horizon must be rejected");
        assert!(matches!(
            err,
            SnapError::Precondition(Precondition::AboveHorizon { .. })
        ));
    }

    #[test]
    fn upward_camera_is_rejected() {
        let err = compute_snap_basis(&camera_with(0.0, -20.0, 0.0), &SnapTolerances::default())
            .expect_err("sky-facing camera must be rejected");
        assert!(matches!(
            err,
            SnapError::Precondition(Precondition::AboveHorizon { .. })
        ));
    }

    #[test]
    fn negative_horizon_tolerance_is_rejected() {
        let tolerances = SnapTolerances {
            horizon: -0.5,
            ..SnapTolerances::default()
        };
        assert!(!tolerances.is_valid());
        let err = compute_snap_basis(&camera_with(0.0, -20.0, 0.0), &tolerances)
            .expect_err("sky-facing camera must stay rejected");
        assert_eq!(
            err,
            SnapError::Precondition(Precondition::InvalidTolerances {
                roll: 1e-5,
                horizon: -0.5
            })
        );
    }

    #[test]
    fn non_finite_roll_tolerance_is_rejected() {
        for roll in [f64::NAN, f64::INFINITY, -1e-5] {
            let tolerances = SnapTolerances {
                roll,
                ..SnapTolerances::default()
            };
            let err = compute_snap_basis(&camera_with(0.0, 45.0, 0.0), &tolerances)
                .expect_err("unusable roll tolerance");
            assert!(matches!(
                err,
                SnapError::Precondition(Precondition::InvalidTolerances { .. })
            ));
        }
    }

    #[test]
    fn looser_roll_tolerance_accepts_slight_roll() {
        let camera = camera_with(0.0, 45.0, 0.01);
        assert!(compute_snap_basis(&camera, &SnapTolerances::default()).is_err());

        let tolerances = SnapTolerances {
            roll: 1e-2,
            ..SnapTolerances::default()
        };
        assert!(compute_snap_basis(&camera, &tolerances).is_ok());
    }
}
