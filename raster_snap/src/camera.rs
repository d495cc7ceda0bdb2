//! Camera pose and projection state consumed by the snapping math.
//! World space is right-handed with +Y up. Cameras look down their local -Z
//! axis and project with an OpenGL depth range, so the near plane sits at
//! NDC z = -1.

use glam::{DMat4, DQuat, DVec2, DVec3, DVec4};

use crate::error::{Precondition, SnapError};

/// Pixel dimensions of the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    fn size(&self) -> DVec2 {
        DVec2::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Perspective lens parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    /// Vertical field of view.
    pub fov_y_degrees: f64,
    pub near_clip: f64,
    pub far_clip: f64,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near_clip: 0.3,
            far_clip: 1000.0,
        }
    }
}

impl Lens {
    pub(crate) fn is_usable(&self) -> bool {
        self.fov_y_degrees.is_finite()
            && self.fov_y_degrees > 0.0
            && self.fov_y_degrees < 180.0
            && self.near_clip.is_finite()
            && self.near_clip > 0.0
            && self.far_clip.is_finite()
            && self.far_clip > self.near_clip
    }
}

/// Build a camera rotation from yaw/pitch/roll degrees.
///
/// Yaw spins around +Y, pitch tilts the view downwards (positive values look
/// at the ground) and roll spins around the view axis. Yaw 0 looks along -Z.
pub fn rotation_from_degrees(yaw: f64, pitch: f64, roll: f64) -> DQuat {
    let yaw_y = DQuat::from_rotation_y(yaw.to_radians());
    let pitch_x = DQuat::from_rotation_x(-pitch.to_radians());
    let roll_z = DQuat::from_rotation_z(roll.to_radians());
    yaw_y * pitch_x * roll_z
}

/// Everything the snapping code needs to know about a camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: DVec3,
    /// Rotation from camera-local axes (+X right, +Y up, -Z forward) into world space.
    pub rotation: DQuat,
    pub lens: Lens,
    pub viewport: Viewport,
}

impl CameraState {
    pub fn new(position: DVec3, rotation: DQuat, lens: Lens, viewport: Viewport) -> Self {
        Self {
            position,
            rotation,
            lens,
            viewport,
        }
    }

    /// Orient a roll-free camera at `eye` towards `target`. Returns `None` when
    /// the two points coincide.
    pub fn look_at(eye: DVec3, target: DVec3, lens: Lens, viewport: Viewport) -> Option<Self> {
        let forward = target - eye;
        if forward.length_squared() <= f64::EPSILON {
            return None;
        }
        let forward = forward.normalize();
        let pitch = (-forward.y).clamp(-1.0, 1.0).asin();
        let yaw = (-forward.x).atan2(-forward.z);
        let rotation = rotation_from_degrees(yaw.to_degrees(), pitch.to_degrees(), 0.0);
        Some(Self::new(eye, rotation, lens, viewport))
    }

    pub fn forward(&self) -> DVec3 {
        self.rotation * DVec3::NEG_Z
    }

    pub fn right(&self) -> DVec3 {
        self.rotation * DVec3::X
    }

    pub fn up(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    /// Downward tilt of the view direction, in degrees. Zero looks at the
    /// horizon, 90 looks straight down.
    pub fn projection_angle_degrees(&self) -> f64 {
        (-self.forward().y).clamp(-1.0, 1.0).asin().to_degrees()
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh_gl(
            self.lens.fov_y_degrees.to_radians(),
            self.viewport.aspect_ratio(),
            self.lens.near_clip,
            self.lens.far_clip,
        )
    }

    pub fn camera_to_world(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Inverse projection followed by the camera-to-world transform.
    pub fn clip_to_world(&self) -> Result<DMat4, SnapError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Precondition::EmptyViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            }
            .into());
        }
        if !self.lens.is_usable() {
            return Err(Precondition::InvalidLens {
                fov_y_degrees: self.lens.fov_y_degrees,
                near_clip: self.lens.near_clip,
                far_clip: self.lens.far_clip,
            }
            .into());
        }

        let projection = self.projection_matrix();
        let determinant = projection.determinant();
        if !determinant.is_finite() || determinant == 0.0 {
            return Err(Precondition::SingularProjection.into());
        }
        Ok(self.camera_to_world() * projection.inverse())
    }

    /// Clip-space coordinates of `pixel` on the near plane.
    pub fn pixel_to_clip(&self, pixel: DVec2) -> DVec4 {
        let ndc = 2.0 * pixel / self.viewport.size() - DVec2::ONE;
        DVec4::new(ndc.x, ndc.y, -1.0, 1.0)
    }
}
