use thiserror::Error;

/// Camera or projection configurations the snapping math cannot handle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Precondition {
    #[error("camera must have yaw/pitch only (one-pixel right step has vertical slope {slope:e})")]
    CameraRoll { slope: f64 },
    #[error("camera must not point at or above the horizon (pitch {pitch_degrees:.3} degrees)")]
    AboveHorizon { pitch_degrees: f64 },
    #[error("viewport must be at least one pixel in each dimension (got {width}x{height})")]
    EmptyViewport { width: u32, height: u32 },
    #[error("lens is unusable (fov {fov_y_degrees} degrees, near {near_clip}, far {far_clip})")]
    InvalidLens {
        fov_y_degrees: f64,
        near_clip: f64,
        far_clip: f64,
    },
    #[error("snap tolerances must be finite and non-negative (roll {roll}, horizon {horizon})")]
    InvalidTolerances { roll: f64, horizon: f64 },
    #[error("camera projection is not invertible")]
    SingularProjection,
    #[error("projection angle {degrees} degrees leaves no height to scale by")]
    DegenerateProjectionAngle { degrees: f64 },
}

/// Error conditions returned by the snapping helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapError {
    #[error(transparent)]
    Precondition(#[from] Precondition),
    #[error("snap basis is degenerate (determinant {determinant:e})")]
    DegenerateBasis { determinant: f64 },
}

impl SnapError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}
