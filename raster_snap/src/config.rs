//! JSON scene descriptions: a camera, optional tolerances and positions to
//! snap. Consumed by `raster_probe` and by hosts that keep camera rigs in
//! data files.

use std::fs;
use std::path::{Path, PathBuf};

use glam::DVec3;
use serde::Deserialize;
use thiserror::Error;

use crate::basis::SnapTolerances;
use crate::camera::{rotation_from_degrees, CameraState, Lens, Viewport};
use crate::scaling::ScalingAxis;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading scene {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing scene: {0}")]
    Json(#[from] serde_json::Error),
    #[error("camera needs exactly one of `look_at` or `rotation`")]
    Orientation,
    #[error("camera position and look_at target coincide")]
    EyeAtTarget,
    #[error("viewport must be at least one pixel in each dimension (got {0}x{1})")]
    EmptyViewport(u32, u32),
    #[error("tolerances must be finite and non-negative (roll {roll}, horizon {horizon})")]
    InvalidTolerances { roll: f64, horizon: f64 },
    #[error("lens is unusable (fov {fov_degrees} degrees, near {near_clip}, far {far_clip})")]
    InvalidLens {
        fov_degrees: f64,
        near_clip: f64,
        far_clip: f64,
    },
}

/// Camera rotation in degrees; see [`rotation_from_degrees`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraConfig {
    pub position: [f64; 3],
    #[serde(default)]
    pub look_at: Option<[f64; 3]>,
    #[serde(default)]
    pub rotation: Option<RotationConfig>,
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f64,
    #[serde(default = "default_near_clip")]
    pub near_clip: f64,
    #[serde(default = "default_far_clip")]
    pub far_clip: f64,
    /// Width and height in pixels.
    pub viewport: [u32; 2],
}

fn default_fov_degrees() -> f64 {
    Lens::default().fov_y_degrees
}

fn default_near_clip() -> f64 {
    Lens::default().near_clip
}

fn default_far_clip() -> f64 {
    Lens::default().far_clip
}

impl CameraConfig {
    pub fn to_camera_state(&self) -> Result<CameraState, ConfigError> {
        let [width, height] = self.viewport;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyViewport(width, height));
        }
        let lens = Lens {
            fov_y_degrees: self.fov_degrees,
            near_clip: self.near_clip,
            far_clip: self.far_clip,
        };
        if !lens.is_usable() {
            return Err(ConfigError::InvalidLens {
                fov_degrees: self.fov_degrees,
                near_clip: self.near_clip,
                far_clip: self.far_clip,
            });
        }

        let position = DVec3::from_array(self.position);
        let viewport = Viewport::new(width, height);
        match (self.look_at, self.rotation) {
            (Some(target), None) => {
                CameraState::look_at(position, DVec3::from_array(target), lens, viewport)
                    .ok_or(ConfigError::EyeAtTarget)
            }
            (None, Some(rotation)) => Ok(CameraState::new(
                position,
                rotation_from_degrees(rotation.yaw, rotation.pitch, rotation.roll),
                lens,
                viewport,
            )),
            _ => Err(ConfigError::Orientation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    #[serde(default)]
    pub tolerances: SnapTolerances,
    #[serde(default)]
    pub positions: Vec<[f64; 3]>,
    /// Sprite alignment to report a projection scale for.
    #[serde(default)]
    pub sprite_axis: Option<ScalingAxis>,
}

impl SceneConfig {
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let scene: Self = serde_json::from_str(input)?;
        if !scene.tolerances.is_valid() {
            return Err(ConfigError::InvalidTolerances {
                roll: scene.tolerances.roll,
                horizon: scene.tolerances.horizon,
            });
        }
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn positions(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.positions.iter().copied().map(DVec3::from_array)
    }
}
