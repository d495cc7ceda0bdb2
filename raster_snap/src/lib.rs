//! Camera-space raster snapping helpers.
//!
//! Sprites drawn under a moving perspective camera shimmer when their world
//! position lands between pixels. This crate derives, from a camera pose and
//! viewport, the world-space step that one raster pixel covers on the
//! horizontal (XZ) plane and floors positions onto that grid. Hosts compute a
//! [`SnapBasis`] once per camera per frame and snap every tracked object with
//! it; [`CachedSnapper`] wraps that pattern and keeps the last good basis when
//! the camera leaves the supported range.

pub mod basis;
pub mod cache;
pub mod camera;
pub mod config;
pub mod error;
pub mod follow;
pub mod scaling;
pub mod snap;

pub use basis::{compute_snap_basis, SnapBasis, SnapTolerances};
pub use cache::CachedSnapper;
pub use camera::{rotation_from_degrees, CameraState, Lens, Viewport};
pub use config::{CameraConfig, ConfigError, RotationConfig, SceneConfig};
pub use error::{Precondition, SnapError};
pub use follow::SnapFollower;
pub use scaling::{projection_scale, ScalingAxis};
pub use snap::snap;
