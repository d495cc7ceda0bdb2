use glam::DVec3;

use crate::basis::{compute_snap_basis, SnapBasis, SnapTolerances};
use crate::camera::CameraState;
use crate::error::SnapError;
use crate::snap::snap;

/// Keeps one camera's snap basis across frames.
///
/// The basis only depends on the camera pose, lens and viewport, so it is
/// recomputed only when those change. When a new pose is rejected the last
/// good basis stays in use; until one exists snapping is a pass-through.
#[derive(Debug, Clone, Default)]
pub struct CachedSnapper {
    tolerances: SnapTolerances,
    camera: Option<CameraState>,
    basis: Option<SnapBasis>,
    last_error: Option<SnapError>,
    recomputations: u64,
}

impl CachedSnapper {
    pub fn new(tolerances: SnapTolerances) -> Self {
        Self {
            tolerances,
            ..Self::default()
        }
    }

    /// Refresh the basis for `camera`. Returns the error that rejected the
    /// camera, if any; the previous basis is kept in that case.
    pub fn update(&mut self, camera: &CameraState) -> Result<(), SnapError> {
        if self.camera.as_ref() == Some(camera) {
            return match &self.last_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            };
        }

        self.camera = Some(*camera);
        self.recomputations += 1;
        match compute_snap_basis(camera, &self.tolerances) {
            Ok(basis) => {
                self.basis = Some(basis);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                if self.basis.is_some() {
                    log::warn!("keeping previous snap basis: {err}");
                } else {
                    log::warn!("no snap basis available yet: {err}");
                }
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn basis(&self) -> Option<&SnapBasis> {
        self.basis.as_ref()
    }

    /// True when the basis in use was computed for an earlier camera state.
    pub fn is_stale(&self) -> bool {
        self.basis.is_some() && self.last_error.is_some()
    }

    pub fn last_error(&self) -> Option<&SnapError> {
        self.last_error.as_ref()
    }

    pub fn tolerances(&self) -> &SnapTolerances {
        &self.tolerances
    }

    /// Number of times the basis has been derived from a new camera state.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Snap `position`, falling back to the unsnapped value when no usable
    /// basis exists.
    pub fn snap(&self, position: DVec3) -> DVec3 {
        let Some(basis) = self.basis.as_ref() else {
            log::debug!("no snap basis; leaving {position} unsnapped");
            return position;
        };
        snap(position, basis).unwrap_or_else(|err| {
            log::debug!("leaving {position} unsnapped: {err}");
            position
        })
    }

    pub fn snap_all(&self, positions: &mut [DVec3]) {
        for position in positions.iter_mut() {
            *position = self.snap(*position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{rotation_from_degrees, Lens, Viewport};
    use crate::error::Precondition;

    fn camera(pitch: f64) -> CameraState {
        CameraState::new(
            DVec3::new(0.0, 6.0, 4.0),
            rotation_from_degrees(0.0, pitch, 0.0),
            Lens::default(),
            Viewport::new(320, 240),
        )
    }

    #[test]
    fn unchanged_camera_reuses_basis() {
        let mut snapper = CachedSnapper::default();
        snapper.update(&camera(40.0)).expect("valid camera");
        snapper.update(&camera(40.0)).expect("valid camera");
        assert_eq!(snapper.recomputations(), 1);

        snapper.update(&camera(41.0)).expect("valid camera");
        assert_eq!(snapper.recomputations(), 2);
        assert!(!snapper.is_stale());
    }

    #[test]
    fn rejected_camera_keeps_last_good_basis() {
        let mut snapper = CachedSnapper::default();
        snapper.update(&camera(40.0)).expect("valid camera");
        let good = *snapper.basis().expect("basis");

        let err = snapper.update(&camera(0.0)).expect_err("level camera");
        assert!(matches!(
            err,
            SnapError::Precondition(Precondition::AboveHorizon { .. })
        ));
        assert_eq!(snapper.basis(), Some(&good));
        assert!(snapper.is_stale());

        // Repeating the same rejected pose reports the same error without recomputing.
        assert_eq!(snapper.update(&camera(0.0)), Err(err));
        assert_eq!(snapper.recomputations(), 2);

        let position = DVec3::new(1.234, 2.0, -5.678);
        assert_eq!(snapper.snap(position), snap(position, &good).expect("snap"));
    }

    #[test]
    fn snap_without_basis_passes_through() {
        let mut snapper = CachedSnapper::default();
        assert!(snapper.update(&camera(-10.0)).is_err());
        assert!(snapper.basis().is_none());
        assert!(!snapper.is_stale());

        let position = DVec3::new(0.123, 4.5, 6.789);
        assert_eq!(snapper.snap(position), position);
    }

    #[test]
    fn snap_all_matches_single_snaps() {
        let mut snapper = CachedSnapper::default();
        snapper.update(&camera(55.0)).expect("valid camera");

        let originals = [
            DVec3::new(0.1, 0.0, 0.2),
            DVec3::new(-3.3, 1.0, 7.7),
            DVec3::new(9.99, -1.0, -0.01),
        ];
        let mut positions = originals;
        snapper.snap_all(&mut positions);
        for (snapped, original) in positions.iter().zip(originals) {
            assert_eq!(*snapped, snapper.snap(original));
        }
    }
}
