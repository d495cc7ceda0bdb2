use glam::DVec3;

use crate::cache::CachedSnapper;

/// Render-only child that trails a physics parent on the raster grid.
///
/// The parent moves freely; after the parent has moved for the frame, the
/// child is placed on the snapped version of the parent's position so only
/// the drawn geometry is quantized.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapFollower {
    render_position: DVec3,
}

impl SnapFollower {
    pub fn new(render_position: DVec3) -> Self {
        Self { render_position }
    }

    pub fn late_update(&mut self, parent_position: DVec3, snapper: &CachedSnapper) -> DVec3 {
        self.render_position = snapper.snap(parent_position);
        self.render_position
    }

    pub fn render_position(&self) -> DVec3 {
        self.render_position
    }
}
