//! Surface queries for placement: height and normal at a grid position.

use glam::{Vec2, Vec3};

use super::TerrainBounds;
use crate::grid::ElevationGrid;

/// Height and orientation of the ground under a grid-space position.
///
/// Implemented over the elevation grid here; a physics or rendering
/// collaborator can supply its own (e.g. raycasts against a mesh).
pub trait SurfaceSampler {
    /// Normalized elevation at `p`
    fn height_at(&self, p: Vec2) -> f32;

    /// Unit normal (Y up) at `p`
    fn normal_at(&self, p: Vec2) -> Vec3;

    /// Angle between the normal and vertical, in degrees
    fn slope_degrees_at(&self, p: Vec2) -> f32 {
        self.normal_at(p).angle_between(Vec3::Y).to_degrees()
    }
}

/// Bilinear heights and central-difference normals over an elevation grid.
pub struct GridSurface<'a> {
    grid: &'a ElevationGrid,
    vertical_scale: f32,
}

impl<'a> GridSurface<'a> {
    /// `vertical_scale` is how many cell widths an elevation of 1.0 spans.
    pub fn new(grid: &'a ElevationGrid, vertical_scale: f32) -> Self {
        Self {
            grid,
            vertical_scale,
        }
    }

    pub fn from_bounds(grid: &'a ElevationGrid, bounds: &TerrainBounds) -> Self {
        Self::new(grid, bounds.vertical_scale())
    }
}

impl SurfaceSampler for GridSurface<'_> {
    fn height_at(&self, p: Vec2) -> f32 {
        // Cell values sit at cell centres
        self.grid.sample_bilinear(p - Vec2::splat(0.5))
    }

    fn normal_at(&self, p: Vec2) -> Vec3 {
        let dx = (self.height_at(p + Vec2::X) - self.height_at(p - Vec2::X)) * 0.5;
        let dy = (self.height_at(p + Vec2::Y) - self.height_at(p - Vec2::Y)) * 0.5;
        Vec3::new(-dx * self.vertical_scale, 1.0, -dy * self.vertical_scale).normalize()
    }
}
