//! Terrain flattening under a placed entity's rectangular footprint.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::PlacedEntity;
use crate::grid::{ElevationGrid, GridCoord};

/// Rectangle in cells: `width` across the facing direction, `length` along it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f32,
    pub length: f32,
}

impl Default for Footprint {
    fn default() -> Self {
        Self {
            width: 10.0,
            length: 10.0,
        }
    }
}

impl Footprint {
    /// Whether `offset` (from the entity position) lies inside the rotated rectangle.
    pub fn contains(&self, facing: Vec2, offset: Vec2) -> bool {
        let right = Vec2::new(facing.y, -facing.x);
        offset.dot(right).abs() < self.width * 0.5 && offset.dot(facing).abs() < self.length * 0.5
    }
}

/// Set every cell whose centre lies under the footprint to the entity's
/// height minus `lower_amount`. Returns the number of cells written.
pub fn flatten_footprint(
    grid: &mut ElevationGrid,
    entity: &PlacedEntity,
    footprint: Footprint,
    lower_amount: f32,
) -> usize {
    let target = (entity.height - lower_amount).clamp(0.0, 1.0);
    let facing = entity.facing();
    let reach = (footprint.width.hypot(footprint.length) * 0.5).ceil() as i32 + 1;
    let origin = GridCoord::from_position(entity.position);
    let mut written = 0;

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let c = origin.offset(dx, dy);
            if !footprint.contains(facing, c.center() - entity.position) {
                continue;
            }
            if let Some(h) = grid.get_mut(c) {
                *h = target;
                written += 1;
            }
        }
    }
    written
}
