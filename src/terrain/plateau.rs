//! Flat plateau regions blended into an elevation grid.

use serde::{Deserialize, Serialize};

use crate::grid::{ElevationGrid, GridRect};

/// A rectangular region flattened toward a target height.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plateau {
    #[serde(default)]
    pub name: String,
    pub rect: GridRect,
    pub height: f32,
    /// Cells this far (Chebyshev) from the rectangle edge or deeper keep their height.
    pub falloff: f32,
}

impl Plateau {
    pub fn new(name: impl Into<String>, rect: GridRect, height: f32, falloff: f32) -> Self {
        Self {
            name: name.into(),
            rect,
            height,
            falloff,
        }
    }

    pub fn apply(&self, grid: &mut ElevationGrid) {
        apply_plateau(grid, self.rect, self.height, self.falloff);
    }
}

/// Blend `rect` toward `target_height`.
///
/// Each cell becomes `lerp(target, original, t)` with `t = clamp(d / falloff)`,
/// `d` being the Chebyshev distance to the nearest rectangle edge. The edge
/// ring sits at the target and cells `falloff` or more inside keep their
/// original height. With `falloff == 0` only the edge ring is touched.
/// Distances are measured against the unclipped rectangle, so a region
/// hanging off the grid blends the same as if the grid were larger.
pub fn apply_plateau(grid: &mut ElevationGrid, rect: GridRect, target_height: f32, falloff: f32) {
    let target = target_height.clamp(0.0, 1.0);
    let falloff = if falloff.is_finite() { falloff.max(0.0) } else { 0.0 };
    let clipped = rect.clipped(grid.width(), grid.height());

    for c in clipped.cells() {
        let Some(d) = rect.edge_distance(c) else {
            continue;
        };
        let t = if d == 0 {
            0.0
        } else if falloff <= 0.0 {
            1.0
        } else {
            (d as f32 / falloff).clamp(0.0, 1.0)
        };
        if t >= 1.0 {
            continue;
        }
        if let Some(h) = grid.get_mut(c) {
            *h = target + (*h - target) * t;
        }
    }
}

/// Apply regions in order; later regions overwrite earlier ones where they overlap.
pub fn apply_plateaus(grid: &mut ElevationGrid, plateaus: &[Plateau]) {
    for plateau in plateaus {
        plateau.apply(grid);
        log::debug!(
            "Applied plateau '{}' at {:?} -> {:.3}",
            plateau.name,
            plateau.rect,
            plateau.height
        );
    }
}
