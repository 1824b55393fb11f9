//! Road carving: cut a path into the elevation grid and record its footprint.

use crate::core::{Error, Result};
use crate::grid::{ElevationGrid, Grid, GridCoord, Mask};

use super::Path;

/// Carve `path` into `grid` and return the road mask.
///
/// Within `width` cells of a path point the surface is set to that point's
/// pre-carve height (mask 1.0). Between `width` and `width + shoulder` the
/// surface blends linearly back to its own height and the mask fades to 0.
/// Where stamps overlap, the strongest one wins.
pub fn carve_road(grid: &mut ElevationGrid, path: &Path, width: f32, shoulder: f32) -> Result<Mask> {
    if !(width >= 0.0 && shoulder >= 0.0 && width.is_finite() && shoulder.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "road width {} and shoulder {} must be finite and non-negative",
            width, shoulder
        )));
    }
    let (w, h) = grid.dims();
    let mut mask = Mask::new(w, h)?;

    // Strongest stamp per cell: (strength, road height)
    let mut best: Grid<(f32, f32)> = Grid::new(w, h, (0.0, 0.0))?;
    let reach = (width + shoulder).ceil() as i32 + 1;

    for &p in &path.points {
        let Some(road_h) = grid.get(p) else {
            continue;
        };
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let c = p.offset(dx, dy);
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                let strength = stamp_strength(d, width, shoulder);
                if strength <= 0.0 {
                    continue;
                }
                if let Some(slot) = best.get_mut(c) {
                    if strength > slot.0 {
                        *slot = (strength, road_h);
                    }
                }
            }
        }
    }

    let mut carved = 0usize;
    for (c, (strength, road_h)) in best.iter() {
        if strength <= 0.0 {
            continue;
        }
        if let Some(h) = grid.get_mut(c) {
            *h = road_h + (*h - road_h) * (1.0 - strength);
        }
        mask.stamp_max(c, strength);
        carved += 1;
    }

    log::debug!(
        "Carved road of {} points (width {}, shoulder {}) over {} cells",
        path.len(),
        width,
        shoulder,
        carved
    );
    Ok(mask)
}

/// 1.0 within `width`, linear fade to 0 at `width + shoulder`.
fn stamp_strength(d: f32, width: f32, shoulder: f32) -> f32 {
    if d <= width {
        1.0
    } else if shoulder > 0.0 && d <= width + shoulder {
        1.0 - (d - width) / shoulder
    } else {
        0.0
    }
}

/// Cells covered at full strength by the carved road.
pub fn road_cells(mask: &Mask) -> Vec<GridCoord> {
    mask.cells_above(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::find_path;

    #[test]
    fn test_carve_flattens_road_core() {
        let mut grid = ElevationGrid::from_fn(32, 32, |_, y| y as f32 / 31.0).unwrap();
        let original = grid.clone();
        let path = Path {
            points: (0..32).map(|x| GridCoord::new(x, 16)).collect(),
            cost: 0.0,
        };
        let mask = carve_road(&mut grid, &path, 2.0, 3.0).unwrap();

        let road_h = original.get(GridCoord::new(10, 16)).unwrap();
        for y in 14..=18 {
            assert!((grid.get(GridCoord::new(10, y)).unwrap() - road_h).abs() < 1e-6);
            assert_eq!(mask.value(GridCoord::new(10, y)), 1.0);
        }
        // Shoulder partially blended, mask fading
        let shoulder = GridCoord::new(10, 20);
        let s = mask.value(shoulder);
        assert!(s > 0.0 && s < 1.0);
        let h = grid.get(shoulder).unwrap();
        assert!(h < original.get(shoulder).unwrap() && h > road_h);
        // Far away untouched
        assert_eq!(grid.get(GridCoord::new(10, 2)), original.get(GridCoord::new(10, 2)));
        assert_eq!(mask.value(GridCoord::new(10, 2)), 0.0);
    }

    #[test]
    fn test_carve_found_path() {
        let mut grid = ElevationGrid::new(24, 24, 0.3).unwrap();
        let path = find_path(&grid, GridCoord::new(1, 1), GridCoord::new(22, 20), 0.0).unwrap();
        let mask = carve_road(&mut grid, &path, 1.0, 0.0).unwrap();
        for c in &path.points {
            assert_eq!(mask.value(*c), 1.0);
        }
        assert!(road_cells(&mask).len() >= path.len());
    }

    #[test]
    fn test_carve_rejects_negative_width() {
        let mut grid = ElevationGrid::new(4, 4, 0.0).unwrap();
        let path = Path {
            points: vec![GridCoord::new(1, 1)],
            cost: 0.0,
        };
        assert!(carve_road(&mut grid, &path, -1.0, 0.0).is_err());
    }
}
