//! Distance-to-feature fields and nearest-point lookup.

use std::collections::HashMap;

use glam::Vec2;

use super::{Grid, GridCoord, Mask};
use crate::core::Result;

const SQRT_2: f32 = std::f32::consts::SQRT_2;

/// Approximate Euclidean distance (in cells) from every cell to the nearest
/// mask cell at or above a threshold.
///
/// Two-pass 8-neighbour chamfer transform with weights 1 and √2. Exact along
/// axes and diagonals, within ~8% elsewhere. Cells inside the feature are 0;
/// with no feature cells at all every value is `f32::INFINITY`.
#[derive(Clone, Debug)]
pub struct DistanceField {
    grid: Grid<f32>,
}

impl DistanceField {
    pub fn from_mask(mask: &Mask, threshold: f32) -> Result<Self> {
        let (width, height) = (mask.width(), mask.height());
        let source = mask.as_grid().as_slice();
        let mut dist: Vec<f32> = source
            .iter()
            .map(|&v| if v >= threshold { 0.0 } else { f32::INFINITY })
            .collect();

        let at = |x: usize, y: usize| y * width + x;

        // Forward pass: neighbours above and to the left
        for y in 0..height {
            for x in 0..width {
                let mut d = dist[at(x, y)];
                if x > 0 {
                    d = d.min(dist[at(x - 1, y)] + 1.0);
                }
                if y > 0 {
                    d = d.min(dist[at(x, y - 1)] + 1.0);
                    if x > 0 {
                        d = d.min(dist[at(x - 1, y - 1)] + SQRT_2);
                    }
                    if x + 1 < width {
                        d = d.min(dist[at(x + 1, y - 1)] + SQRT_2);
                    }
                }
                dist[at(x, y)] = d;
            }
        }

        // Backward pass: neighbours below and to the right
        for y in (0..height).rev() {
            for x in (0..width).rev() {
                let mut d = dist[at(x, y)];
                if x + 1 < width {
                    d = d.min(dist[at(x + 1, y)] + 1.0);
                }
                if y + 1 < height {
                    d = d.min(dist[at(x, y + 1)] + 1.0);
                    if x + 1 < width {
                        d = d.min(dist[at(x + 1, y + 1)] + SQRT_2);
                    }
                    if x > 0 {
                        d = d.min(dist[at(x - 1, y + 1)] + SQRT_2);
                    }
                }
                dist[at(x, y)] = d;
            }
        }

        Ok(Self {
            grid: Grid::from_vec(width, height, dist)?,
        })
    }

    /// Distance at the cell containing `p`; positions off the grid read the edge.
    pub fn distance_at(&self, p: Vec2) -> f32 {
        let c = GridCoord::from_position(p);
        self.grid.get_clamped(c.x, c.y)
    }

    pub fn distance_at_cell(&self, c: GridCoord) -> f32 {
        self.grid.get_clamped(c.x, c.y)
    }

    /// True when the field has no source cells.
    pub fn is_empty(&self) -> bool {
        self.grid.as_slice().iter().all(|d| d.is_infinite())
    }
}

/// Uniform bucket grid over 2D points for nearest-neighbour and radius queries.
#[derive(Clone, Debug)]
pub struct PointIndex {
    cell_size: f32,
    points: Vec<Vec2>,
    buckets: HashMap<(i32, i32), Vec<usize>>,
}

impl PointIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-3),
            points: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec2>, cell_size: f32) -> Self {
        let mut index = Self::new(cell_size);
        for p in points {
            index.insert(p);
        }
        index
    }

    /// Centres of all mask cells at or above `threshold`.
    pub fn from_mask(mask: &Mask, threshold: f32, cell_size: f32) -> Self {
        Self::from_points(
            mask.cells_above(threshold).into_iter().map(GridCoord::center),
            cell_size,
        )
    }

    pub fn insert(&mut self, p: Vec2) -> usize {
        let idx = self.points.len();
        self.points.push(p);
        self.buckets.entry(self.bucket_of(p)).or_default().push(idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<Vec2> {
        self.points.get(idx).copied()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// True if any point lies strictly closer than `radius` to `p`.
    pub fn any_within(&self, p: Vec2, radius: f32) -> bool {
        if radius <= 0.0 {
            return false;
        }
        let r2 = radius * radius;
        let reach = (radius / self.cell_size).ceil() as i32;
        let (bx, by) = self.bucket_of(p);
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(ids) = self.buckets.get(&(bx + dx, by + dy)) {
                    if ids.iter().any(|&i| self.points[i].distance_squared(p) < r2) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Nearest point to `p` whose position differs from `p` by more than `min_separation`.
    ///
    /// Searches outward ring by ring; returns `(index, distance)`.
    pub fn nearest_excluding(&self, p: Vec2, min_separation: f32) -> Option<(usize, f32)> {
        if self.points.is_empty() {
            return None;
        }
        let min2 = min_separation * min_separation;
        let (bx, by) = self.bucket_of(p);
        let max_ring = self.max_ring(bx, by);
        let mut best: Option<(usize, f32)> = None;

        for ring in 0..=max_ring {
            for (cx, cy) in ring_cells(bx, by, ring) {
                let Some(ids) = self.buckets.get(&(cx, cy)) else {
                    continue;
                };
                for &i in ids {
                    let d2 = self.points[i].distance_squared(p);
                    if d2 <= min2 {
                        continue;
                    }
                    if best.is_none_or(|(_, b)| d2 < b) {
                        best = Some((i, d2));
                    }
                }
            }
            // Anything in a later ring is at least `ring * cell_size` away
            if let Some((_, b)) = best {
                let guaranteed = ring as f32 * self.cell_size;
                if b <= guaranteed * guaranteed {
                    break;
                }
            }
        }

        best.map(|(i, d2)| (i, d2.sqrt()))
    }

    /// Nearest point to `p`, including coincident points.
    pub fn nearest(&self, p: Vec2) -> Option<(usize, f32)> {
        self.nearest_excluding(p, -1.0)
    }

    fn bucket_of(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    fn max_ring(&self, bx: i32, by: i32) -> i32 {
        self.buckets
            .keys()
            .map(|&(x, y)| (x - bx).abs().max((y - by).abs()))
            .max()
            .unwrap_or(0)
    }
}

/// Bucket coordinates on the square ring at Chebyshev distance `ring`.
fn ring_cells(bx: i32, by: i32, ring: i32) -> Vec<(i32, i32)> {
    if ring == 0 {
        return vec![(bx, by)];
    }
    let mut cells = Vec::with_capacity(8 * ring as usize);
    for d in -ring..=ring {
        cells.push((bx + d, by - ring));
        cells.push((bx + d, by + ring));
    }
    for d in (-ring + 1)..ring {
        cells.push((bx - ring, by + d));
        cells.push((bx + ring, by + d));
    }
    cells
}
