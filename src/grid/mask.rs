//! Membership masks: dense `[0, 1]` grids used for zoning and exclusion.
//!
//! Masks are the spatial primitive shared by every stage. Zones, roads and
//! rivers are all produced as masks; placement consumes them as inclusion
//! and exclusion regions.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{Grid, GridCoord};
use crate::core::Result;

/// Default threshold separating "inside" from "outside" a mask.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Dense membership-strength grid. Every write is clamped to `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    grid: Grid<f32>,
}

impl Mask {
    /// All-zero mask.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Result<Self> {
        Ok(Self {
            grid: Grid::new(width, height, value.clamp(0.0, 1.0))?,
        })
    }

    /// Build from a grid, clamping every value.
    pub fn from_grid(mut grid: Grid<f32>) -> Self {
        grid.clamp_all(0.0, 1.0);
        Self { grid }
    }

    pub fn from_fn<F>(width: usize, height: usize, f: F) -> Result<Self>
    where
        F: Fn(usize, usize) -> f32 + Send + Sync,
    {
        Grid::from_fn(width, height, |x, y| f(x, y).clamp(0.0, 1.0)).map(|grid| Self { grid })
    }

    /// Binary mask from a predicate.
    pub fn from_predicate<F>(width: usize, height: usize, f: F) -> Result<Self>
    where
        F: Fn(usize, usize) -> bool + Send + Sync,
    {
        Self::from_fn(width, height, |x, y| if f(x, y) { 1.0 } else { 0.0 })
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn as_grid(&self) -> &Grid<f32> {
        &self.grid
    }

    pub fn into_grid(self) -> Grid<f32> {
        self.grid
    }

    /// Value at a cell, 0 outside the mask.
    pub fn value(&self, c: GridCoord) -> f32 {
        self.grid.get(c).unwrap_or(0.0)
    }

    /// Inclusive threshold test at a cell.
    pub fn contains(&self, c: GridCoord, threshold: f32) -> bool {
        self.grid.get(c).is_some_and(|v| v >= threshold)
    }

    pub fn set(&mut self, c: GridCoord, value: f32) -> bool {
        self.grid.set(c, value.clamp(0.0, 1.0))
    }

    /// Max-composite a value into a cell, so overlapping stamps never weaken it.
    pub fn stamp_max(&mut self, c: GridCoord, value: f32) {
        if let Some(cell) = self.grid.get_mut(c) {
            *cell = cell.max(value.clamp(0.0, 1.0));
        }
    }

    pub fn sample_bilinear(&self, p: Vec2) -> f32 {
        self.grid.sample_bilinear(p)
    }

    /// Bilinear sample at normalized `(u, v)`.
    pub fn sample_normalized(&self, u: f32, v: f32) -> f32 {
        self.grid.sample_normalized(u, v)
    }

    /// Resample to another resolution with bilinear filtering.
    ///
    /// Used to bring a low-resolution mask up to the elevation grid's size.
    pub fn resampled(&self, width: usize, height: usize) -> Result<Mask> {
        let (w, h) = (width.max(2) - 1, height.max(2) - 1);
        Mask::from_fn(width, height, |x, y| {
            self.sample_normalized(x as f32 / w as f32, y as f32 / h as f32)
        })
    }

    /// Number of cells at or above `threshold`.
    pub fn coverage(&self, threshold: f32) -> usize {
        self.grid.as_slice().iter().filter(|&&v| v >= threshold).count()
    }

    /// Cells at or above `threshold`, row-major.
    pub fn cells_above(&self, threshold: f32) -> Vec<GridCoord> {
        self.grid
            .iter()
            .filter(|&(_, v)| v >= threshold)
            .map(|(c, _)| c)
            .collect()
    }

    /// Either mask set (binary, at `threshold`).
    pub fn union(&self, other: &Mask, threshold: f32) -> Result<Mask> {
        self.combine(other, |a, b| a >= threshold || b >= threshold)
    }

    /// Both masks set (binary, at `threshold`).
    pub fn intersection(&self, other: &Mask, threshold: f32) -> Result<Mask> {
        self.combine(other, |a, b| a >= threshold && b >= threshold)
    }

    /// Cells of `self` not covered by `other` (binary, at `threshold`).
    pub fn subtract(&self, other: &Mask, threshold: f32) -> Result<Mask> {
        self.combine(other, |a, b| a >= threshold && b < threshold)
    }

    /// `1 - value` per cell.
    pub fn inverted(&self) -> Mask {
        let mut grid = self.grid.clone();
        grid.as_mut_slice().iter_mut().for_each(|v| *v = 1.0 - *v);
        Mask { grid }
    }

    fn combine<F>(&self, other: &Mask, op: F) -> Result<Mask>
    where
        F: Fn(f32, f32) -> bool + Send + Sync,
    {
        self.grid.ensure_same_dims(&other.grid, "mask")?;
        let a = self.grid.as_slice();
        let b = other.grid.as_slice();
        let width = self.width();
        Mask::from_predicate(width, self.height(), |x, y| {
            let i = y * width + x;
            op(a[i], b[i])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_clamped() {
        let mut mask = Mask::new(4, 4).unwrap();
        mask.set(GridCoord::new(0, 0), 3.0);
        mask.set(GridCoord::new(1, 0), -1.0);
        assert_eq!(mask.value(GridCoord::new(0, 0)), 1.0);
        assert_eq!(mask.value(GridCoord::new(1, 0)), 0.0);

        let grid = Grid::from_vec(2, 1, vec![1.5, -0.5]).unwrap();
        let mask = Mask::from_grid(grid);
        assert_eq!(mask.as_grid().as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn test_stamp_max_keeps_strongest() {
        let mut mask = Mask::new(2, 2).unwrap();
        let c = GridCoord::new(1, 1);
        mask.stamp_max(c, 0.7);
        mask.stamp_max(c, 0.3);
        assert!((mask.value(c) - 0.7).abs() < 1e-6);
        mask.stamp_max(GridCoord::new(5, 5), 1.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut mask = Mask::new(2, 1).unwrap();
        mask.set(GridCoord::new(0, 0), 0.5);
        assert!(mask.contains(GridCoord::new(0, 0), 0.5));
        assert!(!mask.contains(GridCoord::new(1, 0), 0.5));
        assert!(!mask.contains(GridCoord::new(9, 0), 0.0));
        assert_eq!(mask.coverage(0.5), 1);
    }

    #[test]
    fn test_combinators() {
        let a = Mask::from_predicate(4, 1, |x, _| x < 2).unwrap();
        let b = Mask::from_predicate(4, 1, |x, _| x >= 1 && x < 3).unwrap();

        assert_eq!(a.union(&b, 0.5).unwrap().coverage(0.5), 3);
        assert_eq!(a.intersection(&b, 0.5).unwrap().coverage(0.5), 1);
        assert_eq!(a.subtract(&b, 0.5).unwrap().cells_above(0.5), vec![GridCoord::new(0, 0)]);
        assert_eq!(a.inverted().coverage(0.5), 2);

        let c = Mask::new(3, 1).unwrap();
        assert!(a.union(&c, 0.5).is_err());
    }

    #[test]
    fn test_resampled_preserves_corners() {
        let low = Mask::from_predicate(2, 2, |x, _| x == 1).unwrap();
        let high = low.resampled(8, 8).unwrap();
        assert_eq!(high.width(), 8);
        assert!((high.value(GridCoord::new(0, 0))).abs() < 1e-6);
        assert!((high.value(GridCoord::new(7, 7)) - 1.0).abs() < 1e-6);
    }
}
