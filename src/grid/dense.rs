//! Dense 2D grid with bounds-checked access.

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::GridCoord;
use crate::core::{Error, Result};

/// Row-major dense grid indexed by `(column, row)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Normalized elevation in `[0, 1]`.
pub type ElevationGrid = Grid<f32>;

impl<T: Copy + Send + Sync> Grid<T> {
    /// Create a grid filled with `value`. Both dimensions must be non-zero.
    pub fn new(width: usize, height: usize, value: T) -> Result<Self> {
        check_dims(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; width * height],
        })
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        check_dims(width, height)?;
        if data.len() != width * height {
            return Err(Error::InvalidDimensions(format!(
                "buffer of {} cells does not match {}x{}",
                data.len(), width, height
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Build a grid by evaluating `f(x, y)` for every cell, rows in parallel.
    pub fn from_fn<F>(width: usize, height: usize, f: F) -> Result<Self>
    where
        F: Fn(usize, usize) -> T + Send + Sync,
    {
        check_dims(width, height)?;
        let mut data = Vec::with_capacity(width * height);
        (0..height)
            .into_par_iter()
            .map(|y| (0..width).map(|x| f(x, y)).collect::<Vec<T>>())
            .collect::<Vec<_>>()
            .into_iter()
            .for_each(|row| data.extend(row));
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn in_bounds(&self, c: GridCoord) -> bool {
        c.x >= 0 && c.y >= 0 && (c.x as usize) < self.width && (c.y as usize) < self.height
    }

    /// Linear index of an in-bounds cell.
    pub fn index_of(&self, c: GridCoord) -> Option<usize> {
        self.in_bounds(c).then(|| c.y as usize * self.width + c.x as usize)
    }

    /// Cell for a linear index.
    pub fn coord_of(&self, index: usize) -> GridCoord {
        GridCoord::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub fn get(&self, c: GridCoord) -> Option<T> {
        self.index_of(c).map(|i| self.data[i])
    }

    pub fn get_mut(&mut self, c: GridCoord) -> Option<&mut T> {
        self.index_of(c).map(move |i| &mut self.data[i])
    }

    /// Write a cell; returns false (and writes nothing) when out of bounds.
    pub fn set(&mut self, c: GridCoord, value: T) -> bool {
        match self.get_mut(c) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Read with coordinates clamped to the grid edge.
    pub fn get_clamped(&self, x: i32, y: i32) -> T {
        let cx = x.clamp(0, self.width as i32 - 1) as usize;
        let cy = y.clamp(0, self.height as i32 - 1) as usize;
        self.data[cy * self.width + cx]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Parallel iterator over mutable rows, yielding `(y, row)`.
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, &mut [T])> {
        self.data.par_chunks_mut(self.width).enumerate()
    }

    /// Iterate `(coord, value)` for every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, T)> + '_ {
        self.data.iter().enumerate().map(|(i, &v)| (self.coord_of(i), v))
    }

    pub fn same_dims<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Fail with `InvalidDimensions` unless `other` matches this grid.
    pub fn ensure_same_dims<U>(&self, other: &Grid<U>, what: &str) -> Result<()> {
        if self.same_dims(other) {
            Ok(())
        } else {
            Err(Error::InvalidDimensions(format!(
                "{} is {}x{}, expected {}x{}",
                what, other.width, other.height, self.width, self.height
            )))
        }
    }
}

impl Grid<f32> {
    /// Bilinear sample at a continuous grid-space position (cell origins at integers).
    ///
    /// Positions outside the grid are clamped to the edge.
    pub fn sample_bilinear(&self, p: Vec2) -> f32 {
        let x0 = p.x.floor();
        let y0 = p.y.floor();
        let fx = p.x - x0;
        let fy = p.y - y0;
        let (ix, iy) = (x0 as i32, y0 as i32);

        let h00 = self.get_clamped(ix, iy);
        let h10 = self.get_clamped(ix + 1, iy);
        let h01 = self.get_clamped(ix, iy + 1);
        let h11 = self.get_clamped(ix + 1, iy + 1);

        let a = h00 + (h10 - h00) * fx;
        let b = h01 + (h11 - h01) * fx;
        a + (b - a) * fy
    }

    /// Bilinear sample at normalized `(u, v)` in `[0, 1]²` covering the whole grid.
    pub fn sample_normalized(&self, u: f32, v: f32) -> f32 {
        let x = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let y = v.clamp(0.0, 1.0) * (self.height - 1) as f32;
        self.sample_bilinear(Vec2::new(x, y))
    }

    /// Minimum and maximum cell values.
    pub fn min_max(&self) -> (f32, f32) {
        self.data.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }

    /// Clamp every cell into `[lo, hi]`.
    pub fn clamp_all(&mut self, lo: f32, hi: f32) {
        self.data.par_iter_mut().for_each(|v| *v = v.clamp(lo, hi));
    }
}

/// Rejects empty grids before any allocation or sampling.
pub(crate) fn check_dims(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions(format!(
            "grid must be non-empty, got {}x{}",
            width, height
        )));
    }
    Ok(())
}
