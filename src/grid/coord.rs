//! Integer grid coordinates and rectangles.
//!
//! Coordinates are always `(x, y)` = `(column, row)`. They are signed so that
//! out-of-range requests can be represented and rejected instead of wrapping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Integer cell coordinate `(column, row)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a continuous grid-space position.
    pub fn from_position(p: Vec2) -> Self {
        Self::new(p.x.floor() as i32, p.y.floor() as i32)
    }

    /// Position of this cell's origin corner as a float vector.
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Centre of this cell in continuous grid space.
    pub fn center(self) -> Vec2 {
        self.as_vec2() + Vec2::splat(0.5)
    }

    /// Euclidean distance in cells.
    pub fn distance(self, other: GridCoord) -> f32 {
        self.as_vec2().distance(other.as_vec2())
    }

    /// Chebyshev distance (king moves).
    pub fn chebyshev(self, other: GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// The eight neighbouring offsets, orthogonals first.
    pub const NEIGHBORS_8: [(i32, i32); 8] = [
        (1, 0), (-1, 0), (0, 1), (0, -1),
        (1, 1), (1, -1), (-1, 1), (-1, -1),
    ];

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned integer rectangle: `x..x+width`, `y..y+height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl GridRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn x_min(&self) -> i32 {
        self.x
    }

    /// Exclusive upper bound on x
    pub fn x_max(&self) -> i32 {
        self.x + self.width
    }

    pub fn y_min(&self) -> i32 {
        self.y
    }

    /// Exclusive upper bound on y
    pub fn y_max(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, c: GridCoord) -> bool {
        c.x >= self.x_min() && c.x < self.x_max() && c.y >= self.y_min() && c.y < self.y_max()
    }

    /// Chebyshev distance from an inside cell to the nearest rectangle edge.
    ///
    /// Border cells return 0. Returns `None` for cells outside the rectangle.
    pub fn edge_distance(&self, c: GridCoord) -> Option<i32> {
        if !self.contains(c) {
            return None;
        }
        let dx = (c.x - self.x_min()).min(self.x_max() - 1 - c.x);
        let dy = (c.y - self.y_min()).min(self.y_max() - 1 - c.y);
        Some(dx.min(dy))
    }

    /// Intersection with a `width × height` grid anchored at the origin.
    pub fn clipped(&self, width: usize, height: usize) -> GridRect {
        let x0 = self.x_min().max(0);
        let y0 = self.y_min().max(0);
        let x1 = self.x_max().min(width as i32);
        let y1 = self.y_max().min(height as i32);
        GridRect::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    /// Iterate the cells of the rectangle row by row.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (self.y_min()..self.y_max())
            .flat_map(move |y| (self.x_min()..self.x_max()).map(move |x| GridCoord::new(x, y)))
    }
}
