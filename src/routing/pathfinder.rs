//! Slope-aware A* over the 8-connected elevation grid.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::grid::{ElevationGrid, GridCoord};

/// Base cost of an orthogonal step
pub const ORTHOGONAL_COST: f32 = 10.0;
/// Base cost of a diagonal step (≈ 10·√2)
pub const DIAGONAL_COST: f32 = 14.0;

/// Base-cost distance ignoring elevation; the A* heuristic.
pub fn octile_distance(a: GridCoord, b: GridCoord) -> f32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    let diag = dx.min(dy) as f32;
    let straight = (dx.max(dy) - dx.min(dy)) as f32;
    diag * DIAGONAL_COST + straight * ORTHOGONAL_COST
}

/// Ordered cells from start to end inclusive, plus the accumulated move cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<GridCoord>,
    pub cost: f32,
}

impl Path {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Option<GridCoord> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<GridCoord> {
        self.points.last().copied()
    }

    /// Cell centres in grid space
    pub fn centers(&self) -> Vec<Vec2> {
        self.points.iter().map(|c| c.center()).collect()
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f: f32,
    h: f32,
    index: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    // Reversed so BinaryHeap pops lowest f, then lowest h, then lowest index
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest 8-connected path from `start` to `end`.
///
/// Each move costs its base (10 orthogonal, 14 diagonal) plus
/// `|Δh| · slope_penalty`.
pub fn find_path(
    grid: &ElevationGrid,
    start: GridCoord,
    end: GridCoord,
    slope_penalty: f32,
) -> Result<Path> {
    if !slope_penalty.is_finite() || slope_penalty < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "slope penalty must be finite and non-negative, got {}",
            slope_penalty
        )));
    }
    let (Some(start_idx), Some(end_idx)) = (grid.index_of(start), grid.index_of(end)) else {
        return Err(Error::PathNotFound(format!(
            "endpoint outside {}x{} grid: {:?} -> {:?}",
            grid.width(),
            grid.height(),
            start,
            end
        )));
    };
    if start_idx == end_idx {
        return Ok(Path {
            points: vec![start],
            cost: 0.0,
        });
    }

    let cells = grid.len();
    let heights = grid.as_slice();
    let mut g = vec![f32::INFINITY; cells];
    let mut came_from = vec![usize::MAX; cells];
    let mut closed = vec![false; cells];
    let mut open = BinaryHeap::new();

    g[start_idx] = 0.0;
    let h0 = octile_distance(start, end);
    open.push(OpenNode {
        f: h0,
        h: h0,
        index: start_idx,
    });

    let mut expanded = 0usize;
    while let Some(current) = open.pop() {
        if closed[current.index] {
            continue;
        }
        if current.index == end_idx {
            let path = reconstruct(grid, &came_from, end_idx, g[end_idx]);
            log::debug!(
                "A* found {} cells, cost {:.1}, expanded {}",
                path.len(),
                path.cost,
                expanded
            );
            return Ok(path);
        }
        closed[current.index] = true;
        expanded += 1;

        let here = grid.coord_of(current.index);
        let here_h = heights[current.index];
        for (i, &(dx, dy)) in GridCoord::NEIGHBORS_8.iter().enumerate() {
            let next = here.offset(dx, dy);
            let Some(next_idx) = grid.index_of(next) else {
                continue;
            };
            if closed[next_idx] {
                continue;
            }
            let base = if i < 4 { ORTHOGONAL_COST } else { DIAGONAL_COST };
            let tentative = g[current.index] + base + (heights[next_idx] - here_h).abs() * slope_penalty;
            if tentative < g[next_idx] {
                g[next_idx] = tentative;
                came_from[next_idx] = current.index;
                let h = octile_distance(next, end);
                open.push(OpenNode {
                    f: tentative + h,
                    h,
                    index: next_idx,
                });
            }
        }
    }

    Err(Error::PathNotFound(format!(
        "frontier exhausted between {:?} and {:?}",
        start, end
    )))
}

fn reconstruct(grid: &ElevationGrid, came_from: &[usize], end_idx: usize, cost: f32) -> Path {
    let mut points = vec![grid.coord_of(end_idx)];
    let mut idx = end_idx;
    while came_from[idx] != usize::MAX {
        idx = came_from[idx];
        points.push(grid.coord_of(idx));
    }
    points.reverse();
    Path { points, cost }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(size: usize) -> ElevationGrid {
        ElevationGrid::new(size, size, 0.5).unwrap()
    }

    #[test]
    fn test_flat_diagonal_path() {
        let grid = flat(64);
        let path = find_path(&grid, GridCoord::new(0, 0), GridCoord::new(63, 63), 0.0).unwrap();
        assert_eq!(path.len(), 64);
        assert_eq!(path.cost, 882.0);
        assert_eq!(path.start(), Some(GridCoord::new(0, 0)));
        assert_eq!(path.end(), Some(GridCoord::new(63, 63)));
    }

    #[test]
    fn test_path_is_connected() {
        let grid = flat(32);
        let path = find_path(&grid, GridCoord::new(3, 28), GridCoord::new(30, 1), 0.0).unwrap();
        for pair in path.points.windows(2) {
            assert_eq!(pair[0].chebyshev(pair[1]), 1);
        }
    }

    #[test]
    fn test_zero_penalty_cost_is_octile() {
        let grid = ElevationGrid::from_fn(40, 40, |x, y| ((x * 7 + y * 3) % 11) as f32 / 10.0).unwrap();
        let pairs = [((0, 0), (39, 10)), ((5, 30), (20, 2)), ((12, 12), (12, 35))];
        for ((ax, ay), (bx, by)) in pairs {
            let (a, b) = (GridCoord::new(ax, ay), GridCoord::new(bx, by));
            let path = find_path(&grid, a, b, 0.0).unwrap();
            assert_eq!(path.cost, octile_distance(a, b));
        }
    }

    #[test]
    fn test_cost_non_decreasing_in_penalty() {
        let grid = ElevationGrid::from_fn(48, 48, |x, y| {
            let dx = x as f32 - 24.0;
            let dy = y as f32 - 24.0;
            (1.0 - (dx * dx + dy * dy).sqrt() / 24.0).clamp(0.0, 1.0)
        })
        .unwrap();
        let (a, b) = (GridCoord::new(0, 24), GridCoord::new(47, 24));
        let mut last = 0.0;
        for penalty in [0.0, 10.0, 50.0, 200.0, 1000.0] {
            let cost = find_path(&grid, a, b, penalty).unwrap().cost;
            assert!(cost >= last - 1e-3, "penalty {} cost {} < {}", penalty, cost, last);
            last = cost;
        }
    }

    #[test]
    fn test_steep_penalty_detours_around_hill() {
        let grid = ElevationGrid::from_fn(30, 30, |x, y| {
            if (10..20).contains(&x) && (5..30).contains(&y) { 1.0 } else { 0.0 }
        })
        .unwrap();
        let path = find_path(&grid, GridCoord::new(2, 20), GridCoord::new(27, 20), 1000.0).unwrap();
        assert!(path.points.iter().all(|c| grid.get(*c) == Some(0.0)));
    }

    #[test]
    fn test_same_start_and_end() {
        let grid = flat(8);
        let path = find_path(&grid, GridCoord::new(4, 4), GridCoord::new(4, 4), 5.0).unwrap();
        assert_eq!(path.points, vec![GridCoord::new(4, 4)]);
        assert_eq!(path.cost, 0.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        let grid = flat(8);
        assert!(matches!(
            find_path(&grid, GridCoord::new(-1, 0), GridCoord::new(4, 4), 0.0),
            Err(Error::PathNotFound(_))
        ));
        assert!(matches!(
            find_path(&grid, GridCoord::new(0, 0), GridCoord::new(8, 4), 0.0),
            Err(Error::PathNotFound(_))
        ));
        assert!(matches!(
            find_path(&grid, GridCoord::new(0, 0), GridCoord::new(4, 4), -1.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(find_path(&grid, GridCoord::new(0, 0), GridCoord::new(4, 4), f32::NAN).is_err());
    }

    #[test]
    fn test_deterministic_tie_break() {
        let grid = flat(20);
        let a = find_path(&grid, GridCoord::new(0, 5), GridCoord::new(19, 12), 0.0).unwrap();
        let b = find_path(&grid, GridCoord::new(0, 5), GridCoord::new(19, 12), 0.0).unwrap();
        assert_eq!(a, b);
    }
}
