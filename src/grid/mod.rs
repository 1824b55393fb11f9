//! Dense 2D grids: elevation fields, scalar masks, distance fields.
//!
//! Coordinates are `(x, y)` with the origin at the top-left cell; a world
//! position `p` belongs to cell `floor(p)`.

pub mod coord;
pub mod dense;
pub mod distance;
pub mod mask;

pub use coord::{GridCoord, GridRect};
pub use dense::{ElevationGrid, Grid};
pub use distance::{DistanceField, PointIndex};
pub use mask::{DEFAULT_THRESHOLD, Mask};
