//! Width-graded segment rasterization with max compositing.

use glam::Vec2;

use crate::grid::{GridCoord, Mask};

/// Strength of a stamp at distance `d` from its centre.
///
/// Full strength within `width / 2`, linear decay to 0 at
/// `(width + smoothing) / 2`.
pub fn stamp_falloff(d: f32, width: f32, smoothing: f32) -> f32 {
    let core = width * 0.5;
    let outer = (width + smoothing) * 0.5;
    if d <= core {
        1.0
    } else if d < outer {
        1.0 - (d - core) / (outer - core)
    } else {
        0.0
    }
}

/// Stamp a soft disc into `mask`, keeping the larger value per cell.
pub fn stamp_disc(mask: &mut Mask, center: Vec2, width: f32, smoothing: f32) {
    let reach = ((width + smoothing) * 0.5).ceil() as i32 + 1;
    let origin = GridCoord::new(center.x.round() as i32, center.y.round() as i32);
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let c = origin.offset(dx, dy);
            let strength = stamp_falloff(c.as_vec2().distance(center), width, smoothing);
            if strength > 0.0 {
                mask.stamp_max(c, strength);
            }
        }
    }
}

/// Points along `a → b` at most one cell apart, endpoints included.
pub fn segment_samples(a: Vec2, b: Vec2) -> Vec<Vec2> {
    let steps = a.distance(b).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|k| a.lerp(b, k as f32 / steps as f32))
        .collect()
}

pub fn rasterize_segment(mask: &mut Mask, a: Vec2, b: Vec2, width: f32, smoothing: f32) {
    for p in segment_samples(a, b) {
        stamp_disc(mask, p, width, smoothing);
    }
}
