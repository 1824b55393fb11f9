//! Edge-anchored undulating mountain base.
//!
//! A single broad massif whose peak sits beyond one grid edge, so the
//! visible terrain is its foothill slope. Fractal undulation is scaled by
//! the massif itself, leaving the lowlands smooth.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::seed::noise_seed;
use crate::core::{Error, Result};
use crate::grid::ElevationGrid;
use crate::grid::dense::check_dims;

/// Mountain shape parameters. Distances are fractions of the larger grid side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountainParams {
    pub radius: f32,
    /// How far beyond the chosen edge the peak sits
    pub edge_offset: f32,
    pub max_height: f32,
    /// Exponent on the radial falloff; larger widens the foothills
    pub smoothness: f32,
    /// Noise periods across the grid
    pub noise_scale: f32,
    pub octaves: u32,
    pub noise_strength: f32,
}

impl Default for MountainParams {
    fn default() -> Self {
        Self {
            radius: 1.75,
            edge_offset: 0.58,
            max_height: 0.7,
            smoothness: 2.0,
            noise_scale: 60.0,
            octaves: 7,
            noise_strength: 0.6,
        }
    }
}

impl MountainParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.radius > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "mountain radius must be positive, got {}",
                self.radius
            )));
        }
        if self.octaves == 0 {
            return Err(Error::InvalidParameter("mountain octaves must be at least 1".into()));
        }
        if !(self.smoothness > 0.0) {
            return Err(Error::InvalidParameter("mountain smoothness must be positive".into()));
        }
        Ok(())
    }
}

/// Which edge the peak is placed beyond.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Pick the peak position: a random point along a random edge, pushed outward.
fn peak_position(width: usize, height: usize, offset: f32, rng: &mut ChaCha8Rng) -> (Edge, Vec2) {
    let (w, h) = (width as f32, height as f32);
    match rng.gen_range(0..4) {
        0 => (Edge::Top, Vec2::new(rng.gen_range(0.0..w), -offset)),
        1 => (Edge::Right, Vec2::new(w + offset, rng.gen_range(0.0..h))),
        2 => (Edge::Bottom, Vec2::new(rng.gen_range(0.0..w), h + offset)),
        _ => (Edge::Left, Vec2::new(-offset, rng.gen_range(0.0..h))),
    }
}

pub fn synthesize_mountain(
    width: usize,
    height: usize,
    params: &MountainParams,
    seed: u64,
) -> Result<ElevationGrid> {
    params.validate()?;
    check_dims(width, height)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let side = width.max(height) as f32;
    let radius = params.radius * side;
    let (edge, center) = peak_position(width, height, params.edge_offset * side, &mut rng);
    let noise_offset = Vec2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0));
    let perlin = Perlin::new(noise_seed(seed));

    let grid = ElevationGrid::from_fn(width, height, |x, y| {
        let p = Vec2::new(x as f32, y as f32);
        let falloff = (1.0 - p.distance(center) / radius).clamp(0.0, 1.0);
        let massif = falloff.powf(params.smoothness);
        if massif <= 0.0 {
            return 0.0;
        }

        // Zero-centred undulation in [-0.5, 0.5] per octave
        let mut undulation = 0.0f64;
        let mut amplitude = 1.0f64;
        let mut frequency = 1.0f64;
        for _ in 0..params.octaves {
            let sx = (p.x + noise_offset.x) / side * params.noise_scale;
            let sy = (p.y + noise_offset.y) / side * params.noise_scale;
            let sample = perlin.get([sx as f64 * frequency, sy as f64 * frequency]);
            undulation += (sample * 0.5).clamp(-0.5, 0.5) * amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        let shaped = massif + undulation as f32 * params.noise_strength * massif;
        (shaped * params.max_height).clamp(0.0, 1.0)
    })?;

    log::debug!(
        "Mountain peak beyond {:?} edge at ({:.1}, {:.1}), radius {:.1}",
        edge,
        center.x,
        center.y,
        radius
    );
    Ok(grid)
}
