//! Fractal-noise heightmap synthesis

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::seed::noise_seed;
use crate::core::{Error, Result};
use crate::grid::ElevationGrid;

/// Parameters controlling fractal noise synthesis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub seed: u64,
    pub scale: f32,       // Cells per noise unit (larger = smoother)
    pub octaves: u32,     // Detail levels
    pub persistence: f32, // Amplitude multiplier per octave
    pub lacunarity: f32,  // Frequency multiplier per octave
    pub offset: Vec2,     // Added to noise-space coordinates
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 100.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
        }
    }
}

impl NoiseParams {
    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Err(Error::InvalidParameter("octaves must be at least 1".into()));
        }
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "noise scale must be positive, got {}",
                self.scale
            )));
        }
        if !self.persistence.is_finite() || !self.lacunarity.is_finite() {
            return Err(Error::InvalidParameter(
                "persistence and lacunarity must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Largest possible magnitude of the octave sum: Σ|persistence|^i.
    pub fn max_amplitude(&self) -> f64 {
        let p = (self.persistence as f64).abs();
        let mut amplitude = 1.0;
        let mut total = 0.0;
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= p;
        }
        total
    }
}

/// Multi-octave Perlin sampler normalized into `[0, 1]`.
pub struct HeightmapSynthesizer {
    params: NoiseParams,
    perlin: Perlin,
    max_amplitude: f64,
}

impl HeightmapSynthesizer {
    pub fn new(params: NoiseParams) -> Result<Self> {
        params.validate()?;
        let perlin = Perlin::new(noise_seed(params.seed));
        let max_amplitude = params.max_amplitude();
        Ok(Self {
            params,
            perlin,
            max_amplitude,
        })
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// Height at grid position (x, y), always within `[0, 1]`.
    pub fn height_at(&self, x: f32, y: f32) -> f32 {
        let p = &self.params;
        let nx = (x / p.scale) as f64;
        let ny = (y / p.scale) as f64;

        let mut amplitude = 1.0f64;
        let mut frequency = 1.0f64;
        let mut sum = 0.0f64;
        for _ in 0..p.octaves {
            let sample = self
                .perlin
                .get([nx * frequency + p.offset.x as f64, ny * frequency + p.offset.y as f64])
                .clamp(-1.0, 1.0);
            sum += sample * amplitude;
            amplitude *= p.persistence as f64;
            frequency *= p.lacunarity as f64;
        }

        if self.max_amplitude <= f64::EPSILON {
            return 0.5;
        }
        (((sum + self.max_amplitude) / (2.0 * self.max_amplitude)) as f32).clamp(0.0, 1.0)
    }

    pub fn synthesize(&self, width: usize, height: usize) -> Result<ElevationGrid> {
        let mut grid = ElevationGrid::new(width, height, 0.0)?;
        grid.par_rows_mut().for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = self.height_at(x as f32, y as f32);
            }
        });
        Ok(grid)
    }
}

/// Synthesize a `width × height` fractal heightmap.
pub fn synthesize(width: usize, height: usize, params: &NoiseParams) -> Result<ElevationGrid> {
    let started = std::time::Instant::now();
    let grid = HeightmapSynthesizer::new(params.clone())?.synthesize(width, height)?;
    let (lo, hi) = grid.min_max();
    log::debug!(
        "Synthesized {}x{} heightmap ({} octaves) range [{:.3}, {:.3}] in {:?}",
        width,
        height,
        params.octaves,
        lo,
        hi,
        started.elapsed()
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_params_default() {
        let params = NoiseParams::default();
        assert_eq!(params.octaves, 4);
        assert_eq!(params.persistence, 0.5);
        assert_eq!(params.lacunarity, 2.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_max_amplitude() {
        let params = NoiseParams {
            octaves: 3,
            persistence: 0.5,
            ..Default::default()
        };
        assert!((params.max_amplitude() - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_synthesis_in_unit_range() {
        for octaves in [1, 2, 5, 9] {
            for persistence in [0.3, 0.5, 1.0, 1.4] {
                let params = NoiseParams {
                    seed: 99,
                    scale: 7.0,
                    octaves,
                    persistence,
                    lacunarity: 2.1,
                    offset: Vec2::new(3.3, -1.7),
                };
                let grid = synthesize(48, 32, &params).unwrap();
                for &h in grid.as_slice() {
                    assert!((0.0..=1.0).contains(&h), "octaves {} gave {}", octaves, h);
                }
            }
        }
    }

    #[test]
    fn test_synthesis_varies_and_is_deterministic() {
        let params = NoiseParams {
            scale: 10.0,
            ..Default::default()
        };
        let a = synthesize(32, 32, &params).unwrap();
        let b = synthesize(32, 32, &params).unwrap();
        assert_eq!(a, b);
        let (lo, hi) = a.min_max();
        assert!(hi - lo > 0.05);

        let other = synthesize(32, 32, &NoiseParams { seed: 1, ..params }).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let zero_octaves = NoiseParams {
            octaves: 0,
            ..Default::default()
        };
        assert!(matches!(
            synthesize(8, 8, &zero_octaves),
            Err(Error::InvalidParameter(_))
        ));

        let zero_scale = NoiseParams {
            scale: 0.0,
            ..Default::default()
        };
        assert!(synthesize(8, 8, &zero_scale).is_err());

        assert!(matches!(
            synthesize(0, 8, &NoiseParams::default()),
            Err(Error::InvalidDimensions(_))
        ));
    }
}
