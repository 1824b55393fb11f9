//! Land-use zoning: forest uplands, farmland and settlement clusters

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::seed::noise_seed;
use crate::core::{Error, Result};
use crate::grid::{ElevationGrid, Grid, GridCoord, Mask};

/// Land-use zone of a single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Forest,
    Farmland,
    Settlement,
}

/// Parameters for zone classification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneParams {
    /// Forest threshold is drawn uniformly from this range per run
    pub forest_threshold_min: f32,
    pub forest_threshold_max: f32,
    /// Cluster noise periods across the grid (smaller = larger clusters)
    pub cluster_scale: f32,
    /// Share of flat land that becomes farmland
    pub field_ratio: f32,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            forest_threshold_min: 0.25,
            forest_threshold_max: 0.45,
            cluster_scale: 15.0,
            field_ratio: 0.5,
        }
    }
}

impl ZoneParams {
    pub fn validate(&self) -> Result<()> {
        if self.forest_threshold_min > self.forest_threshold_max {
            return Err(Error::InvalidParameter(format!(
                "forest threshold range is inverted: [{}, {}]",
                self.forest_threshold_min, self.forest_threshold_max
            )));
        }
        if !(self.cluster_scale > 0.0) {
            return Err(Error::InvalidParameter("cluster_scale must be positive".into()));
        }
        Ok(())
    }
}

/// Mutually exclusive, exhaustive zone masks for one run
#[derive(Clone, Debug)]
pub struct ZoneMasks {
    pub forest: Mask,
    pub settlement: Mask,
    pub farmland: Mask,
    /// Forest threshold actually used
    pub forest_threshold: f32,
}

impl ZoneMasks {
    /// Buildable lowland: settlement ∪ farmland
    pub fn flat_area(&self) -> Result<Mask> {
        self.settlement
            .union(&self.farmland, crate::grid::DEFAULT_THRESHOLD)
    }

    pub fn mask(&self, zone: Zone) -> &Mask {
        match zone {
            Zone::Forest => &self.forest,
            Zone::Farmland => &self.farmland,
            Zone::Settlement => &self.settlement,
        }
    }

    pub fn zone_at(&self, c: GridCoord) -> Option<Zone> {
        [Zone::Forest, Zone::Farmland, Zone::Settlement]
            .into_iter()
            .find(|&z| self.mask(z).value(c) >= 0.5)
    }
}

/// Per-run classifier with a fixed threshold and cluster noise
pub struct ZoneClassifier {
    params: ZoneParams,
    forest_threshold: f32,
    cluster_noise: Perlin,
    noise_offset: Vec2,
}

impl ZoneClassifier {
    pub fn new(params: ZoneParams, seed: u64) -> Result<Self> {
        params.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let forest_threshold = if params.forest_threshold_min < params.forest_threshold_max {
            rng.gen_range(params.forest_threshold_min..=params.forest_threshold_max)
        } else {
            params.forest_threshold_min
        };
        let noise_offset = Vec2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0));

        Ok(Self {
            params,
            forest_threshold,
            cluster_noise: Perlin::new(noise_seed(seed)),
            noise_offset,
        })
    }

    pub fn forest_threshold(&self) -> f32 {
        self.forest_threshold
    }

    /// Cluster noise in `[0, 1]` at a normalized position
    fn cluster_value(&self, u: f32, v: f32) -> f32 {
        let sx = u * self.params.cluster_scale + self.noise_offset.x;
        let sy = v * self.params.cluster_scale + self.noise_offset.y;
        let raw = self.cluster_noise.get([sx as f64, sy as f64]) as f32;
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    pub fn zone_for(&self, elevation: f32, u: f32, v: f32) -> Zone {
        if elevation > self.forest_threshold {
            Zone::Forest
        } else if self.cluster_value(u, v) < self.params.field_ratio {
            Zone::Farmland
        } else {
            Zone::Settlement
        }
    }

    pub fn classify(&self, grid: &ElevationGrid) -> Result<ZoneMasks> {
        let (width, height) = grid.dims();
        let zones: Grid<Zone> = Grid::from_fn(width, height, |x, y| {
            let h = grid.get_clamped(x as i32, y as i32);
            self.zone_for(h, x as f32 / width as f32, y as f32 / height as f32)
        })?;

        let mask_of = |zone: Zone| -> Result<Mask> {
            Mask::from_predicate(width, height, |x, y| {
                zones.get_clamped(x as i32, y as i32) == zone
            })
        };

        Ok(ZoneMasks {
            forest: mask_of(Zone::Forest)?,
            settlement: mask_of(Zone::Settlement)?,
            farmland: mask_of(Zone::Farmland)?,
            forest_threshold: self.forest_threshold,
        })
    }
}

/// Classify every cell of `grid` into forest, farmland or settlement.
pub fn classify(grid: &ElevationGrid, params: &ZoneParams, seed: u64) -> Result<ZoneMasks> {
    let classifier = ZoneClassifier::new(params.clone(), seed)?;
    let masks = classifier.classify(grid)?;
    log::info!(
        "Zones: threshold {:.3}, forest {} / farmland {} / settlement {} cells",
        masks.forest_threshold,
        masks.forest.coverage(0.5),
        masks.farmland.coverage(0.5),
        masks.settlement.coverage(0.5)
    );
    Ok(masks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::heightmap::{NoiseParams, synthesize};

    fn terrain() -> ElevationGrid {
        synthesize(
            64,
            64,
            &NoiseParams {
                scale: 20.0,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_zones_exclusive_and_exhaustive() {
        let grid = terrain();
        let masks = classify(&grid, &ZoneParams::default(), 5).unwrap();
        for (c, _) in grid.iter() {
            let total = masks.forest.value(c) + masks.farmland.value(c) + masks.settlement.value(c);
            assert_eq!(total, 1.0, "cell {:?}", c);
            let zone = masks.zone_at(c).unwrap();
            assert_eq!(masks.mask(zone).value(c), 1.0);
        }
        assert_eq!(masks.zone_at(GridCoord::new(-1, 0)), None);
    }

    #[test]
    fn test_forest_is_above_threshold() {
        let grid = terrain();
        let masks = classify(&grid, &ZoneParams::default(), 9).unwrap();
        assert!((0.25..=0.45).contains(&masks.forest_threshold));
        for (c, h) in grid.iter() {
            assert_eq!(masks.forest.value(c) == 1.0, h > masks.forest_threshold);
        }
    }

    #[test]
    fn test_fixed_threshold_and_field_ratio_extremes() {
        let grid = ElevationGrid::from_fn(32, 32, |x, _| x as f32 / 31.0).unwrap();
        let params = ZoneParams {
            forest_threshold_min: 0.5,
            forest_threshold_max: 0.5,
            field_ratio: 1.1,
            ..Default::default()
        };
        let masks = classify(&grid, &params, 1).unwrap();
        assert_eq!(masks.forest_threshold, 0.5);
        assert_eq!(masks.settlement.coverage(0.5), 0);
        assert_eq!(masks.farmland.coverage(0.5) + masks.forest.coverage(0.5), 32 * 32);

        let flat = masks.flat_area().unwrap();
        assert_eq!(flat.coverage(0.5), masks.farmland.coverage(0.5));
    }

    #[test]
    fn test_classification_is_seeded() {
        let grid = terrain();
        let a = classify(&grid, &ZoneParams::default(), 77).unwrap();
        let b = classify(&grid, &ZoneParams::default(), 77).unwrap();
        assert_eq!(a.settlement, b.settlement);
        assert_eq!(a.forest_threshold, b.forest_threshold);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let params = ZoneParams {
            forest_threshold_min: 0.6,
            forest_threshold_max: 0.4,
            ..Default::default()
        };
        assert!(ZoneClassifier::new(params, 0).is_err());
    }
}
