//! Constraint evaluation and the per-call placement session.

use std::f32::consts::TAU;

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::rule::{PlacementRule, Strategy};
use super::{
    EntityKind, EntityLedger, FeatureMaps, PlacedEntity, SurfaceSampler, TerrainBounds,
    along_path, grid_scan, normalize_yaw,
};
use crate::core::seed::noise_seed;
use crate::core::{DegradedResult, Error, Result};
use crate::grid::{GridCoord, Mask, PointIndex};

/// Smallest bucket used for spacing indices, in cells
const MIN_BUCKET: f32 = 4.0;

/// Why candidates were turned down during one call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionStats {
    pub bounds: usize,
    pub mask: usize,
    pub height: usize,
    pub slope: usize,
    pub feature: usize,
    pub spacing: usize,
    pub exclusion: usize,
    /// Density, cluster or noise gates, and path clearance
    pub gate: usize,
}

impl RejectionStats {
    pub fn total(&self) -> usize {
        self.bounds
            + self.mask
            + self.height
            + self.slope
            + self.feature
            + self.spacing
            + self.exclusion
            + self.gate
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rejection {
    Bounds,
    Mask,
    Height,
    Slope,
    Feature,
    Spacing,
    Exclusion,
}

/// Result of one `place` call
#[derive(Clone, Debug)]
pub struct PlacementOutcome {
    pub kind: EntityKind,
    pub entities: Vec<PlacedEntity>,
    pub attempts: usize,
    pub degraded: Option<DegradedResult>,
    pub rejections: RejectionStats,
}

/// Mutable state for a single placement call.
pub(crate) struct Session<'a> {
    pub mask: &'a Mask,
    pub rule: &'a PlacementRule,
    pub surface: &'a dyn SurfaceSampler,
    pub features: &'a FeatureMaps,
    pub bounds: &'a TerrainBounds,
    pub rng: ChaCha8Rng,
    pub placed: Vec<PlacedEntity>,
    pub attempts: usize,
    pub rejections: RejectionStats,
    same_kind: PointIndex,
    exclusions: Vec<(PointIndex, f32)>,
    noise: Perlin,
    noise_offset: Vec2,
}

impl<'a> Session<'a> {
    fn new(
        engine: &'a PlacementEngine<'a>,
        mask: &'a Mask,
        rule: &'a PlacementRule,
        existing: &EntityLedger,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise_offset = Vec2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0));

        let same_kind = PointIndex::from_points(
            existing.of_kind(rule.kind).map(|e| e.position),
            rule.min_spacing.max(MIN_BUCKET),
        );
        let exclusions = rule
            .exclusions
            .iter()
            .map(|c| {
                let index = PointIndex::from_points(
                    existing.of_kind(c.kind).map(|e| e.position),
                    c.radius.max(MIN_BUCKET),
                );
                (index, c.radius)
            })
            .collect();

        Self {
            mask,
            rule,
            surface: engine.surface,
            features: engine.features,
            bounds: &engine.bounds,
            rng,
            placed: Vec::new(),
            attempts: 0,
            rejections: RejectionStats::default(),
            same_kind,
            exclusions,
            noise: Perlin::new(noise_seed(seed)),
            noise_offset,
        }
    }

    /// Coherent noise in `[0, 1]` at `p` (already scaled by the caller).
    pub fn noise01(&self, p: Vec2) -> f32 {
        let q = p + self.noise_offset;
        let v = self.noise.get([q.x as f64, q.y as f64]) as f32;
        ((v + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    pub fn target_reached(&self) -> bool {
        self.rule
            .target_count
            .is_some_and(|target| self.placed.len() >= target)
    }

    /// Check every constraint; on success return the surface height.
    pub fn evaluate(&mut self, p: Vec2) -> Option<f32> {
        match self.check(p) {
            Ok(height) => Some(height),
            Err(reason) => {
                let stats = &mut self.rejections;
                match reason {
                    Rejection::Bounds => stats.bounds += 1,
                    Rejection::Mask => stats.mask += 1,
                    Rejection::Height => stats.height += 1,
                    Rejection::Slope => stats.slope += 1,
                    Rejection::Feature => stats.feature += 1,
                    Rejection::Spacing => stats.spacing += 1,
                    Rejection::Exclusion => stats.exclusion += 1,
                }
                None
            }
        }
    }

    fn check(&self, p: Vec2) -> std::result::Result<f32, Rejection> {
        let rule = self.rule;
        if !self.bounds.contains(p) {
            return Err(Rejection::Bounds);
        }
        if !self.mask.contains(GridCoord::from_position(p), rule.mask_threshold) {
            return Err(Rejection::Mask);
        }
        let height = self.surface.height_at(p);
        if height < rule.height_band.0 || height > rule.height_band.1 {
            return Err(Rejection::Height);
        }
        if self.surface.slope_degrees_at(p) > rule.max_slope {
            return Err(Rejection::Slope);
        }
        for c in &rule.features {
            // Unregistered features are infinitely far away
            let d = self.features.distance(c.feature, p).unwrap_or(f32::INFINITY);
            if !c.band.admits(d) {
                return Err(Rejection::Feature);
            }
        }
        if self.same_kind.any_within(p, rule.min_spacing) {
            return Err(Rejection::Spacing);
        }
        if self
            .exclusions
            .iter()
            .any(|(index, radius)| index.any_within(p, *radius))
        {
            return Err(Rejection::Exclusion);
        }
        Ok(height)
    }

    /// Record an accepted candidate; draws scale and variant.
    pub fn accept(&mut self, p: Vec2, height: f32, yaw: f32) {
        let (lo, hi) = self.rule.scale_range;
        let scale = if hi > lo { self.rng.gen_range(lo..=hi) } else { lo };
        let variant = if self.rule.variants > 1 {
            self.rng.gen_range(0..self.rule.variants)
        } else {
            0
        };
        self.same_kind.insert(p);
        self.placed.push(PlacedEntity {
            kind: self.rule.kind,
            position: p,
            height,
            yaw: normalize_yaw(yaw + self.rule.rotation_offset),
            scale,
            variant,
        });
    }

    pub fn random_yaw(&mut self) -> f32 {
        self.rng.gen_range(0.0..TAU)
    }
}

/// Places entities against one surface, feature set and terrain extent.
pub struct PlacementEngine<'a> {
    surface: &'a dyn SurfaceSampler,
    features: &'a FeatureMaps,
    bounds: TerrainBounds,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(surface: &'a dyn SurfaceSampler, features: &'a FeatureMaps, bounds: TerrainBounds) -> Self {
        Self {
            surface,
            features,
            bounds,
        }
    }

    pub fn bounds(&self) -> &TerrainBounds {
        &self.bounds
    }

    /// Run `rule` over `candidates`, respecting everything already in `existing`.
    ///
    /// Falling short of the target is reported in the outcome; falling short
    /// of `min_count` is an error.
    pub fn place(
        &self,
        candidates: &Mask,
        rule: &PlacementRule,
        existing: &EntityLedger,
        seed: u64,
    ) -> Result<PlacementOutcome> {
        rule.validate()?;
        self.bounds.validate()?;
        if candidates.width() != self.bounds.grid_width || candidates.height() != self.bounds.grid_height {
            return Err(Error::InvalidDimensions(format!(
                "{} candidate mask is {}x{}, terrain is {}x{}",
                rule.kind,
                candidates.width(),
                candidates.height(),
                self.bounds.grid_width,
                self.bounds.grid_height
            )));
        }

        let started = std::time::Instant::now();
        let mut session = Session::new(self, candidates, rule, existing, seed);
        match rule.strategy {
            Strategy::GridScan {
                step,
                jitter,
                density,
                orientation,
            } => grid_scan::run(&mut session, step, jitter, density, orientation),
            Strategy::AlongPath {
                reference,
                min_offset,
                max_offset,
                attempt_multiplier,
                gate,
            } => along_path::run(
                &mut session,
                reference,
                min_offset,
                max_offset,
                attempt_multiplier,
                gate,
            ),
        }

        let placed = session.placed.len();
        let degraded = rule
            .target_count
            .and_then(|target| DegradedResult::check(rule.kind.name(), target, placed, session.attempts));

        log::info!(
            "Placed {} {} ({} attempts) in {:?}",
            placed,
            rule.kind,
            session.attempts,
            started.elapsed()
        );
        log::debug!("{} rejections: {:?}", rule.kind, session.rejections);

        if placed < rule.min_count {
            return Err(Error::InsufficientCandidates {
                found: placed,
                required: rule.min_count,
            });
        }

        Ok(PlacementOutcome {
            kind: rule.kind,
            entities: session.placed,
            attempts: session.attempts,
            degraded,
            rejections: session.rejections,
        })
    }
}

/// Place with a throwaway engine.
pub fn place(
    candidates: &Mask,
    rule: &PlacementRule,
    existing: &EntityLedger,
    bounds: TerrainBounds,
    surface: &dyn SurfaceSampler,
    features: &FeatureMaps,
    seed: u64,
) -> Result<PlacementOutcome> {
    PlacementEngine::new(surface, features, bounds).place(candidates, rule, existing, seed)
}
