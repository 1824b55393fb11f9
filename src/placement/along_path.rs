//! Rejection sampling beside a linear feature, facing it.

use glam::Vec2;
use rand::Rng;

use super::engine::Session;
use super::rule::PathGate;
use super::{FeatureKind, yaw_toward};
use crate::grid::{GridCoord, PointIndex};

pub(crate) fn run(
    session: &mut Session<'_>,
    reference: FeatureKind,
    min_offset: f32,
    max_offset: f32,
    attempt_multiplier: usize,
    gate: PathGate,
) {
    let features = session.features;
    let Some(points) = features.points(reference).filter(|p| !p.is_empty()) else {
        log::warn!("{}: no {:?} points to place along", session.rule.kind, reference);
        return;
    };
    let target = session.rule.target_count.unwrap_or(0);
    let budget = target.saturating_mul(attempt_multiplier);
    let centers = match gate {
        PathGate::Clusters { count, .. } => cluster_centers(session, points, count),
        _ => Vec::new(),
    };

    while session.placed.len() < target && session.attempts < budget {
        session.attempts += 1;
        let anchor = points.points()[session.rng.gen_range(0..points.len())];

        if !passes_gate(session, anchor, gate, &centers) {
            session.rejections.gate += 1;
            continue;
        }

        // Tangent from the closest distinct reference point
        let Some((neighbor, _)) = points.nearest_excluding(anchor, 0.0) else {
            continue;
        };
        let tangent = (points.points()[neighbor] - anchor).normalize_or_zero();
        if tangent == Vec2::ZERO {
            continue;
        }
        let mut normal = Vec2::new(tangent.y, -tangent.x);
        if session.rng.gen_bool(0.5) {
            normal = -normal;
        }
        let offset = if max_offset > min_offset {
            session.rng.gen_range(min_offset..=max_offset)
        } else {
            min_offset
        };
        let p = anchor + normal * offset;

        // The offset point must not land back on the feature
        if points
            .nearest(p)
            .is_some_and(|(_, d)| d < min_offset * 0.5)
        {
            session.rejections.gate += 1;
            continue;
        }

        let Some(height) = session.evaluate(p) else {
            continue;
        };
        session.accept(p, height, yaw_toward(anchor - p));
    }
}

/// Pick cluster centres among reference points inside the candidate mask.
fn cluster_centers(session: &mut Session<'_>, points: &PointIndex, count: usize) -> Vec<Vec2> {
    let eligible: Vec<Vec2> = points
        .points()
        .iter()
        .copied()
        .filter(|p| {
            session
                .mask
                .contains(GridCoord::from_position(*p), session.rule.mask_threshold)
        })
        .collect();
    if eligible.is_empty() {
        log::warn!("{}: no reference points inside the candidate mask", session.rule.kind);
        return Vec::new();
    }
    (0..count)
        .map(|_| eligible[session.rng.gen_range(0..eligible.len())])
        .collect()
}

fn passes_gate(session: &mut Session<'_>, anchor: Vec2, gate: PathGate, centers: &[Vec2]) -> bool {
    match gate {
        PathGate::Open => true,
        PathGate::Clusters {
            core_radius,
            max_radius,
            ..
        } => {
            let Some(d) = centers
                .iter()
                .map(|c| c.distance(anchor))
                .min_by(|a, b| a.total_cmp(b))
            else {
                return false;
            };
            let chance = cluster_chance(d, core_radius, max_radius);
            chance > 0.0 && session.rng.r#gen::<f32>() < chance
        }
        PathGate::Noise { scale, strength } => {
            let n = session.noise01(anchor / scale.max(f32::EPSILON));
            session.rng.r#gen::<f32>() <= n * strength
        }
    }
}

/// 1 within the core, linear fade to 0 at the outer radius.
pub(crate) fn cluster_chance(d: f32, core_radius: f32, max_radius: f32) -> f32 {
    if d > max_radius {
        0.0
    } else if d <= core_radius || max_radius <= core_radius {
        1.0
    } else {
        1.0 - (d - core_radius) / (max_radius - core_radius)
    }
}
