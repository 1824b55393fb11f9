//! Lattice scan: visit regularly spaced plots and keep those that qualify.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::engine::Session;
use super::rule::{Density, OrientationMode};

pub(crate) fn run(
    session: &mut Session<'_>,
    step: f32,
    jitter: f32,
    density: Density,
    orientation: OrientationMode,
) {
    let columns = (session.bounds.grid_width as f32 / step).ceil() as usize;
    let rows = (session.bounds.grid_height as f32 / step).ceil() as usize;

    'scan: for j in 0..rows {
        for i in 0..columns {
            if session.target_reached() {
                break 'scan;
            }
            let mut p = Vec2::new((i as f32 + 0.5) * step, (j as f32 + 0.5) * step);
            if jitter > 0.0 {
                p += Vec2::new(
                    session.rng.gen_range(-jitter..=jitter),
                    session.rng.gen_range(-jitter..=jitter),
                );
            }
            session.attempts += 1;

            let Some(height) = session.evaluate(p) else {
                continue;
            };
            if !passes_density(session, p, density) {
                session.rejections.gate += 1;
                continue;
            }
            let yaw = match orientation {
                OrientationMode::Random => session.random_yaw(),
                OrientationMode::Fixed(angle) => angle,
                OrientationMode::Quantized { steps, coherence } => {
                    quantized_yaw(session.noise01(p * coherence), steps)
                }
            };
            session.accept(p, height, yaw);
        }
    }
}

fn passes_density(session: &mut Session<'_>, p: Vec2, density: Density) -> bool {
    match density {
        Density::Always => true,
        Density::Uniform(chance) => session.rng.r#gen::<f32>() < chance,
        Density::Noise { scale, bias } => {
            let chance = session.noise01(p / scale) + bias;
            session.rng.r#gen::<f32>() < chance
        }
    }
}

/// Snap a `[0, 1]` noise value to one of `steps` equal turns.
pub(crate) fn quantized_yaw(noise: f32, steps: u32) -> f32 {
    let steps = steps.max(1);
    let k = ((noise * steps as f32).floor() as u32).min(steps - 1);
    k as f32 * TAU / steps as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_quantized_yaw() {
        assert_eq!(quantized_yaw(0.0, 4), 0.0);
        assert!((quantized_yaw(0.3, 4) - FRAC_PI_2).abs() < 1e-6);
        assert!((quantized_yaw(1.0, 4) - 3.0 * FRAC_PI_2).abs() < 1e-6);
        assert_eq!(quantized_yaw(0.7, 1), 0.0);
    }
}
