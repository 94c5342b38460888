//! Tileable terrain noise: 4-D OpenSimplex octaves sampled on a torus.
//!
//! Each grid axis is mapped onto a circle in a plane of 4-D noise space, so
//! the field is continuous across both wrap seams by construction. One
//! `next_u32` is drawn from the master PRNG: it seeds the noise permutation
//! and derives the four domain offsets.

use noise::{NoiseFn, OpenSimplex};

use super::HeightSource;
use crate::coords::Dimension;
use crate::rng::Lcg;

const OCTAVES: u32 = 4;
const PERSISTENCE: f64 = 0.25;
const BASE_FREQUENCY: f64 = 0.25;
const DOMAIN_SCALE: f64 = 0.593;

/// The default initial-terrain source.
#[derive(Debug, Clone, Copy, Default)]
pub struct TorusNoise;

impl HeightSource for TorusNoise {
    fn fill(&self, out: &mut [f32], dim: Dimension, rng: &mut Lcg) {
        assert_eq!(
            out.len(),
            dim.area(),
            "noise buffer length {} does not match {}x{}",
            out.len(),
            dim.width(),
            dim.height()
        );

        let seed = rng.next_u32();
        let simplex = OpenSimplex::new(seed);

        // Domain offsets keep distinct seeds from sampling the same torus.
        let s = i64::from(seed).max(1);
        let ka = (256 / s) as f64;
        let kb = (s.wrapping_mul(567) % 256) as f64;
        let kc = (s.wrapping_mul(s) % 256) as f64;
        let kd = ((567 - s) % 256) as f64;

        let width = dim.width() as f64;
        let height = dim.height() as f64;
        for y in 0..dim.height() {
            for x in 0..dim.width() {
                let rdx = f64::from(x) / width * 2.0 * std::f64::consts::PI;
                let rdy = f64::from(y) / height * 4.0 * std::f64::consts::PI;
                let point = [
                    ka + rdx.sin() * DOMAIN_SCALE,
                    kb + rdx.cos() * DOMAIN_SCALE,
                    kc + rdy.sin() * DOMAIN_SCALE,
                    kd + rdy.cos() * DOMAIN_SCALE,
                ];
                out[(y * dim.width() + x) as usize] = octave_noise(&simplex, point);
            }
        }
    }
}

/// Octave sum scaled into [0, 1].
fn octave_noise(simplex: &OpenSimplex, point: [f64; 4]) -> f32 {
    let mut total = 0.0f64;
    let mut amplitude = 1.0f64;
    let mut frequency = BASE_FREQUENCY;
    let mut max_amplitude = 0.0f64;
    for _ in 0..OCTAVES {
        total += simplex.get(point.map(|c| c * frequency)) * amplitude;
        max_amplitude += amplitude;
        amplitude *= PERSISTENCE;
        frequency *= 2.0;
    }
    ((total / max_amplitude) * 0.5 + 0.5) as f32
}
