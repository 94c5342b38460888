//! Initial-terrain sources. The lithosphere consumes one of these exactly
//! once at construction to obtain a `(W+1) × (H+1)` scalar field, which it
//! then thresholds into the starting continents and oceans.

pub mod sqrdmd;
pub mod torus;

use crate::coords::Dimension;
use crate::rng::Lcg;

pub use sqrdmd::{normalize, sqrdmd, SquareDiamond};
pub use torus::TorusNoise;

/// A provider of the initial heightmap. `out` has `dim.area()` cells,
/// row-major; values may be on any scale, the caller normalizes.
pub trait HeightSource {
    fn fill(&self, out: &mut [f32], dim: Dimension, rng: &mut Lcg);
}
