//! A plate-tectonics simulation engine for procedural world generation.
//!
//! A handful of rigid plates drift, collide, fold, subduct, aggregate and
//! erode on a toroidal grid, evolving a scalar heightmap. Everything is
//! driven by one seeded PRNG, so a seed plus a configuration reproduces a
//! run exactly on the same build.
//!
//! ```
//! use litho_core::{Lithosphere, WorldParams};
//!
//! let mut params = WorldParams {
//!     width: 64,
//!     height: 64,
//!     num_plates: 6,
//!     num_cycles: 1,
//!     ..WorldParams::default()
//! };
//! params.tuning.restart_iterations = 80;
//!
//! let mut lithosphere = Lithosphere::new(&params).unwrap();
//! while !lithosphere.is_finished() {
//!     lithosphere.step();
//! }
//! let heights = lithosphere.topography();
//! assert_eq!(heights.len(), 64 * 64);
//! ```

pub mod coords;
pub mod grid;
pub mod hydraulic;
pub mod lithosphere;
pub mod metrics;
pub mod noise;
pub mod params;
pub mod plates;
pub mod rng;

pub use coords::{Dimension, UVec2, Vec2};
pub use grid::{AgeMap, Grid, HeightMap, OwnerMap, NO_OWNER};
pub use lithosphere::Lithosphere;
pub use metrics::ElevationStats;
pub use params::{ConfigError, Tuning, WorldParams};
pub use plates::Plate;
pub use rng::Lcg;
