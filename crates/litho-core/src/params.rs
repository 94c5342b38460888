//! Simulation parameters: user-facing configuration plus the fixed tuning
//! constants every plate and the lithosphere share. A validated copy is
//! built once at engine construction and passed around by reference; there
//! is no process-global state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::Dimension;

/// Smallest world side the simulation accepts.
pub const MIN_WORLD_SIDE: u32 = 5;

/// Configuration problems detected at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("world side {0} is below the minimum of {MIN_WORLD_SIDE}")]
    WorldTooSmall(u32),
    #[error("at least one plate is required")]
    NoPlates,
}

/// User-facing construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldParams {
    /// Initial PRNG state.
    pub seed: u32,
    /// World grid width; must be >= 5.
    pub width: u32,
    /// World grid height; must be >= 5.
    pub height: u32,
    /// Fraction of cells below the initial land threshold, in (0, 1).
    pub sea_level: f32,
    /// Apply per-plate erosion every N iterations; 0 disables.
    pub erosion_period: u32,
    /// Fraction of overlapping continental crust folded at a juxtaposition.
    pub folding_ratio: f32,
    /// Absolute collision count that triggers segment aggregation.
    pub aggr_overlap_abs: u32,
    /// Relative collided-area fraction that triggers segment aggregation.
    pub aggr_overlap_rel: f32,
    /// Number of restart cycles; 0 runs unbounded.
    pub num_cycles: u32,
    /// Initial plate count.
    pub num_plates: u32,
    pub tuning: Tuning,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 512,
            height: 512,
            sea_level: 0.65,
            erosion_period: 60,
            folding_ratio: 0.02,
            aggr_overlap_abs: 1_000_000,
            aggr_overlap_rel: 0.33,
            num_cycles: 2,
            num_plates: 10,
            tuning: Tuning::default(),
        }
    }
}

impl WorldParams {
    /// Check the hard limits and clamp the soft ratios into their ranges.
    /// Returns the copy the engine will actually run with.
    pub fn validated(&self) -> Result<WorldParams, ConfigError> {
        let small = self.width.min(self.height);
        if small < MIN_WORLD_SIDE {
            return Err(ConfigError::WorldTooSmall(small));
        }
        if self.num_plates == 0 {
            return Err(ConfigError::NoPlates);
        }
        let mut p = self.clone();
        p.sea_level = p.sea_level.clamp(f32::EPSILON, 1.0 - f32::EPSILON);
        p.folding_ratio = p.folding_ratio.clamp(0.0, 1.0);
        p.aggr_overlap_rel = p.aggr_overlap_rel.clamp(f32::EPSILON, 1.0);
        Ok(p)
    }

    pub fn world_dim(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }
}

/// Tuning constants, immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Height limit that separates seas from dry land.
    pub continental_base: f32,
    /// Initial elevation of oceanic crust.
    pub oceanic_base: f32,
    /// Fraction of oceanic crust converted to sediment on subduction.
    pub subduct_ratio: f32,
    /// Height boost factor for young oceanic crust.
    pub buoyancy_bonus: f32,
    /// Iterations during which new oceanic crust keeps its buoyancy boost.
    pub max_buoyancy_age: u32,
    /// Restart when the summed plate speed falls below this.
    pub restart_speed_limit: f32,
    /// Restart when kinetic energy falls below this fraction of its peak.
    pub restart_energy_ratio: f32,
    /// Restart after this many iterations regardless of activity.
    pub restart_iterations: u32,
    /// Restart after this many consecutive collision-free iterations.
    pub no_collision_time_limit: u32,
    /// Refill unowned world cells with fresh oceanic crust each step.
    pub regenerate_crust: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            continental_base: 1.0,
            oceanic_base: 0.1,
            subduct_ratio: 0.5,
            buoyancy_bonus: 3.0,
            max_buoyancy_age: 20,
            restart_speed_limit: 2.0,
            restart_energy_ratio: 0.15,
            restart_iterations: 600,
            no_collision_time_limit: 10,
            regenerate_crust: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(WorldParams::default().validated().is_ok());
    }

    #[test]
    fn tiny_world_is_rejected() {
        let p = WorldParams {
            width: 4,
            ..WorldParams::default()
        };
        assert_eq!(p.validated().unwrap_err(), ConfigError::WorldTooSmall(4));
    }

    #[test]
    fn zero_plates_is_rejected() {
        let p = WorldParams {
            num_plates: 0,
            ..WorldParams::default()
        };
        assert_eq!(p.validated().unwrap_err(), ConfigError::NoPlates);
    }

    #[test]
    fn ratios_are_clamped_not_rejected() {
        let p = WorldParams {
            folding_ratio: 1.7,
            aggr_overlap_rel: 2.0,
            sea_level: 1.2,
            ..WorldParams::default()
        };
        let v = p.validated().unwrap();
        assert_eq!(v.folding_ratio, 1.0);
        assert_eq!(v.aggr_overlap_rel, 1.0);
        assert!(v.sea_level < 1.0);
    }
}
