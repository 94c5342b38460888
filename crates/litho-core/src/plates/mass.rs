//! Incremental total-mass and center-of-mass tracking for a plate.

use serde::{Deserialize, Serialize};

use crate::coords::Vec2;

/// Accumulates crust point by point; `build` turns the sums into a `Mass`.
#[derive(Debug, Clone, Default)]
pub struct MassBuilder {
    mass: f32,
    cx: f32,
    cy: f32,
}

impl MassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a whole row-major height grid.
    pub fn from_height_map(heights: &[f32], width: u32) -> Self {
        let mut builder = Self::new();
        for (i, &crust) in heights.iter().enumerate() {
            let x = (i as u32) % width;
            let y = (i as u32) / width;
            builder.add_point(x, y, crust);
        }
        builder
    }

    pub fn add_point(&mut self, x: u32, y: u32, crust: f32) {
        assert!(crust >= 0.0, "negative crust {crust} at ({x}, {y})");
        self.mass += crust;
        // Center coordinates are weighted by mass.
        self.cx += x as f32 * crust;
        self.cy += y as f32 * crust;
    }

    pub fn build(self) -> Mass {
        if self.mass <= 0.0 {
            Mass::new(0.0, 0.0, 0.0)
        } else {
            Mass::new(self.mass, self.cx / self.mass, self.cy / self.mass)
        }
    }
}

/// A plate's total mass and center of mass in local coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Mass {
    mass: f32,
    cx: f32,
    cy: f32,
}

impl Mass {
    pub fn new(mass: f32, cx: f32, cy: f32) -> Self {
        Self { mass, cx, cy }
    }

    /// Adjust the total. Accumulated float error can push the sum slightly
    /// below zero over long runs; the total is clamped there, and the exact
    /// value is restored whenever the mass is rebuilt from the height grid.
    pub fn inc_mass(&mut self, delta: f32) {
        self.mass += delta;
        if self.mass < 0.0 {
            self.mass = 0.0;
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.cx, self.cy)
    }

    pub fn is_null(&self) -> bool {
        self.mass <= 0.0
    }
}
