//! The axis-aligned world-coordinate footprint of a plate.
//!
//! The footprint may wrap across the toroidal world edges: the float origin
//! is always kept inside the world, while `right`/`bottom` are reported
//! un-wrapped (origin plus side), so a wrapped plate has `right > width`.

use serde::{Deserialize, Serialize};

use crate::coords::{Dimension, UVec2, Vec2};

/// A plate's footprint: float top-left origin plus an integer dimension,
/// inside a toroidal world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bounds {
    world: Dimension,
    position: Vec2,
    dim: Dimension,
}

impl Bounds {
    pub fn new(world: Dimension, position: Vec2, dim: Dimension) -> Self {
        assert!(
            dim.width() <= world.width() && dim.height() <= world.height(),
            "plate of {}x{} does not fit a {}x{} world",
            dim.width(),
            dim.height(),
            world.width(),
            world.height()
        );
        Self {
            world,
            position,
            dim,
        }
    }

    /// Flat local index of a plate-relative point; the point must be inside.
    pub fn index(&self, p: UVec2) -> usize {
        assert!(
            p.x < self.dim.width() && p.y < self.dim.height(),
            "local point ({}, {}) outside plate of {}x{}",
            p.x,
            p.y,
            self.dim.width(),
            self.dim.height()
        );
        self.dim.index_of(p)
    }

    pub fn area(&self) -> usize {
        self.dim.area()
    }

    pub fn width(&self) -> u32 {
        self.dim.width()
    }

    pub fn height(&self) -> u32 {
        self.dim.height()
    }

    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// Left edge in world coordinates.
    pub fn left(&self) -> u32 {
        self.position.x as u32
    }

    /// Top edge in world coordinates.
    pub fn top(&self) -> u32 {
        self.position.y as u32
    }

    /// First column right of the plate; exceeds the world width when the
    /// footprint wraps.
    pub fn right(&self) -> u32 {
        self.left() + self.width()
    }

    /// First row below the plate; exceeds the world height when the
    /// footprint wraps.
    pub fn bottom(&self) -> u32 {
        self.top() + self.height()
    }

    /// True iff the plate-relative float position lies on the local grid.
    pub fn is_in_limits(&self, p: Vec2) -> bool {
        self.dim.contains(p)
    }

    /// True iff the world point falls inside the (possibly wrapped)
    /// footprint.
    pub fn contains_world_point(&self, p: UVec2) -> bool {
        let tx = p.x % self.world.width();
        let ty = p.y % self.world.height();

        let x_direct = tx >= self.left() && tx < self.right();
        let x_wrapped =
            tx + self.world.width() >= self.left() && tx + self.world.width() < self.right();
        let y_direct = ty >= self.top() && ty < self.bottom();
        let y_wrapped =
            ty + self.world.height() >= self.top() && ty + self.world.height() < self.bottom();

        (x_direct || x_wrapped) && (y_direct || y_wrapped)
    }

    /// Translate the origin, re-wrapping it into the world. The local grid
    /// and its indices are unaffected.
    pub fn shift(&mut self, delta: Vec2) {
        self.position += delta;
        if !self.world.contains(self.position) {
            self.position = self.world.wrap(self.position);
        }
    }

    /// Enlarge the footprint towards +x/+y. Panics when the result would
    /// exceed the world.
    pub fn grow(&mut self, delta: UVec2) {
        self.dim.grow(delta.x, delta.y);
        assert!(
            self.dim.width() <= self.world.width(),
            "plate grew to width {} in a world of width {}",
            self.dim.width(),
            self.world.width()
        );
        assert!(
            self.dim.height() <= self.world.height(),
            "plate grew to height {} (delta {}) in a world of height {}",
            self.dim.height(),
            delta.y,
            self.world.height()
        );
    }

    /// Translate a world point into the local grid: `Some((flat index,
    /// local coordinates))` when the point is inside the footprint.
    pub fn map_index(&self, p: UVec2) -> Option<(usize, UVec2)> {
        if !self.contains_world_point(p) {
            return None;
        }
        let tx = p.x % self.world.width();
        let ty = p.y % self.world.height();
        let unwrap_x = if tx < self.left() { self.world.width() } else { 0 };
        let unwrap_y = if ty < self.top() { self.world.height() } else { 0 };
        let local = UVec2::new(tx + unwrap_x - self.left(), ty + unwrap_y - self.top());
        Some((self.dim.index_of(local), local))
    }

    /// As `map_index`, but the point is required to be inside.
    pub fn valid_map_index(&self, p: UVec2) -> (usize, UVec2) {
        match self.map_index(p) {
            Some(found) => found,
            None => panic!(
                "world point ({}, {}) outside plate at ({}, {}) sized {}x{}",
                p.x,
                p.y,
                self.left(),
                self.top(),
                self.width(),
                self.height()
            ),
        }
    }
}
