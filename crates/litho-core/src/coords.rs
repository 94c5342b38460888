//! Toroidal world dimensions and 2D vector types.
//! All elevation math uses f32; coordinates are u32 cells or f32 positions.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A 2D float vector: positions, velocities and impulses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Rotate counter-clockwise by `angle` radians.
    pub fn rotated(self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.y * cos + self.x * sin)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// A cell coordinate on a grid, not necessarily wrapped yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UVec2 {
    pub x: u32,
    pub y: u32,
}

impl UVec2 {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Dimensions of the toroidal world grid. Neighbours of `(x, y)` are taken
/// modulo `(width, height)`; the helpers below assume coordinates are at
/// most one world-length out of range, which is all the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    width: u32,
    height: u32,
}

impl Dimension {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Enlarge both sides; used when a plate footprint grows.
    pub fn grow(&mut self, dw: u32, dh: u32) {
        self.width += dw;
        self.height += dh;
    }

    /// Flat row-major index of an in-range point.
    #[inline]
    pub fn index_of(&self, p: UVec2) -> usize {
        p.y as usize * self.width as usize + p.x as usize
    }

    /// Inverse of `index_of`.
    #[inline]
    pub fn coord_of(&self, index: usize) -> UVec2 {
        let y = index / self.width as usize;
        let x = index - y * self.width as usize;
        UVec2::new(x as u32, y as u32)
    }

    /// Wrap an x at most one width out of range.
    #[inline]
    pub fn x_mod(&self, x: u32) -> u32 {
        if x >= self.width {
            x - self.width
        } else {
            x
        }
    }

    /// Wrap a y at most one height out of range.
    #[inline]
    pub fn y_mod(&self, y: u32) -> u32 {
        if y >= self.height {
            y - self.height
        } else {
            y
        }
    }

    /// Wrap both axes of a point.
    #[inline]
    pub fn point_mod(&self, p: UVec2) -> UVec2 {
        UVec2::new(self.x_mod(p.x), self.y_mod(p.y))
    }

    /// Wrapped flat index of a point at most one world-length out of range.
    #[inline]
    pub fn normalized_index_of(&self, p: UVec2) -> usize {
        self.index_of(self.point_mod(p))
    }

    /// Clamp an x to the last valid column.
    #[inline]
    pub fn x_cap(&self, x: u32) -> u32 {
        x.min(self.width - 1)
    }

    /// Clamp a y to the last valid row.
    #[inline]
    pub fn y_cap(&self, y: u32) -> u32 {
        y.min(self.height - 1)
    }

    /// True iff the floor of the position lies inside the grid.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x.floor() >= 0.0
            && p.x.floor() < self.width as f32
            && p.y.floor() >= 0.0
            && p.y.floor() < self.height as f32
    }

    /// Pull a float position back towards the grid by one world-length per
    /// axis. Matches the plate-shift contract: origins drift by less than a
    /// world-length per step, so a single correction suffices.
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        let mut x = p.x;
        let mut y = p.y;
        if x.floor() < 0.0 {
            x += self.width as f32;
        } else if x.floor() > self.width as f32 {
            x -= self.width as f32;
        }
        if y.floor() < 0.0 {
            y += self.height as f32;
        } else if y.floor() > self.height as f32 {
            y -= self.height as f32;
        }
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn index_coord_roundtrip() {
        let dim = Dimension::new(7, 5);
        for i in 0..dim.area() {
            assert_eq!(dim.index_of(dim.coord_of(i)), i);
        }
    }

    #[test]
    fn mod_wraps_one_length() {
        let dim = Dimension::new(10, 4);
        assert_eq!(dim.x_mod(3), 3);
        assert_eq!(dim.x_mod(10), 0);
        assert_eq!(dim.x_mod(13), 3);
        assert_eq!(dim.y_mod(4), 0);
        assert_eq!(dim.y_mod(7), 3);
    }

    #[test]
    fn cap_clamps_to_last_index() {
        let dim = Dimension::new(10, 4);
        assert_eq!(dim.x_cap(9), 9);
        assert_eq!(dim.x_cap(25), 9);
        assert_eq!(dim.y_cap(3), 3);
        assert_eq!(dim.y_cap(4), 3);
    }

    #[test]
    fn contains_uses_floor() {
        let dim = Dimension::new(10, 4);
        assert!(dim.contains(Vec2::new(9.9, 3.9)));
        assert!(!dim.contains(Vec2::new(10.0, 0.0)));
        assert!(!dim.contains(Vec2::new(-0.1, 0.0)));
    }

    #[test]
    fn wrap_restores_negative_and_overflowing_positions() {
        let dim = Dimension::new(10, 4);
        let p = dim.wrap(Vec2::new(-0.5, 5.5));
        assert_relative_eq!(p.x, 9.5);
        assert_relative_eq!(p.y, 1.5);
    }

    #[test]
    fn rotation_preserves_length() {
        let v = Vec2::new(3.0, 4.0);
        let r = v.rotated(1.234);
        assert_relative_eq!(r.length(), 5.0, epsilon = 1e-5);
    }
}
