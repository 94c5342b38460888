//! Rigid-body kinematics of a plate: a unit direction vector, a scalar
//! speed, a rotation sign and an impulse accumulator.

use serde::{Deserialize, Serialize};

use crate::coords::{Dimension, Vec2};
use crate::plates::mass::Mass;
use crate::rng::Lcg;

/// How strongly deformed crust brakes a plate, relative to its total mass.
pub const DEFORMATION_WEIGHT: f32 = 2.0;

/// What `Movement::collide` needs from the opposing plate. Implemented by
/// `Plate`; tests use a minimal stand-in.
pub trait CollisionTarget {
    fn mass(&self) -> f32;
    fn mass_center(&self) -> Vec2;
    fn velocity_unit(&self) -> Vec2;
    fn dec_impulse(&mut self, delta: Vec2);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Unit direction of travel.
    velocity: Vec2,
    /// Scalar speed along `velocity`.
    speed: f32,
    /// Direction of the circular drift: +1 counter-clockwise, -1 clockwise.
    rot_dir: f32,
    /// External forces accumulated since the last `step`.
    impulse: Vec2,
}

impl Movement {
    /// Draw the rotation direction, then the heading, from the plate's PRNG.
    pub fn new(rng: &mut Lcg) -> Self {
        let rot_dir = rng.next_sign();
        let angle = (2.0 * std::f64::consts::PI * rng.next_double()) as f32;
        Self {
            velocity: Vec2::new(angle.cos(), angle.sin()),
            speed: 1.0,
            rot_dir,
            impulse: Vec2::ZERO,
        }
    }

    pub fn velocity_unit(&self) -> Vec2 {
        self.velocity
    }

    /// Direction scaled by speed.
    pub fn velocity_vector(&self) -> Vec2 {
        self.velocity * self.speed
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn momentum(&self, mass: &Mass) -> f32 {
        mass.mass() * self.speed
    }

    /// Projection of another direction onto this plate's heading.
    pub fn dot(&self, direction: Vec2) -> f32 {
        self.velocity.dot(direction)
    }

    pub fn add_impulse(&mut self, impulse: Vec2) {
        self.impulse += impulse;
    }

    pub fn dec_impulse(&mut self, delta: Vec2) {
        self.impulse -= delta;
    }

    /// Advance one step: realize the accumulated impulse, renormalize the
    /// direction (folding the length change into the speed), then apply a
    /// small circular drift whose radius is fixed by adjusting the angular
    /// velocity to the plate's speed.
    pub fn step(&mut self, world: Dimension) {
        self.velocity += self.impulse;
        self.impulse = Vec2::ZERO;

        let len = self.velocity.length();
        assert!(len > 0.0, "plate velocity vanished");
        self.velocity = self.velocity / len;
        self.speed = (self.speed + len - 1.0).max(0.0);

        let world_avg_side = (world.width() + world.height()) as f32 / 2.0;
        let alpha = self.speed / (world_avg_side * 0.33);
        self.velocity = self.velocity.rotated(self.rot_dir * alpha * self.speed);
    }

    /// Drain kinetic energy spent deforming `deformed_mass` of crust.
    pub fn apply_friction(&mut self, deformed_mass: f32, mass: f32) {
        if mass == 0.0 {
            self.speed = 0.0;
            return;
        }
        let deceleration = DEFORMATION_WEIGHT * deformed_mass / mass;
        if deceleration < self.speed {
            self.speed -= deceleration;
        } else {
            self.speed = 0.0;
        }
    }

    /// Exchange impulses with another plate after a collision, restitution
    /// zero (the normal components stick). `coll_mass` is the crust that
    /// actually collided and stands in for this plate's inertia on the
    /// receiving side; the impulse applied locally uses the plate's
    /// pre-collision mass.
    pub fn collide(&mut self, this_mass: &Mass, other: &mut impl CollisionTarget, coll_mass: f32) {
        let between_centers = other.mass_center() - this_mass.center();
        let distance = between_centers.length();
        if distance <= 0.0 {
            return; // Degenerate geometry: shared center of mass.
        }
        let normal = between_centers / distance;

        // Torque is ignored, so relative velocity is a plain difference.
        let relative = self.velocity - other.velocity_unit();
        let approach = normal.dot(relative);
        if approach <= 0.0 {
            return; // Already separating.
        }

        let denom = normal.length().powi(2) * (1.0 / other.mass() + 1.0 / coll_mass);
        let impulse = -approach / denom;

        self.add_impulse(normal * (impulse / this_mass.mass()));
        other.dec_impulse(normal * (impulse / (coll_mass + other.mass())));
    }
}
