//! Small 3D math types for the simulation core

use serde::{Deserialize, Serialize};

/// 3-component float vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn add(self, other: Vec3) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Advance by `velocity * dt` (one Euler integration step)
    pub fn integrate(self, velocity: Vec3, dt: f32) -> Self {
        self.add(velocity.scale(dt))
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered at `center` with the given half extents
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: Vec3::new(
                center.x - half_extents.x,
                center.y - half_extents.y,
                center.z - half_extents.z,
            ),
            max: Vec3::new(
                center.x + half_extents.x,
                center.y + half_extents.y,
                center.z + half_extents.z,
            ),
        }
    }

    /// Shrink (negative) or grow (positive) the box on every axis
    pub fn expand(self, amount: f32) -> Self {
        Self {
            min: Vec3::new(self.min.x - amount, self.min.y - amount, self.min.z - amount),
            max: Vec3::new(self.max.x + amount, self.max.y + amount, self.max.z + amount),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrate_advances_by_velocity_times_dt() {
        let pos = Vec3::new(1.0, 2.0, 3.0);
        let vel = Vec3::new(0.0, -10.0, 4.0);
        let next = pos.integrate(vel, 0.5);
        assert_eq!(next, Vec3::new(1.0, -3.0, 5.0));
    }

    #[test]
    fn aabb_intersection() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        let b = Aabb::from_center(Vec3::new(1.5, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let c = Aabb::from_center(Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn expand_negative_shrinks() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)).expand(-0.25);
        assert!((a.max.x - 0.75).abs() < f32::EPSILON);
        assert!((a.min.y + 0.75).abs() < f32::EPSILON);
    }
}
