//! Player kinematics - acceleration, drag, gravity, jump trigger

use super::math::{Aabb, Vec3};
use super::FrameInput;

/// Acceleration while the throttle is held, units/s^2
pub const PLAYER_ACCEL: f32 = 45.0;
/// Maximum horizontal speed magnitude
pub const PLAYER_MAX_SPEED: f32 = 38.0;
/// Drag decay toward zero when coasting, units/s^2
pub const PLAYER_DRAG: f32 = 12.0;
/// Downward acceleration while airborne
pub const GRAVITY: f32 = 45.0;
/// Upward impulse applied on entering the trigger zone
pub const JUMP_FORCE: f32 = 19.0;
/// Ground plane height
pub const GROUND_Y: f32 = 0.0;

/// Longitudinal band of the ramp trigger zone
pub const TRIGGER_ZONE_NEAR: f32 = 14.0;
pub const TRIGGER_ZONE_FAR: f32 = 8.0;
/// Lateral half width of the trigger zone
pub const TRIGGER_ZONE_HALF_WIDTH: f32 = 2.5;

/// Player starting position, facing negative z
pub const SPAWN_POSITION: Vec3 = Vec3 {
    x: 0.0,
    y: 0.0,
    z: 55.0,
};

/// Half extents of the player collision box
const PLAYER_HALF_EXTENTS: Vec3 = Vec3 {
    x: 0.6,
    y: 1.0,
    z: 1.1,
};
/// Collision box shrink margin, forgives grazing contact
const COLLISION_MARGIN: f32 = 0.25;

/// The controllable entity. Position and velocity are owned here and
/// mutated once per frame by [`PlayerBody::step`].
#[derive(Debug, Clone)]
pub struct PlayerBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Currently off the ground
    pub airborne: bool,
    /// One-shot latch: the jump impulse fired this round
    pub has_jumped: bool,
}

impl PlayerBody {
    pub fn new() -> Self {
        Self {
            position: SPAWN_POSITION,
            velocity: Vec3::ZERO,
            airborne: false,
            has_jumped: false,
        }
    }

    /// Integrate one frame. Travel direction is negative z.
    pub fn step(&mut self, input: &FrameInput, dt: f32) {
        // Throttle / drag
        if input.accelerate {
            self.velocity.z -= PLAYER_ACCEL * dt;
        } else {
            if self.velocity.z < 0.0 {
                self.velocity.z += PLAYER_DRAG * dt;
            }
            if self.velocity.z > 0.0 {
                self.velocity.z = 0.0;
            }
        }
        self.velocity.z = self.velocity.z.max(-PLAYER_MAX_SPEED);

        // Gravity only applies while off the ground
        if self.airborne || self.position.y > GROUND_Y + 0.01 {
            self.velocity.y -= GRAVITY * dt;
        } else {
            self.position.y = GROUND_Y;
            self.velocity.y = 0.0;
            self.airborne = false;
        }

        self.position = self.position.integrate(self.velocity, dt);

        // Floor clamp
        if self.position.y < GROUND_Y {
            self.position.y = GROUND_Y;
            self.velocity.y = 0.0;
            self.airborne = false;
        }

        // Ramp trigger: fires at most once per round regardless of how many
        // frames are spent inside the zone
        if !self.has_jumped && self.in_trigger_zone() {
            self.airborne = true;
            self.has_jumped = true;
            self.velocity.y = JUMP_FORCE;
        }
    }

    fn in_trigger_zone(&self) -> bool {
        self.position.z < TRIGGER_ZONE_NEAR
            && self.position.z > TRIGGER_ZONE_FAR
            && self.position.x.abs() < TRIGGER_ZONE_HALF_WIDTH
    }

    /// Collision box, recomputed from the current position and shrunk by the
    /// collision margin
    pub fn aabb(&self) -> Aabb {
        let center = Vec3::new(
            self.position.x,
            self.position.y + PLAYER_HALF_EXTENTS.y,
            self.position.z,
        );
        Aabb::from_center(center, PLAYER_HALF_EXTENTS).expand(-COLLISION_MARGIN)
    }
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn throttle() -> FrameInput {
        FrameInput { accelerate: true }
    }

    #[test]
    fn speed_never_exceeds_maximum() {
        let mut body = PlayerBody::new();
        for _ in 0..600 {
            body.step(&throttle(), DT);
            assert!(body.velocity.z >= -PLAYER_MAX_SPEED);
        }
        // After 10 seconds of full throttle we are pinned at max speed
        assert!((body.velocity.z + PLAYER_MAX_SPEED).abs() < 1e-3);
    }

    #[test]
    fn position_never_sinks_below_ground() {
        let mut body = PlayerBody::new();
        for _ in 0..2000 {
            body.step(&throttle(), DT);
            assert!(body.position.y >= GROUND_Y);
        }
    }

    #[test]
    fn drag_decays_to_rest_without_reversing() {
        let mut body = PlayerBody::new();
        for _ in 0..120 {
            body.step(&throttle(), DT);
        }
        let coasting = FrameInput { accelerate: false };
        for _ in 0..600 {
            body.step(&coasting, DT);
            assert!(body.velocity.z <= 0.0);
        }
        assert_eq!(body.velocity.z, 0.0);
    }

    #[test]
    fn jump_impulse_fires_exactly_once_per_zone_entry() {
        let mut body = PlayerBody::new();
        body.position = Vec3::new(0.0, 0.0, 13.0);
        body.step(&FrameInput { accelerate: false }, DT);
        assert!(body.has_jumped);
        assert!(body.airborne);
        let vy_after_jump = body.velocity.y;
        assert!(vy_after_jump > 0.0);

        // Repeated frames inside the zone must not re-fire the impulse
        body.position = Vec3::new(0.0, body.position.y, 12.0);
        body.step(&FrameInput { accelerate: false }, DT);
        assert!(body.velocity.y < vy_after_jump);
    }

    #[test]
    fn no_jump_outside_lateral_band() {
        let mut body = PlayerBody::new();
        body.position = Vec3::new(3.0, 0.0, 11.0);
        body.step(&FrameInput { accelerate: false }, DT);
        assert!(!body.has_jumped);
    }

    #[test]
    fn landing_clears_airborne_and_vertical_velocity() {
        let mut body = PlayerBody::new();
        body.position = Vec3::new(0.0, 0.0, 11.0);
        // Fire the jump, then run until back on the ground
        for _ in 0..600 {
            body.step(&FrameInput { accelerate: false }, DT);
        }
        assert!(!body.airborne);
        assert_eq!(body.position.y, GROUND_Y);
        assert_eq!(body.velocity.y, 0.0);
    }
}
