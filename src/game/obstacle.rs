//! Truck obstacles - constant-velocity motion and the gap window

use super::math::{Aabb, Vec3};
use crate::ws::protocol::Difficulty;

/// Per-difficulty truck parameters
#[derive(Debug, Clone, Copy)]
pub struct TruckSettings {
    /// Constant travel speed along x
    pub speed: f32,
    /// Length of the pass-through gap in the truck's local space
    pub gap_size: f32,
    /// Absolute x where each truck spawns
    pub spawn_distance: f32,
}

impl TruckSettings {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                speed: 18.0,
                gap_size: 16.0,
                spawn_distance: 90.0,
            },
            Difficulty::Medium => Self {
                speed: 24.0,
                gap_size: 15.0,
                spawn_distance: 90.0,
            },
            Difficulty::Hard => Self {
                speed: 30.0,
                gap_size: 14.0,
                spawn_distance: 90.0,
            },
            Difficulty::Insane => Self {
                speed: 38.0,
                gap_size: 13.0,
                spawn_distance: 90.0,
            },
        }
    }
}

/// Solid truck body length on either side of the gap
const BODY_LENGTH: f32 = 8.0;
/// Truck height and half width
const TRUCK_HEIGHT: f32 = 4.6;
const TRUCK_HALF_WIDTH: f32 = 1.75;
/// Gap edges are pulled in by this much; the opening is slightly narrower
/// than the nominal gap size
const GAP_EDGE_INSET: f32 = 1.0;
/// Vertical band of the gap window
const GAP_BOTTOM: f32 = 1.8;
const GAP_TOP: f32 = 7.0;

/// A truck crossing the road at constant speed. The bounding box is
/// recomputed from the full transform every frame; the geometry is not a
/// point so incremental updates would drift.
#[derive(Debug, Clone)]
pub struct Truck {
    /// +1 or -1 along x
    pub direction: f32,
    pub speed: f32,
    pub position: Vec3,
    gap_size: f32,
    aabb: Aabb,
}

impl Truck {
    pub fn new(direction: f32, settings: &TruckSettings) -> Self {
        let position = Vec3::new(-direction * settings.spawn_distance, 0.0, 0.0);
        let mut truck = Self {
            direction,
            speed: settings.speed,
            position,
            gap_size: settings.gap_size,
            aabb: Aabb::new(Vec3::ZERO, Vec3::ZERO),
        };
        truck.recompute_aabb();
        truck
    }

    /// Spawn the round's obstacle pair, closing in from opposite sides
    pub fn spawn_pair(settings: &TruckSettings) -> [Truck; 2] {
        [Truck::new(1.0, settings), Truck::new(-1.0, settings)]
    }

    /// Advance along x and refresh the bounding volume
    pub fn step(&mut self, dt: f32) {
        self.position.x += self.direction * self.speed * dt;
        self.recompute_aabb();
    }

    fn recompute_aabb(&mut self) {
        let half_length = self.gap_size / 2.0 + BODY_LENGTH;
        self.aabb = Aabb::new(
            Vec3::new(
                self.position.x - half_length,
                0.0,
                self.position.z - TRUCK_HALF_WIDTH,
            ),
            Vec3::new(
                self.position.x + half_length,
                TRUCK_HEIGHT,
                self.position.z + TRUCK_HALF_WIDTH,
            ),
        );
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// True when an overlapping player is inside the gap window: both the
    /// longitudinal sub-range and the vertical band must hold.
    pub fn in_gap_window(&self, player_position: Vec3) -> bool {
        let mut local_x = player_position.x - self.position.x;
        if self.direction < 0.0 {
            local_x = -local_x;
        }

        let gap_start = -self.gap_size / 2.0 + GAP_EDGE_INSET;
        let gap_end = self.gap_size / 2.0 - GAP_EDGE_INSET;

        local_x > gap_start
            && local_x < gap_end
            && player_position.y > GAP_BOTTOM
            && player_position.y < GAP_TOP
    }

    /// Overlap test against the player box, honoring the gap window
    pub fn collides_with(&self, player_box: &Aabb, player_position: Vec3) -> bool {
        if !self.aabb.intersects(player_box) {
            return false;
        }
        !self.in_gap_window(player_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hard() -> TruckSettings {
        TruckSettings::for_difficulty(Difficulty::Hard)
    }

    #[test]
    fn trucks_close_in_from_opposite_sides() {
        let [mut a, mut b] = Truck::spawn_pair(&hard());
        assert_eq!(a.position.x, -90.0);
        assert_eq!(b.position.x, 90.0);
        for _ in 0..60 {
            a.step(1.0 / 60.0);
            b.step(1.0 / 60.0);
        }
        assert!((a.position.x + 60.0).abs() < 1e-3);
        assert!((b.position.x - 60.0).abs() < 1e-3);
    }

    #[test]
    fn aabb_follows_the_transform() {
        let settings = hard();
        let mut truck = Truck::new(1.0, &settings);
        let before = *truck.aabb();
        truck.step(1.0);
        let after = *truck.aabb();
        assert!((after.min.x - before.min.x - settings.speed).abs() < 1e-3);
        assert!((after.max.x - before.max.x - settings.speed).abs() < 1e-3);
    }

    #[test]
    fn gap_window_requires_both_bands() {
        let settings = hard();
        let mut truck = Truck::new(1.0, &settings);
        truck.position.x = 0.0;
        truck.step(0.0);

        // Centered and at gap height: through
        assert!(truck.in_gap_window(Vec3::new(0.0, 4.0, 0.0)));
        // Centered but on the ground: blocked by the vertical band
        assert!(!truck.in_gap_window(Vec3::new(0.0, 0.0, 0.0)));
        // Right height but longitudinally outside the gap
        assert!(!truck.in_gap_window(Vec3::new(settings.gap_size, 4.0, 0.0)));
    }

    #[test]
    fn gap_window_is_mirrored_for_opposite_direction() {
        let settings = hard();
        let mut truck = Truck::new(-1.0, &settings);
        truck.position.x = 0.0;
        truck.step(0.0);

        let offset = settings.gap_size / 2.0 - GAP_EDGE_INSET - 0.5;
        assert!(truck.in_gap_window(Vec3::new(-offset, 4.0, 0.0)));
        assert!(truck.in_gap_window(Vec3::new(offset, 4.0, 0.0)));
    }

    #[test]
    fn overlap_outside_gap_is_a_collision() {
        let settings = hard();
        let mut truck = Truck::new(1.0, &settings);
        truck.position.x = 0.0;
        truck.step(0.0);

        let player_pos = Vec3::new(settings.gap_size, 0.0, 0.0);
        let player_box = Aabb::from_center(
            Vec3::new(player_pos.x, 1.0, player_pos.z),
            Vec3::new(0.6, 1.0, 1.1),
        );
        assert!(truck.collides_with(&player_box, player_pos));

        // Same overlap, but airborne inside the gap window: no collision
        let through_pos = Vec3::new(0.0, 4.0, 0.0);
        let through_box = Aabb::from_center(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.6, 1.0, 1.1),
        );
        assert!(!truck.collides_with(&through_box, through_pos));
    }
}
