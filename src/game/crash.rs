//! Crash ragdoll - free-falling, bouncing rigid-body approximations

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::math::Vec3;

/// Rest height for settled parts
const GROUND_REST_Y: f32 = 0.1;
/// Spark ballistics
const SPARK_COUNT: usize = 30;
const SPARK_GRAVITY: f32 = 25.0;
const SPARK_BOUNCE_DAMPING: f32 = 0.3;
const SPARK_LIFE_DECAY: f32 = 1.5;

/// Identifier of a ragdoll part within the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartId(pub u32);

/// Rider and chassis parts use different mass/drag assumptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Rider,
    Chassis,
}

/// Integration constants per part kind
#[derive(Debug, Clone, Copy)]
struct PartProfile {
    gravity: f32,
    /// Vertical restitution on bounce
    friction: f32,
    /// Horizontal velocity damping on bounce
    bounce_damping: f32,
    /// Angular velocity damping on bounce
    angular_bounce_damping: f32,
    /// Bounces before switching to the pure-damping regime
    max_bounces: u32,
    /// Linear damping once settled
    settle_damping: f32,
    /// Angular damping once settled
    settle_angular_damping: f32,
}

impl PartKind {
    fn profile(self) -> PartProfile {
        match self {
            PartKind::Rider => PartProfile {
                gravity: 35.0,
                friction: 0.7,
                bounce_damping: 0.7,
                angular_bounce_damping: 0.6,
                max_bounces: 3,
                settle_damping: 0.95,
                settle_angular_damping: 0.9,
            },
            PartKind::Chassis => PartProfile {
                gravity: 40.0,
                friction: 0.5,
                bounce_damping: 0.6,
                angular_bounce_damping: 0.5,
                max_bounces: 2,
                settle_damping: 0.92,
                settle_angular_damping: 0.85,
            },
        }
    }
}

/// One independent rigid-body record. Owns its position, velocity, spin and
/// bounce counter; no scene-graph types involved.
#[derive(Debug, Clone)]
pub struct RagdollPart {
    pub id: PartId,
    pub kind: PartKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    pub angular_velocity: Vec3,
    pub bounce_count: u32,
}

impl RagdollPart {
    fn step(&mut self, dt: f32) {
        let profile = self.kind.profile();

        self.velocity.y -= profile.gravity * dt;
        self.position = self.position.integrate(self.velocity, dt);
        self.rotation = self.rotation.integrate(self.angular_velocity, dt);

        if self.position.y < GROUND_REST_Y {
            self.position.y = GROUND_REST_Y;
            if self.bounce_count < profile.max_bounces {
                // Invert and dampen the bounce
                self.velocity.y = -self.velocity.y * profile.friction;
                self.velocity.x *= profile.bounce_damping;
                self.velocity.z *= profile.bounce_damping;
                self.angular_velocity = self
                    .angular_velocity
                    .scale(profile.angular_bounce_damping);
                self.bounce_count += 1;
            } else {
                // Past the cap: pure damping, the part settles and never
                // re-launches
                self.velocity.y = 0.0;
                self.velocity = self.velocity.scale(profile.settle_damping);
                self.angular_velocity = self
                    .angular_velocity
                    .scale(profile.settle_angular_damping);
            }
        }
    }
}

/// One impact spark with a decaying lifetime
#[derive(Debug, Clone)]
pub struct Spark {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Remaining life in [0, 1], doubles as opacity
    pub life: f32,
}

impl Spark {
    fn step(&mut self, dt: f32) {
        self.life -= SPARK_LIFE_DECAY * dt;
        self.velocity.y -= SPARK_GRAVITY * dt;
        self.position = self.position.integrate(self.velocity, dt);
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = -self.velocity.y * SPARK_BOUNCE_DAMPING;
        }
    }
}

/// Local offsets the parts start from, relative to the crash position.
/// Stand-ins for the visual sub-parts of the rider and the bike.
const RIDER_PART_OFFSETS: [Vec3; 6] = [
    Vec3 { x: 0.0, y: 1.75, z: 0.0 },  // helmet
    Vec3 { x: 0.0, y: 1.2, z: 0.1 },   // torso
    Vec3 { x: -0.3, y: 1.3, z: 0.0 },  // left arm
    Vec3 { x: 0.3, y: 1.3, z: 0.0 },   // right arm
    Vec3 { x: -0.15, y: 0.7, z: 0.2 }, // left leg
    Vec3 { x: 0.15, y: 0.7, z: 0.2 },  // right leg
];

const CHASSIS_PART_OFFSETS: [Vec3; 6] = [
    Vec3 { x: 0.0, y: 0.6, z: 0.0 },  // frame
    Vec3 { x: 0.0, y: 0.8, z: -0.3 }, // tank
    Vec3 { x: 0.0, y: 0.35, z: -0.6 }, // front wheel
    Vec3 { x: 0.0, y: 0.35, z: 0.6 }, // rear wheel
    Vec3 { x: 0.0, y: 1.0, z: -0.7 }, // handlebars
    Vec3 { x: 0.0, y: 0.75, z: 0.3 }, // seat
];

/// Arena of independent crash bodies plus the impact spark burst.
/// Spawned once per collision, persists until round reset.
#[derive(Debug, Clone)]
pub struct CrashSim {
    parts: Vec<RagdollPart>,
    sparks: Vec<Spark>,
    pub elapsed: f32,
}

impl CrashSim {
    /// Spawn the ragdoll from the crash position. `impact_direction` is the
    /// travel direction of the truck that was hit; the impact force is the
    /// sum of player speed and truck speed.
    pub fn spawn(
        rng: &mut ChaCha8Rng,
        crash_position: Vec3,
        player_velocity_z: f32,
        impact_direction: f32,
        truck_speed: f32,
    ) -> Self {
        let impact_force = player_velocity_z.abs() + truck_speed.abs();
        let launch = if impact_direction > 0.0 { -1.0 } else { 1.0 };

        let mut parts = Vec::with_capacity(RIDER_PART_OFFSETS.len() + CHASSIS_PART_OFFSETS.len());
        let mut next_id = 0u32;

        for offset in RIDER_PART_OFFSETS {
            let velocity = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 8.0 + launch * impact_force * 0.6,
                12.0 + rng.gen::<f32>() * 8.0,
                player_velocity_z * 0.5 + (rng.gen::<f32>() - 0.5) * 5.0,
            );
            let angular_velocity = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 15.0,
                (rng.gen::<f32>() - 0.5) * 15.0,
                (rng.gen::<f32>() - 0.5) * 15.0,
            );
            parts.push(RagdollPart {
                id: PartId(next_id),
                kind: PartKind::Rider,
                position: crash_position.add(offset),
                velocity,
                rotation: Vec3::ZERO,
                angular_velocity,
                bounce_count: 0,
            });
            next_id += 1;
        }

        for offset in CHASSIS_PART_OFFSETS {
            let velocity = Vec3::new(
                launch * impact_force * 0.3 + (rng.gen::<f32>() - 0.5) * 3.0,
                4.0 + rng.gen::<f32>() * 3.0,
                player_velocity_z * 0.7 + (rng.gen::<f32>() - 0.5) * 2.0,
            );
            let angular_velocity = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 8.0,
                (rng.gen::<f32>() - 0.5) * 10.0,
                (rng.gen::<f32>() - 0.5) * 8.0,
            );
            parts.push(RagdollPart {
                id: PartId(next_id),
                kind: PartKind::Chassis,
                position: crash_position.add(offset),
                velocity,
                rotation: Vec3::ZERO,
                angular_velocity,
                bounce_count: 0,
            });
            next_id += 1;
        }

        let sparks = Self::spawn_sparks(rng, crash_position, impact_direction);

        Self {
            parts,
            sparks,
            elapsed: 0.0,
        }
    }

    fn spawn_sparks(rng: &mut ChaCha8Rng, position: Vec3, direction: f32) -> Vec<Spark> {
        (0..SPARK_COUNT)
            .map(|_| Spark {
                position: Vec3::new(
                    position.x + (rng.gen::<f32>() - 0.5) * 0.5,
                    position.y + 1.0 + rng.gen::<f32>() * 0.5,
                    position.z + (rng.gen::<f32>() - 0.5) * 0.5,
                ),
                velocity: Vec3::new(
                    direction * (5.0 + rng.gen::<f32>() * 10.0) + (rng.gen::<f32>() - 0.5) * 8.0,
                    rng.gen::<f32>() * 8.0,
                    (rng.gen::<f32>() - 0.5) * 8.0,
                ),
                life: 1.0,
            })
            .collect()
    }

    /// Integrate every part and spark by one frame. Dead sparks are removed
    /// individually; parts persist until the round resets.
    pub fn step(&mut self, dt: f32) {
        self.elapsed += dt;

        for part in &mut self.parts {
            part.step(dt);
        }

        for spark in &mut self.sparks {
            spark.step(dt);
        }
        self.sparks.retain(|s| s.life > 0.0);
    }

    pub fn parts(&self) -> &[RagdollPart] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&RagdollPart> {
        self.parts.iter().find(|p| p.id == id)
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn spawn_test_sim(seed: u64) -> CrashSim {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        CrashSim::spawn(&mut rng, Vec3::new(0.0, 0.0, 0.0), -30.0, 1.0, 30.0)
    }

    #[test]
    fn spawns_rider_and_chassis_parts_with_distinct_ids() {
        let sim = spawn_test_sim(7);
        assert_eq!(sim.parts().len(), 12);
        let rider = sim.parts().iter().filter(|p| p.kind == PartKind::Rider).count();
        assert_eq!(rider, 6);
        for (i, part) in sim.parts().iter().enumerate() {
            assert_eq!(part.id, PartId(i as u32));
        }
        assert_eq!(sim.sparks().len(), SPARK_COUNT);
    }

    #[test]
    fn rider_parts_launch_upward() {
        let sim = spawn_test_sim(11);
        for part in sim.parts().iter().filter(|p| p.kind == PartKind::Rider) {
            assert!(part.velocity.y >= 12.0);
        }
    }

    #[test]
    fn bounce_count_is_monotonic_and_capped() {
        let mut sim = spawn_test_sim(3);
        let mut last_counts: Vec<u32> = sim.parts().iter().map(|p| p.bounce_count).collect();

        for _ in 0..3000 {
            sim.step(DT);
            for (part, last) in sim.parts().iter().zip(&last_counts) {
                assert!(part.bounce_count >= *last);
                let cap = part.kind.profile().max_bounces;
                assert!(part.bounce_count <= cap);
            }
            last_counts = sim.parts().iter().map(|p| p.bounce_count).collect();
        }
    }

    #[test]
    fn parts_settle_after_bounce_cap() {
        let mut sim = spawn_test_sim(5);
        // 50 simulated seconds is far past any bounce sequence
        for _ in 0..3000 {
            sim.step(DT);
        }
        for part in sim.parts() {
            assert!(part.position.y >= 0.0);
            assert!(part.velocity.length() < 1.0, "part {:?} still moving", part.id);
        }
    }

    #[test]
    fn settled_parts_never_relaunch() {
        let mut sim = spawn_test_sim(9);
        for _ in 0..3000 {
            sim.step(DT);
        }
        // Track vertical velocity after ground contact past the cap: the
        // magnitude sequence must be non-increasing
        for _ in 0..300 {
            let before: Vec<f32> = sim.parts().iter().map(|p| p.velocity.y.abs()).collect();
            sim.step(DT);
            for (part, prev) in sim.parts().iter().zip(&before) {
                if part.bounce_count >= part.kind.profile().max_bounces
                    && part.position.y <= GROUND_REST_Y
                {
                    assert!(part.velocity.y.abs() <= prev + 1e-3);
                }
            }
        }
    }

    #[test]
    fn sparks_decay_and_are_removed() {
        let mut sim = spawn_test_sim(13);
        sim.step(DT);
        assert!(sim.sparks().iter().all(|s| s.life < 1.0));
        // Life decays at 1.5/s, so everything is gone within a second
        for _ in 0..60 {
            sim.step(DT);
        }
        assert!(sim.sparks().is_empty());
    }
}
