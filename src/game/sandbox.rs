//! Sandbox world - collect/throw game with wandering pals

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::math::Vec3;
use crate::ws::protocol::SandboxInput;

/// Player walk speed
const WALK_SPEED: f32 = 6.0;
/// Downward acceleration
const SANDBOX_GRAVITY: f32 = 36.0;
/// Jump impulse
const JUMP_IMPULSE: f32 = 12.0;
/// Ground height for the walking player
const PLAYER_GROUND_Y: f32 = 1.0;
/// Seconds between throws
const THROW_COOLDOWN: f32 = 0.5;

/// Wandering pal parameters
const PAL_COUNT: usize = 10;
const PAL_SPEED: f32 = 3.0;
const PAL_RADIUS: f32 = 0.5;
/// World half extent the pals are clamped to
const WORLD_BOUND: f32 = 50.0;

/// Thrown sphere parameters
const SPHERE_SPEED: f32 = 30.0;
const SPHERE_ARC: f32 = 12.0;
const SPHERE_RADIUS: f32 = 0.2;

/// The walking/throwing player
#[derive(Debug, Clone)]
pub struct SandboxPlayer {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub throw_cooldown: f32,
}

impl SandboxPlayer {
    fn new() -> Self {
        Self {
            position: Vec3::new(0.0, PLAYER_GROUND_Y, 0.0),
            velocity: Vec3::ZERO,
            yaw: 0.0,
            throw_cooldown: 0.0,
        }
    }

    /// Forward direction on the ground plane; yaw 0 faces negative z
    fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }
}

/// A wandering NPC. Picks a fresh random heading every few seconds and is
/// clamped to the world bounds.
#[derive(Debug, Clone)]
pub struct Pal {
    pub position: Vec3,
    heading: Vec3,
    retarget_timer: f32,
}

impl Pal {
    fn step(&mut self, rng: &mut ChaCha8Rng, dt: f32) {
        self.retarget_timer -= dt;
        if self.retarget_timer <= 0.0 {
            self.retarget_timer = 2.0 + rng.gen::<f32>() * 3.0;
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            self.heading = Vec3::new(angle.cos(), 0.0, angle.sin());
        }

        self.position = self.position.integrate(self.heading.scale(PAL_SPEED), dt);
        self.position.x = self.position.x.clamp(-WORLD_BOUND, WORLD_BOUND);
        self.position.z = self.position.z.clamp(-WORLD_BOUND, WORLD_BOUND);
    }
}

/// A thrown sphere with ballistic motion; despawns on ground contact.
#[derive(Debug, Clone)]
pub struct ThrownSphere {
    pub position: Vec3,
    pub velocity: Vec3,
    pub active: bool,
}

impl ThrownSphere {
    fn step(&mut self, dt: f32) {
        self.velocity.y -= SANDBOX_GRAVITY * dt;
        self.position = self.position.integrate(self.velocity, dt);
        if self.position.y < SPHERE_RADIUS {
            self.active = false;
        }
    }

    fn hits(&self, pal: &Pal) -> bool {
        let delta = Vec3::new(
            self.position.x - pal.position.x,
            self.position.y - pal.position.y,
            self.position.z - pal.position.z,
        );
        delta.length() < SPHERE_RADIUS + PAL_RADIUS
    }
}

/// The whole sandbox game: player, pals, thrown spheres, catch counter.
pub struct SandboxWorld {
    pub player: SandboxPlayer,
    pub pals: Vec<Pal>,
    pub spheres: Vec<ThrownSphere>,
    pub caught: u32,
    rng: ChaCha8Rng,
}

impl SandboxWorld {
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pals = (0..PAL_COUNT)
            .map(|_| Pal {
                position: Vec3::new(
                    (rng.gen::<f32>() - 0.5) * 80.0,
                    PLAYER_GROUND_Y,
                    (rng.gen::<f32>() - 0.5) * 80.0,
                ),
                heading: Vec3::ZERO,
                retarget_timer: 0.0,
            })
            .collect();

        Self {
            player: SandboxPlayer::new(),
            pals,
            spheres: Vec::new(),
            caught: 0,
            rng,
        }
    }

    /// Step the world by one frame from the polled input snapshot.
    pub fn step(&mut self, input: &SandboxInput, dt: f32) {
        self.step_player(input, dt);

        for pal in &mut self.pals {
            pal.step(&mut self.rng, dt);
        }

        // Spheres integrate, then resolve catches; a hit removes both the
        // sphere and the pal
        for sphere in &mut self.spheres {
            sphere.step(dt);
            if !sphere.active {
                continue;
            }
            if let Some(idx) = self.pals.iter().position(|p| sphere.hits(p)) {
                self.pals.swap_remove(idx);
                sphere.active = false;
                self.caught += 1;
            }
        }
        self.spheres.retain(|s| s.active);
    }

    fn step_player(&mut self, input: &SandboxInput, dt: f32) {
        let player = &mut self.player;

        player.yaw -= input.look_yaw;

        if player.throw_cooldown > 0.0 {
            player.throw_cooldown -= dt;
        }
        if input.throw && player.throw_cooldown <= 0.0 {
            player.throw_cooldown = THROW_COOLDOWN;
            let forward = player.forward();
            let origin = player.position.add(Vec3::new(0.0, 1.0, 0.0));
            self.spheres.push(ThrownSphere {
                position: origin,
                velocity: Vec3::new(
                    forward.x * SPHERE_SPEED,
                    SPHERE_ARC,
                    forward.z * SPHERE_SPEED,
                ),
                active: true,
            });
        }

        let player = &mut self.player;
        if input.jump && player.position.y <= PLAYER_GROUND_Y + 0.01 {
            player.velocity.y = JUMP_IMPULSE;
        }
        player.velocity.y -= SANDBOX_GRAVITY * dt;
        player.position.y += player.velocity.y * dt;
        if player.position.y < PLAYER_GROUND_Y {
            player.position.y = PLAYER_GROUND_Y;
            player.velocity.y = 0.0;
        }

        let mut step = Vec3::ZERO;
        let forward = player.forward();
        let right = player.right();
        step = step.add(forward.scale(input.move_forward.clamp(-1.0, 1.0)));
        step = step.add(right.scale(input.move_right.clamp(-1.0, 1.0)));
        if step.length() > 0.0 {
            let norm = step.scale(1.0 / step.length());
            player.position = player.position.integrate(norm.scale(WALK_SPEED), dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn idle() -> SandboxInput {
        SandboxInput::default()
    }

    #[test]
    fn pals_wander_within_bounds() {
        let mut world = SandboxWorld::new(1);
        for _ in 0..3600 {
            world.step(&idle(), DT);
            for pal in &world.pals {
                assert!(pal.position.x.abs() <= WORLD_BOUND);
                assert!(pal.position.z.abs() <= WORLD_BOUND);
            }
        }
    }

    #[test]
    fn throw_respects_cooldown() {
        let mut world = SandboxWorld::new(2);
        let throwing = SandboxInput {
            throw: true,
            ..SandboxInput::default()
        };
        world.step(&throwing, DT);
        assert_eq!(world.spheres.len(), 1);
        // Held input inside the cooldown window does not spawn another
        for _ in 0..10 {
            world.step(&throwing, DT);
        }
        assert!(world.spheres.len() <= 1);
        // After the cooldown expires a second throw goes out
        for _ in 0..30 {
            world.step(&throwing, DT);
        }
        let total_thrown = world.spheres.len() as u32 + world.caught;
        assert!(total_thrown >= 2 || world.spheres.is_empty());
    }

    #[test]
    fn sphere_despawns_on_ground_contact() {
        let mut world = SandboxWorld::new(3);
        world.pals.clear();
        let throwing = SandboxInput {
            throw: true,
            ..SandboxInput::default()
        };
        world.step(&throwing, DT);
        assert_eq!(world.spheres.len(), 1);
        for _ in 0..300 {
            world.step(&idle(), DT);
        }
        assert!(world.spheres.is_empty());
    }

    #[test]
    fn direct_hit_catches_a_pal() {
        let mut world = SandboxWorld::new(4);
        world.pals.clear();
        world.pals.push(Pal {
            position: Vec3::new(0.0, 1.0, -3.0),
            heading: Vec3::ZERO,
            retarget_timer: f32::MAX,
        });
        // Plant a sphere right on the pal
        world.spheres.push(ThrownSphere {
            position: Vec3::new(0.0, 1.2, -3.0),
            velocity: Vec3::ZERO,
            active: true,
        });

        world.step(&idle(), DT);
        assert_eq!(world.caught, 1);
        assert!(world.pals.is_empty());
        assert!(world.spheres.is_empty());
    }

    #[test]
    fn jump_is_grounded_only() {
        let mut world = SandboxWorld::new(5);
        let jumping = SandboxInput {
            jump: true,
            ..SandboxInput::default()
        };
        world.step(&jumping, DT);
        let vy = world.player.velocity.y;
        assert!(vy > 0.0);
        // Mid-air jump input has no effect
        world.step(&jumping, DT);
        assert!(world.player.velocity.y < vy);
    }
}
