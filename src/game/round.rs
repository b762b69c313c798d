//! Round state - the simulation context for one truck-jump attempt

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ws::protocol::Difficulty;

use super::crash::CrashSim;
use super::gate::{CollisionTimingGate, GateEvent, RoundOutcome};
use super::kinematics::PlayerBody;
use super::obstacle::{Truck, TruckSettings};
use super::FrameInput;

/// Transition that fired during a frame step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundEvent {
    Crashed,
    Failed,
    Won { elapsed: f32 },
}

/// Everything a round owns: player body, the active obstacle pair, the
/// timing gate, the crash sim once a collision happened, and the elapsed
/// clock. Created at round start, mutated only by [`GameRound::step`],
/// discarded at reset.
pub struct GameRound {
    pub difficulty: Difficulty,
    pub player: PlayerBody,
    pub trucks: Vec<Truck>,
    pub gate: CollisionTimingGate,
    pub crash: Option<CrashSim>,
    pub elapsed: f32,
    rng: ChaCha8Rng,
}

impl GameRound {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let settings = TruckSettings::for_difficulty(difficulty);
        let [a, b] = Truck::spawn_pair(&settings);
        Self {
            difficulty,
            player: PlayerBody::new(),
            trucks: vec![a, b],
            gate: CollisionTimingGate::new(),
            crash: None,
            elapsed: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn outcome(&self) -> RoundOutcome {
        self.gate.outcome()
    }

    /// Step the whole round by one frame. After a terminal transition only
    /// the crash sim keeps integrating (debris settles while the round waits
    /// for a reset).
    pub fn step(&mut self, input: &FrameInput, dt: f32) -> Option<RoundEvent> {
        if self.outcome().is_terminal() {
            if let Some(crash) = &mut self.crash {
                crash.step(dt);
            }
            return None;
        }

        self.elapsed += dt;

        self.player.step(input, dt);
        for truck in &mut self.trucks {
            truck.step(dt);
        }

        let event = match self.gate.update(&self.player, &self.trucks) {
            Some(GateEvent::Crashed {
                impact_direction,
                truck_speed,
            }) => {
                self.crash = Some(CrashSim::spawn(
                    &mut self.rng,
                    self.player.position,
                    self.player.velocity.z,
                    impact_direction,
                    truck_speed,
                ));
                Some(RoundEvent::Crashed)
            }
            Some(GateEvent::Failed) => Some(RoundEvent::Failed),
            Some(GateEvent::Won) => Some(RoundEvent::Won {
                elapsed: self.elapsed,
            }),
            None => None,
        };

        if let Some(crash) = &mut self.crash {
            crash.step(dt);
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::math::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn idle() -> FrameInput {
        FrameInput { accelerate: false }
    }

    fn throttle() -> FrameInput {
        FrameInput { accelerate: true }
    }

    /// Scenario A: player never jumps, the pair closes to overlap at the
    /// player's position outside the gap window.
    #[test]
    fn grounded_player_in_the_road_gets_crashed() {
        let mut round = GameRound::new(Difficulty::Hard, 42);
        round.player.position = Vec3::new(0.0, 0.0, 0.0);

        let mut saw_crash = false;
        for _ in 0..600 {
            if let Some(RoundEvent::Crashed) = round.step(&idle(), DT) {
                saw_crash = true;
                break;
            }
        }
        assert!(saw_crash);
        assert_eq!(round.outcome(), RoundOutcome::Crashed);
        assert!(round.crash.is_some());
        assert!(!round.crash.as_ref().unwrap().parts().is_empty());
    }

    /// Scenario B: full throttle from the start reaches the crossing zone
    /// while the trucks are still far out. Exactly one FAILED, no CRASHED.
    #[test]
    fn early_jump_fails_exactly_once() {
        let mut round = GameRound::new(Difficulty::Hard, 42);

        let mut events = Vec::new();
        for _ in 0..1200 {
            if let Some(event) = round.step(&throttle(), DT) {
                events.push(event);
            }
        }
        assert_eq!(events, vec![RoundEvent::Failed]);
        assert_eq!(round.outcome(), RoundOutcome::Failed);
        assert!(round.crash.is_none());
    }

    /// Scenario C: a well-timed crossing passes through the gap and wins
    /// past the finish line.
    #[test]
    fn well_timed_crossing_wins() {
        let mut round = GameRound::new(Difficulty::Hard, 42);

        // Put the round at the moment of a perfect jump: player airborne at
        // the edge of the crossing zone, trucks aligned on the crossing point
        round.player.position = Vec3::new(0.0, 4.5, 4.9);
        round.player.velocity = Vec3::new(0.0, 6.0, -38.0);
        round.player.airborne = true;
        round.player.has_jumped = true;
        round.trucks[0].position.x = -3.0;
        round.trucks[1].position.x = 3.0;

        let mut won_at = None;
        for _ in 0..600 {
            match round.step(&throttle(), DT) {
                Some(RoundEvent::Won { elapsed }) => {
                    won_at = Some(elapsed);
                    break;
                }
                Some(other) => panic!("unexpected event {:?}", other),
                None => {}
            }
        }
        assert!(won_at.is_some());
        assert_eq!(round.outcome(), RoundOutcome::Won);
        assert!(round.gate.passed_through_gate());
    }

    #[test]
    fn terminal_round_ignores_input_but_settles_debris() {
        let mut round = GameRound::new(Difficulty::Hard, 42);
        round.player.position = Vec3::new(0.0, 0.0, 0.0);

        for _ in 0..600 {
            if round.step(&idle(), DT).is_some() {
                break;
            }
        }
        assert_eq!(round.outcome(), RoundOutcome::Crashed);

        let player_pos = round.player.position;
        let before_elapsed = round.elapsed;
        for _ in 0..60 {
            assert!(round.step(&throttle(), DT).is_none());
        }
        assert_eq!(round.player.position, player_pos);
        assert_eq!(round.elapsed, before_elapsed);
        // Debris kept integrating
        assert!(round.crash.as_ref().unwrap().elapsed > 0.0);
    }
}
