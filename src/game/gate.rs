//! Collision / timing state machine for a round

use super::kinematics::PlayerBody;
use super::obstacle::Truck;

/// Longitudinal half width of the crossing zone where jump timing is judged
pub const CROSSING_ZONE_HALF_DEPTH: f32 = 5.0;
/// Both trucks must be within this distance of the crossing point for the
/// jump to count as well timed
pub const TRUCK_PROXIMITY: f32 = 25.0;
/// Passing this z with the gate flag set wins the round
pub const FINISH_LINE_Z: f32 = -20.0;

/// Terminal outcome of a round. Transitions happen exactly once; only a
/// round reset returns to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Running,
    /// Hit a truck outside the gap window
    Crashed,
    /// Jumped with the trucks too far from the crossing point
    Failed,
    /// Passed through the gap and crossed the finish line
    Won,
}

impl RoundOutcome {
    pub fn is_terminal(self) -> bool {
        self != RoundOutcome::Running
    }
}

/// Transition produced by a gate update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateEvent {
    Crashed {
        /// Travel direction of the truck that was hit
        impact_direction: f32,
        truck_speed: f32,
    },
    Failed,
    Won,
}

/// Pass/fail/crash judgment from relative entity positions.
#[derive(Debug, Clone)]
pub struct CollisionTimingGate {
    outcome: RoundOutcome,
    /// Set by a successful gap traversal, required for the win
    passed_through_gate: bool,
    /// The timing check fired this round (latched)
    timing_judged: bool,
}

impl CollisionTimingGate {
    pub fn new() -> Self {
        Self {
            outcome: RoundOutcome::Running,
            passed_through_gate: false,
            timing_judged: false,
        }
    }

    pub fn outcome(&self) -> RoundOutcome {
        self.outcome
    }

    pub fn passed_through_gate(&self) -> bool {
        self.passed_through_gate
    }

    /// Evaluate one frame. Checks run in a fixed order: jump timing, truck
    /// collision, finish line. At most one transition per round; the returned
    /// event is the transition that fired this frame, if any.
    pub fn update(&mut self, player: &PlayerBody, trucks: &[Truck]) -> Option<GateEvent> {
        if self.outcome.is_terminal() {
            return None;
        }

        // Timing judgment inside the crossing zone, fires at most once
        if player.has_jumped
            && !self.passed_through_gate
            && !self.timing_judged
            && player.position.z < CROSSING_ZONE_HALF_DEPTH
            && player.position.z > -CROSSING_ZONE_HALF_DEPTH
        {
            self.timing_judged = true;
            let both_near = trucks.len() == 2
                && trucks
                    .iter()
                    .all(|t| t.position.x.abs() < TRUCK_PROXIMITY);
            if both_near {
                self.passed_through_gate = true;
            } else {
                self.outcome = RoundOutcome::Failed;
                return Some(GateEvent::Failed);
            }
        }

        // Physical collision against either truck
        let player_box = player.aabb();
        for truck in trucks {
            if truck.collides_with(&player_box, player.position) {
                self.outcome = RoundOutcome::Crashed;
                return Some(GateEvent::Crashed {
                    impact_direction: truck.direction,
                    truck_speed: truck.speed,
                });
            }
        }

        // Finish line, only counts after a confirmed gap traversal
        if player.position.z < FINISH_LINE_Z && self.passed_through_gate {
            self.outcome = RoundOutcome::Won;
            return Some(GateEvent::Won);
        }

        None
    }
}

impl Default for CollisionTimingGate {
    fn default() -> Self {
        Self::new()
    }
}
