//! Game simulation modules

pub mod clock;
pub mod crash;
pub mod gate;
pub mod kinematics;
pub mod math;
pub mod obstacle;
pub mod round;
pub mod sandbox;
pub mod verdict;

pub use clock::SimulationClock;
pub use gate::RoundOutcome;
pub use round::{GameRound, RoundEvent};
pub use sandbox::SandboxWorld;

/// Input state for a single frame, polled once per simulation step
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub accelerate: bool,
}
