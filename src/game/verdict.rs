//! Multiplayer end-check - combines local outcome with the remote snapshot

use serde::{Deserialize, Serialize};

use crate::ws::protocol::RemoteSnapshot;

use super::gate::RoundOutcome;

/// Result of a finished two-player round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchVerdict {
    BothWon,
    /// Local won, remote crashed
    LocalWin,
    /// Local crashed, remote won
    LocalLoss,
    BothCrashed,
}

/// Evaluate the end-check. Returns `None` while either side is still
/// running. A failed timing attempt counts as crashed, matching the
/// `crashed` game-event tag sent for it.
pub fn evaluate(local: RoundOutcome, remote: &RemoteSnapshot) -> Option<MatchVerdict> {
    let local_won = local == RoundOutcome::Won;
    let local_crashed = matches!(local, RoundOutcome::Crashed | RoundOutcome::Failed);

    match (local_won, local_crashed, remote.won, remote.crashed) {
        (true, _, true, _) => Some(MatchVerdict::BothWon),
        (true, _, _, true) => Some(MatchVerdict::LocalWin),
        (_, true, true, _) => Some(MatchVerdict::LocalLoss),
        (_, true, _, true) => Some(MatchVerdict::BothCrashed),
        _ => None,
    }
}
