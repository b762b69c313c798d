//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::crash::PartKind;
use crate::game::gate::RoundOutcome;
use crate::game::math::Vec3;
use crate::game::verdict::MatchVerdict;

/// Difficulty levels of the truck-jump game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Insane,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Hard
    }
}

/// Which game a room runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Motorcycle truck-jump timing game, solo or two players
    TruckJump,
    /// Collect/throw sandbox, solo only
    Sandbox,
}

impl Default for GameMode {
    fn default() -> Self {
        Self::TruckJump
    }
}

/// Polled input snapshot for the sandbox game
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SandboxInput {
    /// Forward/backward axis (-1.0 to 1.0)
    #[serde(default)]
    pub move_forward: f32,
    /// Strafe axis (-1.0 to 1.0)
    #[serde(default)]
    pub move_right: f32,
    /// Yaw look delta in radians since the last frame
    #[serde(default)]
    pub look_yaw: f32,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub throw: bool,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Open a new room; the caller becomes the host
    CreateRoom {
        #[serde(default)]
        mode: GameMode,
        #[serde(default)]
        difficulty: Difficulty,
    },

    /// Join an existing room by its shareable code
    JoinRoom { code: String },

    /// Host starts the round for everyone, carrying the chosen difficulty
    StartGame {
        #[serde(default)]
        difficulty: Difficulty,
    },

    /// Truck-jump input flags for the current frame
    InputFrame { accelerate: bool },

    /// Sandbox input snapshot for the current frame
    SandboxFrame { input: SandboxInput },

    /// Restart the round after a terminal outcome
    ResetRound,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave the current room
    LeaveRoom,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome { player_id: Uuid, server_time: u64 },

    /// Room opened; share the code with the other player
    RoomCreated { code: String, player_num: u8 },

    /// Joined an existing room
    RoomJoined {
        code: String,
        player_num: u8,
        difficulty: Difficulty,
    },

    /// The other player connected (handshake relay)
    PeerJoined { player_num: u8 },

    /// The other player left; terminal for the current round
    PeerLeft { reason: String },

    /// Round started
    GameStarted { difficulty: Difficulty },

    /// Truck-jump state snapshot, sent at the snapshot rate
    Snapshot {
        tick: u64,
        player: PlayerStateSnapshot,
        trucks: Vec<TruckSnapshot>,
        outcome: RoundOutcome,
        elapsed: f32,
        best_time: Option<f32>,
        /// Crash debris, empty until a collision
        ragdoll: Vec<PartSnapshot>,
        /// Live spark count of the crash burst
        sparks: u32,
    },

    /// Sandbox state snapshot
    SandboxSnapshot {
        tick: u64,
        player_position: Vec3,
        player_yaw: f32,
        pals: Vec<Vec3>,
        spheres: Vec<Vec3>,
        caught: u32,
    },

    /// The relayed state of the other player. Overwrites previous knowledge
    /// wholesale; there is no sequencing.
    RemoteUpdate { state: RemoteSnapshot },

    /// Relayed game event from the other player
    RoundEvent { event: RoundEventKind },

    /// Combined end-check once both players finished
    RoundVerdict { verdict: MatchVerdict },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Relayed player-state update; the fields the original peers exchanged
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Vertical velocity, for client-side interpolation
    pub vy: f32,
    pub crashed: bool,
    pub won: bool,
}

impl Default for RemoteSnapshot {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 55.0,
            vy: 0.0,
            crashed: false,
            won: false,
        }
    }
}

/// Local player state in a truck-jump snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerStateSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub airborne: bool,
    pub has_jumped: bool,
}

/// Truck state in a snapshot; z is fixed per lane so only x moves
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TruckSnapshot {
    pub direction: f32,
    pub x: f32,
}

/// One ragdoll part for rendering the crash
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartSnapshot {
    pub id: u32,
    pub kind: PartKind,
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Game event tags relayed between players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEventKind {
    Crashed,
    Won,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msg_wire_format_is_tagged_snake_case() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"join_room","code":"KN3P"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::JoinRoom { ref code } if code == "KN3P"));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"start_game","difficulty":"insane"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMsg::StartGame {
                difficulty: Difficulty::Insane
            }
        ));
    }

    #[test]
    fn create_room_defaults() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"create_room"}"#).unwrap();
        match msg {
            ClientMsg::CreateRoom { mode, difficulty } => {
                assert_eq!(mode, GameMode::TruckJump);
                assert_eq!(difficulty, Difficulty::Hard);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn round_event_tags() {
        let json = serde_json::to_string(&ServerMsg::RoundEvent {
            event: RoundEventKind::Crashed,
        })
        .unwrap();
        assert!(json.contains(r#""type":"round_event""#));
        assert!(json.contains(r#""event":"crashed""#));
    }
}
