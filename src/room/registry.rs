//! Registry of active rooms

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use rand::rngs::OsRng;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::store::BestTimeStore;
use crate::ws::protocol::{ClientMsg, Difficulty, GameMode, ServerMsg};

use super::code;
use super::session::RoomSession;

/// Commands delivered to a room task. Everything a room learns from the
/// outside arrives through this queue and is drained once per frame.
#[derive(Debug)]
pub enum RoomCmd {
    /// A connection attaches to the room
    Join {
        player_id: Uuid,
        out_tx: mpsc::Sender<ServerMsg>,
    },
    /// A message from an attached player
    Client { player_id: Uuid, msg: ClientMsg },
    /// The player's connection dropped
    Disconnected { player_id: Uuid },
}

/// Handle to a running room task
#[derive(Clone)]
pub struct RoomHandle {
    pub code: String,
    pub mode: GameMode,
    pub cmd_tx: mpsc::Sender<RoomCmd>,
    pub player_count: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }
}

/// All active rooms, keyed by room code
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    best_times: BestTimeStore,
}

impl RoomRegistry {
    pub fn new(best_times: BestTimeStore) -> Self {
        Self {
            rooms: DashMap::new(),
            best_times,
        }
    }

    /// Open a new room and spawn its task. Returns the handle; the creator
    /// still has to attach with [`RoomCmd::Join`].
    pub fn create_room(
        self: &Arc<Self>,
        mode: GameMode,
        difficulty: Difficulty,
    ) -> RoomHandle {
        let code = loop {
            let candidate = code::generate(&mut OsRng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = RoomHandle {
            code: code.clone(),
            mode,
            cmd_tx,
            player_count: player_count.clone(),
        };

        self.rooms.insert(code.clone(), handle.clone());

        let session = RoomSession::new(
            code.clone(),
            mode,
            difficulty,
            cmd_rx,
            player_count,
            self.best_times.clone(),
        );
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            session.run().await;
            registry.rooms.remove(&code);
            info!(room = %code, "Room closed");
        });

        handle
    }

    /// Look up a room by user-supplied code
    pub fn get(&self, raw_code: &str) -> Option<RoomHandle> {
        let code = code::normalize(raw_code)?;
        self.rooms.get(&code).map(|r| r.value().clone())
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }
}
