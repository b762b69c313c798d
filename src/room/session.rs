//! Room session - the authoritative per-room frame loop

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::RngCore;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::game::verdict;
use crate::game::{FrameInput, GameRound, RoundEvent, SandboxWorld, SimulationClock};
use crate::store::BestTimeStore;
use crate::util::time::{SIMULATION_TPS, SNAPSHOT_INTERVAL_TICKS};
use crate::ws::protocol::{
    ClientMsg, Difficulty, GameMode, PartSnapshot, PlayerStateSnapshot, RemoteSnapshot,
    RoundEventKind, SandboxInput, ServerMsg, TruckSnapshot,
};

use super::registry::RoomCmd;

/// Maximum players per truck-jump room
const MAX_PLAYERS: usize = 2;

/// One attached player and the state the room keeps for them
struct PlayerSlot {
    player_id: Uuid,
    player_num: u8,
    out_tx: mpsc::Sender<ServerMsg>,
    /// Latest polled truck-jump input flags
    input: FrameInput,
    /// Latest polled sandbox input
    sandbox_input: SandboxInput,
    round: Option<GameRound>,
    /// Last relayed snapshot of the other player. Overwritten wholesale on
    /// every relay, no sequencing.
    remote: RemoteSnapshot,
    verdict_sent: bool,
}

impl PlayerSlot {
    fn new(player_id: Uuid, player_num: u8, out_tx: mpsc::Sender<ServerMsg>) -> Self {
        Self {
            player_id,
            player_num,
            out_tx,
            input: FrameInput::default(),
            sandbox_input: SandboxInput::default(),
            round: None,
            remote: RemoteSnapshot::default(),
            verdict_sent: false,
        }
    }

    fn send(&self, msg: ServerMsg) {
        // A full outbound queue means a slow client; dropping frames is fine
        let _ = self.out_tx.try_send(msg);
    }
}

/// The room task. Owns every slot and the simulation; mutates state only
/// inside [`RoomSession::run`]'s frame step, with inbound commands drained
/// from a single-consumer queue once per frame.
pub struct RoomSession {
    code: String,
    mode: GameMode,
    difficulty: Difficulty,
    cmd_rx: mpsc::Receiver<RoomCmd>,
    slots: Vec<PlayerSlot>,
    sandbox: Option<SandboxWorld>,
    clock: SimulationClock,
    tick: u64,
    started: bool,
    saw_player: bool,
    player_count: Arc<AtomicUsize>,
    best_times: BestTimeStore,
}

impl RoomSession {
    pub fn new(
        code: String,
        mode: GameMode,
        difficulty: Difficulty,
        cmd_rx: mpsc::Receiver<RoomCmd>,
        player_count: Arc<AtomicUsize>,
        best_times: BestTimeStore,
    ) -> Self {
        Self {
            code,
            mode,
            difficulty,
            cmd_rx,
            slots: Vec::new(),
            sandbox: None,
            clock: SimulationClock::new(),
            tick: 0,
            started: false,
            saw_player: false,
            player_count,
            best_times,
        }
    }

    /// Run the frame loop until every player has left.
    pub async fn run(mut self) {
        info!(room = %self.code, mode = ?self.mode, "Room opened");

        let tick_duration = Duration::from_micros(1_000_000 / SIMULATION_TPS as u64);
        let mut ticker = interval(tick_duration);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            self.drain_commands();
            self.run_frame();

            if self.saw_player && self.slots.is_empty() {
                break;
            }
        }
    }

    /// Drain the inbound command queue. Exactly once per frame, so all
    /// mutation happens inside the frame step.
    fn drain_commands(&mut self) {
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            match cmd {
                RoomCmd::Join { player_id, out_tx } => self.handle_join(player_id, out_tx),
                RoomCmd::Client { player_id, msg } => self.handle_client(player_id, msg),
                RoomCmd::Disconnected { player_id } => self.handle_disconnect(player_id),
            }
        }
    }

    fn handle_join(&mut self, player_id: Uuid, out_tx: mpsc::Sender<ServerMsg>) {
        let max_players = match self.mode {
            GameMode::TruckJump => MAX_PLAYERS,
            GameMode::Sandbox => 1,
        };

        if self.slots.len() >= max_players {
            let _ = out_tx.try_send(ServerMsg::Error {
                code: "room_full".to_string(),
                message: "Room is full".to_string(),
            });
            return;
        }

        let player_num = self.slots.len() as u8 + 1;
        let slot = PlayerSlot::new(player_id, player_num, out_tx);

        if player_num == 1 {
            slot.send(ServerMsg::RoomCreated {
                code: self.code.clone(),
                player_num,
            });
        } else {
            slot.send(ServerMsg::RoomJoined {
                code: self.code.clone(),
                player_num,
                difficulty: self.difficulty,
            });
            // Handshake relay to the host
            for other in &self.slots {
                other.send(ServerMsg::PeerJoined { player_num });
            }
        }

        self.slots.push(slot);
        self.saw_player = true;
        self.player_count.store(self.slots.len(), Ordering::Relaxed);

        info!(
            room = %self.code,
            player = %player_id,
            player_num,
            "Player joined room"
        );
    }

    fn handle_client(&mut self, player_id: Uuid, msg: ClientMsg) {
        let Some(idx) = self.slots.iter().position(|s| s.player_id == player_id) else {
            warn!(room = %self.code, player = %player_id, "Message from unknown player");
            return;
        };

        match msg {
            ClientMsg::StartGame { difficulty } => {
                // Only the host picks the difficulty and starts the round
                if self.slots[idx].player_num != 1 {
                    self.slots[idx].send(ServerMsg::Error {
                        code: "not_host".to_string(),
                        message: "Only the host can start the game".to_string(),
                    });
                    return;
                }
                self.difficulty = difficulty;
                self.start_round();
            }
            ClientMsg::ResetRound => {
                if self.started {
                    self.start_round();
                }
            }
            ClientMsg::InputFrame { accelerate } => {
                self.slots[idx].input = FrameInput { accelerate };
            }
            ClientMsg::SandboxFrame { input } => {
                self.slots[idx].sandbox_input = input;
            }
            ClientMsg::Ping { t } => {
                self.slots[idx].send(ServerMsg::Pong { t });
            }
            ClientMsg::LeaveRoom => {
                self.handle_disconnect(player_id);
            }
            ClientMsg::CreateRoom { .. } | ClientMsg::JoinRoom { .. } => {
                self.slots[idx].send(ServerMsg::Error {
                    code: "already_in_room".to_string(),
                    message: "Already attached to a room".to_string(),
                });
            }
        }
    }

    fn handle_disconnect(&mut self, player_id: Uuid) {
        let Some(idx) = self.slots.iter().position(|s| s.player_id == player_id) else {
            return;
        };
        let slot = self.slots.remove(idx);
        self.player_count.store(self.slots.len(), Ordering::Relaxed);

        info!(room = %self.code, player = %slot.player_id, "Player left room");

        // Terminal for the other side's round; no resume or renegotiation
        for other in &self.slots {
            other.send(ServerMsg::PeerLeft {
                reason: "disconnected".to_string(),
            });
        }
    }

    /// (Re)create the simulation state and notify everyone. Fresh rounds,
    /// fresh remote snapshots; a reset is the only way out of a terminal
    /// outcome.
    fn start_round(&mut self) {
        self.started = true;
        self.clock.reset();

        match self.mode {
            GameMode::TruckJump => {
                for slot in &mut self.slots {
                    slot.round = Some(GameRound::new(self.difficulty, rand::rngs::OsRng.next_u64()));
                    slot.remote = RemoteSnapshot::default();
                    slot.verdict_sent = false;
                }
            }
            GameMode::Sandbox => {
                self.sandbox = Some(SandboxWorld::new(rand::rngs::OsRng.next_u64()));
            }
        }

        for slot in &self.slots {
            slot.send(ServerMsg::GameStarted {
                difficulty: self.difficulty,
            });
        }

        info!(room = %self.code, difficulty = ?self.difficulty, "Round started");
    }

    /// One simulation frame: step every round, relay state between the two
    /// players, emit snapshots and events.
    fn run_frame(&mut self) {
        self.tick += 1;
        let dt = self.clock.frame_delta(Instant::now());
        if !self.started {
            return;
        }

        match self.mode {
            GameMode::TruckJump => self.step_truck_jump(dt),
            GameMode::Sandbox => self.step_sandbox(dt),
        }
    }

    fn step_truck_jump(&mut self, dt: f32) {
        // Step each player's round from their polled input
        let mut events: Vec<(usize, RoundEvent)> = Vec::new();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(round) = &mut slot.round else {
                continue;
            };
            let input = slot.input;
            if let Some(event) = round.step(&input, dt) {
                events.push((idx, event));
            }
        }

        for (idx, event) in events {
            self.handle_round_event(idx, event);
        }

        // Relay player-state-updates and send snapshots at the snapshot rate
        if self.tick % SNAPSHOT_INTERVAL_TICKS == 0 {
            self.relay_states();
            self.send_snapshots();
        }
    }

    fn handle_round_event(&mut self, idx: usize, event: RoundEvent) {
        let player_id = self.slots[idx].player_id;
        let relayed = match event {
            RoundEvent::Won { elapsed } => {
                // Persist only strictly better times
                match self.best_times.record(elapsed) {
                    Ok(true) => {
                        info!(room = %self.code, player = %player_id, elapsed, "New best time")
                    }
                    Ok(false) => {}
                    Err(e) => warn!(room = %self.code, error = %e, "Best time write failed"),
                }
                RoundEventKind::Won
            }
            // A badly timed jump relays the same tag as a physical crash
            RoundEvent::Crashed | RoundEvent::Failed => RoundEventKind::Crashed,
        };

        info!(room = %self.code, player = %player_id, event = ?relayed, "Round event");

        for (other_idx, other) in self.slots.iter_mut().enumerate() {
            if other_idx == idx {
                continue;
            }
            other.send(ServerMsg::RoundEvent { event: relayed });
            // The event also lands in the peer's remote snapshot
            match relayed {
                RoundEventKind::Crashed => other.remote.crashed = true,
                RoundEventKind::Won => other.remote.won = true,
            }
        }

        self.check_verdicts();
    }

    /// Overwrite each player's remote snapshot with the other player's
    /// current state and forward it. Last write wins.
    fn relay_states(&mut self) {
        if self.slots.len() < 2 {
            return;
        }

        let snapshots: Vec<Option<RemoteSnapshot>> = self
            .slots
            .iter()
            .map(|slot| {
                slot.round.as_ref().map(|round| RemoteSnapshot {
                    x: round.player.position.x,
                    y: round.player.position.y,
                    z: round.player.position.z,
                    vy: round.player.velocity.y,
                    crashed: matches!(
                        round.outcome(),
                        crate::game::RoundOutcome::Crashed | crate::game::RoundOutcome::Failed
                    ),
                    won: round.outcome() == crate::game::RoundOutcome::Won,
                })
            })
            .collect();

        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let other_idx = 1 - idx;
            if let Some(Some(state)) = snapshots.get(other_idx) {
                slot.remote = *state;
                slot.send(ServerMsg::RemoteUpdate { state: *state });
            }
        }

        self.check_verdicts();
    }

    /// Emit the combined end-check once per slot per round
    fn check_verdicts(&mut self) {
        for slot in &mut self.slots {
            if slot.verdict_sent {
                continue;
            }
            let Some(round) = &slot.round else { continue };
            if let Some(verdict) = verdict::evaluate(round.outcome(), &slot.remote) {
                slot.verdict_sent = true;
                slot.send(ServerMsg::RoundVerdict { verdict });
            }
        }
    }

    fn send_snapshots(&self) {
        let best_time = self.best_times.current();
        for slot in &self.slots {
            let Some(round) = &slot.round else { continue };

            let (ragdoll, sparks) = match &round.crash {
                Some(crash) => (
                    crash
                        .parts()
                        .iter()
                        .map(|p| PartSnapshot {
                            id: p.id.0,
                            kind: p.kind,
                            position: p.position,
                            rotation: p.rotation,
                        })
                        .collect(),
                    crash.sparks().len() as u32,
                ),
                None => (Vec::new(), 0),
            };

            slot.send(ServerMsg::Snapshot {
                tick: self.tick,
                player: PlayerStateSnapshot {
                    position: round.player.position,
                    velocity: round.player.velocity,
                    airborne: round.player.airborne,
                    has_jumped: round.player.has_jumped,
                },
                trucks: round
                    .trucks
                    .iter()
                    .map(|t| TruckSnapshot {
                        direction: t.direction,
                        x: t.position.x,
                    })
                    .collect(),
                outcome: round.outcome(),
                elapsed: round.elapsed,
                best_time,
                ragdoll,
                sparks,
            });
        }
    }

    fn step_sandbox(&mut self, dt: f32) {
        let Some(world) = &mut self.sandbox else {
            return;
        };
        let Some(slot) = self.slots.first_mut() else {
            return;
        };

        world.step(&slot.sandbox_input, dt);
        // Look deltas are consumed; holding flags is fine, re-applying a
        // rotation delta is not
        slot.sandbox_input.look_yaw = 0.0;

        if self.tick % SNAPSHOT_INTERVAL_TICKS == 0 {
            slot.send(ServerMsg::SandboxSnapshot {
                tick: self.tick,
                player_position: world.player.position,
                player_yaw: world.player.yaw,
                pals: world.pals.iter().map(|p| p.position).collect(),
                spheres: world.spheres.iter().map(|s| s.position).collect(),
                caught: world.caught,
            });
        }
    }
}
