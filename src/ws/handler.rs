//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::room::{RoomCmd, RoomHandle};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = Uuid::new_v4();
    info!(player = %player_id, "New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Outbound channel: the room task (or this reader) pushes, the writer
    // task drains into the socket
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMsg>(64);

    let writer_player = player_id;
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(player = %writer_player, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    let _ = out_tx
        .send(ServerMsg::Welcome {
            player_id,
            server_time: unix_millis(),
        })
        .await;

    let rate_limiter = ConnectionRateLimiter::new();
    let mut room: Option<RoomHandle> = None;

    // Reader loop: WebSocket -> room command queue
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(player = %player_id, error = %e, "Failed to parse client message");
                        continue;
                    }
                };

                if matches!(
                    client_msg,
                    ClientMsg::InputFrame { .. } | ClientMsg::SandboxFrame { .. }
                ) && !rate_limiter.check_input()
                {
                    warn!(player = %player_id, "Rate limited input message");
                    continue;
                }

                match (&mut room, client_msg) {
                    (None, ClientMsg::CreateRoom { mode, difficulty }) => {
                        let handle = state.rooms.create_room(mode, difficulty);
                        attach(&handle, player_id, &out_tx).await;
                        room = Some(handle);
                    }
                    (None, ClientMsg::JoinRoom { code }) => match state.rooms.get(&code) {
                        Some(handle) => {
                            attach(&handle, player_id, &out_tx).await;
                            room = Some(handle);
                        }
                        None => {
                            let _ = out_tx
                                .send(ServerMsg::Error {
                                    code: "room_not_found".to_string(),
                                    message: "No room with that code".to_string(),
                                })
                                .await;
                        }
                    },
                    (None, ClientMsg::Ping { t }) => {
                        let _ = out_tx.send(ServerMsg::Pong { t }).await;
                    }
                    (None, _) => {
                        let _ = out_tx
                            .send(ServerMsg::Error {
                                code: "not_in_room".to_string(),
                                message: "Create or join a room first".to_string(),
                            })
                            .await;
                    }
                    (Some(handle), msg) => {
                        let leaving = matches!(msg, ClientMsg::LeaveRoom);
                        if handle
                            .cmd_tx
                            .send(RoomCmd::Client { player_id, msg })
                            .await
                            .is_err()
                        {
                            debug!(player = %player_id, "Room command channel closed");
                            room = None;
                        } else if leaving {
                            room = None;
                        }
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(player = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect to the room task
    if let Some(handle) = room {
        let _ = handle.cmd_tx.send(RoomCmd::Disconnected { player_id }).await;
    }

    writer_handle.abort();
    info!(player = %player_id, "WebSocket connection closed");
}

/// Attach this connection to a room
async fn attach(handle: &RoomHandle, player_id: Uuid, out_tx: &mpsc::Sender<ServerMsg>) {
    let _ = handle
        .cmd_tx
        .send(RoomCmd::Join {
            player_id,
            out_tx: out_tx.clone(),
        })
        .await;
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
