use crate::{
    error::GameError,
    game::Scorer,
    websocket::messages::{ClientMessage, ServerMessage},
    AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// How often connected clients get a timer update
const TIMER_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler for one game
pub async fn handle_websocket(
    Path(game_id): Path<Uuid>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<Response, GameError> {
    if !state.games.contains_key(&game_id) {
        return Err(GameError::GameNotFound(game_id));
    }

    tracing::info!("WebSocket connection requested for game {}", game_id);
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, game_id))
        .into_response())
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, game_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(100);

    match state.with_game(game_id, |session| Ok(session.view())) {
        Ok(view) => {
            let _ = tx.send(ServerMessage::GameState { state: view }).await;
        }
        Err(e) => {
            tracing::warn!("Game {} vanished before the socket opened: {}", game_id, e);
            return;
        }
    }

    // Spawn a task to send messages to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Timer updates until the game ends
    let tick_state = state.clone();
    let tick_tx = tx.clone();
    let tick_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(TIMER_TICK_INTERVAL);
        loop {
            interval.tick().await;
            let Some(msg) = timer_update(&tick_state, game_id, Instant::now()) else {
                break;
            };

            let game_over = matches!(msg, ServerMessage::GameOver { .. });
            if tick_tx.send(msg).await.is_err() || game_over {
                break;
            }
        }
    });

    // Handle incoming messages from the client
    let state_for_recv = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let reply = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => handle_client_message(client_msg, &state_for_recv, game_id)
                            .unwrap_or_else(|e| {
                                tracing::debug!("Game {}: {}", game_id, e);
                                ServerMessage::Error {
                                    message: e.to_string(),
                                }
                            }),
                        Err(e) => {
                            tracing::error!("Failed to parse message: {}", e);
                            ServerMessage::Error {
                                message: format!("Invalid message format: {}", e),
                            }
                        }
                    };
                    if tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Client disconnected from game {}", game_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }
    tick_task.abort();

    tracing::info!("WebSocket connection closed for game {}", game_id);
}

/// The timer message for `game_id` at `now`: a tick while the game runs,
/// the results once it is over, `None` when the game is gone
fn timer_update(state: &AppState, game_id: Uuid, now: Instant) -> Option<ServerMessage> {
    let update = state.with_game(game_id, |session| {
        session.tick_at(now);
        Ok((
            session.timer().status_at(now),
            session.results().ok().cloned(),
        ))
    });

    match update {
        Ok((_, Some(results))) => {
            let performance_rating = Scorer::performance_rating(&results);
            Some(ServerMessage::GameOver {
                results,
                performance_rating,
            })
        }
        Ok((timer, None)) => Some(ServerMessage::TimerTick { timer }),
        Err(_) => None,
    }
}

/// Apply one client message to the game and build the reply
fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    game_id: Uuid,
) -> Result<ServerMessage, GameError> {
    state.with_game(game_id, |session| match msg {
        ClientMessage::SubmitSelection { coordinates } => {
            let outcome = session.submit_selection(&coordinates)?;
            Ok(ServerMessage::SelectionResult {
                outcome,
                progress: session.progress(),
            })
        }
        ClientMessage::RequestHint { kind } => {
            let hint = session.hint(kind)?;
            Ok(ServerMessage::Hint {
                hint,
                hints_remaining: session.view().hints_remaining,
            })
        }
        ClientMessage::Pause => {
            session.pause()?;
            Ok(ServerMessage::GameState {
                state: session.view(),
            })
        }
        ClientMessage::Resume => {
            session.resume()?;
            Ok(ServerMessage::GameState {
                state: session.view(),
            })
        }
        ClientMessage::GetState => Ok(ServerMessage::GameState {
            state: session.view(),
        }),
    })
}
