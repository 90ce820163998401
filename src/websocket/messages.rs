use serde::{Deserialize, Serialize};

use crate::{
    game::{
        GameResults, GameView, Hint, HintKind, PerformanceRating, Progress, SelectionOutcome,
        TimerStatus,
    },
    models::Coordinate,
};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SubmitSelection {
        coordinates: Vec<Coordinate>,
    },
    RequestHint {
        #[serde(default)]
        kind: HintKind,
    },
    Pause,
    Resume,
    GetState,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameState {
        state: GameView,
    },
    SelectionResult {
        outcome: SelectionOutcome,
        progress: Progress,
    },
    Hint {
        hint: Hint,
        hints_remaining: u32,
    },
    TimerTick {
        timer: TimerStatus,
    },
    GameOver {
        results: GameResults,
        performance_rating: PerformanceRating,
    },
    Error {
        message: String,
    },
}
