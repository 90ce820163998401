use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    achievements::AchievementSummary,
    dictionary::DatabaseStats,
    error::GameError,
    game::{
        session::DEFAULT_START_ATTEMPTS, GameResults, GameSession, GameView, Hint, HintHistory,
        HintKind, PerformanceRating, Progress, Scorer, SelectionOutcome, SessionStats,
    },
    models::{Coordinate, Difficulty, GameSettings, GameStatus},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub topic: String,
    pub subtopic: String,
    /// Preset for grid size, time limit and hints; explicit fields win
    pub difficulty: Option<Difficulty>,
    pub grid_size: Option<usize>,
    /// Seconds, 0 for no limit
    pub time_limit: Option<u32>,
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub coordinates: Vec<Coordinate>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    #[serde(flatten)]
    pub outcome: SelectionOutcome,
    pub progress: Progress,
}

#[derive(Debug, Default, Deserialize)]
pub struct HintRequest {
    #[serde(default)]
    pub kind: HintKind,
}

#[derive(Debug, Serialize)]
pub struct HintResponse {
    pub hint: Hint,
    pub hints_remaining: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsResponse {
    #[serde(flatten)]
    pub results: GameResults,
    pub performance_rating: PerformanceRating,
}

impl From<GameResults> for ResultsResponse {
    fn from(results: GameResults) -> Self {
        let performance_rating = Scorer::performance_rating(&results);
        Self {
            results,
            performance_rating,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub sessions: SessionStats,
    pub word_database: DatabaseStats,
}

/// Create a game and build its grid
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameView>), GameError> {
    let preset = req.difficulty.map(Difficulty::preset);
    let settings = GameSettings::new(
        req.grid_size
            .or(preset.map(|p| p.grid_size))
            .unwrap_or(state.config.game.default_grid_size),
        req.time_limit
            .or(preset.map(|p| p.time_limit))
            .unwrap_or(state.config.game.default_time_limit),
    )?;

    let mut options = state.session_options(req.seed);
    if let Some(preset) = preset {
        options.max_hints = preset.max_hints;
    }

    let mut session =
        GameSession::initialize(&state.words, &req.topic, &req.subtopic, settings, options)?;
    session.start_with_attempts(DEFAULT_START_ATTEMPTS)?;

    let view = session.view();
    state.games.insert(session.id(), session);

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameView>, GameError> {
    let view = state.with_game(game_id, |session| Ok(session.view()))?;
    Ok(Json(view))
}

pub async fn submit_selection(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, GameError> {
    let response = state.with_game(game_id, |session| {
        let outcome = session.submit_selection(&req.coordinates)?;
        Ok(SelectionResponse {
            outcome,
            progress: session.progress(),
        })
    })?;
    Ok(Json(response))
}

pub async fn request_hint(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
    Json(req): Json<HintRequest>,
) -> Result<Json<HintResponse>, GameError> {
    let response = state.with_game(game_id, |session| {
        let hint = session.hint(req.kind)?;
        Ok(HintResponse {
            hint,
            hints_remaining: session.view().hints_remaining,
        })
    })?;
    Ok(Json(response))
}

pub async fn hint_history(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<HintHistory>, GameError> {
    let history = state.with_game(game_id, |session| Ok(session.hint_history()))?;
    Ok(Json(history))
}

pub async fn pause_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameView>, GameError> {
    let view = state.with_game(game_id, |session| {
        session.pause()?;
        Ok(session.view())
    })?;
    Ok(Json(view))
}

pub async fn resume_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameView>, GameError> {
    let view = state.with_game(game_id, |session| {
        session.resume()?;
        Ok(session.view())
    })?;
    Ok(Json(view))
}

/// End a game early; it counts as expired unless every word was found
pub async fn end_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, GameError> {
    let results = state.with_game(game_id, |session| {
        let status = if session.progress().complete {
            GameStatus::Completed
        } else {
            GameStatus::Expired
        };
        session.end(status).cloned()
    })?;
    Ok(Json(results.into()))
}

pub async fn get_results(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, GameError> {
    // Swept sessions only leave their results behind
    if let Some(finished) = state.finished_results.get(&game_id) {
        return Ok(Json(finished.results.clone().into()));
    }

    let results = state.with_game(game_id, |session| session.results().cloned())?;
    Ok(Json(results.into()))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        sessions: state.session_stats(),
        word_database: state.words.stats(),
    })
}

pub async fn get_achievements(State(state): State<Arc<AppState>>) -> Json<AchievementSummary> {
    Json(state.achievements.summary())
}
