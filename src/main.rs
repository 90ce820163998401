mod achievements;
mod config;
mod dictionary;
mod error;
mod game;
mod models;
mod routes;
mod utils;
mod websocket;

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use achievements::AchievementStore;
use anyhow::Result;
use axum::{routing::get, Router};
use config::Config;
use dashmap::{mapref::entry::Entry, DashMap};
use dictionary::WordDatabase;
use error::GameError;
use game::{GameResults, GameSession, SessionOptions, SessionStats};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// How often the background task sweeps sessions
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15);
/// Unfinished sessions with no activity for this long are dropped
pub const ABANDONED_SESSION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Results of a finished game and when the server first saw them
pub struct FinishedGame {
    pub results: GameResults,
    pub recorded_at: Instant,
}

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub words: WordDatabase,
    pub achievements: AchievementStore,
    /// Live and recently finished games
    pub games: DashMap<Uuid, GameSession>,
    /// Results kept for a while after their session is swept
    pub finished_results: DashMap<Uuid, FinishedGame>,
    /// Totals over every game finished since startup
    stats: Mutex<SessionStats>,
}

impl AppState {
    pub fn new(config: Config, words: WordDatabase, achievements: AchievementStore) -> Self {
        Self {
            config,
            words,
            achievements,
            games: DashMap::new(),
            finished_results: DashMap::new(),
            stats: Mutex::new(SessionStats::default()),
        }
    }

    pub fn session_options(&self, seed: Option<u64>) -> SessionOptions {
        SessionOptions {
            placement: self.config.game.placement,
            max_hints: self.config.game.max_hints,
            seed,
        }
    }

    /// Run `f` against a game under its map entry lock. The game's timer is
    /// checked first so an expired game is never treated as active.
    pub fn with_game<T>(
        &self,
        game_id: Uuid,
        f: impl FnOnce(&mut GameSession) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut session = self
            .games
            .get_mut(&game_id)
            .ok_or(GameError::GameNotFound(game_id))?;

        session.tick();
        let result = f(&mut *session);
        self.record_results(&*session, Instant::now());
        result
    }

    /// Store a finished game's results once, folding them into the running
    /// stats and achievements the first time they are seen
    fn record_results(&self, session: &GameSession, now: Instant) {
        let Ok(results) = session.results() else {
            return;
        };
        if let Entry::Vacant(entry) = self.finished_results.entry(session.id()) {
            self.stats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(results);
            self.achievements.record(results);
            entry.insert(FinishedGame {
                results: results.clone(),
                recorded_at: now,
            });
        }
    }

    pub fn session_stats(&self) -> SessionStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{game_id}", get(websocket::handle_websocket))
        .merge(routes::create_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "word_search_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting word search backend server...");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let words = match WordDatabase::load(&config.game.word_database_path).await {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!(
                "Failed to load word database: {}. Using empty database for now.",
                e
            );
            tracing::warn!(
                "Provide a word database at {} to create games",
                config.game.word_database_path
            );
            WordDatabase::empty()
        }
    };

    let achievements = match &config.game.achievements_path {
        Some(path) => AchievementStore::load(path).await,
        None => {
            tracing::info!("Achievements are kept in memory only");
            AchievementStore::in_memory()
        }
    };

    let state = Arc::new(AppState::new(config.clone(), words, achievements));

    let cleanup_state = state.clone();
    tokio::spawn(async move {
        session_cleanup_task(cleanup_state).await;
    });

    let app = build_router(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/ws/{{game_id}}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Background task that expires timed-out games, drops stale sessions and
/// writes new achievements to disk
async fn session_cleanup_task(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);

    loop {
        interval.tick().await;
        sweep_sessions(&state, Instant::now());
        expire_results(&state, Instant::now());

        if let Err(e) = state.achievements.flush().await {
            tracing::warn!("Failed to save achievements: {}", e);
        }
    }
}

/// Returns the number of sessions removed
fn sweep_sessions(state: &AppState, now: Instant) -> usize {
    let ttl = state.config.game.finished_session_ttl;
    let mut to_remove = Vec::new();

    for mut entry in state.games.iter_mut() {
        let game_id = *entry.key();
        let session = entry.value_mut();

        session.tick_at(now);
        state.record_results(session, now);

        let stale = match session.finished_for(now) {
            Some(finished_for) => finished_for > ttl,
            None => session.idle_for(now) > ABANDONED_SESSION_TIMEOUT,
        };
        if stale {
            to_remove.push((game_id, session.status()));
        }
    }

    let removed = to_remove.len();
    for (game_id, status) in to_remove {
        if state.games.remove(&game_id).is_some() {
            tracing::info!("Removed stale game session {} ({})", game_id, status);
        }
    }
    removed
}

/// Drop results older than the configured TTL whose session is gone.
/// Returns the number of results removed.
fn expire_results(state: &AppState, now: Instant) -> usize {
    let ttl = state.config.game.finished_results_ttl;
    // Collected first so no results shard is locked while `games` is read
    let expired: Vec<Uuid> = state
        .finished_results
        .iter()
        .filter(|entry| now.saturating_duration_since(entry.recorded_at) > ttl)
        .map(|entry| *entry.key())
        .collect();

    let mut removed = 0;
    for game_id in expired {
        if !state.games.contains_key(&game_id) && state.finished_results.remove(&game_id).is_some()
        {
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::debug!("Expired results of {} finished games", removed);
    }
    removed
}

#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    let config = Config::from_lookup(|_| None).unwrap();
    let words = WordDatabase::from_json(include_str!("../word_database.json")).unwrap();
    Arc::new(AppState::new(config, words, AchievementStore::in_memory()))
}
