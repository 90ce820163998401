pub mod games;
pub mod health;
pub mod topics;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/topics", get(topics::list_topics))
        .route("/topics/{topic}/subtopics", get(topics::list_subtopics))
        .route("/games", post(games::create_game))
        .route("/games/{game_id}", get(games::get_game))
        .route("/games/{game_id}/selections", post(games::submit_selection))
        .route("/games/{game_id}/hint", post(games::request_hint))
        .route("/games/{game_id}/hints", get(games::hint_history))
        .route("/games/{game_id}/pause", post(games::pause_game))
        .route("/games/{game_id}/resume", post(games::resume_game))
        .route("/games/{game_id}/end", post(games::end_game))
        .route("/games/{game_id}/results", get(games::get_results))
        .route("/stats", get(games::get_stats))
        .route("/achievements", get(games::get_achievements))
}
