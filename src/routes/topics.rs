use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{error::GameError, AppState};

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubtopicsResponse {
    pub topic: String,
    pub subtopics: Vec<String>,
}

pub async fn list_topics(State(state): State<Arc<AppState>>) -> Json<TopicsResponse> {
    let topics = state.words.topics().into_iter().map(String::from).collect();
    Json(TopicsResponse { topics })
}

/// Only subtopics with enough words to start a game are listed
pub async fn list_subtopics(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
) -> Result<Json<SubtopicsResponse>, GameError> {
    let subtopics = state
        .words
        .subtopics(&topic)?
        .into_iter()
        .filter(|subtopic| state.words.validate_subtopic_data(&topic, subtopic))
        .map(String::from)
        .collect();

    Ok(Json(SubtopicsResponse { topic, subtopics }))
}
