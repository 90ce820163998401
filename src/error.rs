use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::GameStatus;

/// Input rejected by the grid builder before any placement is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid size must be at least 1")]
    InvalidSize,
    #[error("cannot place an empty word")]
    EmptyWord,
    #[error("word '{0}' must contain only the letters A-Z")]
    InvalidWord(String),
    #[error("word '{word}' has {len} letters but the grid is only {size}x{size}")]
    WordTooLong { word: String, len: usize, size: usize },
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("word database file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("word database is corrupted: {0}")]
    Corrupted(String),
    #[error("topic '{0}' not found in database")]
    TopicNotFound(String),
    #[error("subtopic '{subtopic}' not found in topic '{topic}'")]
    SubtopicNotFound { topic: String, subtopic: String },
    #[error("subtopic '{subtopic}' in topic '{topic}' is not playable: {reason}")]
    InvalidSubtopic {
        topic: String,
        subtopic: String,
        reason: String,
    },
    #[error("failed to read word database: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid {field}: {reason}")]
    InvalidSettings { field: &'static str, reason: String },
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("subtopic '{subtopic}' has only {count} words, need {min}")]
    InsufficientWords {
        topic: String,
        subtopic: String,
        count: usize,
        min: usize,
    },
    #[error("placed only {placed} of {requested} words; try a larger grid")]
    TooFewWordsPlaced { placed: usize, requested: usize },
    #[error("cannot {operation} while the game is {status}")]
    InvalidStatus {
        operation: &'static str,
        status: GameStatus,
    },
    #[error("no hints remaining")]
    HintsExhausted,
    #[error("every word has already been found")]
    NothingToHint,
    #[error("game {0} not found")]
    GameNotFound(Uuid),
}

impl GameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::InvalidSettings { .. } | GameError::Grid(_) => StatusCode::BAD_REQUEST,
            GameError::Database(DatabaseError::TopicNotFound(_))
            | GameError::Database(DatabaseError::SubtopicNotFound { .. })
            | GameError::GameNotFound(_) => StatusCode::NOT_FOUND,
            GameError::Database(DatabaseError::InvalidSubtopic { .. })
            | GameError::InsufficientWords { .. }
            | GameError::TooFewWordsPlaced { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GameError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::InvalidStatus { .. }
            | GameError::HintsExhausted
            | GameError::NothingToHint => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
