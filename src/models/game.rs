use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GameError;

pub const MIN_GRID_SIZE: usize = 8;
pub const MAX_GRID_SIZE: usize = 20;
/// Shortest allowed timed game, in seconds
pub const MIN_TIME_LIMIT: u32 = 60;
/// Longest allowed timed game, in seconds
pub const MAX_TIME_LIMIT: u32 = 1800;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Setup,
    Active,
    Paused,
    Completed,
    Expired,
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, GameStatus::Completed | GameStatus::Expired)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameStatus::Setup => "setup",
            GameStatus::Active => "active",
            GameStatus::Paused => "paused",
            GameStatus::Completed => "completed",
            GameStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Which list of a subtopic a word came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WordType {
    /// Names of characters from the subtopic
    Character,
    /// Terms that define the subtopic (places, items, jargon)
    Defining,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSettings {
    pub grid_size: usize,
    /// Seconds; 0 means no time limit
    pub time_limit: u32,
}

impl GameSettings {
    pub fn new(grid_size: usize, time_limit: u32) -> Result<Self, GameError> {
        let settings = Self {
            grid_size,
            time_limit,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(GameError::InvalidSettings {
                field: "grid_size",
                reason: format!(
                    "must be between {} and {}, got {}",
                    MIN_GRID_SIZE, MAX_GRID_SIZE, self.grid_size
                ),
            });
        }

        if self.time_limit != 0 && !(MIN_TIME_LIMIT..=MAX_TIME_LIMIT).contains(&self.time_limit) {
            return Err(GameError::InvalidSettings {
                field: "time_limit",
                reason: format!(
                    "must be 0 (no limit) or between {} and {} seconds, got {}",
                    MIN_TIME_LIMIT, MAX_TIME_LIMIT, self.time_limit
                ),
            });
        }

        Ok(())
    }
}

/// Named presets for grid size, time limit and hint budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyPreset {
    pub grid_size: usize,
    pub time_limit: u32,
    pub max_hints: u32,
}

impl Difficulty {
    pub fn preset(self) -> DifficultyPreset {
        let (grid_size, minutes, max_hints) = match self {
            Difficulty::Easy => (10, 20, 5),
            Difficulty::Medium => (15, 15, 3),
            Difficulty::Hard => (18, 10, 1),
            Difficulty::Expert => (20, 8, 0),
        };
        DifficultyPreset {
            grid_size,
            time_limit: minutes * 60,
            max_hints,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub game_id: Uuid,
    pub topic: String,
    pub subtopic: String,
    pub grid_size: usize,
    pub time_limit: u32,
    /// Capacity estimate for this grid size; the placed count may be lower
    pub max_words: usize,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Word lists of one subtopic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordData {
    pub topic: String,
    pub subtopic: String,
    pub character_words: Vec<String>,
    pub defining_words: Vec<String>,
}

impl WordData {
    /// Every word tagged with the list it came from, character words first.
    pub fn tagged_words(&self) -> impl Iterator<Item = (&str, WordType)> {
        self.character_words
            .iter()
            .map(|w| (w.as_str(), WordType::Character))
            .chain(
                self.defining_words
                    .iter()
                    .map(|w| (w.as_str(), WordType::Defining)),
            )
    }
}
