use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::GameResults;

pub const SCHEMA_VERSION: &str = "1.0";

/// Completion band of a result. Ordered so that brighter is greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StarColor {
    None,
    Silver,
    Gold,
}

impl StarColor {
    pub fn from_completion(completion_percentage: f64) -> Self {
        if completion_percentage >= 100.0 {
            StarColor::Gold
        } else if completion_percentage >= 80.0 {
            StarColor::Silver
        } else {
            StarColor::None
        }
    }
}

/// Stars earned for playing on a grid of this size, 0 to 4
pub fn star_level(grid_size: usize) -> u8 {
    match grid_size {
        20.. => 4,
        18..=19 => 3,
        15..=17 => 2,
        10..=14 => 1,
        _ => 0,
    }
}

/// Best result recorded for one subtopic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub highest_star_level: u8,
    pub star_color: StarColor,
    pub completion_percentage: f64,
    pub grid_size: usize,
    pub total_score: u32,
    pub date_achieved: DateTime<Utc>,
}

impl Achievement {
    pub fn from_results(results: &GameResults, now: DateTime<Utc>) -> Self {
        Self {
            highest_star_level: star_level(results.grid_size),
            star_color: StarColor::from_completion(results.completion_percentage),
            completion_percentage: results.completion_percentage,
            grid_size: results.grid_size,
            total_score: results.total_score,
            date_achieved: now,
        }
    }

    /// More stars wins; on equal stars the brighter colour wins
    fn beats(&self, other: &Achievement) -> bool {
        (self.highest_star_level, self.star_color) > (other.highest_star_level, other.star_color)
    }
}

/// Achievements keyed by topic, then subtopic. This is the on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementBook {
    pub version: String,
    pub achievements: BTreeMap<String, BTreeMap<String, Achievement>>,
}

impl Default for AchievementBook {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            achievements: BTreeMap::new(),
        }
    }
}

impl AchievementBook {
    /// Keep `results` if it earns stars and beats what the subtopic already
    /// holds. Returns true when the book changed.
    pub fn record(&mut self, results: &GameResults, now: DateTime<Utc>) -> bool {
        let candidate = Achievement::from_results(results, now);
        if candidate.highest_star_level == 0 {
            return false;
        }

        let subtopics = self.achievements.entry(results.topic.clone()).or_default();
        match subtopics.get(&results.subtopic) {
            Some(existing) if !candidate.beats(existing) => false,
            _ => {
                subtopics.insert(results.subtopic.clone(), candidate);
                true
            }
        }
    }

    pub fn achievement_count(&self) -> usize {
        self.achievements.values().map(|s| s.len()).sum()
    }

    pub fn total_stars(&self) -> u32 {
        self.achievements
            .values()
            .flat_map(|s| s.values())
            .map(|a| a.highest_star_level as u32)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementSummary {
    pub achievement_count: usize,
    pub total_stars: u32,
    pub achievements: BTreeMap<String, BTreeMap<String, Achievement>>,
}

struct StoreState {
    book: AchievementBook,
    dirty: bool,
}

/// Shared achievement book, written back to a JSON file by [`flush`](Self::flush).
///
/// Recording is synchronous so it can happen under a game's lock; the file
/// write happens later from the background task.
pub struct AchievementStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl AchievementStore {
    pub fn in_memory() -> Self {
        Self::with_book(None, AchievementBook::default())
    }

    fn with_book(path: Option<PathBuf>, book: AchievementBook) -> Self {
        Self {
            path,
            state: Mutex::new(StoreState { book, dirty: false }),
        }
    }

    /// Load the book from `path`. A missing or unreadable file starts a
    /// fresh book; a corrupt one is copied to `.bak` first.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let book = match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<AchievementBook>(&raw) {
                Ok(book) => {
                    if book.version != SCHEMA_VERSION {
                        tracing::warn!(
                            "Achievement schema version mismatch: expected {}, got {}",
                            SCHEMA_VERSION,
                            book.version
                        );
                    }
                    tracing::info!(
                        "Loaded {} achievements from {}",
                        book.achievement_count(),
                        path.display()
                    );
                    book
                }
                Err(e) => {
                    tracing::warn!(
                        "Corrupted achievements file {}: {}. Starting fresh",
                        path.display(),
                        e
                    );
                    backup(&path).await;
                    AchievementBook::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No achievements at {}, starting fresh", path.display());
                AchievementBook::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read achievements from {}: {}. Starting fresh",
                    path.display(),
                    e
                );
                AchievementBook::default()
            }
        };

        Self::with_book(Some(path), book)
    }

    pub fn record(&self, results: &GameResults) -> bool {
        let mut state = self.lock();
        let improved = state.book.record(results, Utc::now());
        if improved {
            tracing::info!(
                "New achievement for {}/{}: {} stars",
                results.topic,
                results.subtopic,
                star_level(results.grid_size)
            );
            state.dirty = true;
        }
        improved
    }

    pub fn summary(&self) -> AchievementSummary {
        let state = self.lock();
        AchievementSummary {
            achievement_count: state.book.achievement_count(),
            total_stars: state.book.total_stars(),
            achievements: state.book.achievements.clone(),
        }
    }

    /// Write the book if it changed since the last flush. Returns true when
    /// a file was written.
    pub async fn flush(&self) -> io::Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };

        let book = {
            let mut state = self.lock();
            if !state.dirty {
                return Ok(false);
            }
            state.dirty = false;
            state.book.clone()
        };

        if let Err(e) = write_atomically(path, &book).await {
            self.lock().dirty = true;
            return Err(e);
        }
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn backup(path: &Path) {
    let backup_path = path.with_extension("json.bak");
    match fs::copy(path, &backup_path).await {
        Ok(_) => tracing::info!("Backed up corrupted achievements to {}", backup_path.display()),
        Err(e) => tracing::warn!("Could not back up corrupted achievements: {}", e),
    }
}

async fn write_atomically(path: &Path, book: &AchievementBook) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(book)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).await?;
    fs::rename(&tmp, path).await
}
