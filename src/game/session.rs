use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    dictionary::{WordDatabase, MIN_PLAYABLE_WORDS},
    error::GameError,
    game::{
        grid::{estimate_capacity, GridBuilder, PlacementConfig},
        hints::{Hint, HintHistory, HintKind, HintSystem, DEFAULT_MAX_HINTS},
        scorer::{GameResults, ScoreInput, Scorer},
        timer::{GameTimer, TimerStatus},
        validator::SelectionValidator,
    },
    models::{
        Coordinate, Game, GameSettings, GameStatus, Grid, WordData, WordPlacement, WordType,
    },
    utils::letters::normalize_word,
};

/// Fresh grids a crowded puzzle gets before the start is given up
pub const DEFAULT_START_ATTEMPTS: usize = 3;

/// Knobs a session takes from server configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub placement: PlacementConfig,
    pub max_hints: u32,
    /// Fixed seed for reproducible grids and hints
    pub seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            placement: PlacementConfig::default(),
            max_hints: DEFAULT_MAX_HINTS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SelectionOutcome {
    Found {
        word: String,
        newly_discovered: bool,
        remaining: usize,
        completed: bool,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Progress {
    pub found_words: usize,
    pub total_words: usize,
    pub remaining_words: usize,
    pub percentage: f64,
    pub complete: bool,
}

/// A word the player is looking for. The placement is only shown once found.
#[derive(Debug, Clone, Serialize)]
pub struct WordEntry {
    pub word: String,
    pub word_type: WordType,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<WordPlacement>,
}

/// What a client needs to render a session
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub game: Game,
    pub grid: Option<Vec<Vec<char>>>,
    pub words: Vec<WordEntry>,
    pub progress: Progress,
    pub timer: TimerStatus,
    pub hints_remaining: u32,
}

/// One game from setup to results.
pub struct GameSession {
    game: Game,
    word_data: WordData,
    options: SessionOptions,
    rng: StdRng,
    grid: Option<Grid>,
    placements: Vec<WordPlacement>,
    word_types: HashMap<String, WordType>,
    validator: SelectionValidator,
    discovered: HashSet<String>,
    timer: GameTimer,
    hints: HintSystem,
    results: Option<GameResults>,
    last_activity: Instant,
    finished_at: Option<Instant>,
}

impl GameSession {
    /// Set up a game for `topic`/`subtopic`. The grid is built by [`start`](Self::start).
    pub fn initialize(
        db: &WordDatabase,
        topic: &str,
        subtopic: &str,
        settings: GameSettings,
        options: SessionOptions,
    ) -> Result<Self, GameError> {
        settings.validate()?;

        let word_data = db.words(topic, subtopic)?;
        if !db.has_sufficient_words(topic, subtopic, MIN_PLAYABLE_WORDS) {
            return Err(GameError::InsufficientWords {
                topic: topic.to_string(),
                subtopic: subtopic.to_string(),
                count: db.distinct_words(topic, subtopic)?,
                min: MIN_PLAYABLE_WORDS,
            });
        }

        let lengths: Vec<usize> = word_data
            .tagged_words()
            .filter_map(|(w, _)| normalize_word(w))
            .map(|w| w.len())
            .filter(|len| *len <= settings.grid_size)
            .collect();
        let max_words = estimate_capacity(settings.grid_size, &lengths);
        if max_words == 0 {
            return Err(GameError::InvalidSettings {
                field: "grid_size",
                reason: format!(
                    "a {0}x{0} grid is too small for the words in {1}/{2}",
                    settings.grid_size, topic, subtopic
                ),
            });
        }

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let game = Game {
            game_id: Uuid::new_v4(),
            topic: topic.to_string(),
            subtopic: subtopic.to_string(),
            grid_size: settings.grid_size,
            time_limit: settings.time_limit,
            max_words,
            status: GameStatus::Setup,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };

        tracing::info!(
            "Initialized game {} ({}/{}, {}x{}, {}s, up to {} words)",
            game.game_id,
            topic,
            subtopic,
            settings.grid_size,
            settings.grid_size,
            settings.time_limit,
            max_words
        );

        Ok(Self {
            game,
            word_data,
            options,
            rng,
            grid: None,
            placements: Vec::new(),
            word_types: HashMap::new(),
            validator: SelectionValidator::new(&[]),
            discovered: HashSet::new(),
            timer: GameTimer::new(settings.time_limit),
            hints: HintSystem::new(options.max_hints),
            results: None,
            last_activity: Instant::now(),
            finished_at: None,
        })
    }

    /// Build the grid and start the clock
    pub fn start(&mut self) -> Result<&Grid, GameError> {
        self.start_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) -> Result<&Grid, GameError> {
        self.require(GameStatus::Setup, "start the game")?;

        let size = self.game.grid_size;
        let candidates = self.candidate_words();
        if candidates.is_empty() {
            return Err(GameError::InsufficientWords {
                topic: self.game.topic.clone(),
                subtopic: self.game.subtopic.clone(),
                count: 0,
                min: 1,
            });
        }

        let words: Vec<&str> = candidates.iter().map(|(w, _)| w.as_str()).collect();
        let builder_seed: u64 = self.rng.random();
        let mut builder = GridBuilder::seeded(builder_seed, self.options.placement);
        let (grid, placements) = builder.build(&words, size)?;

        let min_ratio = if size <= 10 { 0.7 } else { 0.8 };
        if (placements.len() as f64) < words.len() as f64 * min_ratio {
            tracing::warn!(
                "Game {}: placed {} of {} words, below the {:.0}% minimum",
                self.game.game_id,
                placements.len(),
                words.len(),
                min_ratio * 100.0
            );
            return Err(GameError::TooFewWordsPlaced {
                placed: placements.len(),
                requested: words.len(),
            });
        }

        self.word_types = candidates.into_iter().collect();
        self.validator = SelectionValidator::new(&placements);
        self.placements = placements;

        self.game.status = GameStatus::Active;
        self.game.started_at = Some(Utc::now());
        self.timer.start_at(now);
        self.touch(now);

        tracing::info!(
            "Started game {} with {} words on a {}x{} grid",
            self.game.game_id,
            self.placements.len(),
            size,
            size
        );

        Ok(&*self.grid.insert(grid))
    }

    /// Start the game, building a fresh grid up to `attempts` times while
    /// too few words fit. A failed build leaves the session in setup.
    pub fn start_with_attempts(&mut self, attempts: usize) -> Result<(), GameError> {
        let now = Instant::now();
        let mut attempt = 1;
        loop {
            match self.start_at(now).map(|_| ()) {
                Ok(()) => return Ok(()),
                Err(GameError::TooFewWordsPlaced { placed, requested }) if attempt < attempts => {
                    tracing::debug!(
                        "Game {}: attempt {} placed {}/{} words, rebuilding grid",
                        self.game.game_id,
                        attempt,
                        placed,
                        requested
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Normalized, de-duplicated words that fit the grid, trimmed to
    /// capacity shortest first
    fn candidate_words(&self) -> Vec<(String, WordType)> {
        let size = self.game.grid_size;
        let mut seen = HashSet::new();
        let mut words: Vec<(String, WordType)> = self
            .word_data
            .tagged_words()
            .filter_map(|(raw, word_type)| {
                let word = normalize_word(raw);
                if word.is_none() {
                    tracing::warn!("Skipping unusable word '{}'", raw);
                }
                word.map(|w| (w, word_type))
            })
            .filter(|(w, _)| w.len() <= size)
            .filter(|(w, _)| seen.insert(w.clone()))
            .collect();

        let lengths: Vec<usize> = words.iter().map(|(w, _)| w.len()).collect();
        let capacity = estimate_capacity(size, &lengths);
        if words.len() > capacity {
            words.sort_by_key(|(w, _)| w.len());
            words.truncate(capacity);
        }
        words
    }

    /// Check a selection; a match marks the word discovered
    pub fn submit_selection(
        &mut self,
        selection: &[Coordinate],
    ) -> Result<SelectionOutcome, GameError> {
        self.submit_selection_at(selection, Instant::now())
    }

    pub fn submit_selection_at(
        &mut self,
        selection: &[Coordinate],
        now: Instant,
    ) -> Result<SelectionOutcome, GameError> {
        self.tick_at(now);
        self.require(GameStatus::Active, "submit a selection")?;
        self.touch(now);

        let Some(grid) = self.grid.as_ref() else {
            return Err(GameError::InvalidStatus {
                operation: "submit a selection",
                status: self.game.status,
            });
        };

        let word = match self.validator.validate(grid, selection) {
            Ok(word) => word,
            Err(rejection) => {
                return Ok(SelectionOutcome::Rejected {
                    reason: rejection.to_string(),
                })
            }
        };

        let newly_discovered = self.discovered.insert(word.clone());
        if newly_discovered {
            tracing::debug!("Game {}: found '{}'", self.game.game_id, word);
        }

        let remaining = self.placements.len() - self.discovered.len();
        let completed = remaining == 0;
        if completed {
            self.finish_at(GameStatus::Completed, now);
        }

        Ok(SelectionOutcome::Found {
            word,
            newly_discovered,
            remaining,
            completed,
        })
    }

    pub fn hint(&mut self, kind: HintKind) -> Result<Hint, GameError> {
        let now = Instant::now();
        self.tick_at(now);
        self.require(GameStatus::Active, "take a hint")?;
        self.touch(now);

        let unfound: Vec<(&WordPlacement, WordType)> = self
            .placements
            .iter()
            .filter(|p| !self.discovered.contains(&p.word))
            .map(|p| {
                let word_type = self
                    .word_types
                    .get(&p.word)
                    .copied()
                    .unwrap_or(WordType::Defining);
                (p, word_type)
            })
            .collect();

        self.hints
            .hint(kind, &unfound, self.game.grid_size, &mut self.rng)
    }

    pub fn hint_history(&self) -> HintHistory {
        self.hints.history()
    }

    pub fn pause(&mut self) -> Result<(), GameError> {
        self.pause_at(Instant::now())
    }

    pub fn pause_at(&mut self, now: Instant) -> Result<(), GameError> {
        self.tick_at(now);
        self.require(GameStatus::Active, "pause")?;
        self.timer.pause_at(now);
        self.game.status = GameStatus::Paused;
        self.touch(now);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), GameError> {
        self.resume_at(Instant::now())
    }

    pub fn resume_at(&mut self, now: Instant) -> Result<(), GameError> {
        self.require(GameStatus::Paused, "resume")?;
        self.timer.resume_at(now);
        self.game.status = GameStatus::Active;
        self.touch(now);
        Ok(())
    }

    /// End the game early. Ending a finished game is a no-op.
    pub fn end(&mut self, status: GameStatus) -> Result<&GameResults, GameError> {
        self.end_at(status, Instant::now())
    }

    pub fn end_at(&mut self, status: GameStatus, now: Instant) -> Result<&GameResults, GameError> {
        if !status.is_finished() {
            return Err(GameError::InvalidSettings {
                field: "status",
                reason: format!("a game can only end as completed or expired, not {}", status),
            });
        }
        if !self.game.status.is_finished() {
            self.require_started("end the game")?;
            self.finish_at(status, now);
        }
        self.results()
    }

    /// Expire the game if its time has run out. Returns true when this call
    /// ended it.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        if self.game.status == GameStatus::Active && self.timer.is_expired_at(now) {
            tracing::info!("Game {} ran out of time", self.game.game_id);
            self.finish_at(GameStatus::Expired, now);
            return true;
        }
        false
    }

    fn finish_at(&mut self, status: GameStatus, now: Instant) {
        self.timer.stop_at(now);
        self.game.status = status;
        self.game.finished_at = Some(Utc::now());
        self.finished_at = Some(now);

        let results = Scorer::calculate(&ScoreInput {
            game: &self.game,
            placements: &self.placements,
            word_types: &self.word_types,
            discovered: &self.discovered,
            elapsed_secs: self.timer.elapsed_secs_at(now),
        });

        tracing::info!(
            "Game {} {}: {}/{} words, score {}",
            self.game.game_id,
            status,
            results.found_words,
            results.total_words,
            results.total_score
        );
        self.results = Some(results);
    }

    pub fn results(&self) -> Result<&GameResults, GameError> {
        self.results.as_ref().ok_or(GameError::InvalidStatus {
            operation: "read results",
            status: self.game.status,
        })
    }

    pub fn progress(&self) -> Progress {
        let total_words = self.placements.len();
        let found_words = self.discovered.len();
        Progress {
            found_words,
            total_words,
            remaining_words: total_words - found_words,
            percentage: if total_words == 0 {
                0.0
            } else {
                found_words as f64 / total_words as f64 * 100.0
            },
            complete: total_words > 0 && found_words == total_words,
        }
    }

    pub fn view(&self) -> GameView {
        self.view_at(Instant::now())
    }

    pub fn view_at(&self, now: Instant) -> GameView {
        let words = self
            .placements
            .iter()
            .map(|p| {
                let found = self.discovered.contains(&p.word);
                WordEntry {
                    word: p.word.clone(),
                    word_type: self
                        .word_types
                        .get(&p.word)
                        .copied()
                        .unwrap_or(WordType::Defining),
                    found,
                    placement: found.then(|| p.clone()),
                }
            })
            .collect();

        GameView {
            game: self.game.clone(),
            grid: self.grid.as_ref().map(|g| g.rows().to_vec()),
            words,
            progress: self.progress(),
            timer: self.timer.status_at(now),
            hints_remaining: self.hints.remaining(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.game.game_id
    }

    pub fn status(&self) -> GameStatus {
        self.game.status
    }

    pub fn timer(&self) -> &GameTimer {
        &self.timer
    }

    /// How long the session has been finished, if it has
    pub fn finished_for(&self, now: Instant) -> Option<std::time::Duration> {
        self.finished_at.map(|at| now.saturating_duration_since(at))
    }

    pub fn idle_for(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_activity)
    }

    fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    fn require(&self, status: GameStatus, operation: &'static str) -> Result<(), GameError> {
        if self.game.status == status {
            Ok(())
        } else {
            Err(GameError::InvalidStatus {
                operation,
                status: self.game.status,
            })
        }
    }

    fn require_started(&self, operation: &'static str) -> Result<(), GameError> {
        match self.game.status {
            GameStatus::Active | GameStatus::Paused => Ok(()),
            status => Err(GameError::InvalidStatus { operation, status }),
        }
    }
}

#[cfg(test)]
impl GameSession {
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn placements(&self) -> &[WordPlacement] {
        &self.placements
    }

    pub fn is_discovered(&self, word: &str) -> bool {
        self.discovered.contains(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::DatabaseError, models::Direction};
    use axum::http::StatusCode;
    use std::time::Duration;

    const SAMPLE: &str = r#"{
        "anime": {
            "naruto": {
                "character_words": ["NARUTO", "SASUKE", "SAKURA", "KAKASHI", "ITACHI", "Rock Lee"],
                "defining_words": ["CHAKRA", "HOKAGE", "SHINOBI", "RAMEN", "KUNAI", "SHARINGAN"]
            },
            "small": {
                "character_words": ["ONE", "TWO", "SIX", "TEN", "OWL"],
                "defining_words": ["CAT", "DOG", "EMU", "YAK", "ELK"]
            },
            "mixed": {
                "character_words": ["ONE", "TWO", "SIX", "TEN", "OWL"],
                "defining_words": ["CAT", "DOG", "EMU", "YAK", "ELEPHANTS"]
            },
            "tiny": {
                "character_words": ["ONE", "TWO", "SIX", "TEN", "OWL"],
                "defining_words": ["CAT", "DOG", "EMU"]
            },
            "echo": {
                "character_words": ["NARUTO", "SASUKE", "SAKURA", "KAKASHI", "ITACHI"],
                "defining_words": ["naruto", "Sasuke", "SAKURA", "KAKASHI", "CHAKRA"]
            }
        }
    }"#;

    fn db() -> WordDatabase {
        WordDatabase::from_json(SAMPLE).unwrap()
    }

    fn options(seed: u64) -> SessionOptions {
        SessionOptions {
            seed: Some(seed),
            ..SessionOptions::default()
        }
    }

    /// One placement attempt per word, so an 8x8 grid often comes up short
    fn crowded(seed: u64) -> SessionOptions {
        SessionOptions {
            placement: PlacementConfig {
                retry_budget: 1,
                ..PlacementConfig::default()
            },
            ..options(seed)
        }
    }

    fn started(seed: u64, time_limit: u32) -> (GameSession, Instant) {
        let settings = GameSettings::new(12, time_limit).unwrap();
        let mut session =
            GameSession::initialize(&db(), "anime", "naruto", settings, options(seed)).unwrap();
        let t0 = Instant::now();
        session.start_at(t0).unwrap();
        (session, t0)
    }

    fn cells_of(placement: &WordPlacement) -> Vec<Coordinate> {
        placement.cells().collect()
    }

    #[test]
    fn test_initialize_validates_input() {
        let db = db();
        let settings = GameSettings {
            grid_size: 5,
            time_limit: 0,
        };
        assert!(matches!(
            GameSession::initialize(&db, "anime", "naruto", settings, options(0)),
            Err(GameError::InvalidSettings { field: "grid_size", .. })
        ));

        let settings = GameSettings::new(10, 0).unwrap();
        assert!(matches!(
            GameSession::initialize(&db, "cartoons", "naruto", settings, options(0)),
            Err(GameError::Database(_))
        ));

        // Bad list data is the client's problem, not a server fault
        match GameSession::initialize(&db, "anime", "tiny", settings, options(0)) {
            Err(e) => {
                assert!(matches!(
                    e,
                    GameError::Database(DatabaseError::InvalidSubtopic { .. })
                ));
                assert_eq!(e.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
            }
            Ok(_) => panic!("a subtopic with a 3-word list must be rejected"),
        }
    }

    #[test]
    fn test_start_builds_grid_from_subtopic() {
        let (session, _) = started(1, 300);

        assert_eq!(session.status(), GameStatus::Active);
        let grid = session.grid().unwrap();
        assert_eq!(grid.rows().len(), 12);
        assert!(!session.placements().is_empty());

        for placement in session.placements() {
            assert_eq!(grid.read(&cells_of(placement)).unwrap(), placement.word);
        }
        // "Rock Lee" is normalized before placement
        let words: Vec<_> = session.placements().iter().map(|p| p.word.as_str()).collect();
        assert!(!words.contains(&"Rock Lee"));
    }

    #[test]
    fn test_same_seed_same_game() {
        let (first, _) = started(9, 0);
        let (second, _) = started(9, 0);
        assert_eq!(first.grid(), second.grid());
        assert_eq!(first.placements(), second.placements());
    }

    #[test]
    fn test_words_longer_than_grid_are_left_out() {
        let settings = GameSettings::new(8, 0).unwrap();
        let mut session =
            GameSession::initialize(&db(), "anime", "mixed", settings, options(4)).unwrap();
        session.start().unwrap();

        assert_eq!(session.placements().len(), 9);
        assert!(session.placements().iter().all(|p| p.len() <= 8));
        assert!(!session.placements().iter().any(|p| p.word == "ELEPHANTS"));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (mut session, _) = started(2, 0);
        assert!(matches!(
            session.start(),
            Err(GameError::InvalidStatus { status: GameStatus::Active, .. })
        ));
    }

    #[test]
    fn test_finding_every_word_completes_game() {
        let (mut session, t0) = started(3, 600);
        let placements = session.placements().to_vec();

        for (i, placement) in placements.iter().enumerate() {
            let outcome = session
                .submit_selection_at(&cells_of(placement), t0 + Duration::from_secs(10))
                .unwrap();
            let last = i == placements.len() - 1;
            assert_eq!(
                outcome,
                SelectionOutcome::Found {
                    word: placement.word.clone(),
                    newly_discovered: true,
                    remaining: placements.len() - i - 1,
                    completed: last,
                }
            );
        }

        assert_eq!(session.status(), GameStatus::Completed);
        let results = session.results().unwrap();
        assert!(results.perfect_game);
        assert_eq!(results.time_remaining, 590);
        assert_eq!(results.found_words, placements.len());
        assert!(session.progress().complete);
    }

    #[test]
    fn test_repeat_discovery_is_not_new() {
        let (mut session, _) = started(5, 0);
        let placement = session.placements()[0].clone();

        let first = session.submit_selection(&cells_of(&placement)).unwrap();
        assert!(matches!(first, SelectionOutcome::Found { newly_discovered: true, .. }));
        if session.status() == GameStatus::Active {
            let again = session.submit_selection(&cells_of(&placement)).unwrap();
            assert!(matches!(again, SelectionOutcome::Found { newly_discovered: false, .. }));
        }
        assert!(session.is_discovered(&placement.word));
        assert_eq!(session.progress().found_words, 1);
    }

    #[test]
    fn test_bad_selection_is_rejected_not_error() {
        let (mut session, _) = started(6, 0);
        let outcome = session
            .submit_selection(&[Coordinate::new(0, 0), Coordinate::new(5, 5)])
            .unwrap();
        assert!(matches!(outcome, SelectionOutcome::Rejected { .. }));
        assert_eq!(session.progress().found_words, 0);
    }

    #[test]
    fn test_timer_expiry_ends_game() {
        let (mut session, t0) = started(7, 60);

        assert!(!session.tick_at(t0 + Duration::from_secs(59)));
        assert!(session.tick_at(t0 + Duration::from_secs(61)));
        assert_eq!(session.status(), GameStatus::Expired);

        let results = session.results().unwrap();
        assert!(results.expired);
        assert_eq!(results.time_remaining, 0);

        let placement = session.placements()[0].clone();
        assert!(matches!(
            session.submit_selection(&cells_of(&placement)),
            Err(GameError::InvalidStatus { status: GameStatus::Expired, .. })
        ));
    }

    #[test]
    fn test_pause_and_resume() {
        let (mut session, t0) = started(8, 60);

        session.pause_at(t0 + Duration::from_secs(30)).unwrap();
        assert_eq!(session.status(), GameStatus::Paused);
        // Paused games do not expire
        assert!(!session.tick_at(t0 + Duration::from_secs(500)));

        let placement = session.placements()[0].clone();
        assert!(session.submit_selection(&cells_of(&placement)).is_err());

        session.resume_at(t0 + Duration::from_secs(500)).unwrap();
        assert_eq!(session.status(), GameStatus::Active);
        assert_eq!(
            session.timer().remaining_at(t0 + Duration::from_secs(510)),
            Some(20)
        );
        assert!(session.resume().is_err());
    }

    #[test]
    fn test_hints_follow_budget() {
        let (mut session, _) = started(10, 0);

        for _ in 0..DEFAULT_MAX_HINTS {
            session.hint(HintKind::Letter).unwrap();
        }
        assert!(matches!(
            session.hint(HintKind::Letter),
            Err(GameError::HintsExhausted)
        ));
        assert_eq!(session.view().hints_remaining, 0);
    }

    #[test]
    fn test_end_early_and_view() {
        let (mut session, _) = started(11, 0);
        let placement = session.placements()[0].clone();
        session.submit_selection(&cells_of(&placement)).unwrap();

        let view = session.view();
        let entry = view.words.iter().find(|w| w.word == placement.word).unwrap();
        assert!(entry.found);
        assert_eq!(entry.placement.as_ref().map(|p| p.direction), Some(placement.direction));
        assert!(view
            .words
            .iter()
            .filter(|w| !w.found)
            .all(|w| w.placement.is_none()));

        let results = session.end(GameStatus::Expired).unwrap().clone();
        assert_eq!(results.found_words, 1);
        // Ending again returns the same results
        assert_eq!(session.end(GameStatus::Completed).unwrap(), &results);
        assert!(session.end(GameStatus::Active).is_err());
    }

    #[test]
    fn test_results_unavailable_before_end() {
        let (session, _) = started(12, 0);
        assert!(matches!(
            session.results(),
            Err(GameError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_small_grid_keeps_short_words() {
        let settings = GameSettings::new(8, 0).unwrap();
        let mut session =
            GameSession::initialize(&db(), "anime", "small", settings, options(13)).unwrap();
        session.start().unwrap();
        assert_eq!(session.placements().len(), 10);
        assert!(session
            .placements()
            .iter()
            .all(|p| matches!(p.direction, Direction::Horizontal | Direction::Vertical)));
    }

    #[test]
    fn test_repeated_words_are_not_enough() {
        let settings = GameSettings::new(10, 0).unwrap();
        let result = GameSession::initialize(&db(), "anime", "echo", settings, options(0));
        assert!(matches!(
            result,
            Err(GameError::InsufficientWords { count: 6, min: MIN_PLAYABLE_WORDS, .. })
        ));
    }

    #[test]
    fn test_crowded_grid_starts_on_a_later_attempt() {
        let settings = GameSettings::new(8, 0).unwrap();
        let mut first_failures = 0;
        let mut recovered = 0;

        for seed in 0..64 {
            let mut session =
                GameSession::initialize(&db(), "anime", "small", settings, crowded(seed)).unwrap();
            match session.start() {
                Ok(_) => continue,
                Err(GameError::TooFewWordsPlaced { placed, requested }) => {
                    assert!(placed < 7);
                    assert_eq!(requested, 10);
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
            first_failures += 1;
            assert_eq!(session.status(), GameStatus::Setup);
            assert!(session.grid().is_none());

            if session.start_with_attempts(DEFAULT_START_ATTEMPTS).is_ok() {
                recovered += 1;
                assert_eq!(session.status(), GameStatus::Active);
                assert!(session.placements().len() >= 7);
            }
        }

        assert!(first_failures > 0);
        assert!(recovered > 0);
    }

    #[test]
    fn test_start_gives_up_after_attempts() {
        let settings = GameSettings::new(8, 0).unwrap();
        let gave_up = (0..10).any(|seed| {
            let mut session =
                GameSession::initialize(&db(), "anime", "naruto", settings, crowded(seed)).unwrap();
            let result = session.start_with_attempts(DEFAULT_START_ATTEMPTS);
            matches!(result, Err(GameError::TooFewWordsPlaced { .. }))
                && session.status() == GameStatus::Setup
        });
        assert!(gave_up);
    }

    #[test]
    fn test_hint_history() {
        let (mut session, _) = started(14, 0);
        let letter = session.hint(HintKind::Letter).unwrap();
        let location = session.hint(HintKind::Location).unwrap();

        let history = session.hint_history();
        assert_eq!(history.max_hints, DEFAULT_MAX_HINTS);
        assert_eq!(history.hints_remaining, DEFAULT_MAX_HINTS - 2);
        assert_eq!(history.hints, vec![letter, location]);
    }
}
