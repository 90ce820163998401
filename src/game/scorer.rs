use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::{Game, GameStatus, WordPlacement, WordType};

pub const POINTS_PER_WORD: u32 = 100;
/// Bonus points per second left on the clock after a perfect game
pub const TIME_BONUS_MULTIPLIER: u32 = 10;

/// Score multiplier keyed by the largest grid size it applies to
static DIFFICULTY_MULTIPLIERS: Lazy<BTreeMap<usize, f64>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    map.insert(8, 1.0);
    map.insert(10, 1.2);
    map.insert(12, 1.5);
    map.insert(15, 1.8);
    map.insert(20, 2.0);
    map
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeProgress {
    pub total: usize,
    pub found: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WordBreakdown {
    pub character_words: TypeProgress,
    pub defining_words: TypeProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResults {
    pub total_words: usize,
    pub found_words: usize,
    pub unfound_words: usize,
    pub completion_percentage: f64,

    pub elapsed_time: u32,
    pub time_remaining: u32,
    pub time_limit: u32,

    pub perfect_game: bool,
    pub game_status: GameStatus,
    pub completed_on_time: bool,
    pub expired: bool,

    pub word_score: u32,
    pub time_bonus: u32,
    pub difficulty_multiplier: f64,
    pub total_score: u32,

    pub word_breakdown: WordBreakdown,

    pub topic: String,
    pub subtopic: String,
    pub grid_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceRating {
    Legendary,
    Exceptional,
    Excellent,
    Outstanding,
    Great,
    Good,
    Fair,
    NeedsImprovement,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub games_played: usize,
    pub total_words_found: usize,
    pub perfect_games: usize,
    pub perfect_game_rate: f64,
    pub average_completion: f64,
    pub total_score: u64,
    pub average_score: f64,
    pub best_score: u32,
    pub best_completion: f64,
    #[serde(skip)]
    completion_sum: f64,
}

/// Everything the scorer needs to know about a finished game.
pub struct ScoreInput<'a> {
    pub game: &'a Game,
    pub placements: &'a [WordPlacement],
    pub word_types: &'a HashMap<String, WordType>,
    pub discovered: &'a HashSet<String>,
    pub elapsed_secs: u32,
}

pub struct Scorer;

impl Scorer {
    /// Calculate the final results of a game.
    ///
    /// Scoring rules:
    /// - 100 points per word found
    /// - A perfect game earns 10 points per second remaining
    /// - The sum is scaled by the grid-size difficulty multiplier
    pub fn calculate(input: &ScoreInput<'_>) -> GameResults {
        let game = input.game;
        let total_words = input.placements.len();
        let found_words = input
            .placements
            .iter()
            .filter(|p| input.discovered.contains(&p.word))
            .count();

        let time_remaining = game.time_limit.saturating_sub(input.elapsed_secs);
        let perfect_game = found_words == total_words;

        let word_score = Self::word_score(found_words);
        let time_bonus = Self::time_bonus(time_remaining, perfect_game);
        let difficulty_multiplier = Self::difficulty_multiplier(game.grid_size);
        // Exact products are whole numbers; round away float noise
        let total_score = ((word_score + time_bonus) as f64 * difficulty_multiplier).round() as u32;

        GameResults {
            total_words,
            found_words,
            unfound_words: total_words - found_words,
            completion_percentage: percentage(found_words, total_words),

            elapsed_time: input.elapsed_secs,
            time_remaining,
            time_limit: game.time_limit,

            perfect_game,
            game_status: game.status,
            completed_on_time: game.status == GameStatus::Completed,
            expired: game.status == GameStatus::Expired,

            word_score,
            time_bonus,
            difficulty_multiplier,
            total_score,

            word_breakdown: Self::word_breakdown(
                input.placements,
                input.word_types,
                input.discovered,
            ),

            topic: game.topic.clone(),
            subtopic: game.subtopic.clone(),
            grid_size: game.grid_size,
        }
    }

    fn word_score(found_words: usize) -> u32 {
        found_words as u32 * POINTS_PER_WORD
    }

    fn time_bonus(time_remaining: u32, perfect_game: bool) -> u32 {
        if perfect_game {
            time_remaining * TIME_BONUS_MULTIPLIER
        } else {
            0
        }
    }

    pub fn difficulty_multiplier(grid_size: usize) -> f64 {
        DIFFICULTY_MULTIPLIERS
            .range(grid_size..)
            .next()
            .or_else(|| DIFFICULTY_MULTIPLIERS.iter().next_back())
            .map(|(_, multiplier)| *multiplier)
            .unwrap_or(1.0)
    }

    pub fn word_breakdown(
        placements: &[WordPlacement],
        word_types: &HashMap<String, WordType>,
        discovered: &HashSet<String>,
    ) -> WordBreakdown {
        let progress = |wanted: WordType| {
            let words: Vec<_> = placements
                .iter()
                .filter(|p| word_types.get(&p.word).copied().unwrap_or(WordType::Defining) == wanted)
                .collect();
            let found = words.iter().filter(|p| discovered.contains(&p.word)).count();
            TypeProgress {
                total: words.len(),
                found,
                percentage: percentage(found, words.len()),
            }
        };

        WordBreakdown {
            character_words: progress(WordType::Character),
            defining_words: progress(WordType::Defining),
        }
    }

    /// Rate a game by completion and by the share of the time limit used.
    /// Untimed games count as having used all of their time.
    pub fn performance_rating(results: &GameResults) -> PerformanceRating {
        let time_percentage = if results.time_limit == 0 {
            100.0
        } else {
            results.elapsed_time as f64 / results.time_limit as f64 * 100.0
        };

        if results.perfect_game {
            return if time_percentage < 50.0 {
                PerformanceRating::Legendary
            } else if time_percentage < 75.0 {
                PerformanceRating::Exceptional
            } else {
                PerformanceRating::Excellent
            };
        }

        match results.completion_percentage {
            c if c >= 90.0 => PerformanceRating::Outstanding,
            c if c >= 75.0 => PerformanceRating::Great,
            c if c >= 50.0 => PerformanceRating::Good,
            c if c >= 25.0 => PerformanceRating::Fair,
            _ => PerformanceRating::NeedsImprovement,
        }
    }
}

impl SessionStats {
    /// Fold one finished game into the running totals
    pub fn record(&mut self, results: &GameResults) {
        self.games_played += 1;
        self.total_words_found += results.found_words;
        if results.perfect_game {
            self.perfect_games += 1;
        }
        self.completion_sum += results.completion_percentage;
        self.total_score += results.total_score as u64;
        self.best_score = self.best_score.max(results.total_score);
        self.best_completion = self.best_completion.max(results.completion_percentage);

        let games = self.games_played as f64;
        self.perfect_game_rate = percentage(self.perfect_games, self.games_played);
        self.average_completion = self.completion_sum / games;
        self.average_score = self.total_score as f64 / games;
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
