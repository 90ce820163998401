use std::str::FromStr;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    error::GridError,
    models::{Coordinate, Direction, Grid, WordPlacement},
    utils::letters::{is_puzzle_letter, random_letter},
};

/// Placement attempts per word before it is skipped
pub const DEFAULT_RETRY_BUDGET: usize = 100;

/// Expected fraction of a word's letters that need a cell of their own
/// once crossovers are taken into account
const OVERLAP_FACTOR: f64 = 0.8;

/// Order in which words are offered to the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordOrder {
    /// Longest words first; ties keep their input order
    #[default]
    LongestFirst,
    AsGiven,
    /// Shuffled with the builder's own RNG
    Shuffled,
}

impl FromStr for WordOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "longest_first" => Ok(WordOrder::LongestFirst),
            "as_given" => Ok(WordOrder::AsGiven),
            "shuffled" => Ok(WordOrder::Shuffled),
            other => Err(format!(
                "unknown word order '{}', expected longest_first, as_given or shuffled",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementConfig {
    pub retry_budget: usize,
    pub word_order: WordOrder,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            word_order: WordOrder::default(),
        }
    }
}

/// Places words across or down an N×N grid and fills the gaps.
///
/// Words may cross only where they agree on the shared letter. A word that
/// finds no valid spot within the retry budget is left out of the result;
/// the caller decides whether a partially filled puzzle is acceptable.
pub struct GridBuilder<R = StdRng> {
    rng: R,
    config: PlacementConfig,
}

impl GridBuilder<StdRng> {
    /// Deterministic builder: the same seed, words and size give the same grid.
    pub fn seeded(seed: u64, config: PlacementConfig) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), config)
    }
}

impl<R: Rng> GridBuilder<R> {
    pub fn with_rng(rng: R, config: PlacementConfig) -> Self {
        Self { rng, config }
    }

    /// Build a `size`×`size` grid from `words`.
    ///
    /// Every word is validated before anything is placed: it must be
    /// non-empty, alphabetic and no longer than `size`. Lower-case input is
    /// upper-cased. Returned placements are in the order they were committed.
    pub fn build<S: AsRef<str>>(
        &mut self,
        words: &[S],
        size: usize,
    ) -> Result<(Grid, Vec<WordPlacement>), GridError> {
        if size == 0 {
            return Err(GridError::InvalidSize);
        }

        let words = validate_words(words, size)?;
        let words = self.order(words);

        let mut cells: Vec<Option<char>> = vec![None; size * size];
        let mut placements = Vec::with_capacity(words.len());

        for word in words {
            match self.find_placement(&word, &cells, size) {
                Some(placement) => {
                    for (coord, letter) in placement.letters() {
                        cells[coord.row * size + coord.col] = Some(letter);
                    }
                    placements.push(placement);
                }
                None => {
                    tracing::debug!(
                        "Skipping '{}': no valid spot in {} attempts on a {}x{} grid",
                        word,
                        self.config.retry_budget,
                        size,
                        size
                    );
                }
            }
        }

        let letters: Vec<Vec<char>> = cells
            .chunks(size)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.unwrap_or_else(|| random_letter(&mut self.rng)))
                    .collect()
            })
            .collect();

        // `chunks(size)` over size*size cells is always square
        let grid = Grid::from_rows(letters).ok_or(GridError::InvalidSize)?;

        tracing::debug!(
            "Built {}x{} grid with {} placed words",
            size,
            size,
            placements.len()
        );

        Ok((grid, placements))
    }

    fn order(&mut self, mut words: Vec<String>) -> Vec<String> {
        match self.config.word_order {
            WordOrder::LongestFirst => words.sort_by(|a, b| b.len().cmp(&a.len())),
            WordOrder::AsGiven => {}
            WordOrder::Shuffled => words.shuffle(&mut self.rng),
        }
        words
    }

    fn find_placement(
        &mut self,
        word: &str,
        cells: &[Option<char>],
        size: usize,
    ) -> Option<WordPlacement> {
        let span = size - word.len() + 1;

        for _ in 0..self.config.retry_budget {
            let direction = if self.rng.random_bool(0.5) {
                Direction::Horizontal
            } else {
                Direction::Vertical
            };

            let (rows, cols) = match direction {
                Direction::Horizontal => (size, span),
                Direction::Vertical => (span, size),
            };
            let start = Coordinate::new(
                self.rng.random_range(0..rows),
                self.rng.random_range(0..cols),
            );

            let candidate = WordPlacement::new(word, start, direction);
            if fits(&candidate, cells, size) {
                return Some(candidate);
            }
        }

        None
    }
}

/// A placement fits when each cell it covers is empty or already holds the
/// letter the word needs there.
fn fits(candidate: &WordPlacement, cells: &[Option<char>], size: usize) -> bool {
    candidate.letters().all(|(coord, letter)| {
        coord.row < size
            && coord.col < size
            && match cells[coord.row * size + coord.col] {
                None => true,
                Some(existing) => existing == letter,
            }
    })
}

fn validate_words<S: AsRef<str>>(words: &[S], size: usize) -> Result<Vec<String>, GridError> {
    words
        .iter()
        .map(|raw| {
            let word = raw.as_ref().to_ascii_uppercase();
            if word.is_empty() {
                return Err(GridError::EmptyWord);
            }
            if !word.chars().all(is_puzzle_letter) {
                return Err(GridError::InvalidWord(raw.as_ref().to_string()));
            }
            if word.len() > size {
                return Err(GridError::WordTooLong {
                    len: word.len(),
                    word,
                    size,
                });
            }
            Ok(word)
        })
        .collect()
}

/// Estimate how many of the given words a `grid_size`×`grid_size` grid can
/// hold, assuming a fifth of the letters end up on shared cells.
///
/// When the whole list does not fit, words are counted shortest first.
pub fn estimate_capacity(grid_size: usize, word_lengths: &[usize]) -> usize {
    let total_cells = grid_size * grid_size;
    let effective = |len: usize| (len as f64 * OVERLAP_FACTOR) as usize;

    let total_needed = (word_lengths.iter().sum::<usize>() as f64 * OVERLAP_FACTOR) as usize;
    if total_needed <= total_cells {
        return word_lengths.len();
    }

    let mut sorted = word_lengths.to_vec();
    sorted.sort_unstable();

    let mut used = 0;
    let mut count = 0;
    for len in sorted {
        if used + effective(len) > total_cells {
            break;
        }
        used += effective(len);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn builder(seed: u64) -> GridBuilder {
        GridBuilder::seeded(seed, PlacementConfig::default())
    }

    /// Checks every property a returned grid must satisfy
    fn assert_consistent(grid: &Grid, placements: &[WordPlacement], size: usize) {
        assert_eq!(grid.rows().len(), size);
        assert_eq!(grid.rows().len(), size);

        for row in grid.rows() {
            assert_eq!(row.len(), size);
            assert!(row.iter().all(|c| c.is_ascii_uppercase()), "bad cell in {:?}", row);
        }

        let mut claimed: HashMap<Coordinate, char> = HashMap::new();
        for placement in placements {
            assert!(placement.len() <= size);
            for (coord, letter) in placement.letters() {
                assert!(coord.row < size && coord.col < size, "{:?} out of bounds", coord);
                if let Some(previous) = claimed.insert(coord, letter) {
                    assert_eq!(previous, letter, "conflicting crossover at {:?}", coord);
                }
            }
            let cells: Vec<_> = placement.cells().collect();
            assert_eq!(grid.read(&cells).as_deref(), Some(placement.word.as_str()));
        }
    }

    #[test]
    fn test_cat_and_dog_fit_on_small_grid() {
        for seed in 0..50 {
            let (grid, placements) = builder(seed).build(&["CAT", "DOG"], 4).unwrap();
            assert_consistent(&grid, &placements, 4);

            let mut words: Vec<_> = placements.iter().map(|p| p.word.as_str()).collect();
            words.sort();
            assert_eq!(words, vec!["CAT", "DOG"], "seed {}", seed);
        }
    }

    #[test]
    fn test_word_longer_than_grid_is_rejected() {
        let result = builder(1).build(&["SUPERCALIFRAGILISTIC"], 8);
        assert_eq!(
            result,
            Err(GridError::WordTooLong {
                word: "SUPERCALIFRAGILISTIC".to_string(),
                len: 20,
                size: 8,
            })
        );

        // One oversized word rejects the whole request before placement
        let result = builder(1).build(&["CAT", "SUPERCALIFRAGILISTIC"], 8);
        assert!(matches!(result, Err(GridError::WordTooLong { len: 20, .. })));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(builder(0).build(&["CAT"], 0), Err(GridError::InvalidSize));
        assert_eq!(builder(0).build(&[""], 5), Err(GridError::EmptyWord));
        assert_eq!(
            builder(0).build(&["C4T"], 5),
            Err(GridError::InvalidWord("C4T".to_string()))
        );
    }

    #[test]
    fn test_lowercase_input_is_uppercased() {
        let (grid, placements) = builder(3).build(&["cat"], 5).unwrap();
        assert_eq!(placements[0].word, "CAT");
        assert_consistent(&grid, &placements, 5);
    }

    #[test]
    fn test_word_exactly_grid_size() {
        let (grid, placements) = builder(9).build(&["ABCDEFGH"], 8).unwrap();
        assert_eq!(placements.len(), 1);
        let start = placements[0].start;
        match placements[0].direction {
            Direction::Horizontal => assert_eq!(start.col, 0),
            Direction::Vertical => assert_eq!(start.row, 0),
        }
        assert_consistent(&grid, &placements, 8);
    }

    #[test]
    fn test_crossing_words_share_matching_letter() {
        let size = 5;
        let mut cells = vec![None; size * size];
        let cat = WordPlacement::new("CAT", Coordinate::new(0, 0), Direction::Horizontal);
        for (coord, letter) in cat.letters() {
            cells[coord.row * size + coord.col] = Some(letter);
        }

        // COT going down from CAT's C
        let cot_down = WordPlacement::new("COT", Coordinate::new(0, 0), Direction::Vertical);
        assert!(fits(&cot_down, &cells, size));

        // COT starting on CAT's T needs a C there
        let cot_up_to_t = WordPlacement::new("COT", Coordinate::new(0, 2), Direction::Vertical);
        assert!(!fits(&cot_up_to_t, &cells, size));

        // COT along CAT's row conflicts on the middle letter
        let cot_across = WordPlacement::new("COT", Coordinate::new(0, 0), Direction::Horizontal);
        assert!(!fits(&cot_across, &cells, size));

        // Off the edge
        let off_grid = WordPlacement::new("COT", Coordinate::new(3, 4), Direction::Vertical);
        assert!(!fits(&off_grid, &cells, size));
    }

    #[test]
    fn test_cat_and_cot_crossover_is_discoverable() {
        let mut crossed = 0;
        for seed in 0..500 {
            let (grid, placements) = builder(seed).build(&["CAT", "COT"], 5).unwrap();
            assert_consistent(&grid, &placements, 5);
            assert_eq!(placements.len(), 2, "seed {}", seed);

            let shared = placements[0]
                .cells()
                .filter(|c| placements[1].cells().any(|d| d == *c))
                .count();
            if shared > 0 {
                crossed += 1;
            }
        }
        assert!(crossed > 0, "no run placed CAT and COT crossing each other");
    }

    #[test]
    fn test_same_seed_same_grid() {
        let words = ["NARUTO", "SASUKE", "SAKURA", "KAKASHI", "CHAKRA", "HOKAGE"];
        let first = builder(42).build(&words, 10).unwrap();
        let second = builder(42).build(&words, 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_properties_hold_across_seeds() {
        let words = [
            "TOTORO", "SPIRITED", "CHIHIRO", "HAKU", "NOFACE", "KIKI", "JIJI", "ASHITAKA",
            "SAN", "PONYO", "HOWL", "CALCIFER", "SOPHIE", "CATBUS",
        ];
        for seed in 0..100 {
            for size in [8, 10, 12] {
                let (grid, placements) = builder(seed).build(&words, size).unwrap();
                assert_consistent(&grid, &placements, size);
            }
        }
    }

    #[test]
    fn test_unplaceable_words_are_skipped() {
        // Twelve distinct letters cannot share any of nine cells
        let (grid, placements) = builder(5).build(&["ABC", "DEF", "GHI", "JKL"], 3).unwrap();
        assert!(placements.len() < 4);
        assert!(!placements.is_empty());
        assert_consistent(&grid, &placements, 3);
    }

    #[test]
    fn test_zero_retry_budget_places_nothing() {
        let config = PlacementConfig {
            retry_budget: 0,
            word_order: WordOrder::AsGiven,
        };
        let (grid, placements) = GridBuilder::seeded(0, config)
            .build(&["CAT", "DOG"], 6)
            .unwrap();
        assert!(placements.is_empty());
        assert_consistent(&grid, &placements, 6);
    }

    #[test]
    fn test_longest_first_places_longest_word_first() {
        let (_, placements) = builder(8).build(&["CAT", "ELEPHANT", "DOGS"], 10).unwrap();
        assert_eq!(placements[0].word, "ELEPHANT");
    }

    #[test]
    fn test_order_keeps_ties_stable() {
        let mut b = builder(0);
        let ordered = b.order(vec!["AB".into(), "CDE".into(), "FG".into(), "HIJ".into()]);
        assert_eq!(ordered, vec!["CDE", "HIJ", "AB", "FG"]);

        let mut b = GridBuilder::seeded(
            0,
            PlacementConfig {
                word_order: WordOrder::AsGiven,
                ..PlacementConfig::default()
            },
        );
        let ordered = b.order(vec!["AB".into(), "CDE".into()]);
        assert_eq!(ordered, vec!["AB", "CDE"]);
    }

    #[test]
    fn test_word_order_from_str() {
        assert_eq!("longest_first".parse::<WordOrder>(), Ok(WordOrder::LongestFirst));
        assert_eq!("AS_GIVEN".parse::<WordOrder>(), Ok(WordOrder::AsGiven));
        assert_eq!(" shuffled ".parse::<WordOrder>(), Ok(WordOrder::Shuffled));
        assert!("random".parse::<WordOrder>().is_err());
    }

    #[test]
    fn test_estimate_capacity() {
        // 10 * 5 * 0.8 = 40 letters, 64 cells
        assert_eq!(estimate_capacity(8, &[5; 10]), 10);

        // 9 effective letters each, 7 * 9 = 63 <= 64
        assert_eq!(estimate_capacity(8, &[12; 10]), 7);

        assert_eq!(estimate_capacity(8, &[]), 0);
    }
}
