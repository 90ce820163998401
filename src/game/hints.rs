use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    error::GameError,
    models::{Coordinate, Direction, WordPlacement, WordType},
};

/// Hints allowed per game unless configured otherwise
pub const DEFAULT_MAX_HINTS: u32 = 3;
/// A reveal shows a whole word and costs this many hints
pub const REVEAL_COST: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    /// Letter, pattern or location, picked at random
    #[default]
    Auto,
    Letter,
    Pattern,
    Location,
    Reveal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    fn of(coord: Coordinate, grid_size: usize) -> Self {
        let mid = grid_size / 2;
        match (coord.row < mid, coord.col < mid) {
            (true, true) => Quadrant::TopLeft,
            (true, false) => Quadrant::TopRight,
            (false, true) => Quadrant::BottomLeft,
            (false, false) => Quadrant::BottomRight,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "top-left",
            Quadrant::TopRight => "top-right",
            Quadrant::BottomLeft => "bottom-left",
            Quadrant::BottomRight => "bottom-right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Hint {
    Letter {
        message: String,
        letter: char,
        word_length: usize,
    },
    Pattern {
        message: String,
        pattern: String,
        word_type: WordType,
    },
    Location {
        message: String,
        quadrant: Quadrant,
        direction: Direction,
        start: Coordinate,
        word_length: usize,
    },
    Reveal {
        message: String,
        word: String,
        coordinates: Vec<Coordinate>,
    },
}

impl Hint {
    pub fn message(&self) -> &str {
        match self {
            Hint::Letter { message, .. }
            | Hint::Pattern { message, .. }
            | Hint::Location { message, .. }
            | Hint::Reveal { message, .. } => message,
        }
    }
}

/// Hints handed out in one game, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct HintHistory {
    pub max_hints: u32,
    pub hints_remaining: u32,
    pub hints: Vec<Hint>,
}

/// Per-game hint budget and the hints handed out so far.
#[derive(Debug, Clone)]
pub struct HintSystem {
    max_hints: u32,
    remaining: u32,
    given: Vec<Hint>,
}

impl HintSystem {
    pub fn new(max_hints: u32) -> Self {
        Self {
            max_hints,
            remaining: max_hints,
            given: Vec::new(),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max_hints(&self) -> u32 {
        self.max_hints
    }

    pub fn given(&self) -> &[Hint] {
        &self.given
    }

    pub fn history(&self) -> HintHistory {
        HintHistory {
            max_hints: self.max_hints(),
            hints_remaining: self.remaining,
            hints: self.given().to_vec(),
        }
    }

    /// Produce a hint about one of the `unfound` words and charge the budget.
    pub fn hint(
        &mut self,
        kind: HintKind,
        unfound: &[(&WordPlacement, WordType)],
        grid_size: usize,
        rng: &mut impl Rng,
    ) -> Result<Hint, GameError> {
        let cost = if kind == HintKind::Reveal { REVEAL_COST } else { 1 };
        if self.remaining < cost {
            return Err(GameError::HintsExhausted);
        }
        if unfound.is_empty() {
            return Err(GameError::NothingToHint);
        }

        let kind = match kind {
            HintKind::Auto => *[HintKind::Letter, HintKind::Pattern, HintKind::Location]
                .choose(rng)
                .unwrap_or(&HintKind::Letter),
            other => other,
        };

        let hint = match kind {
            HintKind::Reveal => reveal_hint(unfound).ok_or(GameError::NothingToHint)?,
            _ => {
                let &(placement, word_type) =
                    unfound.choose(rng).ok_or(GameError::NothingToHint)?;
                match kind {
                    HintKind::Pattern => pattern_hint(placement, word_type, rng),
                    HintKind::Location => location_hint(placement, grid_size),
                    _ => letter_hint(placement),
                }
            }
        };

        self.remaining -= cost;
        self.given.push(hint.clone());
        tracing::debug!("Hint given ({} left): {}", self.remaining, hint.message());

        Ok(hint)
    }
}

fn letter_hint(placement: &WordPlacement) -> Hint {
    let letter = placement.word.chars().next().unwrap_or('?');
    Hint::Letter {
        message: format!(
            "There's a word starting with '{}'. It's {} letters long",
            letter,
            placement.len()
        ),
        letter,
        word_length: placement.len(),
    }
}

fn pattern_hint(placement: &WordPlacement, word_type: WordType, rng: &mut impl Rng) -> Hint {
    let len = placement.len();
    let reveal_count = (len / 3).max(1).min(len);
    let shown = rand::seq::index::sample(rng, len, reveal_count).into_vec();

    let pattern: String = placement
        .word
        .chars()
        .enumerate()
        .map(|(i, c)| if shown.contains(&i) { c } else { '_' })
        .collect();

    let type_label = match word_type {
        WordType::Character => "character",
        WordType::Defining => "defining",
    };

    Hint::Pattern {
        message: format!("Look for: {} ({})", pattern, type_label),
        pattern,
        word_type,
    }
}

fn location_hint(placement: &WordPlacement, grid_size: usize) -> Hint {
    let quadrant = Quadrant::of(placement.start, grid_size);
    let heading = match placement.direction {
        Direction::Horizontal => "across",
        Direction::Vertical => "down",
    };
    Hint::Location {
        message: format!("Try the {} area, going {}", quadrant.label(), heading),
        quadrant,
        direction: placement.direction,
        start: placement.start,
        word_length: placement.len(),
    }
}

/// Reveals the shortest unfound word; ties go to the first listed
fn reveal_hint(unfound: &[(&WordPlacement, WordType)]) -> Option<Hint> {
    let placement = unfound
        .iter()
        .map(|(p, _)| *p)
        .reduce(|best, p| if p.len() < best.len() { p } else { best })?;

    Some(Hint::Reveal {
        message: format!("Here's where '{}' is located!", placement.word),
        word: placement.word.clone(),
        coordinates: placement.cells().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn placements() -> Vec<WordPlacement> {
        vec![
            WordPlacement::new("KAKASHI", Coordinate::new(0, 0), Direction::Horizontal),
            WordPlacement::new("SAI", Coordinate::new(6, 7), Direction::Vertical),
        ]
    }

    #[test]
    fn test_letter_hint() {
        let words = placements();
        let unfound = vec![(&words[0], WordType::Character)];
        let mut hints = HintSystem::new(3);
        let mut rng = StdRng::seed_from_u64(1);

        let hint = hints.hint(HintKind::Letter, &unfound, 10, &mut rng).unwrap();
        assert_eq!(
            hint,
            Hint::Letter {
                message: "There's a word starting with 'K'. It's 7 letters long".to_string(),
                letter: 'K',
                word_length: 7,
            }
        );
        assert_eq!(hints.remaining(), 2);
        assert_eq!(hints.given().len(), 1);
    }

    #[test]
    fn test_pattern_hint_reveals_a_third() {
        let words = placements();
        let unfound = vec![(&words[0], WordType::Character)];
        let mut hints = HintSystem::new(3);
        let mut rng = StdRng::seed_from_u64(2);

        let Hint::Pattern { pattern, word_type, .. } =
            hints.hint(HintKind::Pattern, &unfound, 10, &mut rng).unwrap()
        else {
            panic!("expected a pattern hint");
        };

        assert_eq!(word_type, WordType::Character);
        assert_eq!(pattern.len(), 7);
        assert_eq!(pattern.chars().filter(|c| *c != '_').count(), 2);
        for (shown, actual) in pattern.chars().zip("KAKASHI".chars()) {
            assert!(shown == '_' || shown == actual);
        }
    }

    #[test]
    fn test_location_hint() {
        let words = placements();
        let unfound = vec![(&words[1], WordType::Defining)];
        let mut hints = HintSystem::new(3);
        let mut rng = StdRng::seed_from_u64(3);

        let hint = hints.hint(HintKind::Location, &unfound, 10, &mut rng).unwrap();
        assert_eq!(hint.message(), "Try the bottom-right area, going down");
        assert!(matches!(
            hint,
            Hint::Location { quadrant: Quadrant::BottomRight, direction: Direction::Vertical, .. }
        ));
    }

    #[test]
    fn test_reveal_picks_shortest_and_costs_two() {
        let words = placements();
        let unfound: Vec<_> = words.iter().map(|p| (p, WordType::Character)).collect();
        let mut hints = HintSystem::new(3);
        let mut rng = StdRng::seed_from_u64(4);

        let hint = hints.hint(HintKind::Reveal, &unfound, 10, &mut rng).unwrap();
        let Hint::Reveal { word, coordinates, .. } = hint else {
            panic!("expected a reveal hint");
        };
        assert_eq!(word, "SAI");
        assert_eq!(
            coordinates,
            vec![Coordinate::new(6, 7), Coordinate::new(7, 7), Coordinate::new(8, 7)]
        );
        assert_eq!(hints.remaining(), 1);

        // One hint left is not enough for another reveal
        assert!(matches!(
            hints.hint(HintKind::Reveal, &unfound, 10, &mut rng),
            Err(GameError::HintsExhausted)
        ));
    }

    #[test]
    fn test_budget_runs_out() {
        let words = placements();
        let unfound = vec![(&words[0], WordType::Character)];
        let mut hints = HintSystem::new(2);
        let mut rng = StdRng::seed_from_u64(5);

        assert!(hints.hint(HintKind::Auto, &unfound, 10, &mut rng).is_ok());
        assert!(hints.hint(HintKind::Auto, &unfound, 10, &mut rng).is_ok());
        assert!(matches!(
            hints.hint(HintKind::Auto, &unfound, 10, &mut rng),
            Err(GameError::HintsExhausted)
        ));

        let history = hints.history();
        assert_eq!(history.max_hints, 2);
        assert_eq!(history.hints_remaining, 0);
        assert_eq!(history.hints.len(), 2);
        assert_eq!(history.hints, hints.given());
    }

    #[test]
    fn test_no_hint_when_everything_found() {
        let mut hints = HintSystem::new(3);
        let mut rng = StdRng::seed_from_u64(6);
        assert!(matches!(
            hints.hint(HintKind::Letter, &[], 10, &mut rng),
            Err(GameError::NothingToHint)
        ));
        assert_eq!(hints.remaining(), 3);
    }
}
