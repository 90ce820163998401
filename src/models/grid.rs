use serde::{Deserialize, Serialize};

/// A cell address on the puzzle grid, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True when the two cells share an edge (no diagonals).
    pub fn is_adjacent(&self, other: &Coordinate) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    /// Cell reached after moving `offset` steps from `start`.
    pub fn step(self, start: Coordinate, offset: usize) -> Coordinate {
        match self {
            Direction::Horizontal => Coordinate::new(start.row, start.col + offset),
            Direction::Vertical => Coordinate::new(start.row + offset, start.col),
        }
    }
}

/// A word committed to the grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordPlacement {
    pub word: String,
    pub start: Coordinate,
    pub direction: Direction,
}

impl WordPlacement {
    pub fn new(word: impl Into<String>, start: Coordinate, direction: Direction) -> Self {
        Self {
            word: word.into(),
            start,
            direction,
        }
    }

    pub fn len(&self) -> usize {
        self.word.len()
    }

    /// Cells spanned by the word, in reading order.
    pub fn cells(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.word.len()).map(move |offset| self.direction.step(self.start, offset))
    }

    /// Cells paired with the letter the word puts there.
    pub fn letters(&self) -> impl Iterator<Item = (Coordinate, char)> + '_ {
        self.cells().zip(self.word.chars())
    }
}

/// A completed N×N letter grid. Every cell holds exactly one letter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    letters: Vec<Vec<char>>,
}

impl Grid {
    /// Wrap a square letter matrix. Returns `None` if the rows are ragged
    /// or do not match `size`.
    pub fn from_rows(letters: Vec<Vec<char>>) -> Option<Self> {
        let size = letters.len();
        if letters.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self { size, letters })
    }

    pub fn get(&self, coord: Coordinate) -> Option<char> {
        self.letters.get(coord.row)?.get(coord.col).copied()
    }

    pub fn in_bounds(&self, coord: Coordinate) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.letters
    }

    /// Letters read along `path`. `None` if any cell is out of bounds.
    pub fn read(&self, path: &[Coordinate]) -> Option<String> {
        path.iter().map(|coord| self.get(*coord)).collect()
    }
}
