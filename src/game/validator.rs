use std::collections::HashSet;

use thiserror::Error;

use crate::models::{Coordinate, Grid, WordPlacement};

/// Why a player's selection did not name a hidden word.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionRejection {
    #[error("nothing selected")]
    Empty,
    #[error("selection must step between neighbouring cells")]
    NotConnected,
    #[error("selection visits a cell twice")]
    RepeatedCell,
    #[error("selection leaves the grid")]
    OutOfBounds,
    #[error("'{0}' is not one of the hidden words")]
    NotInSolution(String),
}

pub struct SelectionValidator {
    solution: HashSet<String>,
}

impl SelectionValidator {
    pub fn new(placements: &[WordPlacement]) -> Self {
        let solution = placements.iter().map(|p| p.word.clone()).collect();
        Self { solution }
    }

    /// Check a selection against the grid and return the hidden word it spells
    pub fn validate(
        &self,
        grid: &Grid,
        selection: &[Coordinate],
    ) -> Result<String, SelectionRejection> {
        Self::check_path(grid, selection)?;

        let word = Self::extract_word(grid, selection).ok_or(SelectionRejection::OutOfBounds)?;
        if self.solution.contains(&word) {
            Ok(word)
        } else {
            Err(SelectionRejection::NotInSolution(word))
        }
    }

    /// Validate that positions form a connected path on the grid
    pub fn check_path(grid: &Grid, selection: &[Coordinate]) -> Result<(), SelectionRejection> {
        if selection.is_empty() {
            return Err(SelectionRejection::Empty);
        }

        if !selection.iter().all(|coord| grid.in_bounds(*coord)) {
            return Err(SelectionRejection::OutOfBounds);
        }

        if !selection.windows(2).all(|pair| pair[0].is_adjacent(&pair[1])) {
            return Err(SelectionRejection::NotConnected);
        }

        let unique: HashSet<_> = selection.iter().collect();
        if unique.len() != selection.len() {
            return Err(SelectionRejection::RepeatedCell);
        }

        Ok(())
    }

    /// Extract word from grid positions
    pub fn extract_word(grid: &Grid, selection: &[Coordinate]) -> Option<String> {
        grid.read(selection)
    }
}
