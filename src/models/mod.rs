pub mod game;
pub mod grid;

pub use game::{Difficulty, Game, GameSettings, GameStatus, WordData, WordType};
pub use grid::{Coordinate, Direction, Grid, WordPlacement};
