// Puzzle engine: grid building, selection checks, timing, hints and scoring

pub mod grid;
pub mod hints;
pub mod scorer;
pub mod session;
pub mod timer;
pub mod validator;

pub use grid::{PlacementConfig, WordOrder};
pub use hints::{Hint, HintHistory, HintKind};
pub use scorer::{GameResults, PerformanceRating, Scorer, SessionStats};
pub use session::{GameSession, GameView, Progress, SelectionOutcome, SessionOptions};
pub use timer::TimerStatus;
