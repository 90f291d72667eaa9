pub mod board;
pub mod runner;
pub mod sgf;
pub mod types;

pub use board::Board;
pub use runner::{run_game, GameConfig, MoveEvent, PASS_LIMIT};
pub use sgf::{load_openings, parse_sgf, Opening, OpeningMove};
pub use types::{duration_to_millis, Color, EndReason, GameOutcome, Winner};
