//! Tic-Tac-Toe rules: board, players, and an immutable game state that
//! produces the 19-byte board encoding used by the record files.

mod board;
mod player;
mod state;

pub use board::{Board, Cell, SQUARES};
pub use player::Player;
pub use state::{GameOutcome, GameState, MoveError};
