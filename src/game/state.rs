use std::fmt;

use super::{Board, Cell, Player, SQUARES};
use crate::encoding::{BoardEncoding, ENCODING_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("square {0} is already occupied")]
    Occupied(usize),

    #[error("square {0} is off the board")]
    InvalidSquare(usize),

    #[error("the game is already over")]
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    current_player: Player,
    outcome: Option<GameOutcome>,
    plies: usize,
}

impl GameState {
    /// Create initial game state
    pub fn initial() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::X,
            outcome: None,
            plies: 0,
        }
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn plies(&self) -> usize {
        self.plies
    }

    /// Empty squares, or nothing once the game is over.
    pub fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..SQUARES).filter(|&sq| self.board.is_empty_at(sq)).collect()
    }

    /// Apply a move and return new state (immutable)
    pub fn apply_move(&self, square: usize) -> Result<GameState, MoveError> {
        let mut next = *self;
        next.apply_move_mut(square)?;
        Ok(next)
    }

    pub fn apply_move_mut(&mut self, square: usize) -> Result<(), MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if square >= SQUARES {
            return Err(MoveError::InvalidSquare(square));
        }
        if !self.board.is_empty_at(square) {
            return Err(MoveError::Occupied(square));
        }

        self.board.set(square, self.current_player.to_cell());
        self.plies += 1;

        if self.board.check_win(square) {
            self.outcome = Some(GameOutcome::Winner(self.current_player));
        } else if self.board.is_full() {
            self.outcome = Some(GameOutcome::Draw);
        }

        self.current_player = self.current_player.other();
        Ok(())
    }

    /// 9 bytes of X stones, 9 bytes of O stones, then whose turn it is.
    pub fn encode(&self) -> BoardEncoding {
        let mut bytes = [0u8; ENCODING_LEN];
        for sq in 0..SQUARES {
            match self.board.get(sq) {
                Cell::X => bytes[sq] = 1,
                Cell::O => bytes[SQUARES + sq] = 1,
                Cell::Empty => {}
            }
        }
        bytes[2 * SQUARES] = self.current_player.index();
        BoardEncoding::from(bytes)
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::initial()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            for col in 0..3 {
                let mark = match self.board.get(row * 3 + col) {
                    Cell::X => Player::X.mark(),
                    Cell::O => Player::O.mark(),
                    Cell::Empty => ' ',
                };
                write!(f, "|{mark}")?;
            }
            write!(f, "|")?;
            if row < 2 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
