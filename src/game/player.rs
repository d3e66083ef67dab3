use super::board::Cell;

/// `X` always moves first and is "player 1" in the board encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the other player
    pub fn other(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Convert player to cell type
    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }

    /// The turn byte written into the board encoding.
    pub fn index(self) -> u8 {
        match self {
            Player::X => 0,
            Player::O => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Player> {
        match index {
            0 => Some(Player::X),
            1 => Some(Player::O),
            _ => None,
        }
    }

    /// Mark used when printing boards
    pub fn mark(self) -> char {
        match self {
            Player::X => 'x',
            Player::O => 'o',
        }
    }
}
