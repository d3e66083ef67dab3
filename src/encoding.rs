//! Fixed-width board encoding and the (board, move distribution) training
//! example stored in the record files.

use std::fmt;

use crate::error::RecordError;
use crate::game::{Player, SQUARES};

/// 9 bytes of player-1 stones, 9 bytes of player-2 stones, 1 turn byte.
pub const ENCODING_LEN: usize = 2 * SQUARES + 1;

/// Number of moves in the distribution (one per square).
pub const MOVE_COUNT: usize = SQUARES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardEncoding([u8; ENCODING_LEN]);

impl BoardEncoding {
    pub fn as_bytes(&self) -> &[u8; ENCODING_LEN] {
        &self.0
    }

    /// Whose turn it is, if the turn byte is valid.
    pub fn to_move(&self) -> Option<Player> {
        Player::from_index(self.0[2 * SQUARES])
    }

    /// Network input: every byte widened to `f32`.
    pub fn to_f32(&self) -> [f32; ENCODING_LEN] {
        self.0.map(f32::from)
    }
}

impl From<[u8; ENCODING_LEN]> for BoardEncoding {
    fn from(bytes: [u8; ENCODING_LEN]) -> Self {
        BoardEncoding(bytes)
    }
}

impl TryFrom<&[u8]> for BoardEncoding {
    type Error = RecordError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; ENCODING_LEN] = bytes.try_into().map_err(|_| {
            RecordError::MalformedExample(format!(
                "board encoding has {} bytes, expected {ENCODING_LEN}",
                bytes.len()
            ))
        })?;
        Ok(BoardEncoding(array))
    }
}

impl fmt::Display for BoardEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            for col in 0..3 {
                let sq = row * 3 + col;
                let mark = match (self.0[sq], self.0[SQUARES + sq]) {
                    (0, 0) => ' ',
                    (_, 0) => Player::X.mark(),
                    (0, _) => Player::O.mark(),
                    _ => '?',
                };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        match self.to_move() {
            Some(p) => write!(f, "{} to move", p.mark()),
            None => write!(f, "invalid turn byte {}", self.0[2 * SQUARES]),
        }
    }
}

/// One supervised example: a position and the move distribution to learn.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub board: BoardEncoding,
    pub choice: [f32; MOVE_COUNT],
}

impl TrainingExample {
    /// Example whose distribution puts all mass on the chosen square.
    pub fn from_move(board: BoardEncoding, square: usize) -> Self {
        let mut choice = [0.0; MOVE_COUNT];
        choice[square] = 1.0;
        TrainingExample { board, choice }
    }

    /// The square with the highest target probability.
    pub fn chosen_move(&self) -> usize {
        self.choice
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            })
            .0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    #[test]
    fn test_try_from_rejects_wrong_length() {
        let err = BoardEncoding::try_from(&[0u8; 18][..]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed example: board encoding has 18 bytes, expected 19"
        );
    }

    #[test]
    fn test_one_hot_example() {
        let example = TrainingExample::from_move(GameState::initial().encode(), 4);
        assert_eq!(example.choice.iter().sum::<f32>(), 1.0);
        assert_eq!(example.choice[4], 1.0);
        assert_eq!(example.chosen_move(), 4);
    }

    #[test]
    fn test_display_shows_turn() {
        let state = GameState::initial().apply_move(0).unwrap();
        let text = state.encode().to_string();
        assert!(text.starts_with("|x| | |\n"));
        assert!(text.ends_with("o to move"));
    }
}
