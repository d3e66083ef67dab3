pub const SQUARES: usize = 9;

/// Every winning line on the 3x3 board, as square indices (row-major).
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    X,
    O,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; SQUARES],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [Cell::Empty; SQUARES],
        }
    }

    /// Get the cell at a square index (0 = top-left, 8 = bottom-right)
    pub fn get(&self, square: usize) -> Cell {
        self.cells[square]
    }

    pub fn is_empty_at(&self, square: usize) -> bool {
        square < SQUARES && self.cells[square] == Cell::Empty
    }

    /// Place a piece. The caller checks that the square is empty.
    pub(crate) fn set(&mut self, square: usize, cell: Cell) {
        self.cells[square] = cell;
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != Cell::Empty)
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Check if the piece just placed at `square` completes a line.
    pub fn check_win(&self, square: usize) -> bool {
        let cell = self.cells[square];
        if cell == Cell::Empty {
            return false;
        }
        LINES
            .iter()
            .filter(|line| line.contains(&square))
            .any(|line| line.iter().all(|&i| self.cells[i] == cell))
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(cell: Cell, squares: &[usize]) -> Board {
        let mut board = Board::new();
        for &sq in squares {
            board.set(sq, cell);
        }
        board
    }

    #[test]
    fn test_row_col_and_diagonals_win() {
        assert!(board_with(Cell::X, &[3, 4, 5]).check_win(4));
        assert!(board_with(Cell::O, &[1, 4, 7]).check_win(1));
        assert!(board_with(Cell::X, &[0, 4, 8]).check_win(8));
        assert!(board_with(Cell::O, &[2, 4, 6]).check_win(6));
    }

    #[test]
    fn test_no_win_for_broken_line() {
        let mut board = board_with(Cell::X, &[0, 1]);
        board.set(2, Cell::O);
        assert!(!board.check_win(0));
        assert!(!board.check_win(2));
    }

    #[test]
    fn test_empty_square_never_wins() {
        assert!(!Board::new().check_win(4));
    }

    #[test]
    fn test_is_full() {
        let mut board = Board::new();
        assert!(!board.is_full());
        for sq in 0..SQUARES {
            board.set(sq, if sq % 2 == 0 { Cell::X } else { Cell::O });
        }
        assert!(board.is_full());
        assert_eq!(board.count(Cell::X), 5);
    }
}
