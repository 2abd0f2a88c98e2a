//! Pure functions over a board: win lines, legal moves, terminal checks.
//! The controller and both agents go through these and nothing else.

use crate::board::{Board, Cell, GameStatus, CELLS, SIDE};
use crate::players::Mark;

/// Rows, columns, then the two diagonals.
pub const WIN_COMBINATIONS: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Empty cells in ascending index order.
pub fn legal_moves(board: &Board) -> Vec<usize> {
    (0..CELLS).filter(|&i| board.cell(i) == Cell::Empty).collect()
}

pub fn winner(board: &Board) -> Option<Mark> {
    WIN_COMBINATIONS.iter().find_map(|&[a, b, c]| match board.cell(a) {
        Cell::Marked(mark) if board.cell(b) == Cell::Marked(mark) && board.cell(c) == Cell::Marked(mark) => {
            Some(mark)
        }
        _ => None,
    })
}

pub fn is_full(board: &Board) -> bool {
    board.iter().all(|&c| c != Cell::Empty)
}

pub fn is_draw(board: &Board) -> bool {
    is_full(board) && winner(board).is_none()
}

pub fn is_terminal(board: &Board) -> bool {
    winner(board).is_some() || is_draw(board)
}

pub fn status(board: &Board) -> GameStatus {
    match winner(board) {
        Some(mark) => GameStatus::Won(mark),
        None if is_full(board) => GameStatus::Drawn,
        None => GameStatus::InProgress,
    }
}

/// Flat index for a `(row, col)` pair, `None` when off the board.
pub fn index_of(row: usize, col: usize) -> Option<usize> {
    (row < SIDE && col < SIDE).then_some(row * SIDE + col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::StateKey;

    fn board(s: &str) -> Board {
        Board::from(&s.parse::<StateKey>().unwrap())
    }

    #[test]
    fn every_line_wins() {
        for line in WIN_COMBINATIONS {
            let mut b = Board::new();
            line.iter().for_each(|&i| b.set(i, Mark::Nought));
            assert_eq!(winner(&b), Some(Mark::Nought), "line {line:?}");
            assert!(is_terminal(&b));
            assert!(!is_draw(&b));
        }
    }

    #[test]
    fn legal_moves_are_ascending_empties() {
        assert_eq!(legal_moves(&board("X-O-X-O--")), vec![1, 3, 5, 7, 8]);
        assert_eq!(legal_moves(&Board::new()), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let b = board("XOXXOOOXX");
        assert_eq!(winner(&b), None);
        assert!(is_draw(&b));
        assert!(is_terminal(&b));
        assert_eq!(status(&b), GameStatus::Drawn);
    }

    #[test]
    fn full_board_with_line_is_a_win_not_a_draw() {
        let b = board("XXXOOXXOO");
        assert_eq!(status(&b), GameStatus::Won(Mark::Cross));
        assert!(!is_draw(&b));
    }

    #[test]
    fn open_board_is_in_progress() {
        let b = board("XX--O---O");
        assert_eq!(status(&b), GameStatus::InProgress);
        assert!(!is_terminal(&b));
    }

    #[test]
    fn row_col_mapping() {
        assert_eq!(index_of(0, 0), Some(0));
        assert_eq!(index_of(2, 1), Some(7));
        assert_eq!(index_of(3, 0), None);
        assert_eq!(index_of(1, 3), None);
    }
}
