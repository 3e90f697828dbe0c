//! Trivial deduction: single-line tactics applied to a fixpoint.

use log::trace;

use crate::board::Board;
use crate::error::ValidationError;
use crate::validate::count_range;

/// Complete row `row` and column `col` where one value already has all its
/// size/2 occurrences: every remaining undefined cell of that line gets the
/// opposite value.
pub(crate) fn fill_line_column(board: &mut Board, row: usize, col: usize) {
    fill_row(board, row);
    fill_col(board, col);
}

fn fill_row(board: &mut Board, row: usize) {
    let (full, n0, n1) = count_range(board.row(row));
    if full {
        return;
    }
    let half = board.size() / 2;
    let fill = if n0 == half {
        1
    } else if n1 == half {
        0
    } else {
        return;
    };
    for col in 0..board.size() {
        if !board.get(row, col).is_defined() {
            board.set(row, col, Some(fill));
        }
    }
}

fn fill_col(board: &mut Board, col: usize) {
    let (full, n0, n1) = count_range(&board.col(col));
    if full {
        return;
    }
    let half = board.size() / 2;
    let fill = if n0 == half {
        1
    } else if n1 == half {
        0
    } else {
        return;
    };
    for row in 0..board.size() {
        if !board.get(row, col).is_defined() {
            board.set(row, col, Some(fill));
        }
    }
}

/// Try to force the cell at (row, col) from its own row and column alone.
///
/// A defined cell returns its value. Otherwise each candidate value is
/// played on a throwaway clone, the two lines are completed, and a rule
/// violation refutes the candidate, forcing the other value. Returns `None`
/// when neither value is refuted.
pub(crate) fn guess_pos(board: &Board, row: usize, col: usize) -> Option<u8> {
    if let Some(v) = board.get(row, col).value() {
        return Some(v);
    }

    for (candidate, forced) in [(0u8, 1u8), (1u8, 0u8)] {
        let mut probe = board.clone();
        probe.set(row, col, Some(candidate));
        fill_line_column(&mut probe, row, col);
        if probe.check_row(row).is_err() || probe.check_col(col).is_err() {
            return Some(forced);
        }
    }
    None
}

/// One sweep over the board, committing every cell `guess_pos` can force.
/// Returns whether anything was set.
pub(crate) fn trivial_pass(board: &mut Board) -> bool {
    let mut changed = false;
    for row in 0..board.size() {
        for col in 0..board.size() {
            if board.get(row, col).is_defined() {
                continue;
            }
            if let Some(value) = guess_pos(board, row, col) {
                board.set(row, col, Some(value));
                trace!("trivial: setting [{row},{col}] to {value}");
                changed = true;
            }
        }
    }
    changed
}

/// Run trivial passes to a fixpoint, then validate the whole board.
/// `Ok(true)` means the board is complete (and valid).
pub(crate) fn try_solve_trivial(board: &mut Board) -> Result<bool, ValidationError> {
    while trivial_pass(board) {}
    board.validate()
}

/// The first cell (row-major) a trivial method can force, with its value.
pub(crate) fn trivial_hint(board: &Board) -> Option<(usize, usize, u8)> {
    for row in 0..board.size() {
        for col in 0..board.size() {
            if board.get(row, col).is_defined() {
                continue;
            }
            if let Some(value) = guess_pos(board, row, col) {
                return Some((row, col, value));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_line_column_completes_half_filled_row() {
        // Row 0 already has both zeroes; the rest must be ones.
        let mut board = Board::from_string("01.0............").unwrap();
        fill_line_column(&mut board, 0, 0);
        assert_eq!(board.row(0).iter().map(|c| c.to_char()).collect::<String>(), "0110");
    }

    #[test]
    fn fill_line_column_completes_half_filled_column() {
        let mut board = Board::new(4);
        board.set(0, 1, Some(1));
        board.set(2, 1, Some(1));
        fill_line_column(&mut board, 0, 1);
        let col: String = board.col(1).iter().map(|c| c.to_char()).collect();
        assert_eq!(col, "1010");
    }

    #[test]
    fn fill_line_column_leaves_undecided_lines_alone() {
        let mut board = Board::from_string("0...............").unwrap();
        fill_line_column(&mut board, 0, 0);
        assert_eq!(board.to_string(), "0...............");
    }

    #[test]
    fn guess_pos_blocks_three_in_a_row() {
        // Playing a 1 at (0,2) would make three ones; the cell is forced to 0.
        let mut board = Board::new(4);
        board.set(0, 0, Some(1));
        board.set(0, 1, Some(1));
        assert_eq!(guess_pos(&board, 0, 2), Some(0));
    }

    #[test]
    fn guess_pos_respects_defined_cells() {
        let board = Board::from_string("0110.10.1..0.0.1").unwrap();
        assert_eq!(guess_pos(&board, 0, 0), Some(0));
        assert_eq!(guess_pos(&board, 0, 1), Some(1));
    }

    #[test]
    fn guess_pos_unknown_on_open_board() {
        let board = Board::new(4);
        assert_eq!(guess_pos(&board, 1, 1), None);
    }

    #[test]
    fn guess_pos_sees_line_completion_composition() {
        // Row 0 holds both zeroes already. Completing it after playing a 0 at
        // (0,3) overflows the row, so the cell is forced to 1.
        let board = Board::from_string("0.0.............").unwrap();
        assert_eq!(guess_pos(&board, 0, 1), Some(1));
        assert_eq!(guess_pos(&board, 0, 3), Some(1));
    }

    #[test]
    fn trivial_pass_commits_deductions() {
        let mut board = Board::new(4);
        board.set(0, 0, Some(1));
        board.set(0, 1, Some(1));
        assert!(trivial_pass(&mut board));
        assert_eq!(board.get(0, 2).value(), Some(0));
    }

    #[test]
    fn trivial_solves_a_near_complete_board() {
        let solution = "011001010110101100001011110010100101";
        let mut board = Board::from_string(solution).unwrap();
        board.set(0, 0, None);
        board.set(3, 4, None);
        let mut work = board.clone();
        assert_eq!(try_solve_trivial(&mut work), Ok(true));
        assert_eq!(work.to_string(), solution);
    }

    #[test]
    fn trivial_fixpoint_is_idempotent() {
        let mut board =
            Board::from_string("......0....0..1.......1.1.00..1.....").unwrap();
        let first = try_solve_trivial(&mut board);
        let after_one = board.clone();
        let second = try_solve_trivial(&mut board);
        assert_eq!(first, second);
        assert_eq!(board, after_one);
    }

    #[test]
    fn trivial_deductions_stay_sound() {
        // Every committed cell keeps the board valid.
        let mut board =
            Board::from_string("......0....0..1.......1.1.00..1.....").unwrap();
        assert!(board.validate().is_ok());
        let full = try_solve_trivial(&mut board).unwrap();
        assert!(!full);
        // The deduced cells must agree with the unique solution.
        let solution =
            Board::from_string("011001010110101100001011110010100101").unwrap();
        assert!(board.matches(&solution, true));
    }

    #[test]
    fn trivial_fixpoint_reports_broken_boards() {
        let mut board = Board::from_string("......111...........................").unwrap();
        assert!(try_solve_trivial(&mut board).is_err());
    }

    #[test]
    fn hint_finds_first_forced_cell() {
        let mut board = Board::new(4);
        board.set(2, 0, Some(1));
        board.set(2, 1, Some(1));
        assert_eq!(trivial_hint(&board), Some((2, 2, 0)));
    }

    #[test]
    fn hint_none_when_stuck() {
        assert_eq!(trivial_hint(&Board::new(4)), None);
    }
}
