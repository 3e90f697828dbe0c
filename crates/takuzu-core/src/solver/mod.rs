//! Solver façade.
//!
//! Dispatches between the trivial deducer (single-line tactics iterated to a
//! fixpoint) and the recursive backtracking search, in first-solution or
//! enumerate-all mode.

mod recurse;
mod trivial;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::{SolveError, ValidationError};

/// Search tuning carried by a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Recursion depth down to which both values of a branching cell are
    /// explored on concurrent tasks. 0 disables speculative branching.
    pub speculative_depth: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            speculative_depth: 0,
        }
    }
}

/// Result of an enumerate-all search.
#[derive(Debug, Clone)]
pub struct Enumeration {
    /// Every distinct full solution found, in unspecified order.
    pub solutions: Vec<Board>,
    /// The deadline expired after at least one solution had been collected;
    /// the set may be incomplete.
    pub timed_out: bool,
}

/// Stateless solver; all search state is per-call.
pub struct Solver {
    config: SolverConfig,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    /// Run the trivial deducer to a fixpoint, mutating `board` in place.
    /// `Ok(true)` means the board is complete and valid.
    pub fn try_solve_trivial(&self, board: &mut Board) -> Result<bool, ValidationError> {
        trivial::try_solve_trivial(board)
    }

    /// The first cell a trivial method can force, with its value.
    pub fn trivial_hint(&self, board: &Board) -> Option<(usize, usize, u8)> {
        trivial::trivial_hint(board)
    }

    /// Find one solution extending `board`.
    pub fn solve(
        &self,
        board: &Board,
        timeout: Option<Duration>,
    ) -> Result<Board, SolveError> {
        let search = recurse::Search::new(self.config.speculative_depth, false, timeout);
        recurse::recurse_solve(&search, 0, board.clone())?;
        let (first, _) = recurse::Search::finish(search);
        first.ok_or(SolveError::DeadEnd)
    }

    /// Enumerate every distinct solution extending `board`.
    ///
    /// A timeout with no solution collected is an error; a timeout after at
    /// least one solution returns the partial set with
    /// [`Enumeration::timed_out`] set. An exhausted search with no solution
    /// returns an empty set.
    pub fn solve_all(
        &self,
        board: &Board,
        timeout: Option<Duration>,
    ) -> Result<Enumeration, SolveError> {
        let search = recurse::Search::new(self.config.speculative_depth, true, timeout);
        let outcome = recurse::recurse_solve(&search, 0, board.clone());
        let (_, solutions) = recurse::Search::finish(search);
        match outcome {
            Ok(()) | Err(SolveError::DeadEnd) => Ok(Enumeration {
                solutions,
                timed_out: false,
            }),
            Err(SolveError::Timeout) if !solutions.is_empty() => Ok(Enumeration {
                solutions,
                timed_out: true,
            }),
            Err(err) => Err(err),
        }
    }

    /// Whether `board` has exactly one solution. A timeout (even with a
    /// partial solution set) means uniqueness cannot be proven and is
    /// reported as an error.
    pub fn has_unique_solution(
        &self,
        board: &Board,
        timeout: Option<Duration>,
    ) -> Result<bool, SolveError> {
        let enumeration = self.solve_all(board, timeout)?;
        if enumeration.timed_out {
            return Err(SolveError::Timeout);
        }
        Ok(enumeration.solutions.len() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const PUZZLE_6X6: &str = "......0....0..1.......1.1.00..1.....";
    const SOLUTION_6X6: &str = "011001010110101100001011110010100101";

    #[test]
    fn solve_finds_the_known_solution() {
        let board = Board::from_string(PUZZLE_6X6).unwrap();
        let solver = Solver::new();
        let solution = solver.solve(&board, None).unwrap();
        assert_eq!(solution.to_string(), SOLUTION_6X6);
    }

    #[test]
    fn solve_speculative_matches_sequential() {
        let board = Board::from_string(PUZZLE_6X6).unwrap();
        let solver = Solver::with_config(SolverConfig {
            speculative_depth: 2,
        });
        let solution = solver.solve(&board, None).unwrap();
        assert_eq!(solution.to_string(), SOLUTION_6X6);
    }

    #[test]
    fn solve_preserves_the_input_cells() {
        let board = Board::from_string(PUZZLE_6X6).unwrap();
        let solution = Solver::new().solve(&board, None).unwrap();
        assert!(board.matches(&solution, true));
        assert!(solution.is_full());
    }

    #[test]
    fn solve_rejects_a_broken_board() {
        // Three adjacent ones: the root branch dies on validation.
        let board = Board::from_string("......111...........................").unwrap();
        let result = Solver::new().solve(&board, None);
        assert!(matches!(
            result,
            Err(SolveError::Invalid(_)) | Err(SolveError::DeadEnd)
        ));
    }

    #[test]
    fn solve_small_board_succeeds_or_dead_ends() {
        // 4x4 boards are legal; the solver must never hand back an invalid
        // board.
        let board = Board::from_string("000.1..11..0.1.1").unwrap();
        match Solver::new().solve(&board, None) {
            Ok(solution) => {
                assert!(solution.is_full());
                assert!(solution.validate().is_ok());
                assert!(board.matches(&solution, true));
            }
            Err(err) => assert!(matches!(
                err,
                SolveError::DeadEnd | SolveError::Invalid(_)
            )),
        }
    }

    #[test]
    fn solve_all_unique_puzzle_yields_one_solution() {
        let board = Board::from_string(PUZZLE_6X6).unwrap();
        let enumeration = Solver::new().solve_all(&board, None).unwrap();
        assert!(!enumeration.timed_out);
        assert_eq!(enumeration.solutions.len(), 1);
        assert_eq!(enumeration.solutions[0].to_string(), SOLUTION_6X6);
    }

    #[test]
    fn solve_all_counts_every_4x4_grid() {
        // The empty 4x4 board has exactly 72 distinct solutions.
        let enumeration = Solver::new().solve_all(&Board::new(4), None).unwrap();
        assert_eq!(enumeration.solutions.len(), 72);
        for solution in &enumeration.solutions {
            assert!(solution.is_full());
            assert_eq!(solution.validate(), Ok(true));
        }
    }

    #[test]
    fn solve_all_deduplicates_and_extends() {
        // Dropping one clue from the 6x6 puzzle opens it up to 9 solutions.
        let mut board = Board::from_string(PUZZLE_6X6).unwrap();
        board.set(1, 0, None);
        let enumeration = Solver::new().solve_all(&board, None).unwrap();
        assert_eq!(enumeration.solutions.len(), 9);

        let encodings: HashSet<String> = enumeration
            .solutions
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(encodings.len(), enumeration.solutions.len());
        for solution in &enumeration.solutions {
            assert_eq!(solution.validate(), Ok(true));
            assert!(board.matches(solution, true));
        }
    }

    #[test]
    fn solve_all_speculative_finds_the_same_set() {
        let solver = Solver::with_config(SolverConfig {
            speculative_depth: 3,
        });
        let enumeration = solver.solve_all(&Board::new(4), None).unwrap();
        assert_eq!(enumeration.solutions.len(), 72);
    }

    #[test]
    fn solve_all_two_solution_puzzle() {
        let board = Board::from_string(".0.101011010.1.0").unwrap();
        let enumeration = Solver::new().solve_all(&board, None).unwrap();
        let mut encodings: Vec<String> = enumeration
            .solutions
            .iter()
            .map(|s| s.to_string())
            .collect();
        encodings.sort();
        assert_eq!(
            encodings,
            vec![
                "0011010110101100".to_string(),
                "1001010110100110".to_string()
            ]
        );
    }

    #[test]
    fn solve_all_empty_set_on_contradiction() {
        let board = Board::from_string("......111...........................").unwrap();
        let result = Solver::new().solve_all(&board, None);
        assert!(matches!(result, Err(SolveError::Invalid(_))));
    }

    #[test]
    fn timeout_surfaces() {
        // An exhaustive enumeration of a 10x10 board cannot finish within a
        // millisecond.
        let solver = Solver::new();
        let result = solver.solve_all(&Board::new(10), Some(Duration::from_millis(1)));
        match result {
            Err(SolveError::Timeout) => {}
            Ok(enumeration) => assert!(enumeration.timed_out),
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn has_unique_solution_oracle() {
        let solver = Solver::new();
        let unique = Board::from_string(PUZZLE_6X6).unwrap();
        assert_eq!(solver.has_unique_solution(&unique, None), Ok(true));

        let ambiguous = Board::from_string(".0.101011010.1.0").unwrap();
        assert_eq!(solver.has_unique_solution(&ambiguous, None), Ok(false));
    }

    #[test]
    fn trivial_mode_is_exposed() {
        let mut board = Board::from_string(SOLUTION_6X6).unwrap();
        board.set(0, 0, None);
        let solver = Solver::new();
        assert_eq!(solver.try_solve_trivial(&mut board), Ok(true));
        assert_eq!(board.to_string(), SOLUTION_6X6);
        assert!(solver.trivial_hint(&board).is_none());
    }
}
