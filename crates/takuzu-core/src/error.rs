use thiserror::Error;

use crate::validate::Axis;

/// Board codec and copy failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input is shorter than 4 characters or not a perfect square.
    #[error("bad string length")]
    BadLength,
    /// The input contains a character outside `{'0','1','.','O','I'}`.
    #[error("invalid char '{0}' in string")]
    InvalidChar(char),
    /// `copy_from` between boards of different sizes.
    #[error("sizes do not match")]
    SizeMismatch,
}

/// A rule violation found while validating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Three or more equal adjacent values in one line (rule R1).
    #[error("{axis} {index}: 3+ same values {value}")]
    ThreeAdjacent { axis: Axis, index: usize, value: u8 },
    /// More than size/2 occurrences of one value in one line (rule R2).
    #[error("{axis} {index}: too many {}", value_word(.value))]
    TooManyOfValue { axis: Axis, index: usize, value: u8 },
    /// Two identical fully-defined lines on the same axis (rule R3).
    #[error("duplicate {axis}s ({index})")]
    Duplicate { axis: Axis, index: usize },
}

fn value_word(value: &u8) -> &'static str {
    if *value == 0 {
        "zeroes"
    } else {
        "ones"
    }
}

/// Outcome signals of the recursive search.
///
/// `DeadEnd` and `Timeout` drive control flow inside the recursion and double
/// as the public error of a failed solve; `Invalid` carries the validation
/// error that killed a branch (or the input board itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    /// Both values of some branching cell lead to a contradiction.
    #[error("dead end")]
    DeadEnd,
    /// The search deadline expired.
    #[error("timeout")]
    Timeout,
    /// The board breaks one of the takuzu rules.
    #[error("the board looks wrong: {0}")]
    Invalid(#[from] ValidationError),
}

/// Puzzle generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// Board size must be even and at least 4.
    #[error("board size {0} should be an even value of at least 4")]
    BadSize(usize),
    /// The requested empty-cell ratios are out of order.
    #[error("min/max ratio incorrect ({min}/{max})")]
    BadRatio { min: u32, max: u32 },
    /// Random seeding hit the rollback cap before reaching the target ratio.
    #[error("could not fill up board")]
    CouldNotFill,
    /// Reduction kept failing until too many cells were removed.
    #[error("could not use current board")]
    CouldNotReduce,
    /// The underlying solver failed while checking a candidate board.
    #[error(transparent)]
    Solve(#[from] SolveError),
}
