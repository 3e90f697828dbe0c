//! Takuzu (Binairo) puzzle engine.
//!
//! A takuzu is an N×N grid of binary cells ruled by three constraints: no
//! three equal adjacent values in a line, exactly N/2 of each value per
//! completed line, and no two identical rows or columns.
//!
//! The crate provides the board model with its string codec ([`Board`]),
//! rule validation, a trivial single-line deducer, a recursive backtracking
//! solver with optional speculative parallel branching ([`Solver`]), and a
//! puzzle generator/reducer built on the solver's uniqueness oracle
//! ([`Generator`]).

mod board;
mod error;
mod generator;
mod solver;
mod validate;

pub use board::{Board, Cell};
pub use error::{GenerateError, ParseError, SolveError, ValidationError};
pub use generator::{generate_parallel, Generator, GeneratorConfig, Reduced};
pub use solver::{Enumeration, Solver, SolverConfig};
pub use validate::{count_range, Axis};
