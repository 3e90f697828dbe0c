//! Puzzle generation: random seeding, reduction, and parallel workers.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::{GenerateError, SolveError};
use crate::solver::{Solver, SolverConfig};

/// Configuration for puzzle generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Board side length; must be even and at least 4.
    pub size: usize,
    /// Restrict the uniqueness checks to the trivial deducer.
    pub simple: bool,
    /// Target percentage of undefined cells after random seeding (clamped to
    /// at least 40).
    pub min_ratio: u32,
    /// Percentage of undefined cells beyond which a candidate board is
    /// abandoned (clamped to at most 99).
    pub max_ratio: u32,
    /// Timeout of the whole-grid uniqueness check before reduction.
    pub build_timeout: Option<Duration>,
    /// Timeout of each per-cell uniqueness check during reduction.
    pub reduce_timeout: Option<Duration>,
    /// How many candidate boards to try before giving up.
    pub max_attempts: usize,
    /// Search tuning forwarded to the embedded solver.
    pub solver: SolverConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: 6,
            simple: false,
            min_ratio: 55,
            max_ratio: 62,
            build_timeout: Some(Duration::from_secs(5 * 60)),
            reduce_timeout: Some(Duration::from_secs(20 * 60)),
            max_attempts: 100,
            solver: SolverConfig::default(),
        }
    }
}

/// A reduced puzzle plus a flag recording whether its uniqueness was fully
/// verified.
#[derive(Debug, Clone)]
pub struct Reduced {
    pub board: Board,
    /// The initial uniqueness check timed out and the reduction continued
    /// from a possibly incomplete solution set.
    pub unverified: bool,
}

/// Takuzu puzzle generator.
pub struct Generator {
    config: GeneratorConfig,
    solver: Solver,
    rng: StdRng,
}

impl Generator {
    /// Create a generator seeded from system entropy.
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        Self::build(config, StdRng::from_entropy())
    }

    /// Create a generator with a fixed seed, for reproducible output.
    pub fn with_seed(config: GeneratorConfig, seed: u64) -> Result<Self, GenerateError> {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(mut config: GeneratorConfig, rng: StdRng) -> Result<Self, GenerateError> {
        if config.size < 4 || config.size % 2 != 0 {
            return Err(GenerateError::BadSize(config.size));
        }
        config.min_ratio = config.min_ratio.max(40);
        if config.min_ratio > config.max_ratio {
            return Err(GenerateError::BadRatio {
                min: config.min_ratio,
                max: config.max_ratio,
            });
        }
        config.max_ratio = config.max_ratio.min(99);
        let solver = Solver::with_config(config.solver);
        Ok(Self {
            config,
            solver,
            rng,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a new puzzle with a unique solution, retrying from scratch on
    /// failure up to `max_attempts` times.
    pub fn generate(&mut self) -> Result<Board, GenerateError> {
        let mut last_err = GenerateError::CouldNotFill;
        for attempt in 1..=self.config.max_attempts.max(1) {
            match self.build_board() {
                Ok(board) => return Ok(board),
                Err(err) => {
                    debug!("generate: attempt {attempt} failed: {err}");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    /// Build one candidate board: random seeding down to the target ratio,
    /// then reduction to a uniquely solvable puzzle.
    fn build_board(&mut self) -> Result<Board, GenerateError> {
        let size = self.config.size;
        let cell_count = size * size;
        let mut board = Board::new(size);

        debug!("filling new board ({size}x{size})");
        let target = cell_count * self.config.min_ratio as usize / 100;
        let mut open: Vec<(usize, usize)> = (0..cell_count)
            .map(|i| (i / size, i % size))
            .collect();
        let mut rollbacks = 0;

        while open.len() > target {
            let pick = self.rng.gen_range(0..open.len());
            let (row, col) = open[pick];
            let bit = self.rng.gen_range(0..=1u8);
            board.set(row, col, Some(bit));

            let acceptable = board.validate().is_ok() && {
                let mut probe = board.clone();
                self.solver.try_solve_trivial(&mut probe).is_ok()
            };
            if acceptable {
                open.swap_remove(pick);
                continue;
            }

            board.set(row, col, None);
            rollbacks += 1;
            if rollbacks > 2 * cell_count {
                debug!("could not fill up board");
                return Err(GenerateError::CouldNotFill);
            }
        }

        // Reduce; on failure remove a few more cells and retry until the
        // board gets too empty to be worth keeping.
        let removal_step = (cell_count / 150).max(1);
        loop {
            let empty = board.undefined_count();
            let percent = empty * 100 / cell_count;
            debug!("empty cells: {empty} ({percent}%)");
            if percent > self.config.max_ratio as usize {
                debug!("too many empty cells; giving up on this board");
                return Err(GenerateError::CouldNotReduce);
            }
            match self.reduce_board(board.clone(), self.config.simple) {
                Ok(reduced) => return Ok(reduced.board),
                Err(err @ GenerateError::Solve(SolveError::Timeout)) => {
                    debug!("uniqueness check timed out; giving up on this board");
                    return Err(err);
                }
                Err(err) => debug!("could not use this grid: {err}"),
            }
            self.remove_random_cells(&mut board, removal_step);
        }
    }

    /// Randomly remove as many cells as possible while the puzzle keeps a
    /// unique solution.
    ///
    /// The input is expected to be solvable; when it admits several
    /// solutions, one of them is picked at random and reduced instead. With
    /// `trivial_only`, a clear is kept only when the trivial deducer alone
    /// still completes the board.
    pub fn reduce_board(
        &mut self,
        mut board: Board,
        trivial_only: bool,
    ) -> Result<Reduced, GenerateError> {
        debug!("reduce: checking for all grid solutions");
        let enumeration = self
            .solver
            .solve_all(&board, self.config.build_timeout)?;
        let count = enumeration.solutions.len();
        let unverified = enumeration.timed_out;
        if unverified {
            warn!("reduce: uniqueness check timed out ({count} solution(s) found); going on anyway");
        }
        debug!("reduce: {count} solution(s) found");
        match count {
            0 => return Err(GenerateError::Solve(SolveError::DeadEnd)),
            1 => {}
            _ => {
                debug!("reduce: picking one solution randomly");
                let pick = self.rng.gen_range(0..count);
                board = enumeration.solutions[pick].clone();
            }
        }

        debug!("reduce: grid reduction");
        let mut positions = board.defined_positions();
        positions.shuffle(&mut self.rng);
        let mut digits_left = 0;
        for (row, col) in positions {
            let saved = board.get(row, col);
            board.set(row, col, None);

            let still_unique = if trivial_only {
                let mut probe = board.clone();
                matches!(self.solver.try_solve_trivial(&mut probe), Ok(true))
            } else {
                matches!(
                    self.solver
                        .has_unique_solution(&board, self.config.reduce_timeout),
                    Ok(true)
                )
            };

            if !still_unique {
                board.set(row, col, saved.value());
                digits_left += 1;
            }
        }
        debug!("reduce: {digits_left} digits left");

        Ok(Reduced { board, unverified })
    }

    /// Clear up to `count` random defined cells.
    fn remove_random_cells(&mut self, board: &mut Board, count: usize) {
        let mut positions = board.defined_positions();
        for _ in 0..count {
            if positions.is_empty() {
                return;
            }
            let pick = self.rng.gen_range(0..positions.len());
            let (row, col) = positions.swap_remove(pick);
            board.set(row, col, None);
        }
    }
}

/// Run several generator workers in parallel and return the first board
/// produced; the remaining workers are abandoned.
pub fn generate_parallel(
    config: GeneratorConfig,
    workers: usize,
) -> Result<Board, GenerateError> {
    if workers <= 1 {
        return Generator::new(config)?.generate();
    }

    // Validate once up front so a bad configuration fails fast instead of in
    // every worker.
    let _ = Generator::new(config.clone())?;

    let (tx, rx) = mpsc::channel();
    for id in 0..workers {
        let tx = tx.clone();
        let config = config.clone();
        thread::spawn(move || {
            let result = Generator::new(config).and_then(|mut g| g.generate());
            match &result {
                Ok(_) => info!("worker #{id} done"),
                Err(err) => debug!("worker #{id} failed: {err}"),
            }
            let _ = tx.send(result);
        });
    }
    drop(tx);

    let mut last_err = GenerateError::CouldNotFill;
    for result in rx {
        match result {
            Ok(board) => return Ok(board),
            Err(err) => last_err = err,
        }
    }
    Err(last_err)
}
