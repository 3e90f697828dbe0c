//! Recursive backtracking search with optional speculative branching.
//!
//! Each node owns its board. Children always work on clones and report back
//! through a channel (speculative mode) or an ordinary return value
//! (sequential mode); the only shared mutable state is the solution
//! accumulator behind a mutex.

use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::board::Board;
use crate::error::SolveError;

use super::trivial;

/// Shared state of one top-level search.
pub(crate) struct Search {
    speculative_depth: u32,
    enumerate_all: bool,
    deadline: Option<Instant>,
    solutions: Mutex<SolutionSet>,
}

/// Solutions found so far, deduplicated by their codec string.
#[derive(Default)]
struct SolutionSet {
    first: Option<Board>,
    by_encoding: HashMap<String, Board>,
}

impl Search {
    pub(crate) fn new(
        speculative_depth: u32,
        enumerate_all: bool,
        timeout: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Search {
            speculative_depth,
            enumerate_all,
            deadline: timeout.map(|t| Instant::now() + t),
            solutions: Mutex::new(SolutionSet::default()),
        })
    }

    fn record(&self, board: &Board) {
        let mut set = self.solutions.lock().unwrap();
        if set.first.is_none() {
            set.first = Some(board.clone());
        }
        if self.enumerate_all {
            set.by_encoding
                .entry(board.to_string())
                .or_insert_with(|| board.clone());
        }
    }

    fn expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() > d)
    }

    /// Tear the search down and hand back the first solution plus the
    /// deduplicated solution set.
    pub(crate) fn finish(search: Arc<Self>) -> (Option<Board>, Vec<Board>) {
        match Arc::try_unwrap(search) {
            Ok(owned) => {
                let set = owned.solutions.into_inner().unwrap();
                (set.first, set.by_encoding.into_values().collect())
            }
            // A speculative task may still hold its handle for a moment
            // after reporting; fall back to copying out of the lock.
            Err(shared) => {
                let set = shared.solutions.lock().unwrap();
                (
                    set.first.clone(),
                    set.by_encoding.values().cloned().collect(),
                )
            }
        }
    }
}

/// One branch result: the value that was played and how the subtree ended.
type BranchReport = (u8, Result<(), SolveError>);

/// Solve `board` recursively. `Ok(())` means the subtree was explored without
/// a failure and any solutions were recorded on `search`.
pub(crate) fn recurse_solve(
    search: &Arc<Search>,
    level: u32,
    mut board: Board,
) -> Result<(), SolveError> {
    loop {
        // Trivial deduction first; a validation failure kills the branch.
        let full = trivial::try_solve_trivial(&mut board).map_err(SolveError::Invalid)?;
        if full {
            trace!("{{{level}}} board is correct and complete");
            search.record(&board);
            return Ok(());
        }

        let Some((row, col)) = board.first_undefined() else {
            break;
        };
        trace!("{{{level}}} guess: trying values for [{row},{col}]");

        if level < search.speculative_depth {
            explore_speculative(search, level, &mut board, row, col)?;
            // A speculative node never continues after its branching cycle.
            break;
        }

        let mut err_count = 0;
        let mut changed = false;
        for test_value in [0u8, 1u8] {
            if !search.enumerate_all && board.get(row, col).is_defined() {
                // A failed sibling already forced this cell.
                break;
            }
            let mut child = board.clone();
            child.set(row, col, Some(test_value));
            match recurse_solve(search, level + 1, child) {
                Ok(()) => {
                    if !search.enumerate_all {
                        return Ok(());
                    }
                }
                Err(failure) => {
                    collect_failure(
                        search, level, &mut board, row, col, test_value, failure,
                        &mut err_count, &mut changed,
                    )?;
                }
            }
            if changed && !search.enumerate_all {
                break;
            }
        }

        if err_count == 2 {
            trace!("{{{level}}} both values failed");
            return Err(SolveError::DeadEnd);
        }
        if search.enumerate_all || !changed {
            break;
        }
        // Otherwise a forced value was committed; run the deduction loop
        // again on the updated board.
    }

    let full = board.validate().map_err(SolveError::Invalid)?;
    if full {
        search.record(&board);
    }
    Ok(())
}

/// Explore both values of the branching cell on concurrent tasks.
///
/// Both results are always drained. In first-solution mode the first
/// successful child wins and the sibling's result is discarded; the parent
/// performs no further state change of its own.
fn explore_speculative(
    search: &Arc<Search>,
    level: u32,
    board: &mut Board,
    row: usize,
    col: usize,
) -> Result<(), SolveError> {
    let (tx, rx) = mpsc::channel::<BranchReport>();
    for test_value in [0u8, 1u8] {
        let tx = tx.clone();
        let search = Arc::clone(search);
        let mut child = board.clone();
        child.set(row, col, Some(test_value));
        thread::spawn(move || {
            let result = recurse_solve(&search, level + 1, child);
            // The parent may already be gone after an early return.
            let _ = tx.send((test_value, result));
        });
    }
    drop(tx);

    let mut err_count = 0;
    let mut changed = false;
    let mut pending = 2;
    while pending > 0 {
        let (value, result) = rx.recv().expect("solver branch disappeared");
        pending -= 1;
        trace!("{{{level}}} speculative result for [{row},{col}]={value}: {result:?}");
        match result {
            Ok(()) => {
                if !search.enumerate_all {
                    drain(&rx, pending);
                    return Ok(());
                }
            }
            Err(failure) => {
                let outcome = collect_failure(
                    search, level, board, row, col, value, failure,
                    &mut err_count, &mut changed,
                );
                if let Err(err) = outcome {
                    drain(&rx, pending);
                    return Err(err);
                }
            }
        }
    }

    if err_count == 2 {
        trace!("{{{level}}} both speculative values failed");
        return Err(SolveError::DeadEnd);
    }
    Ok(())
}

/// Handle one failed child branch: propagate timeouts (turning a dead branch
/// into a timeout once the deadline has passed, below the top levels) or
/// force the sibling value into the parent board.
#[allow(clippy::too_many_arguments)]
fn collect_failure(
    search: &Arc<Search>,
    level: u32,
    board: &mut Board,
    row: usize,
    col: usize,
    value: u8,
    failure: SolveError,
    err_count: &mut u32,
    changed: &mut bool,
) -> Result<(), SolveError> {
    if matches!(failure, SolveError::Timeout) {
        trace!("{{{level}}} timeout propagation");
        return Err(SolveError::Timeout);
    }
    if level > 2 && search.expired() {
        debug!("{{{level}}} timeout, giving up");
        return Err(SolveError::Timeout);
    }
    trace!("{{{level}}} bad outcome ({failure}); forcing [{row},{col}] to {}", 1 - value);
    *err_count += 1;
    board.set(row, col, Some(1 - value));
    *changed = true;
    Ok(())
}

fn drain(rx: &mpsc::Receiver<BranchReport>, mut pending: u32) {
    while pending > 0 {
        let _ = rx.recv();
        pending -= 1;
    }
}
