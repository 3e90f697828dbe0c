//! Command-line driver for the takuzu puzzle engine.
//!
//! Loads or generates a board, then solves, reduces, or enumerates it.
//! Exit codes: 0 success, 1 runtime error, 2 no solution, 3 multiple
//! solutions in `--all` mode, 255 no board could be produced.

use std::env;
use std::process;
use std::time::Duration;

use log::{error, info, warn, LevelFilter};
use takuzu_core::{
    generate_parallel, Board, Generator, GeneratorConfig, SolveError, Solver, SolverConfig,
};

const USAGE: &str = "\
Usage: takuzu [OPTIONS]

  --board STR            load a board from its string form
  --new N                generate a new board of side length N
  --reduce               reduce the loaded board
  --all                  look for all possible solutions
  --simple               only use trivial deductions
  --out                  also print the board string form
  --verbosity N          log verbosity (0-3)
  --workers N            parallel generator workers (default 1)
  --timeout DUR          solver timeout (default none)
  --build-timeout DUR    uniqueness-check timeout while reducing (default 5m)
  --reduce-timeout DUR   per-cell solver timeout while reducing (default 20m)
  --speculative-level N  parallel branching depth (default 0)
  --min-ratio N          generator empty-cell lower bound (default 55)
  --max-ratio N          generator empty-cell upper bound (default 62)

Durations are integers with an optional ms/s/m/h suffix; plain integers are
seconds and 0 disables the timeout.";

struct Options {
    verbosity: u32,
    simple: bool,
    out: bool,
    board: Option<String>,
    new_size: usize,
    reduce: bool,
    all: bool,
    workers: usize,
    timeout: Option<Duration>,
    build_timeout: Option<Duration>,
    reduce_timeout: Option<Duration>,
    speculative_level: u32,
    min_ratio: u32,
    max_ratio: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            verbosity: 0,
            simple: false,
            out: false,
            board: None,
            new_size: 0,
            reduce: false,
            all: false,
            workers: 1,
            timeout: None,
            build_timeout: Some(Duration::from_secs(5 * 60)),
            reduce_timeout: Some(Duration::from_secs(20 * 60)),
            speculative_level: 0,
            min_ratio: 55,
            max_ratio: 62,
        }
    }
}

fn main() {
    let opts = match parse_args(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("Error: {msg}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    let level = match opts.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    process::exit(run(&opts));
}

fn run(opts: &Options) -> i32 {
    let solver = Solver::with_config(SolverConfig {
        speculative_depth: opts.speculative_level,
    });

    let mut board = None;
    if let Some(text) = &opts.board {
        match Board::from_string(text) {
            Ok(loaded) => board = Some(loaded),
            Err(err) => eprintln!("Error: {err}"),
        }
    }

    if opts.new_size > 0 {
        let config = GeneratorConfig {
            size: opts.new_size,
            simple: opts.simple,
            min_ratio: opts.min_ratio,
            max_ratio: opts.max_ratio,
            build_timeout: opts.build_timeout,
            reduce_timeout: opts.reduce_timeout,
            solver: solver.config(),
            ..GeneratorConfig::default()
        };
        match generate_parallel(config, opts.workers.max(1)) {
            Ok(generated) => board = Some(generated),
            Err(err) => {
                error!("generation failed: {err}");
                board = None;
            }
        }
    }

    let Some(mut board) = board else {
        eprintln!("Could not create takuzu board.");
        return 255;
    };

    print!("{}", board.grid_string());
    println!();

    if opts.new_size > 0 {
        if opts.out {
            println!("{board}");
        }
        return 0;
    }

    if opts.reduce {
        let config = GeneratorConfig {
            size: board.size(),
            simple: opts.simple,
            build_timeout: opts.build_timeout,
            reduce_timeout: opts.reduce_timeout,
            solver: solver.config(),
            ..GeneratorConfig::default()
        };
        let mut generator = match Generator::new(config) {
            Ok(generator) => generator,
            Err(err) => {
                error!("{err}");
                return 1;
            }
        };
        let reduced = match generator.reduce_board(board, opts.simple) {
            Ok(reduced) => reduced,
            Err(err) => {
                error!("{err}");
                return 1;
            }
        };
        if reduced.unverified {
            warn!("uniqueness of the reduced board could not be fully verified");
        }
        print!("{}", reduced.board.grid_string());
        println!();
        if opts.out {
            println!("{}", reduced.board);
        }
        return 0;
    }

    if opts.simple {
        match solver.try_solve_trivial(&mut board) {
            Err(err) => {
                error!("{err}");
                return 1;
            }
            Ok(false) => {
                print!("{}", board.grid_string());
                println!();
                if opts.out {
                    println!("{board}");
                }
                info!("the takuzu could not be completed using trivial methods");
                return 2;
            }
            Ok(true) => {
                info!("the takuzu is correct and complete");
                print!("{}", board.grid_string());
                println!();
                if opts.out {
                    println!("{board}");
                }
                return 0;
            }
        }
    }

    if opts.all {
        let enumeration = match solver.solve_all(&board, opts.timeout) {
            Ok(enumeration) => enumeration,
            Err(err) => {
                info!("search failed: {err}");
                println!("No solution found.");
                return 2;
            }
        };
        if enumeration.timed_out {
            warn!("search timed out; the solution set may be incomplete");
        }
        info!("{} solution(s) found", enumeration.solutions.len());
        if enumeration.solutions.is_empty() {
            println!("No solution found.");
            return 2;
        }
        for solution in &enumeration.solutions {
            if opts.out {
                println!("{solution}");
            } else {
                print!("{}", solution.grid_string());
                println!();
            }
        }
        if enumeration.solutions.len() > 1 {
            return 3;
        }
        return 0;
    }

    match solver.solve(&board, opts.timeout) {
        Ok(solution) => {
            print!("{}", solution.grid_string());
            println!();
            if opts.out {
                println!("{solution}");
            }
            0
        }
        Err(SolveError::DeadEnd) => {
            println!("No solution found.");
            2
        }
        Err(err) => {
            error!("{err}");
            1
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut opts = Options::default();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| format!("option {name} needs a value"))
        };
        match arg.as_str() {
            "--simple" => opts.simple = true,
            "--out" => opts.out = true,
            "--reduce" => opts.reduce = true,
            "--all" => opts.all = true,
            "--verbosity" => opts.verbosity = parse_number(&value("--verbosity")?)?,
            "--board" => opts.board = Some(value("--board")?),
            "--new" => opts.new_size = parse_number(&value("--new")?)? as usize,
            "--workers" => opts.workers = parse_number(&value("--workers")?)? as usize,
            "--timeout" => opts.timeout = parse_duration(&value("--timeout")?)?,
            "--build-timeout" => {
                opts.build_timeout = parse_duration(&value("--build-timeout")?)?
            }
            "--reduce-timeout" => {
                opts.reduce_timeout = parse_duration(&value("--reduce-timeout")?)?
            }
            "--speculative-level" => {
                opts.speculative_level = parse_number(&value("--speculative-level")?)?
            }
            "--min-ratio" => opts.min_ratio = parse_number(&value("--min-ratio")?)?,
            "--max-ratio" => opts.max_ratio = parse_number(&value("--max-ratio")?)?,
            "--help" | "-h" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => return Err(format!("unknown option {other}")),
        }
    }
    Ok(opts)
}

fn parse_number(text: &str) -> Result<u32, String> {
    text.parse::<u32>()
        .map_err(|_| format!("invalid number '{text}'"))
}

/// Parse a duration: integer with optional ms/s/m/h suffix; a plain integer
/// is in seconds; 0 means "no timeout".
fn parse_duration(text: &str) -> Result<Option<Duration>, String> {
    let (number, scale) = if let Some(rest) = text.strip_suffix("ms") {
        (rest, Duration::from_millis(1))
    } else if let Some(rest) = text.strip_suffix('s') {
        (rest, Duration::from_secs(1))
    } else if let Some(rest) = text.strip_suffix('m') {
        (rest, Duration::from_secs(60))
    } else if let Some(rest) = text.strip_suffix('h') {
        (rest, Duration::from_secs(3600))
    } else {
        (text, Duration::from_secs(1))
    };
    let count: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{text}'"))?;
    if count == 0 {
        return Ok(None);
    }
    Ok(Some(scale * count as u32))
}
