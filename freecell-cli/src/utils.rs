use anyhow::{Context, Result};
use freecell_common::{Board, Layout, Move};
use freecell_solver::{CancelToken, Counters, HomeBalance, SolveResult, Solver, SolverConfig, with_throughput};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use std::{
    io::{IsTerminal, Read, Write, stderr, stdin},
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

const THROUGHPUT_INTERVAL: Duration = Duration::from_secs(5);

/// Where the board to solve comes from.
#[derive(Debug, PartialEq, Eq)]
pub enum BoardSource {
    File(PathBuf),
    Seed(u64),
    Stdin,
}

impl BoardSource {
    /// An explicit file wins, then an explicit seed, then piped input. A
    /// random deal is the last resort.
    pub fn select(
        file: Option<PathBuf>,
        seed: Option<u64>,
        piped: bool,
        random_seed: impl FnOnce() -> u64,
    ) -> Self {
        if let Some(file) = file {
            Self::File(file)
        } else if let Some(seed) = seed {
            Self::Seed(seed)
        } else if piped {
            Self::Stdin
        } else {
            Self::Seed(random_seed())
        }
    }

    pub fn load(&self, layout: Layout) -> Result<Board> {
        let board = match self {
            Self::File(file) => {
                let content = std::fs::read_to_string(file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                Board::parse(&content).context("Failed to parse board")?
            }
            Self::Seed(seed) => {
                log::info!("{:<32}{:>12}", "deal seed", seed);
                Board::deal_with_layout(layout, &mut SmallRng::seed_from_u64(*seed))?
            }
            Self::Stdin => {
                let mut content = String::new();
                stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read from stdin")?;
                Board::parse(&content).context("Failed to parse board")?
            }
        };
        Ok(board)
    }
}

pub fn do_solve(board: &Board, config: SolverConfig, verbose: bool) -> Result<Vec<Move>> {
    println!("{board}\n");
    let solver = Solver::new(config);
    let counters = Counters::new();
    let run = || {
        solver.solve_cancellable(board, &HomeBalance::default(), &CancelToken::new(), &counters)
    };
    let SolveResult {
        moves,
        interrupted,
        plays,
        seen,
        rounds,
        elapsed,
    } = if verbose {
        with_throughput(&counters, THROUGHPUT_INTERVAL, run)?
    } else {
        with_spinner(&counters, run)?
    };
    let elapsed_str = format_elapsed(elapsed);
    let status = if interrupted { "Stopped" } else { "Solved" };
    println!(
        "✓ {status} in {} Moves, Time: {elapsed_str}, Rounds: {rounds}, Plays: {plays}, Boards: {seen}\n",
        moves.len()
    );
    Ok(moves)
}

/// One line per move naming the cards it moves.
pub fn describe_moves(board: &Board, moves: &[Move]) -> String {
    let mut board = board.clone();
    let mut lines = Vec::with_capacity(moves.len());
    for (i, mov) in moves.iter().enumerate() {
        lines.push(format!("{:>3}. {:<8} {}", i + 1, mov.to_string(), mov.describe(&board)));
        board = mov.apply(&board);
    }
    lines.join("\n")
}

fn spinner_message(counters: &Counters) -> String {
    format!(
        "Solving the game... {} plays, {} boards",
        counters.plays(),
        counters.seen()
    )
}

fn with_spinner<T, F: FnOnce() -> T>(counters: &Counters, f: F) -> T {
    if !stderr().is_terminal() {
        return f();
    }
    let spinning = AtomicBool::new(true);
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let spinner_chars = ['|', '/', '-', '\\'];
            let mut i = 0;
            let _ = write!(stderr(), "\x1b[?25l"); // hide cursor

            while spinning.load(Ordering::Relaxed) {
                let spinner_char = spinner_chars[i % spinner_chars.len()];
                // Locked per frame so log lines from the solver still get through.
                let mut handle = stderr().lock();
                let _ = write!(handle, "\r\x1b[2K{spinner_char} {}", spinner_message(counters));
                let _ = handle.flush();
                drop(handle);
                std::thread::sleep(Duration::from_millis(100));
                i += 1;
            }

            let _ = write!(stderr(), "\r\x1b[2K\r\x1b[?25h"); // clear line and show cursor
        });

        let result = f();
        spinning.store(false, Ordering::Relaxed);
        result
    })
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 90 {
        let ms = elapsed.subsec_millis();
        format!("{secs}.{ms:03}s")
    } else {
        let minutes = secs / 60;
        let secs = secs % 60;
        format!("{minutes}m {secs}s")
    }
}
