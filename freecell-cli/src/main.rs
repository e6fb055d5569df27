mod utils;

use crate::utils::*;

use anyhow::{Result, bail};
use clap::Parser;
use freecell_common::board::{DEFAULT_COLUMNS, DEFAULT_FREE_CELLS};
use freecell_common::{Layout, format_moves};
use freecell_solver::config::{DEFAULT_MAX_BUDGET, DEFAULT_MAX_PLAYS};
use freecell_solver::{SafeHome, SolverConfig};
use rand::Rng;

use std::{
    io::{IsTerminal, stdin},
    path::PathBuf,
    time::Duration,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Seed of the deal to solve (random when omitted)
    #[arg(short, long, value_name = "SEED")]
    seed: Option<u64>,
    /// Tableau columns of a dealt game
    #[arg(short, long, default_value_t = DEFAULT_COLUMNS, value_name = "NUM")]
    columns: usize,
    /// Free cells of a dealt game
    #[arg(short, long, default_value_t = DEFAULT_FREE_CELLS, value_name = "NUM")]
    free_cells: usize,
    /// Play budget of the first round of each attempt
    #[arg(long, default_value_t = DEFAULT_MAX_PLAYS, value_name = "NUM")]
    max_plays: usize,
    /// Give up an attempt once its budget grows past this
    #[arg(long, default_value_t = DEFAULT_MAX_BUDGET, value_name = "NUM")]
    max_budget: usize,
    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long, default_value_t = 0, value_name = "NUM")]
    threads: usize,
    /// Independent attempts started from the deal
    #[arg(short, long, default_value_t = 4, value_name = "NUM")]
    rounds: usize,
    /// Stop searching after this many seconds and print the best solution
    #[arg(short, long, value_name = "SECS")]
    time_limit: Option<u64>,
    /// Do not force safe moves to the home piles
    #[arg(long)]
    no_safe_home: bool,
    /// Preview initial game state without solving
    #[arg(short, long)]
    preview: bool,
    /// Print every move with the cards it moves
    #[arg(short, long)]
    describe: bool,
    /// Log round outcomes and throughput
    #[arg(short, long)]
    verbose: bool,
    /// Path to a game state file to solve
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let Cli {
        seed,
        columns,
        free_cells,
        max_plays,
        max_budget,
        threads,
        rounds,
        time_limit,
        no_safe_home,
        preview,
        describe,
        verbose,
        file,
    } = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "info" }),
    )
    .init();

    let source = BoardSource::select(file, seed, !stdin().is_terminal(), || rand::rng().random());
    let seed = match &source {
        BoardSource::Seed(seed) => *seed,
        _ => seed.unwrap_or_else(|| rand::rng().random()),
    };
    let board = source.load(Layout::new(columns, free_cells)?)?;
    if board.is_won() {
        bail!("The game is already won.");
    }
    if preview {
        println!("{board}");
        return Ok(());
    }

    let config = SolverConfig {
        threads,
        rounds,
        seed,
        max_plays,
        max_budget: max_budget.max(max_plays),
        safe_home: (!no_safe_home).then(SafeHome::default),
        time_limit: time_limit.map(Duration::from_secs),
        ..Default::default()
    };
    let moves = do_solve(&board, config, verbose)?;
    if describe {
        println!("{}", describe_moves(&board, &moves));
    } else {
        println!("{}", format_moves(&moves));
    }

    Ok(())
}
