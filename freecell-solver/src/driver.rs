use crate::cancel::CancelToken;
use crate::config::SolverConfig;
use crate::heuristic::{HomeBalance, Scorer};
use crate::move_list::MoveList;
use crate::progress::Counters;
use crate::search::{Progress, Round, Status};

use freecell_common::{Board, Move};

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub moves: Vec<Move>,
    /// The run was cancelled before it finished improving `moves`.
    pub interrupted: bool,
    pub plays: u64,
    pub seen: u64,
    pub rounds: usize,
    pub elapsed: Duration,
}

/// Runs many bounded best-first rounds in parallel, forking new attempts from
/// points along every solution found to look for a shorter one.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

/// State shared by every attempt of one run.
struct Run<'a> {
    root: &'a Board,
    scorer: &'a dyn Scorer,
    config: &'a SolverConfig,
    cancel: CancelToken,
    best_len: AtomicUsize,
    best: Mutex<Option<MoveList>>,
    counters: &'a Counters,
    rounds: AtomicUsize,
    interrupted: AtomicBool,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(&self, board: &Board) -> Result<SolveResult> {
        self.solve_with(board, &HomeBalance::default())
    }

    pub fn solve_with(&self, board: &Board, scorer: &dyn Scorer) -> Result<SolveResult> {
        self.solve_cancellable(board, scorer, &CancelToken::new(), &Counters::new())
    }

    /// Solves until done or until `cancel` fires, recording plays and seen
    /// boards in `counters` as it goes.
    pub fn solve_cancellable(
        &self,
        board: &Board,
        scorer: &dyn Scorer,
        cancel: &CancelToken,
        counters: &Counters,
    ) -> Result<SolveResult> {
        board.validate().context("Invalid initial board")?;

        let timer = Instant::now();
        let mut cancel = cancel.clone();
        if let Some(limit) = self.config.time_limit {
            cancel = cancel.with_timeout(limit);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .context("Failed to build the thread pool")?;

        let run = Run {
            root: board,
            scorer,
            config: &self.config,
            cancel,
            best_len: AtomicUsize::new(usize::MAX),
            best: Mutex::new(None),
            counters,
            rounds: AtomicUsize::new(0),
            interrupted: AtomicBool::new(false),
        };
        let plays_before = counters.plays();
        let seen_before = counters.seen();

        let mut master = SmallRng::seed_from_u64(self.config.seed);
        let attempts: Vec<SmallRng> = (0..self.config.rounds.max(1))
            .map(|_| SmallRng::from_rng(&mut master))
            .collect();
        let start = Progress::start(board.clone(), scorer);
        pool.install(|| {
            attempts.into_par_iter().for_each(|rng| {
                run.attempt(start.clone(), self.config.max_plays, rng);
            })
        });

        let elapsed = timer.elapsed();
        let plays = counters.plays() - plays_before;
        let seen = counters.seen() - seen_before;
        let rounds = run.rounds.load(Ordering::Relaxed);
        let interrupted = run.interrupted.load(Ordering::Relaxed);
        let best = run.best.into_inner().unwrap_or_else(PoisonError::into_inner);

        let Some(best) = best else {
            if interrupted {
                log::warn!("{:<32}{:>12}", "interrupted without solution", rounds);
                bail!("Interrupted before a solution was found.");
            }
            bail!("No solution found.");
        };
        if interrupted {
            log::warn!("{:<32}{:>12}", "interrupted with moves", best.len());
        }
        log::info!(
            "{:<32}{:>12} moves {:>8} rounds {:>12} plays",
            "solved",
            best.len(),
            rounds,
            plays
        );

        Ok(SolveResult {
            moves: best.to_vec(),
            interrupted,
            plays,
            seen,
            rounds,
            elapsed,
        })
    }
}

impl Run<'_> {
    /// Plays rounds from `start` until one succeeds or the budget runs out,
    /// then forks shorter attempts from the solution. Returns the best
    /// solution found by this attempt or its forks.
    fn attempt(&self, start: Progress, budget: usize, mut rng: SmallRng) -> Option<MoveList> {
        let mut budget = budget.max(1);
        loop {
            if self.cancel.is_cancelled() {
                self.interrupted.store(true, Ordering::Relaxed);
                return None;
            }
            let best = self.best_len.load(Ordering::Acquire);
            // An empty solution cannot be beaten.
            let bound = match best {
                0 => return None,
                usize::MAX => usize::MAX,
                best => best - 1,
            };
            if start.moves.len() + start.board.min_moves_to_win() > bound {
                return None;
            }

            self.rounds.fetch_add(1, Ordering::Relaxed);
            let shuffler = self
                .config
                .shuffle_moves
                .then(|| SmallRng::from_rng(&mut rng));
            let result = Round::new(self.scorer)
                .max_plays(budget)
                .bound(bound)
                .shuffler(shuffler)
                .reporter(self.counters)
                .cancel(&self.cancel)
                .safe_home(self.config.safe_home)
                .cache_limit(self.config.cache_limit)
                .play(start.clone());
            log::debug!(
                "{:<32}{:>12?} {:>8} depth {:>10} budget",
                "round",
                result.status,
                start.moves.len(),
                budget
            );

            match (result.status, result.moves) {
                (Status::Success, Some(moves)) => {
                    self.publish(&moves);
                    return Some(self.fork(&start, moves, budget, &mut rng));
                }
                (Status::Interrupted, _) => {
                    self.interrupted.store(true, Ordering::Relaxed);
                    return None;
                }
                _ => {
                    budget = budget.saturating_mul(self.config.budget_growth.max(2));
                    if budget > self.config.max_budget {
                        return None;
                    }
                }
            }
        }
    }

    /// Starts one attempt from each board at a power-of-two index along
    /// `moves`, past `start`, and keeps the shortest solution.
    fn fork(&self, start: &Progress, moves: MoveList, budget: usize, rng: &mut SmallRng) -> MoveList {
        let len = moves.len();
        let boards = moves.replay(self.root);
        let forks: Vec<(Progress, usize, SmallRng)> = (0..usize::BITS)
            .map(|shift| 1usize << shift)
            .take_while(|&index| index < len)
            .filter(|&index| index > start.moves.len())
            .map(|index| {
                let prefix = moves.prefix(index);
                let board = boards[index].clone();
                let score = self.scorer.score(&board, &prefix);
                let remaining = len - index;
                let budget = (budget.saturating_mul(remaining) / len).max(self.config.min_plays);
                (Progress::new(board, score, prefix), budget, SmallRng::from_rng(&mut *rng))
            })
            .collect();

        forks
            .into_par_iter()
            .filter_map(|(progress, budget, rng)| self.attempt(progress, budget, rng))
            .chain(rayon::iter::once(moves))
            .min_by_key(|found| found.len())
            .unwrap_or_default()
    }

    fn publish(&self, moves: &MoveList) {
        let len = moves.len();
        self.best_len.fetch_min(len, Ordering::AcqRel);
        let mut best = self.best.lock().unwrap_or_else(PoisonError::into_inner);
        if best.as_ref().is_none_or(|current| current.len() > len) {
            log::info!("{:<32}{:>12}", "new best solution", len);
            *best = Some(moves.clone());
        }
    }
}

/// Solves `board` with the default scorer.
pub fn solve(board: &Board, config: SolverConfig) -> Result<SolveResult> {
    Solver::new(config).solve(board)
}
