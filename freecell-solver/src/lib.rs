//! A parallel best-first FreeCell solver.
//!
//! A single [`Round`] explores the move graph best first under a play budget
//! and a length bound. The [`Solver`] runs many rounds on a rayon pool and,
//! whenever one succeeds, forks further rounds from points along the
//! solution to look for a shorter one.
pub mod cancel;
pub mod config;
pub mod driver;
pub mod heuristic;
pub mod move_list;
pub mod progress;
pub mod search;

pub use crate::cancel::CancelToken;
pub use crate::config::{SafeHome, SolverConfig};
pub use crate::driver::{SolveResult, Solver, solve};
pub use crate::heuristic::{HomeBalance, Scorer, candidate_moves};
pub use crate::move_list::MoveList;
pub use crate::progress::{Counters, ProgressReporter, with_throughput};
pub use crate::search::{Progress, Round, RoundResult, Status, TranspositionCache};
