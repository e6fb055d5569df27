use crate::cancel::CancelToken;
use crate::config::{DEFAULT_CACHE_LIMIT, SafeHome};
use crate::heuristic::{Scorer, candidate_moves};
use crate::move_list::MoveList;
use crate::progress::ProgressReporter;

use freecell_common::{Board, Moves};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Histories whose lengths fall in the same bucket count as equally long.
pub const NEAR_TIE_MOVES: usize = 4;
/// Plays between two looks at the cancel token.
pub const CHECK_INTERVAL: u64 = 1 << 16;

/// A frontier entry: a board, its score and the moves that reached it.
#[derive(Debug, Clone)]
pub struct Progress {
    pub board: Board,
    pub score: f64,
    pub moves: MoveList,
}

impl Progress {
    pub fn new(board: Board, score: f64, moves: MoveList) -> Self {
        assert!(score.is_finite(), "non-finite score {score}");
        Self {
            board,
            score,
            moves,
        }
    }

    pub fn start(board: Board, scorer: &dyn Scorer) -> Self {
        let moves = MoveList::new();
        let score = scorer.score(&board, &moves);
        Self::new(board, score, moves)
    }

    fn bucket(&self) -> usize {
        self.moves.len() / NEAR_TIE_MOVES
    }
}

impl Ord for Progress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.bucket().cmp(&self.bucket()))
    }
}

impl PartialOrd for Progress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Progress {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Progress {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Unwinnable,
    MaxPlays,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct RoundResult {
    pub status: Status,
    /// The winning history when `status` is `Success`.
    pub moves: Option<MoveList>,
    pub plays: u64,
    pub seen: u64,
}

/// Board to the smallest depth it was reached at.
#[derive(Debug)]
pub struct TranspositionCache {
    depths: FxHashMap<Board, u16>,
    limit: usize,
    evictions: usize,
}

impl TranspositionCache {
    pub fn new(limit: usize) -> Self {
        Self {
            depths: FxHashMap::default(),
            limit: limit.max(1),
            evictions: 0,
        }
    }

    /// Records `board` at `depth` and tells whether it is worth exploring:
    /// unseen, or seen only at a greater depth.
    pub fn admit(&mut self, board: &Board, depth: usize) -> bool {
        let depth = depth.min(u16::MAX as usize) as u16;
        if let Some(seen) = self.depths.get_mut(board) {
            if *seen <= depth {
                return false;
            }
            *seen = depth;
            return true;
        }
        if self.depths.len() >= self.limit {
            log::debug!("{:<32}{:>12}", "transposition cache cleared", self.depths.len());
            self.depths.clear();
            self.evictions += 1;
        }
        self.depths.insert(board.clone(), depth);
        true
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn evictions(&self) -> usize {
        self.evictions
    }
}

/// One best-first round with a play budget and a length bound.
pub struct Round<'a> {
    scorer: &'a dyn Scorer,
    max_plays: usize,
    bound: usize,
    shuffler: Option<SmallRng>,
    reporter: &'a dyn ProgressReporter,
    cancel: Option<&'a CancelToken>,
    safe_home: Option<SafeHome>,
    cache_limit: usize,
}

impl<'a> Round<'a> {
    pub fn new(scorer: &'a dyn Scorer) -> Self {
        Self {
            scorer,
            max_plays: usize::MAX,
            bound: usize::MAX,
            shuffler: None,
            reporter: &(),
            cancel: None,
            safe_home: Some(SafeHome::default()),
            cache_limit: DEFAULT_CACHE_LIMIT,
        }
    }

    pub fn max_plays(mut self, max_plays: usize) -> Self {
        self.max_plays = max_plays;
        self
    }

    /// Longest solution worth finding; children that cannot finish within it
    /// are dropped.
    pub fn bound(mut self, bound: usize) -> Self {
        self.bound = bound;
        self
    }

    pub fn shuffler(mut self, shuffler: Option<SmallRng>) -> Self {
        self.shuffler = shuffler;
        self
    }

    pub fn reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn safe_home(mut self, safe_home: Option<SafeHome>) -> Self {
        self.safe_home = safe_home;
        self
    }

    pub fn cache_limit(mut self, cache_limit: usize) -> Self {
        self.cache_limit = cache_limit;
        self
    }

    pub fn play(mut self, start: Progress) -> RoundResult {
        let mut plays = 0u64;
        let mut seen = 0u64;
        let finish = |status: Status, moves: Option<MoveList>, plays: u64, seen: u64| RoundResult {
            status,
            moves,
            plays,
            seen,
        };

        if start.board.is_won() {
            return finish(Status::Success, Some(start.moves), plays, seen);
        }

        let mut cache = TranspositionCache::new(self.cache_limit);
        cache.admit(&start.board, start.moves.len());
        let mut frontier = BinaryHeap::new();
        frontier.push(start);
        let mut moves = Moves::new();

        while let Some(Progress {
            board,
            moves: history,
            ..
        }) = frontier.pop()
        {
            candidate_moves(&board, self.safe_home.as_ref(), &mut moves);
            if let Some(rng) = self.shuffler.as_mut() {
                moves.shuffle(rng);
            }

            let depth = history.len() + 1;
            for &mov in moves.iter() {
                if plays >= self.max_plays as u64 {
                    return finish(Status::MaxPlays, None, plays, seen);
                }
                plays += 1;
                if plays % CHECK_INTERVAL == 0 && self.cancel.is_some_and(CancelToken::is_cancelled) {
                    return finish(Status::Interrupted, None, plays, seen);
                }

                let child = mov.apply(&board);
                self.reporter.move_played();
                if !cache.admit(&child, depth) {
                    continue;
                }
                self.reporter.game_seen();
                seen += 1;

                let child_moves = history.push(mov);
                if child.is_won() {
                    return finish(Status::Success, Some(child_moves), plays, seen);
                }
                if depth + child.min_moves_to_win() <= self.bound {
                    let score = self.scorer.score(&child, &child_moves);
                    frontier.push(Progress::new(child, score, child_moves));
                }
            }
        }

        finish(Status::Unwinnable, None, plays, seen)
    }
}
