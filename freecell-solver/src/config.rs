use freecell_common::{Board, Card};

use std::time::Duration;

pub const DEFAULT_MAX_PLAYS: usize = 20_000;
pub const DEFAULT_MAX_BUDGET: usize = 5_000_000;
pub const DEFAULT_MIN_PLAYS: usize = 1_000;
pub const DEFAULT_CACHE_LIMIT: usize = 1 << 20;

/// When retiring a card home can never hurt, so it is played immediately.
///
/// Ranks count from 1 (Ace). A card is safe when its rank is at most
/// `always_rank`, or when both home piles of the opposite colour hold at least
/// `rank - opposite_slack` cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeHome {
    pub always_rank: u8,
    pub opposite_slack: u8,
}

impl Default for SafeHome {
    fn default() -> Self {
        Self {
            always_rank: 2,
            opposite_slack: 1,
        }
    }
}

impl SafeHome {
    pub fn is_safe(&self, board: &Board, card: Card) -> bool {
        let rank = card.rank() + 1;
        if rank <= self.always_rank {
            return true;
        }
        let needed = rank.saturating_sub(self.opposite_slack);
        (0..4u8)
            .filter(|&suit| suit & 1 != card.suit() & 1)
            .all(|suit| board.home_count(suit) >= needed)
    }
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Worker threads, 0 for the rayon default.
    pub threads: usize,
    /// Independent attempts started from the initial board.
    pub rounds: usize,
    pub seed: u64,
    /// Play budget of the first round of every attempt.
    pub max_plays: usize,
    /// Attempts give up once their budget grows past this.
    pub max_budget: usize,
    pub budget_growth: usize,
    /// Smallest budget handed to a forked attempt.
    pub min_plays: usize,
    /// Entries in a round's transposition cache before it is cleared.
    pub cache_limit: usize,
    pub shuffle_moves: bool,
    pub safe_home: Option<SafeHome>,
    pub time_limit: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            rounds: 4,
            seed: 0,
            max_plays: DEFAULT_MAX_PLAYS,
            max_budget: DEFAULT_MAX_BUDGET,
            budget_growth: 2,
            min_plays: DEFAULT_MIN_PLAYS,
            cache_limit: DEFAULT_CACHE_LIMIT,
            shuffle_moves: true,
            safe_home: Some(SafeHome::default()),
            time_limit: None,
        }
    }
}
