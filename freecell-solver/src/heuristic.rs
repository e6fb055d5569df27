use crate::config::SafeHome;
use crate::move_list::MoveList;

use freecell_common::card::MAX_SUIT;
use freecell_common::{Board, Move, Moves};

/// Ranks boards for the best-first frontier. Higher is better; scores must
/// be finite.
pub trait Scorer: Sync {
    fn score(&self, board: &Board, moves: &MoveList) -> f64;
}

impl<F> Scorer for F
where
    F: Fn(&Board, &MoveList) -> f64 + Sync,
{
    fn score(&self, board: &Board, moves: &MoveList) -> f64 {
        self(board, moves)
    }
}

/// Cards at home minus how unevenly they are spread over the suits, with
/// small rewards for open space and a small cost per move played.
#[derive(Debug, Clone, Copy)]
pub struct HomeBalance {
    pub free_cell_bonus: f64,
    pub empty_column_bonus: f64,
    pub move_penalty: f64,
}

impl Default for HomeBalance {
    fn default() -> Self {
        Self {
            free_cell_bonus: 0.25,
            empty_column_bonus: 0.5,
            move_penalty: 0.02,
        }
    }
}

impl Scorer for HomeBalance {
    fn score(&self, board: &Board, moves: &MoveList) -> f64 {
        let counts = (0..MAX_SUIT).map(|suit| board.home_count(suit) as f64);
        let sum: f64 = counts.clone().sum();
        let mean = sum / MAX_SUIT as f64;
        let variance = counts.map(|c| (c - mean) * (c - mean)).sum::<f64>() / MAX_SUIT as f64;

        sum - variance + self.free_cell_bonus * board.free_open() as f64
            + self.empty_column_bonus * board.empty_columns() as f64
            - self.move_penalty * moves.len() as f64
    }
}

/// Fills `moves` with the moves worth trying on `board`: a single safe home
/// move when the policy finds one, otherwise every legal move except shifting
/// a whole column onto an empty one.
pub fn candidate_moves(board: &Board, safe_home: Option<&SafeHome>, moves: &mut Moves) {
    moves.clear();
    board.collect_moves(moves);

    if let Some(policy) = safe_home {
        let forced = moves.iter().copied().find(|mov| {
            mov.is_home() && mov.card(board).is_some_and(|card| policy.is_safe(board, card))
        });
        if let Some(forced) = forced {
            moves.clear();
            moves.push(forced);
            return;
        }
    }

    moves.retain(|mov| !is_pointless(board, mov));
}

fn is_pointless(board: &Board, mov: &Move) -> bool {
    match *mov {
        Move::TableauToTableau(from, to, count) => {
            board.is_column_empty(to as usize) && board.column_len(from as usize) == count as usize
        }
        _ => false,
    }
}
