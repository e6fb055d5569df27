use freecell_common::{Board, Move};

use std::sync::Arc;

#[derive(Debug)]
struct Node {
    prev: MoveList,
    mov: Move,
    len: usize,
}

/// Persistent move history. Pushing shares the existing prefix, so cloning a
/// list and extending it in many branches is cheap.
#[derive(Debug, Clone, Default)]
pub struct MoveList(Option<Arc<Node>>);

impl MoveList {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn push(&self, mov: Move) -> MoveList {
        MoveList(Some(Arc::new(Node {
            prev: self.clone(),
            mov,
            len: self.len() + 1,
        })))
    }

    pub fn last(&self) -> Option<Move> {
        self.0.as_ref().map(|node| node.mov)
    }

    /// Newest move first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            node: self.0.as_deref(),
        }
    }

    /// Oldest move first.
    pub fn to_vec(&self) -> Vec<Move> {
        let mut moves: Vec<Move> = self.iter().collect();
        moves.reverse();
        moves
    }

    /// The first `n` moves, sharing storage with `self`.
    pub fn prefix(&self, n: usize) -> MoveList {
        let mut list = self;
        while list.len() > n {
            match &list.0 {
                Some(node) => list = &node.prev,
                None => break,
            }
        }
        list.clone()
    }

    /// Plays the moves on `board`, returning the start and every board after
    /// it (`len() + 1` boards).
    pub fn replay(&self, board: &Board) -> Vec<Board> {
        let mut boards = Vec::with_capacity(self.len() + 1);
        boards.push(board.clone());
        for mov in self.to_vec() {
            let next = mov.apply(&boards[boards.len() - 1]);
            boards.push(next);
        }
        boards
    }
}

impl PartialEq for MoveList {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for MoveList {}

impl FromIterator<Move> for MoveList {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        iter.into_iter().fold(MoveList::new(), |list, mov| list.push(mov))
    }
}

pub struct Iter<'a> {
    node: Option<&'a Node>,
}

impl Iterator for Iter<'_> {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        let node = self.node?;
        self.node = node.prev.0.as_deref();
        Some(node.mov)
    }
}
