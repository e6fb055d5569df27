use crate::card::{Card, MAX_CARD, MAX_RANK, MAX_SUIT};
use crate::error::DealError;
use crate::move_::{Move, Moves};

use anyhow::{Context, Result, bail};
use rand::Rng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;
use std::fmt;

pub const TOTAL_HOMES: usize = MAX_SUIT as usize;
pub const DEFAULT_COLUMNS: usize = 8;
pub const DEFAULT_FREE_CELLS: usize = 4;
pub const MAX_COLUMNS: usize = 10;
pub const MAX_FREE_CELLS: usize = 8;

/// Marks an empty home slot and the start of every column.
const EMPTY: u8 = u8::MAX;
const BUFFER_SIZE: usize = TOTAL_HOMES + MAX_CARD as usize + MAX_COLUMNS;

type Cells = SmallVec<[u8; BUFFER_SIZE]>;
type Roots = SmallVec<[u8; MAX_COLUMNS]>;

/// Number of tableau columns and free cells of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    pub columns: usize,
    pub free_cells: usize,
}

impl Layout {
    pub fn new(columns: usize, free_cells: usize) -> Result<Self, DealError> {
        if columns == 0 || columns > MAX_COLUMNS || free_cells > MAX_FREE_CELLS {
            return Err(DealError::InvalidLayout {
                columns,
                free_cells,
            });
        }
        Ok(Self {
            columns,
            free_cells,
        })
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            free_cells: DEFAULT_FREE_CELLS,
        }
    }
}

/// An immutable FreeCell position.
///
/// The whole position lives in one flat buffer of card ids:
///
/// ```text
/// [home C D S H][free cells, descending][EMPTY col0 ...][EMPTY col1 ...]...
/// ```
///
/// `roots` holds the offset of each column's sentinel, so the top card and the
/// length of any column are found in O(1). Moves copy the buffer and rotate
/// the span between source and destination; nothing is mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: Cells,
    roots: Roots,
    free_capacity: u8,
}

impl Board {
    /// Shuffles a fresh deck and deals it into the default layout.
    pub fn deal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::deal_with_layout(Layout::default(), rng).expect("a full deck always deals")
    }

    pub fn deal_with_layout<R: Rng + ?Sized>(layout: Layout, rng: &mut R) -> Result<Self, DealError> {
        let mut deck: Vec<Option<Card>> = Card::all().map(Some).collect();
        deck.shuffle(rng);
        Self::from_rows(layout, &[], &[], &deck)
    }

    /// Deals `cards` row by row across the columns; `None` leaves a hole that
    /// is skipped, which allows ragged layouts to be written as a grid.
    pub fn from_rows(
        layout: Layout,
        home: &[Card],
        free: &[Card],
        cards: &[Option<Card>],
    ) -> Result<Self, DealError> {
        let layout = Layout::new(layout.columns, layout.free_cells)?;
        let mut columns = vec![Vec::new(); layout.columns];
        for (i, card) in cards.iter().enumerate() {
            if let Some(card) = card {
                columns[i % layout.columns].push(*card);
            }
        }
        Self::from_columns(layout, home, free, &columns)
    }

    /// Builds a board from the top card of each home pile, the free cards and
    /// the columns (bottom card first). Every one of the 52 cards must appear
    /// exactly once.
    pub fn from_columns(
        layout: Layout,
        home: &[Card],
        free: &[Card],
        columns: &[Vec<Card>],
    ) -> Result<Self, DealError> {
        let layout = Layout::new(layout.columns, layout.free_cells)?;
        if columns.len() > layout.columns {
            return Err(DealError::TooManyColumns {
                used: columns.len(),
                capacity: layout.columns,
            });
        }
        if free.len() > layout.free_cells {
            return Err(DealError::TooManyFreeCards {
                used: free.len(),
                capacity: layout.free_cells,
            });
        }

        let mut seen = [false; MAX_CARD as usize];
        let mut mark = |card: Card| -> Result<(), DealError> {
            let slot = &mut seen[card.id() as usize];
            if *slot {
                return Err(DealError::DuplicateCard(card));
            }
            *slot = true;
            Ok(())
        };

        let mut cells = Cells::new();
        cells.extend([EMPTY; TOTAL_HOMES]);
        for &top in home {
            for rank in 0..=top.rank() {
                mark(Card::new(rank, top.suit()))?;
            }
            cells[top.suit() as usize] = top.id();
        }

        let mut free: SmallVec<[Card; MAX_FREE_CELLS]> = free.iter().copied().collect();
        free.sort_unstable_by(|a, b| b.cmp(a));
        for card in free {
            mark(card)?;
            cells.push(card.id());
        }

        let mut roots = Roots::new();
        for col in 0..layout.columns {
            roots.push(cells.len() as u8);
            cells.push(EMPTY);
            for &card in columns.get(col).map(Vec::as_slice).unwrap_or_default() {
                mark(card)?;
                cells.push(card.id());
            }
        }

        let missing: Vec<Card> = Card::all().filter(|c| !seen[c.id() as usize]).collect();
        if !missing.is_empty() {
            return Err(DealError::MissingCards(missing));
        }

        Ok(Self {
            cells,
            roots,
            free_capacity: layout.free_cells as u8,
        })
    }

    /// Checks the deal invariants: all 52 cards exactly once, home piles of
    /// their own suit, a sorted free run within capacity and one sentinel per
    /// column at the recorded root.
    pub fn validate(&self) -> Result<(), DealError> {
        if self.roots.is_empty() || self.roots.len() > MAX_COLUMNS {
            return Err(DealError::Corrupt("invalid column count"));
        }
        if self.cells.len() < TOTAL_HOMES + self.roots.len() {
            return Err(DealError::Corrupt("buffer too short"));
        }

        let mut seen = [false; MAX_CARD as usize];
        let mut mark = |id: u8| -> Result<(), DealError> {
            let card = Card::from_id(id).ok_or(DealError::Corrupt("unexpected sentinel"))?;
            let slot = &mut seen[id as usize];
            if *slot {
                return Err(DealError::DuplicateCard(card));
            }
            *slot = true;
            Ok(())
        };

        for suit in 0..MAX_SUIT {
            let id = self.cells[suit as usize];
            if id == EMPTY {
                continue;
            }
            let top = Card::from_id(id).ok_or(DealError::Corrupt("invalid home card"))?;
            if top.suit() != suit {
                return Err(DealError::Corrupt("home pile holds another suit"));
            }
            for rank in 0..=top.rank() {
                mark(Card::new(rank, suit).id())?;
            }
        }

        let free_end = self.root(0);
        if free_end < TOTAL_HOMES {
            return Err(DealError::Corrupt("first column overlaps home piles"));
        }
        if self.free_used() > self.free_capacity() {
            return Err(DealError::TooManyFreeCards {
                used: self.free_used(),
                capacity: self.free_capacity(),
            });
        }
        for pos in TOTAL_HOMES..free_end {
            mark(self.cells[pos])?;
            if pos > TOTAL_HOMES && self.cells[pos - 1] <= self.cells[pos] {
                return Err(DealError::Corrupt("free cells out of order"));
            }
        }

        for col in 0..self.columns() {
            let root = self.root(col);
            if col > 0 && root <= self.root(col - 1) {
                return Err(DealError::Corrupt("column roots out of order"));
            }
            if self.cells.get(root) != Some(&EMPTY) {
                return Err(DealError::Corrupt("missing column sentinel"));
            }
        }
        for col in 0..self.columns() {
            for pos in self.root(col) + 1..=self.top_pos(col) {
                mark(self.cells[pos])?;
            }
        }

        let missing: Vec<Card> = Card::all().filter(|c| !seen[c.id() as usize]).collect();
        if !missing.is_empty() {
            return Err(DealError::MissingCards(missing));
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        Layout {
            columns: self.columns(),
            free_cells: self.free_capacity(),
        }
    }

    pub fn columns(&self) -> usize {
        self.roots.len()
    }

    pub fn free_capacity(&self) -> usize {
        self.free_capacity as usize
    }

    pub fn free_used(&self) -> usize {
        self.root(0) - TOTAL_HOMES
    }

    pub fn free_open(&self) -> usize {
        self.free_capacity() - self.free_used()
    }

    pub fn column_len(&self, col: usize) -> usize {
        self.top_pos(col) - self.root(col)
    }

    pub fn is_column_empty(&self, col: usize) -> bool {
        self.top_pos(col) == self.root(col)
    }

    pub fn empty_columns(&self) -> usize {
        (0..self.columns())
            .filter(|&col| self.is_column_empty(col))
            .count()
    }

    /// Top card of the home pile for `suit`.
    pub fn home(&self, suit: u8) -> Option<Card> {
        Card::from_id(self.cells[suit as usize])
    }

    /// Number of cards already retired to the home pile for `suit`.
    pub fn home_count(&self, suit: u8) -> u8 {
        self.home(suit).map_or(0, |card| card.rank() + 1)
    }

    pub fn home_score(&self) -> usize {
        (0..MAX_SUIT).map(|suit| self.home_count(suit) as usize).sum()
    }

    pub fn peek_tableau(&self, col: usize) -> Option<Card> {
        Card::from_id(self.cells[self.top_pos(col)])
    }

    pub fn peek_free(&self, cell: usize) -> Option<Card> {
        (cell < self.free_used()).then(|| self.card_at(TOTAL_HOMES + cell))
    }

    /// Cards of a column, bottom first.
    pub fn tableau(&self, col: usize) -> impl Iterator<Item = Card> + '_ {
        self.cells[self.root(col) + 1..=self.top_pos(col)]
            .iter()
            .filter_map(|&id| Card::from_id(id))
    }

    /// Cards in the free cells, in canonical (descending) order.
    pub fn free_cells(&self) -> impl Iterator<Item = Card> + '_ {
        self.cells[TOTAL_HOMES..self.root(0)]
            .iter()
            .filter_map(|&id| Card::from_id(id))
    }

    pub fn is_won(&self) -> bool {
        (0..MAX_SUIT).all(|suit| self.home_count(suit) == MAX_RANK)
    }

    /// Lower bound on the moves still needed: every card not yet home needs
    /// at least one move.
    pub fn min_moves_to_win(&self) -> usize {
        MAX_CARD as usize - self.home_score()
    }

    /// Length of the alternating-colour, descending run at the top of `col`.
    pub fn run_size(&self, col: usize) -> usize {
        let root = self.root(col);
        let mut pos = self.top_pos(col);
        if pos == root {
            return 0;
        }
        let mut count = 1;
        while pos - 1 > root && self.card_at(pos).fits_on(self.card_at(pos - 1)) {
            count += 1;
            pos -= 1;
        }
        count
    }

    /// Largest run that may move from `from` to `to`: one card per open free
    /// cell plus one, doubled for every empty column not taking part.
    pub fn max_run_move(&self, from: usize, to: usize) -> usize {
        let empty = (0..self.columns())
            .filter(|&col| col != from && col != to && self.is_column_empty(col))
            .count();
        (self.free_open() + 1) << empty
    }

    pub fn can_move_tableau_to_home(&self, col: usize) -> bool {
        self.peek_tableau(col).is_some_and(|card| self.accepts_home(card))
    }

    pub fn can_move_free_to_home(&self, cell: usize) -> bool {
        self.peek_free(cell).is_some_and(|card| self.accepts_home(card))
    }

    pub fn can_move_tableau_to_free(&self, col: usize) -> bool {
        self.free_open() > 0 && !self.is_column_empty(col)
    }

    pub fn can_move_tableau_to_tableau(&self, from: usize, to: usize, count: usize) -> bool {
        if from == to || count == 0 || count > self.run_size(from) {
            return false;
        }
        if count > self.max_run_move(from, to) {
            return false;
        }
        let bottom = self.card_at(self.top_pos(from) + 1 - count);
        self.peek_tableau(to).is_none_or(|dst| bottom.fits_on(dst))
    }

    pub fn can_move_free_to_tableau(&self, cell: usize, to: usize) -> bool {
        self.peek_free(cell).is_some_and(|card| {
            self.peek_tableau(to).is_none_or(|dst| card.fits_on(dst))
        })
    }

    pub fn move_tableau_to_home(&self, col: usize) -> Board {
        assert!(
            self.can_move_tableau_to_home(col),
            "illegal move from tableau {col} to home"
        );
        let pos = self.top_pos(col);
        let card = self.card_at(pos);
        let mut cells = self.cells.clone();
        cells.remove(pos);
        cells[card.suit() as usize] = card.id();
        let mut roots = self.roots.clone();
        roots[col + 1..].iter_mut().for_each(|root| *root -= 1);
        self.derive(cells, roots)
    }

    pub fn move_free_to_home(&self, cell: usize) -> Board {
        assert!(
            self.can_move_free_to_home(cell),
            "illegal move from free cell {cell} to home"
        );
        let pos = TOTAL_HOMES + cell;
        let card = self.card_at(pos);
        let mut cells = self.cells.clone();
        cells.remove(pos);
        cells[card.suit() as usize] = card.id();
        let mut roots = self.roots.clone();
        roots.iter_mut().for_each(|root| *root -= 1);
        self.derive(cells, roots)
    }

    pub fn move_tableau_to_free(&self, col: usize) -> Board {
        assert!(
            self.can_move_tableau_to_free(col),
            "illegal move from tableau {col} to free cell"
        );
        let src = self.top_pos(col);
        let card = self.card_at(src);
        // Keeps the free run sorted so equal sets of free cards encode equally.
        let dst = TOTAL_HOMES + self.free_cells().take_while(|&free| free > card).count();
        let mut cells = self.cells.clone();
        cells[dst..=src].rotate_right(1);
        let mut roots = self.roots.clone();
        roots[..=col].iter_mut().for_each(|root| *root += 1);
        self.derive(cells, roots)
    }

    pub fn move_free_to_tableau(&self, cell: usize, to: usize) -> Board {
        assert!(
            self.can_move_free_to_tableau(cell, to),
            "illegal move from free cell {cell} to tableau {to}"
        );
        let src = TOTAL_HOMES + cell;
        let dst = self.top_pos(to);
        let mut cells = self.cells.clone();
        cells[src..=dst].rotate_left(1);
        let mut roots = self.roots.clone();
        roots[..=to].iter_mut().for_each(|root| *root -= 1);
        self.derive(cells, roots)
    }

    pub fn move_tableau_to_tableau(&self, from: usize, to: usize, count: usize) -> Board {
        assert!(
            self.can_move_tableau_to_tableau(from, to, count),
            "illegal move of {count} cards from tableau {from} to tableau {to}"
        );
        let src = self.top_pos(from) + 1 - count;
        let shift = count as u8;
        let mut cells = self.cells.clone();
        let mut roots = self.roots.clone();
        if from < to {
            let end = self.top_pos(to) + 1;
            cells[src..end].rotate_left(count);
            roots[from + 1..=to].iter_mut().for_each(|root| *root -= shift);
        } else {
            let dst = self.top_pos(to) + 1;
            cells[dst..src + count].rotate_right(count);
            roots[to + 1..=from].iter_mut().for_each(|root| *root += shift);
        }
        self.derive(cells, roots)
    }

    pub fn legal_moves(&self) -> Moves {
        let mut moves = Moves::new();
        self.collect_moves(&mut moves);
        moves
    }

    /// Appends every structurally legal move to `moves`: per column home,
    /// free cell, then other columns with growing run length; then per free
    /// cell home and columns.
    pub fn collect_moves(&self, moves: &mut Moves) {
        let columns = self.columns();
        for from in 0..columns {
            let Some(top) = self.peek_tableau(from) else {
                continue;
            };
            if self.accepts_home(top) {
                moves.push(Move::TableauToHome(from as u8));
            }
            if self.free_open() > 0 {
                moves.push(Move::TableauToFree(from as u8));
            }

            let run = self.run_size(from);
            for to in 0..columns {
                if to == from {
                    continue;
                }
                match self.peek_tableau(to) {
                    Some(dst) if dst.rank() > top.rank() => {
                        // Only one run length can land on a given card.
                        let count = (dst.rank() - top.rank()) as usize;
                        if count <= run && self.can_move_tableau_to_tableau(from, to, count) {
                            moves.push(Move::TableauToTableau(from as u8, to as u8, count as u8));
                        }
                    }
                    Some(_) => {}
                    None => {
                        let limit = run.min(self.max_run_move(from, to));
                        for count in 1..=limit {
                            moves.push(Move::TableauToTableau(from as u8, to as u8, count as u8));
                        }
                    }
                }
            }
        }

        for cell in 0..self.free_used() {
            if self.can_move_free_to_home(cell) {
                moves.push(Move::FreeToHome(cell as u8));
            }
            for to in 0..columns {
                if self.can_move_free_to_tableau(cell, to) {
                    moves.push(Move::FreeToTableau(cell as u8, to as u8));
                }
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines();
        let header = lines
            .by_ref()
            .find(|line| !line.trim().is_empty())
            .context("Missing home and free cell line")?;
        let header_context = || format!("Failed to parse at '{header}'");
        let (home_part, free_part) = header.split_once("||").with_context(header_context)?;

        let home_slots = Self::parse_slots(home_part).with_context(header_context)?;
        if home_slots.len() != TOTAL_HOMES {
            bail!("Expected {TOTAL_HOMES} home slots at '{header}'");
        }
        let home: Vec<Card> = home_slots.into_iter().flatten().collect();
        let free_slots = Self::parse_slots(free_part).with_context(header_context)?;
        let free_capacity = free_slots.len();
        let free: Vec<Card> = free_slots.into_iter().flatten().collect();

        let rows: Vec<&str> = lines.skip_while(|line| line.trim().is_empty()).collect();
        let column_count = rows
            .iter()
            .map(|row| row.chars().count().div_ceil(4))
            .max()
            .filter(|&count| count > 0)
            .unwrap_or(DEFAULT_COLUMNS);
        if column_count > MAX_COLUMNS {
            bail!("Too many columns: {column_count}");
        }

        let mut columns = vec![Vec::new(); column_count];
        for (depth, row) in rows.iter().enumerate() {
            let row_context = || format!("Failed to parse at '{row}'");
            let chars: Vec<char> = row.chars().collect();
            for (col, slot) in chars.chunks(4).enumerate() {
                let text: String = slot.iter().collect();
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if columns[col].len() != depth {
                    bail!("Gap in column {} at '{row}'", col + 1);
                }
                columns[col].push(text.parse::<Card>().with_context(row_context)?);
            }
        }

        let layout = Layout::new(column_count, free_capacity)?;
        Ok(Self::from_columns(layout, &home, &free, &columns)?)
    }

    fn parse_slots(s: &str) -> Result<Vec<Option<Card>>> {
        s.split_whitespace()
            .map(|token| match token {
                "--" => Ok(None),
                _ => token.parse().map(Some),
            })
            .collect()
    }

    #[inline]
    fn root(&self, col: usize) -> usize {
        self.roots[col] as usize
    }

    #[inline]
    fn top_pos(&self, col: usize) -> usize {
        if col + 1 == self.roots.len() {
            self.cells.len() - 1
        } else {
            self.root(col + 1) - 1
        }
    }

    #[inline]
    fn card_at(&self, pos: usize) -> Card {
        Card::from_id(self.cells[pos]).expect("position holds a card")
    }

    #[inline]
    fn accepts_home(&self, card: Card) -> bool {
        self.home_count(card.suit()) == card.rank()
    }

    fn derive(&self, cells: Cells, roots: Roots) -> Board {
        let board = Board {
            cells,
            roots,
            free_capacity: self.free_capacity,
        };
        debug_assert_eq!(board.validate(), Ok(()));
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn slot(f: &mut fmt::Formatter<'_>, card: Option<Card>) -> fmt::Result {
            match card {
                Some(card) => write!(f, "  {card}"),
                None => f.write_str("  --"),
            }
        }

        for suit in 0..MAX_SUIT {
            slot(f, self.home(suit))?;
        }
        f.write_str("||")?;
        for cell in 0..self.free_capacity() {
            slot(f, self.peek_free(cell))?;
        }
        f.write_str("\n\n")?;

        // The first row is always written so that the column count survives.
        let depth = (0..self.columns())
            .map(|col| self.column_len(col))
            .max()
            .unwrap_or(0)
            .max(1);
        for row in 0..depth {
            if row > 0 {
                f.write_str("\n")?;
            }
            for col in 0..self.columns() {
                if row < self.column_len(col) {
                    write!(f, "  {}", self.card_at(self.root(col) + 1 + row))?;
                } else {
                    f.write_str("    ")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace().map(card).collect()
    }

    /// Plays random legal moves from `board`, handing every visited board to `f`.
    fn random_walk(board: Board, steps: usize, seed: u64, mut f: impl FnMut(&Board)) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = board;
        f(&board);
        for _ in 0..steps {
            let moves = board.legal_moves();
            if moves.is_empty() {
                break;
            }
            let mov = moves[rng.random_range(0..moves.len())];
            board = mov.apply(&board);
            f(&board);
        }
    }

    fn brute_force_moves(board: &Board) -> HashSet<Move> {
        let mut moves = HashSet::new();
        let columns = board.columns();
        for from in 0..columns {
            if board.can_move_tableau_to_home(from) {
                moves.insert(Move::TableauToHome(from as u8));
            }
            if board.can_move_tableau_to_free(from) {
                moves.insert(Move::TableauToFree(from as u8));
            }
            for to in 0..columns {
                for count in 0..=13 {
                    if board.can_move_tableau_to_tableau(from, to, count) {
                        moves.insert(Move::TableauToTableau(from as u8, to as u8, count as u8));
                    }
                }
            }
        }
        for cell in 0..board.free_capacity() {
            if board.can_move_free_to_home(cell) {
                moves.insert(Move::FreeToHome(cell as u8));
            }
            for to in 0..columns {
                if board.can_move_free_to_tableau(cell, to) {
                    moves.insert(Move::FreeToTableau(cell as u8, to as u8));
                }
            }
        }
        moves
    }

    #[test]
    fn test_deal() {
        let board = Board::deal(&mut SmallRng::seed_from_u64(1));
        assert_eq!(board.validate(), Ok(()));
        assert!(!board.is_won());
        assert_eq!(board.min_moves_to_win(), 52);
        assert_eq!(board.free_used(), 0);
        assert_eq!(board.free_open(), DEFAULT_FREE_CELLS);
        let lens: Vec<usize> = (0..board.columns()).map(|c| board.column_len(c)).collect();
        assert_eq!(lens, vec![7, 7, 7, 7, 6, 6, 6, 6]);
    }

    #[test]
    fn test_same_seed_same_deal() {
        let a = Board::deal(&mut SmallRng::seed_from_u64(2000));
        let b = Board::deal(&mut SmallRng::seed_from_u64(2000));
        let c = Board::deal(&mut SmallRng::seed_from_u64(2001));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, c);
    }

    #[test]
    fn test_deal_errors() {
        let layout = Layout::default();
        let err = Board::from_columns(layout, &cards("KC KC KD KH"), &[], &[]).unwrap_err();
        assert_eq!(err, DealError::DuplicateCard(card("AC")));
        assert!(err.to_string().contains("Card already used"));

        let err = Board::from_columns(layout, &cards("KC KD KH"), &cards("AC"), &[]).unwrap_err();
        assert_eq!(err, DealError::DuplicateCard(card("AC")));

        let err = Board::from_columns(layout, &cards("KC KD KH QS"), &[], &[]).unwrap_err();
        assert_eq!(err, DealError::MissingCards(vec![card("KS")]));

        let err = Board::from_columns(
            Layout::new(8, 1).unwrap(),
            &cards("KC KD KH JS"),
            &cards("QS KS"),
            &[],
        )
        .unwrap_err();
        assert_eq!(
            err,
            DealError::TooManyFreeCards {
                used: 2,
                capacity: 1
            }
        );

        let err = Board::from_columns(
            Layout::new(1, 4).unwrap(),
            &cards("KC KD KH JS"),
            &[],
            &[cards("QS"), cards("KS")],
        )
        .unwrap_err();
        assert!(matches!(err, DealError::TooManyColumns { .. }));

        assert!(Layout::new(0, 4).is_err());
        assert!(Layout::new(11, 4).is_err());
        assert!(Layout::new(8, 9).is_err());
    }

    #[test]
    fn test_won_board() {
        let board = Board::from_columns(Layout::default(), &cards("KC KD KS KH"), &[], &[]).unwrap();
        assert!(board.is_won());
        assert_eq!(board.min_moves_to_win(), 0);
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn test_one_move_from_win() {
        let board = Board::from_columns(
            Layout::default(),
            &cards("KC KD KS QH"),
            &[],
            &[cards("KH")],
        )
        .unwrap();
        assert!(!board.is_won());
        assert_eq!(board.min_moves_to_win(), 1);

        let home_moves: Vec<Move> = board
            .legal_moves()
            .into_iter()
            .filter(|m| m.is_home())
            .collect();
        assert_eq!(home_moves, vec![Move::TableauToHome(0)]);
        let won = home_moves[0].apply(&board);
        assert!(won.is_won());
        assert_eq!(won.min_moves_to_win(), 0);
    }

    #[test]
    fn test_legal_moves_are_valid() {
        for seed in 0..20 {
            let board = Board::deal(&mut SmallRng::seed_from_u64(seed));
            random_walk(board, 150, seed, |board| {
                let moves = board.legal_moves();
                let unique: HashSet<Move> = moves.iter().copied().collect();
                assert_eq!(unique.len(), moves.len(), "duplicate moves on\n{board}");
                assert_eq!(unique, brute_force_moves(board), "move mismatch on\n{board}");
                for mov in moves {
                    assert!(mov.is_legal(board));
                    let next = mov.apply(board);
                    assert_eq!(next.validate(), Ok(()), "{mov} broke\n{board}");
                }
            });
        }
    }

    #[test]
    fn test_min_moves_zero_iff_won() {
        for seed in 0..10 {
            let board = Board::deal(&mut SmallRng::seed_from_u64(seed));
            random_walk(board, 300, seed + 100, |board| {
                assert_eq!(board.min_moves_to_win() == 0, board.is_won());
                assert!(board.min_moves_to_win() <= 52);
            });
        }
        let won = Board::from_columns(Layout::default(), &cards("KC KD KS KH"), &[], &[]).unwrap();
        assert_eq!(won.min_moves_to_win() == 0, won.is_won());
    }

    #[test]
    fn test_inverse_moves() {
        let mut checked = 0;
        for seed in 0..10 {
            let board = Board::deal(&mut SmallRng::seed_from_u64(seed));
            random_walk(board, 100, seed + 7, |board| {
                for mov in board.legal_moves() {
                    if let Some(inverse) = mov.inverse(board) {
                        let after = mov.apply(board);
                        assert_eq!(&inverse.apply(&after), board, "{mov} then {inverse}");
                        checked += 1;
                    }
                }
            });
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_supermove_capacity() {
        let board = Board::from_columns(
            Layout::default(),
            &cards("KC KD"),
            &cards("TS QS KH"),
            &[
                cards("KS QH JS TH 9S 8H"),
                vec![],
                vec![],
                cards("2S 3S 4S 5S 6S 7S 8S"),
                cards("AH 2H 3H 4H 5H 6H 7H"),
                cards("9H"),
                cards("JH"),
                cards("AS"),
            ],
        )
        .unwrap();
        assert_eq!(board.run_size(0), 6);
        assert_eq!(board.free_open(), 1);
        assert_eq!(board.empty_columns(), 2);
        assert_eq!(board.max_run_move(0, 1), 4);

        assert!(board.can_move_tableau_to_tableau(0, 1, 4));
        assert!(!board.can_move_tableau_to_tableau(0, 1, 5));
        assert!(board.can_move_tableau_to_tableau(0, 2, 4));
        assert!(!board.can_move_tableau_to_tableau(0, 2, 5));

        // Filling the other empty column halves the capacity.
        let board = board.move_tableau_to_tableau(0, 2, 1);
        assert_eq!(board.max_run_move(0, 1), 2);
        assert!(board.can_move_tableau_to_tableau(0, 1, 2));
        assert!(!board.can_move_tableau_to_tableau(0, 1, 3));

        // Runs only land on a card one rank above.
        assert!(!board.can_move_tableau_to_tableau(0, 2, 1));
        assert_eq!(board.validate(), Ok(()));
    }

    #[test]
    fn test_free_cells_canonical() {
        let board = Board::deal(&mut SmallRng::seed_from_u64(3));
        let a = board.move_tableau_to_free(0).move_tableau_to_free(1);
        let b = board.move_tableau_to_free(1).move_tableau_to_free(0);
        assert_eq!(a, b);
        let free: Vec<Card> = a.free_cells().collect();
        assert!(free.windows(2).all(|w| w[0] > w[1]));

        let full = a.move_tableau_to_free(2).move_tableau_to_free(3);
        assert_eq!(full.free_open(), 0);
        assert!(!full.can_move_tableau_to_free(0));
    }

    #[test]
    fn test_move_between_columns() {
        let board = Board::from_columns(
            Layout::new(4, 0).unwrap(),
            &cards("KC KD JS JH"),
            &[],
            &[cards("KS QH"), vec![], cards("QS"), cards("KH")],
        )
        .unwrap();
        let moved = board.move_tableau_to_tableau(0, 1, 1);
        assert_eq!(moved.tableau(0).collect::<Vec<_>>(), cards("KS"));
        assert_eq!(moved.tableau(1).collect::<Vec<_>>(), cards("QH"));
        let back = moved.move_tableau_to_tableau(1, 0, 1);
        assert_eq!(back, board);

        let moved = board.move_tableau_to_tableau(2, 3, 1);
        assert_eq!(moved.tableau(3).collect::<Vec<_>>(), cards("KH QS"));
        assert!(moved.is_column_empty(2));
        assert_eq!(moved.validate(), Ok(()));
    }

    #[test]
    #[should_panic(expected = "illegal move")]
    fn test_illegal_move_panics() {
        let board = Board::from_columns(
            Layout::new(4, 0).unwrap(),
            &cards("KC KD JS JH"),
            &[],
            &[cards("KS QH"), vec![], cards("QS"), cards("KH")],
        )
        .unwrap();
        board.move_tableau_to_free(0);
    }

    #[test]
    fn test_render_parse_roundtrip() {
        for seed in 0..5 {
            let board = Board::deal(&mut SmallRng::seed_from_u64(seed));
            random_walk(board, 80, seed, |board| {
                let text = board.to_string();
                let parsed = Board::parse(&text).unwrap();
                assert_eq!(&parsed, board, "failed to round trip\n{text}");
            });
        }

        let won = Board::from_columns(Layout::new(4, 2).unwrap(), &cards("KC KD KS KH"), &[], &[])
            .unwrap();
        assert_eq!(Board::parse(&won.to_string()).unwrap(), won);
    }

    #[test]
    fn test_parse_board() {
        let text = [
            "  9C  9D  8S  8H||  9S  QS  --  --",
            "",
            "  9H  KD  KH  JH  QH  KS  KC",
            "  QC  TC  JS  QD",
            "  JD  TH  JC",
            "  TS  TD                        ",
        ]
        .join("\n");

        let board = Board::parse(&text).unwrap();
        assert_eq!(board.validate(), Ok(()));
        assert_eq!(board.columns(), 8);
        assert_eq!(board.free_capacity(), 4);
        assert_eq!(board.free_used(), 2);
        assert_eq!(board.home(2), Some(card("8S")));
        assert_eq!(board.home_count(3), 8);
        assert_eq!(board.peek_tableau(0), Some(card("TS")));
        assert_eq!(board.peek_free(0), Some(card("QS")));
        assert!(board.is_column_empty(7));

        let rendered = board.to_string();
        let lines: Vec<&str> = rendered.lines().map(str::trim_end).collect();
        let expected: Vec<&str> = text.lines().map(str::trim_end).collect();
        assert_eq!(lines[0], "  9C  9D  8S  8H||  QS  9S  --  --");
        assert_eq!(lines[1..], expected[1..]);
        assert_eq!(Board::parse(&rendered).unwrap(), board);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Board::parse("").is_err());
        assert!(Board::parse("  KC  KD  KS  KH").is_err());
        assert!(Board::parse("  KC  KD  KS||  --").is_err());
        // A card floating below an empty slot.
        let text = "  KC  KD  QS  KH||  --\n\n  KS    \n      ";
        assert!(Board::parse(text).is_ok());
        let text = "  KC  KD  QS  KH||  --\n\n        \n  KS    ";
        assert!(Board::parse(text).is_err());
    }

    #[test]
    fn test_parse_blank_separator_with_spaces() {
        let text = "  KC  KD  QS  KH||  --\n    \t\n  KS    \n";
        let board = Board::parse(text).unwrap();
        assert_eq!(board.columns(), 2);
        assert_eq!(board.peek_tableau(0), Some(card("KS")));
        assert_eq!(board.column_len(0), 1);
    }
}
