use anyhow::{Context, Result, bail};

use std::fmt;
use std::str::FromStr;

pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const MAX_CARD: u8 = MAX_SUIT * MAX_RANK;

const SUITS: [char; 4] = ['C', 'D', 'S', 'H'];
const SUIT_SYMBOLS: [char; 4] = ['♣', '♦', '♠', '♥'];
const RANKS: [char; 13] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

/// One of the 52 cards, encoded as `suit * 13 + rank` with rank 0 for an Ace.
///
/// Suits are ordered clubs, diamonds, spades, hearts so that odd suits are red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u8);

impl Card {
    pub const fn new(rank: u8, suit: u8) -> Self {
        assert!(rank < MAX_RANK && suit < MAX_SUIT);
        Self(suit * MAX_RANK + rank)
    }

    pub fn from_id(id: u8) -> Option<Self> {
        (id < MAX_CARD).then_some(Self(id))
    }

    /// Iterates the whole deck in id order.
    pub fn all() -> impl Iterator<Item = Card> {
        (0..MAX_CARD).map(Card)
    }

    pub fn parse(rank: char, suit: char) -> Result<Self> {
        let rank_idx = RANKS
            .iter()
            .position(|&r| r == rank.to_ascii_uppercase())
            .with_context(|| format!("Invalid rank at card {rank}{suit}"))?;
        let suit_idx = SUITS
            .iter()
            .position(|&s| s == suit.to_ascii_uppercase())
            .or_else(|| SUIT_SYMBOLS.iter().position(|&s| s == suit))
            .with_context(|| format!("Invalid suit at card {rank}{suit}"))?;
        Ok(Card::new(rank_idx as u8, suit_idx as u8))
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn rank(&self) -> u8 {
        self.0 % MAX_RANK
    }

    pub fn suit(&self) -> u8 {
        self.0 / MAX_RANK
    }

    pub fn is_red(&self) -> bool {
        self.suit() & 1 == 1
    }

    pub fn is_ace(&self) -> bool {
        self.rank() == 0
    }

    pub fn is_king(&self) -> bool {
        self.rank() == MAX_RANK - 1
    }

    pub fn rank_above(&self) -> Option<Card> {
        (!self.is_king()).then(|| Card(self.0 + 1))
    }

    pub fn rank_below(&self) -> Option<Card> {
        (!self.is_ace()).then(|| Card(self.0 - 1))
    }

    pub fn suit_above(&self) -> Option<Card> {
        (self.suit() + 1 < MAX_SUIT).then(|| Card(self.0 + MAX_RANK))
    }

    pub fn suit_below(&self) -> Option<Card> {
        (self.suit() > 0).then(|| Card(self.0 - MAX_RANK))
    }

    /// Whether this card may be stacked on `other` in a tableau column.
    #[inline]
    pub fn fits_on(&self, other: Card) -> bool {
        other.rank() == self.rank() + 1 && other.is_red() != self.is_red()
    }

    pub fn pretty_print(&self) -> String {
        format!(
            "{}{}",
            RANKS[self.rank() as usize],
            SUIT_SYMBOLS[self.suit() as usize]
        )
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            RANKS[self.rank() as usize],
            SUITS[self.suit() as usize]
        )
    }
}

impl FromStr for Card {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => Card::parse(rank, suit),
            _ => bail!("Invalid card '{s}'"),
        }
    }
}
