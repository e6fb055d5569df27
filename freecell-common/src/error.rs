use crate::card::Card;

use thiserror::Error;

/// A deal or board that does not hold exactly the 52 cards in legal places.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DealError {
    #[error("Card already used {0}")]
    DuplicateCard(Card),

    #[error("Not all cards used, missing {}", format_cards(.0))]
    MissingCards(Vec<Card>),

    #[error("{used} free cards do not fit in {capacity} free cells")]
    TooManyFreeCards { used: usize, capacity: usize },

    #[error("{used} columns dealt for a tableau of {capacity}")]
    TooManyColumns { used: usize, capacity: usize },

    #[error("Invalid layout: {columns} columns, {free_cells} free cells")]
    InvalidLayout { columns: usize, free_cells: usize },

    #[error("Corrupt board: {0}")]
    Corrupt(&'static str),
}

fn format_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
