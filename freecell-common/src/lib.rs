//! Cards, boards and moves for FreeCell.

pub mod board;
pub mod card;
pub mod error;
pub mod move_;

pub use board::{Board, Layout};
pub use card::Card;
pub use error::DealError;
pub use move_::{Move, Moves, format_moves};
