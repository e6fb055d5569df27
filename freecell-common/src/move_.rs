use crate::board::Board;
use crate::card::Card;

use smallvec::SmallVec;
use std::fmt;

pub type Moves = SmallVec<[Move; 64]>;

/// One FreeCell move. Column and cell indexes are zero based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    TableauToHome(u8),
    TableauToFree(u8),
    /// (from, to, count)
    TableauToTableau(u8, u8, u8),
    FreeToHome(u8),
    /// (cell, to)
    FreeToTableau(u8, u8),
}

impl Move {
    pub fn is_legal(&self, board: &Board) -> bool {
        match *self {
            Move::TableauToHome(col) => board.can_move_tableau_to_home(col as usize),
            Move::TableauToFree(col) => board.can_move_tableau_to_free(col as usize),
            Move::TableauToTableau(from, to, count) => {
                board.can_move_tableau_to_tableau(from as usize, to as usize, count as usize)
            }
            Move::FreeToHome(cell) => board.can_move_free_to_home(cell as usize),
            Move::FreeToTableau(cell, to) => {
                board.can_move_free_to_tableau(cell as usize, to as usize)
            }
        }
    }

    /// Plays the move on `board`. Panics when the move is illegal there.
    pub fn apply(&self, board: &Board) -> Board {
        match *self {
            Move::TableauToHome(col) => board.move_tableau_to_home(col as usize),
            Move::TableauToFree(col) => board.move_tableau_to_free(col as usize),
            Move::TableauToTableau(from, to, count) => {
                board.move_tableau_to_tableau(from as usize, to as usize, count as usize)
            }
            Move::FreeToHome(cell) => board.move_free_to_home(cell as usize),
            Move::FreeToTableau(cell, to) => board.move_free_to_tableau(cell as usize, to as usize),
        }
    }

    /// The card that moves; for a run, its bottom card.
    pub fn card(&self, board: &Board) -> Option<Card> {
        match *self {
            Move::TableauToHome(col) | Move::TableauToFree(col) => board.peek_tableau(col as usize),
            Move::TableauToTableau(from, _, count) => {
                let len = board.column_len(from as usize);
                board.tableau(from as usize).nth(len.checked_sub(count as usize)?)
            }
            Move::FreeToHome(cell) | Move::FreeToTableau(cell, _) => board.peek_free(cell as usize),
        }
    }

    pub fn is_home(&self) -> bool {
        matches!(self, Move::TableauToHome(_) | Move::FreeToHome(_))
    }

    /// The move that undoes `self` when played right after it on `before`.
    /// Home moves have no inverse.
    pub fn inverse(&self, before: &Board) -> Option<Move> {
        if self.is_home() || !self.is_legal(before) {
            return None;
        }
        let after = self.apply(before);
        let inverse = match *self {
            Move::TableauToFree(col) => {
                let card = before.peek_tableau(col as usize)?;
                let cell = after.free_cells().position(|free| free == card)?;
                Move::FreeToTableau(cell as u8, col)
            }
            Move::FreeToTableau(_, to) => Move::TableauToFree(to),
            Move::TableauToTableau(from, to, count) => Move::TableauToTableau(to, from, count),
            Move::TableauToHome(_) | Move::FreeToHome(_) => return None,
        };
        inverse.is_legal(&after).then_some(inverse)
    }

    /// Names the cards involved, e.g. `(Tableau1) 5♥4♣ -> (Tableau3) 6♠`.
    pub fn describe(&self, board: &Board) -> String {
        let format_card = |card: Option<Card>| -> String {
            card.map(|c| c.pretty_print()).unwrap_or_else(|| "--".into())
        };

        match *self {
            Move::TableauToHome(col) => {
                let card = board.peek_tableau(col as usize);
                let home = card.and_then(|c| board.home(c.suit()));
                format!(
                    "(Tableau{}) {} -> (Home) {}",
                    col + 1,
                    format_card(card),
                    format_card(home)
                )
            }
            Move::TableauToFree(col) => {
                let card = board.peek_tableau(col as usize);
                format!("(Tableau{}) {} -> (Free cell)", col + 1, format_card(card))
            }
            Move::TableauToTableau(from, to, count) => {
                let cards: Vec<Card> = board.tableau(from as usize).collect();
                let from_cards = cards
                    .iter()
                    .skip(cards.len().saturating_sub(count as usize))
                    .map(|c| c.pretty_print())
                    .collect::<Vec<_>>()
                    .join("");
                format!(
                    "(Tableau{}) {from_cards} -> (Tableau{}) {}",
                    from + 1,
                    to + 1,
                    format_card(board.peek_tableau(to as usize))
                )
            }
            Move::FreeToHome(cell) => {
                let card = board.peek_free(cell as usize);
                let home = card.and_then(|c| board.home(c.suit()));
                format!(
                    "(Free{}) {} -> (Home) {}",
                    cell + 1,
                    format_card(card),
                    format_card(home)
                )
            }
            Move::FreeToTableau(cell, to) => format!(
                "(Free{}) {} -> (Tableau{}) {}",
                cell + 1,
                format_card(board.peek_free(cell as usize)),
                to + 1,
                format_card(board.peek_tableau(to as usize))
            ),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Move::TableauToHome(col) => write!(f, "T{}:H", col + 1),
            Move::TableauToFree(col) => write!(f, "T{}:F", col + 1),
            Move::TableauToTableau(from, to, count) => {
                write!(f, "T{}:T{}", from + 1, to + 1)?;
                if count > 1 {
                    write!(f, "@{count}")?;
                }
                Ok(())
            }
            Move::FreeToHome(cell) => write!(f, "F{}:H", cell + 1),
            Move::FreeToTableau(cell, to) => write!(f, "F{}:T{}", cell + 1, to + 1),
        }
    }
}

/// Lays the moves out ten per line in aligned columns.
pub fn format_moves(moves: &[Move]) -> String {
    let list: Vec<String> = moves.iter().map(|m| m.to_string()).collect();

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Layout;

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    fn sample_board() -> Board {
        Board::from_columns(
            Layout::new(4, 2).unwrap(),
            &cards("KC KD TS TH"),
            &cards("QS"),
            &[cards("KS QH JS"), vec![], cards("JH"), cards("KH")],
        )
        .unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(Move::TableauToHome(0).to_string(), "T1:H");
        assert_eq!(Move::TableauToFree(3).to_string(), "T4:F");
        assert_eq!(Move::TableauToTableau(0, 1, 1).to_string(), "T1:T2");
        assert_eq!(Move::TableauToTableau(0, 1, 3).to_string(), "T1:T2@3");
        assert_eq!(Move::FreeToHome(0).to_string(), "F1:H");
        assert_eq!(Move::FreeToTableau(1, 2).to_string(), "F2:T3");
    }

    #[test]
    fn test_format_moves() {
        let moves = vec![Move::TableauToFree(0); 12];
        let output = format_moves(&moves);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "T1:F ".repeat(10));
        assert_eq!(lines[1], "T1:F ".repeat(2));
        assert_eq!(format_moves(&[]), "");
    }

    #[test]
    fn test_describe() {
        let board = sample_board();
        assert_eq!(
            Move::TableauToHome(0).describe(&board),
            "(Tableau1) J♠ -> (Home) T♠"
        );
        assert_eq!(
            Move::TableauToTableau(0, 1, 2).describe(&board),
            "(Tableau1) Q♥J♠ -> (Tableau2) --"
        );
        assert_eq!(
            Move::FreeToTableau(0, 3).describe(&board),
            "(Free1) Q♠ -> (Tableau4) K♥"
        );
        assert_eq!(Move::TableauToFree(2).describe(&board), "(Tableau3) J♥ -> (Free cell)");
    }

    #[test]
    fn test_apply_and_inverse() {
        let board = sample_board();
        let moves = board.legal_moves();
        assert!(moves.contains(&Move::TableauToHome(0)));
        assert!(moves.contains(&Move::FreeToTableau(0, 3)));
        assert!(moves.contains(&Move::TableauToTableau(0, 1, 2)));

        let home = Move::TableauToHome(0);
        assert_eq!(home.inverse(&board), None);
        assert_eq!(home.apply(&board).home_count(2), 11);

        let free = Move::TableauToFree(2);
        let inverse = free.inverse(&board).unwrap();
        // JH sorts ahead of QS in the free cells.
        assert_eq!(inverse, Move::FreeToTableau(0, 2));
        assert_eq!(inverse.apply(&free.apply(&board)), board);

        let run = Move::TableauToTableau(0, 1, 2);
        let inverse = run.inverse(&board).unwrap();
        assert_eq!(inverse, Move::TableauToTableau(1, 0, 2));
        assert_eq!(inverse.apply(&run.apply(&board)), board);

        assert_eq!(Move::TableauToTableau(1, 0, 1).inverse(&board), None);

        assert_eq!(run.card(&board), Some("QH".parse().unwrap()));
        assert_eq!(free.card(&board), Some("JH".parse().unwrap()));
        assert_eq!(Move::FreeToHome(0).card(&board), Some("QS".parse().unwrap()));
        assert_eq!(Move::TableauToTableau(0, 1, 4).card(&board), None);
    }
}
