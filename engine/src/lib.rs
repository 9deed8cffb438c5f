//! Chess rules capability used by the corpus and scoring crates: FEN fields, move keys, PGN reading,
//! the move enumeration table and the board symbol encoding. Move generation and legality come from `shakmaty`.

pub mod board_symbols;
pub mod fen;
pub mod move_enumeration;
pub mod move_key;
pub mod pgn;

pub use crate::board_symbols::*;
pub use crate::fen::*;
pub use crate::move_enumeration::*;
pub use crate::move_key::*;
pub use crate::pgn::*;

pub use shakmaty::{Chess, Color, Move, Position, Role};

/// Number of pieces on the board, both colours.
pub fn material_count(position: &Chess) -> usize {
    position.board().occupied().count()
}

/// Number of pieces in the placement field of a FEN.
pub fn placement_material_count(placement: &str) -> usize {
    placement
        .bytes()
        .filter(|c| b"KQRBNPkqrbnp".contains(c))
        .count()
}
