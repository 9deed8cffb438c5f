use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move, Position, Role, Square};

/// Identity of a move for keying purposes: the UCI from and to squares. Castling is keyed as the
/// king's move and the promotion piece is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveKey {
    pub from: Square,
    pub to: Square,
}

impl MoveKey {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    pub fn from_move(m: &Move) -> Self {
        match m.to_uci(CastlingMode::Standard) {
            UciMove::Normal { from, to, .. } => Self { from, to },
            _ => Self {
                from: m.from().unwrap_or_else(|| m.to()),
                to: m.to(),
            },
        }
    }

    /// The same move seen from the other side of the board, rank `r` becoming rank `9 - r`.
    pub fn mirrored(self) -> Self {
        Self {
            from: self.from.flip_vertical(),
            to: self.to.flip_vertical(),
        }
    }

    /// Finds the legal move in `position` with this key. Promotions resolve to the queen.
    pub fn resolve(&self, position: &Chess) -> Option<Move> {
        let mut candidates = position
            .legal_moves()
            .into_iter()
            .filter(|m| MoveKey::from_move(m) == *self);

        let first = candidates.next()?;
        if first.promotion().is_none() || first.promotion() == Some(Role::Queen) {
            return Some(first);
        }

        candidates
            .find(|m| m.promotion() == Some(Role::Queen))
            .or(Some(first))
    }
}

impl fmt::Display for MoveKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl FromStr for MoveKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() < 4 || !s.is_ascii() {
            bail!("Invalid move '{}'", s);
        }

        let from = s[0..2]
            .parse::<Square>()
            .map_err(|_| anyhow!("Invalid from square in move '{}'", s))?;
        let to = s[2..4]
            .parse::<Square>()
            .map_err(|_| anyhow!("Invalid to square in move '{}'", s))?;

        Ok(Self { from, to })
    }
}
