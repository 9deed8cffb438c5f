use std::fmt;

use engine::MoveKey;

/// Occurrence counts of the moves played from one board, in the order they were first seen.
/// Every count is at least one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardInfo {
    moves: Vec<(MoveKey, u32)>,
}

impl BoardInfo {
    pub fn new(first_move: MoveKey) -> Self {
        Self {
            moves: vec![(first_move, 1)],
        }
    }

    pub fn update(&mut self, m: MoveKey) {
        self.add(m, 1);
    }

    fn add(&mut self, m: MoveKey, count: u32) {
        match self.moves.iter_mut().find(|(key, _)| *key == m) {
            Some((_, c)) => *c += count,
            None => self.moves.push((m, count)),
        }
    }

    pub fn merge(&mut self, other: &BoardInfo) {
        for (m, count) in &other.moves {
            self.add(*m, *count);
        }
    }

    pub fn moves(&self) -> &[(MoveKey, u32)] {
        &self.moves
    }

    pub fn count(&self, m: &MoveKey) -> Option<u32> {
        self.moves.iter().find(|(key, _)| key == m).map(|(_, c)| *c)
    }

    pub fn total(&self) -> u32 {
        self.moves.iter().map(|(_, c)| c).sum()
    }

    pub fn max_count(&self) -> Option<u32> {
        self.moves.iter().map(|(_, c)| *c).max()
    }

    /// The same statistics with every move seen from the other side of the board.
    pub fn mirrored(&self) -> Self {
        Self {
            moves: self.moves.iter().map(|(m, c)| (m.mirrored(), *c)).collect(),
        }
    }

    /// Every move played `max_count` times. Ties are all returned.
    pub fn top_moves(&self) -> Vec<MoveKey> {
        match self.max_count() {
            Some(max) => self
                .moves
                .iter()
                .filter(|(_, c)| *c == max)
                .map(|(m, _)| *m)
                .collect(),
            None => vec![],
        }
    }
}

impl fmt::Display for BoardInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (m, count) in &self.moves {
            if !first {
                write!(f, " ")?;
            }

            write!(f, "{}:{}", m, count)?;
            first = false;
        }

        Ok(())
    }
}
