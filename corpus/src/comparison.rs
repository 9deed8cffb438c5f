use engine::{Chess, Move, MoveKey, Position};

use super::BoardInfo;

/// Produces the negative moves of a comparison triplet for one board.
///
/// Implementations are pure over `(position, info)`. They are invoked once per entry and must not
/// carry state from one call to the next.
pub trait ComparisonMoves: Send + Sync {
    fn comparison_moves<'a>(
        &'a self,
        position: &'a Chess,
        info: &'a BoardInfo,
    ) -> Box<dyn Iterator<Item = Move> + 'a>;
}

impl<F> ComparisonMoves for F
where
    F: Fn(&Chess, &BoardInfo) -> Vec<Move> + Send + Sync,
{
    fn comparison_moves<'a>(
        &'a self,
        position: &'a Chess,
        info: &'a BoardInfo,
    ) -> Box<dyn Iterator<Item = Move> + 'a> {
        Box::new(self(position, info).into_iter())
    }
}

/// Legal quiet moves that were never played from the board, in move generation order.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnplayedQuietMoves {
    limit: Option<usize>,
}

impl UnplayedQuietMoves {
    pub fn new() -> Self {
        Self { limit: None }
    }

    /// Caps the number of moves produced for a single board. A limit of zero means no cap.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
        }
    }
}

impl ComparisonMoves for UnplayedQuietMoves {
    fn comparison_moves<'a>(
        &'a self,
        position: &'a Chess,
        info: &'a BoardInfo,
    ) -> Box<dyn Iterator<Item = Move> + 'a> {
        let moves = position
            .legal_moves()
            .into_iter()
            .filter(|m| !m.is_capture())
            .filter(move |m| info.count(&MoveKey::from_move(m)).is_none())
            .take(self.limit.unwrap_or(usize::MAX));

        Box::new(moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::FenParts;

    fn key(s: &str) -> MoveKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_excludes_played_moves_and_captures() {
        let position = FenParts::parse("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
            .unwrap()
            .to_position()
            .unwrap();
        let mut info = BoardInfo::new(key("e4e5"));
        info.update(key("g1f3"));

        let moves: Vec<MoveKey> = UnplayedQuietMoves::new()
            .comparison_moves(&position, &info)
            .map(|m| MoveKey::from_move(&m))
            .collect();

        assert_eq!(moves.len(), position.legal_moves().len() - 3);
        assert!(!moves.contains(&key("e4d5")));
        assert!(!moves.contains(&key("e4e5")));
        assert!(!moves.contains(&key("g1f3")));
        assert!(moves.contains(&key("d2d4")));
    }

    #[test]
    fn test_limit_and_restart() {
        let position = Chess::default();
        let info = BoardInfo::new(key("e2e4"));
        let generator = UnplayedQuietMoves::with_limit(5);

        assert_eq!(generator.comparison_moves(&position, &info).count(), 5);
        assert_eq!(generator.comparison_moves(&position, &info).count(), 5);
        assert_eq!(
            UnplayedQuietMoves::with_limit(0)
                .comparison_moves(&position, &info)
                .count(),
            19
        );
    }

    #[test]
    fn test_closure_generator() {
        let position = Chess::default();
        let info = BoardInfo::new(key("e2e4"));
        let generator = |p: &Chess, _: &BoardInfo| -> Vec<Move> {
            p.legal_moves().into_iter().take(2).collect()
        };

        assert_eq!(generator.comparison_moves(&position, &info).count(), 2);
    }
}
