use anyhow::{bail, Context, Result};
use corpus::canonicalize;
use engine::{BoardSymbols, Chess, FenParts, FieldSelection, MoveEnumeration, MoveKey, Position};

use super::ScoredRecord;

/// A batch of corpus lines expanded into the flat list of child positions sent to the evaluator.
///
/// `boundaries[i]..boundaries[i + 1]` are the children of line `i`.
pub struct ExpandedBatch {
    boards: Vec<Vec<u8>>,
    move_ids: Vec<Vec<u32>>,
    children: Vec<Chess>,
    boundaries: Vec<usize>,
}

impl ExpandedBatch {
    /// Rebuilds each line's board with White to move and plays every legal move from it.
    pub fn expand<S: AsRef<str>>(
        lines: &[S],
        fields: &FieldSelection,
        enumeration: &MoveEnumeration,
    ) -> Result<Self> {
        let mut batch = Self {
            boards: Vec::with_capacity(lines.len()),
            move_ids: Vec::with_capacity(lines.len()),
            children: vec![],
            boundaries: vec![0],
        };

        for line in lines {
            let line = line.as_ref();
            let parts = canonicalize(&fields.parse_line(line)?);
            let position = parts
                .to_position()
                .with_context(|| format!("Failed to rebuild the board of '{}'", line.trim()))?;

            let board = BoardSymbols::from_fen_parts(&FenParts::from_position(&position))?;
            let mut ids = vec![];

            for m in position.legal_moves() {
                let key = MoveKey::from_move(&m);
                let id = enumeration
                    .id(&key)
                    .with_context(|| format!("Move {} has no enumeration id", key))?;

                let mut child = position.clone();
                child.play_unchecked(&m);

                ids.push(id);
                batch.children.push(child);
            }

            batch.boards.push(board.indices());
            batch.move_ids.push(ids);
            batch.boundaries.push(batch.children.len());
        }

        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn children(&self) -> &[Chess] {
        &self.children
    }

    pub fn take_children(&mut self) -> Vec<Chess> {
        std::mem::take(&mut self.children)
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Number of children every line contributed, which `take_children` does not change.
    pub fn total_children(&self) -> usize {
        self.boundaries.last().copied().unwrap_or_default()
    }

    /// Pairs each line with its slice of `scores`.
    pub fn into_records(self, scores: Vec<f32>) -> Result<Vec<ScoredRecord>> {
        let slices = split_scores(scores, &self.boundaries)?;

        Ok(self
            .boards
            .into_iter()
            .zip(self.move_ids)
            .zip(slices)
            .map(|((board, moves), move_scores)| ScoredRecord {
                board,
                moves,
                move_scores,
            })
            .collect())
    }
}

/// Splits the flat scores at the cumulative `boundaries`. The number of scores must equal the number
/// of children submitted.
pub fn split_scores(scores: Vec<f32>, boundaries: &[usize]) -> Result<Vec<Vec<f32>>> {
    let expected = boundaries.last().copied().unwrap_or_default();
    if scores.len() != expected {
        bail!(
            "The evaluator returned {} scores for {} child positions",
            scores.len(),
            expected
        );
    }

    Ok(boundaries
        .windows(2)
        .map(|w| scores[w[0]..w[1]].to_vec())
        .collect())
}
