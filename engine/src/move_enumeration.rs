use shakmaty::Square;

use super::MoveKey;

const NUM_SQUARES: usize = 64;

/// Fixed numbering of every (from, to) pair a queen or a knight can make on an empty board.
/// The table does not depend on whose turn it is, so keys must already be in the canonical frame.
pub struct MoveEnumeration {
    ids: Vec<Option<u32>>,
    len: usize,
}

impl MoveEnumeration {
    pub fn new() -> Self {
        let mut ids = vec![None; NUM_SQUARES * NUM_SQUARES];
        let mut len = 0;

        for from in 0..NUM_SQUARES {
            for to in 0..NUM_SQUARES {
                if is_queen_or_knight_move(from, to) {
                    ids[from * NUM_SQUARES + to] = Some(len as u32);
                    len += 1;
                }
            }
        }

        Self { ids, len }
    }

    pub fn id(&self, key: &MoveKey) -> Option<u32> {
        self.ids[key.from as usize * NUM_SQUARES + key.to as usize]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for MoveEnumeration {
    fn default() -> Self {
        Self::new()
    }
}

fn is_queen_or_knight_move(from: usize, to: usize) -> bool {
    if from == to {
        return false;
    }

    let from = Square::new(from as u32);
    let to = Square::new(to as u32);
    let file_diff = (from.file() as i32 - to.file() as i32).abs();
    let rank_diff = (from.rank() as i32 - to.rank() as i32).abs();

    let is_line = file_diff == 0 || rank_diff == 0 || file_diff == rank_diff;
    let is_knight = (file_diff == 1 && rank_diff == 2) || (file_diff == 2 && rank_diff == 1);

    is_line || is_knight
}
