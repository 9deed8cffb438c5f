use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One scored board: its 64 symbol indices, the enumeration id of every legal move and the score of
/// the child reached by each of those moves.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoredRecord {
    pub board: Vec<u8>,
    pub moves: Vec<u32>,
    pub move_scores: Vec<f32>,
}

impl ScoredRecord {
    pub fn to_json_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).context("Failed to serialize scored record")?;
        line.push('\n');

        Ok(line)
    }
}
