use std::collections::HashMap;
use std::fmt;

use engine::MoveKey;

use super::BoardInfo;

/// Canonical text identity of a board: the selected FEN fields joined with commas.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardKey(String);

impl BoardKey {
    pub fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BoardKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Mapping of board key to move statistics that iterates in first observation order.
/// Downstream splitting depends on that order.
#[derive(Clone, Debug, Default)]
pub struct AggregatedCorpus {
    index: HashMap<BoardKey, usize>,
    entries: Vec<(BoardKey, BoardInfo)>,
}

impl AggregatedCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: BoardKey, m: MoveKey) {
        match self.index.get(&key) {
            Some(&idx) => self.entries[idx].1.update(m),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, BoardInfo::new(m)));
            }
        }
    }

    /// Folds `other` in after every entry already present, as if its games had been walked next.
    pub fn merge(&mut self, other: AggregatedCorpus) {
        for (key, info) in other.entries {
            match self.index.get(&key) {
                Some(&idx) => self.entries[idx].1.merge(&info),
                None => {
                    self.index.insert(key.clone(), self.entries.len());
                    self.entries.push((key, info));
                }
            }
        }
    }

    /// Keeps the entries for which `keep` returns true. Returns the number removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&BoardKey, &BoardInfo) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|(key, info)| keep(key, info));

        if self.entries.len() != before {
            self.index = self
                .entries
                .iter()
                .enumerate()
                .map(|(idx, (key, _))| (key.clone(), idx))
                .collect();
        }

        before - self.entries.len()
    }

    pub fn get(&self, key: &BoardKey) -> Option<&BoardInfo> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BoardKey, &BoardInfo)> {
        self.entries.iter().map(|(key, info)| (key, info))
    }

    pub fn entries(&self) -> &[(BoardKey, BoardInfo)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
