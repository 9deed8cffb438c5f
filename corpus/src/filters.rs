use anyhow::{anyhow, bail, Result};
use engine::{material_count, placement_material_count, Chess, FenField, FieldSelection, Move};

use super::{BoardInfo, BoardKey};

/// A ply about to be aggregated: the position before the move and the move played from it.
pub struct PlyContext<'a> {
    pub position: &'a Chess,
    pub mv: &'a Move,
    /// Half moves made in the game before this one.
    pub plies_played: usize,
}

/// An aggregated entry under review after every game has been walked.
pub struct EntryContext<'a> {
    pub key: &'a BoardKey,
    pub info: &'a BoardInfo,
    pub fields: &'a FieldSelection,
}

/// Evaluated while walking games. Returning true leaves the ply out of the corpus; the game still advances.
pub trait PreFilter: Send + Sync {
    fn veto(&self, ply: &PlyContext) -> bool;
}

/// Evaluated once over the finished corpus. Returning true deletes the entry.
pub trait PostFilter: Send + Sync {
    fn veto(&self, entry: &EntryContext) -> bool;

    /// A key field this filter reads. Selecting fields without it is a configuration error.
    fn required_field(&self) -> Option<FenField> {
        None
    }
}

impl<F> PreFilter for F
where
    F: Fn(&PlyContext) -> bool + Send + Sync,
{
    fn veto(&self, ply: &PlyContext) -> bool {
        self(ply)
    }
}

impl<F> PostFilter for F
where
    F: Fn(&EntryContext) -> bool + Send + Sync,
{
    fn veto(&self, entry: &EntryContext) -> bool {
        self(entry)
    }
}

/// Ordered predicates evaluated until the first one that vetoes.
pub struct FilterChain<T: ?Sized> {
    filters: Vec<Box<T>>,
}

impl<T: ?Sized> FilterChain<T> {
    pub fn new() -> Self {
        Self { filters: vec![] }
    }

    pub fn with(mut self, filter: Box<T>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Box<T>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<T: ?Sized> Default for FilterChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> From<Vec<Box<T>>> for FilterChain<T> {
    fn from(filters: Vec<Box<T>>) -> Self {
        Self { filters }
    }
}

impl FilterChain<dyn PreFilter> {
    pub fn vetoes(&self, ply: &PlyContext) -> bool {
        self.filters.iter().any(|f| f.veto(ply))
    }
}

impl FilterChain<dyn PostFilter> {
    pub fn vetoes(&self, entry: &EntryContext) -> bool {
        self.filters.iter().any(|f| f.veto(entry))
    }

    pub fn validate(&self, fields: &FieldSelection) -> Result<()> {
        for field in self.filters.iter().filter_map(|f| f.required_field()) {
            if !fields.contains(field) {
                bail!(
                    "A post filter reads the '{}' field which is not among the stored FEN fields",
                    field
                );
            }
        }

        Ok(())
    }
}

/// Vetoes positions with at most `n` pieces on the board.
pub struct MaterialAtMost(pub usize);

impl PreFilter for MaterialAtMost {
    fn veto(&self, ply: &PlyContext) -> bool {
        material_count(ply.position) <= self.0
    }
}

/// Vetoes the first `n + 1` positions of a game, those reached after at most `n` half moves.
pub struct PliesAtMost(pub usize);

impl PreFilter for PliesAtMost {
    fn veto(&self, ply: &PlyContext) -> bool {
        ply.plies_played <= self.0
    }
}

pub struct Capture;

impl PreFilter for Capture {
    fn veto(&self, ply: &PlyContext) -> bool {
        ply.mv.is_capture()
    }
}

/// Deletes entries whose placement field holds more than `n` pieces.
pub struct MaterialMoreThan(pub usize);

impl PostFilter for MaterialMoreThan {
    fn veto(&self, entry: &EntryContext) -> bool {
        entry
            .fields
            .field_of(entry.key.as_str(), FenField::Placement)
            .is_some_and(|placement| placement_material_count(placement) > self.0)
    }

    fn required_field(&self) -> Option<FenField> {
        Some(FenField::Placement)
    }
}

fn split_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once(':') {
        Some((name, arg)) => (name.trim(), Some(arg.trim())),
        None => (spec.trim(), None),
    }
}

fn parse_arg(spec: &str, arg: Option<&str>) -> Result<usize> {
    arg.ok_or_else(|| anyhow!("Filter '{}' requires a numeric argument", spec))?
        .parse::<usize>()
        .map_err(|_| anyhow!("Filter '{}' has an invalid numeric argument", spec))
}

/// Parses `material_at_most:N`, `plies_at_most:N` or `capture`.
pub fn parse_pre_filter(spec: &str) -> Result<Box<dyn PreFilter>> {
    let filter: Box<dyn PreFilter> = match split_spec(spec) {
        ("material_at_most", arg) => Box::new(MaterialAtMost(parse_arg(spec, arg)?)),
        ("plies_at_most", arg) => Box::new(PliesAtMost(parse_arg(spec, arg)?)),
        ("capture", None) => Box::new(Capture),
        _ => bail!("Unknown pre filter '{}'", spec),
    };

    Ok(filter)
}

/// Parses `material_more_than:N`.
pub fn parse_post_filter(spec: &str) -> Result<Box<dyn PostFilter>> {
    let filter: Box<dyn PostFilter> = match split_spec(spec) {
        ("material_more_than", arg) => Box::new(MaterialMoreThan(parse_arg(spec, arg)?)),
        _ => bail!("Unknown post filter '{}'", spec),
    };

    Ok(filter)
}
