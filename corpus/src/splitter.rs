use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use common::{create_writer, OutputWriter, Progress};
use engine::{BoardSymbols, Chess, FenField, FenParts, FieldSelection, Move, Position};
use itertools::Itertools;
use log::{debug, info, warn};

use super::{canonical_fen, canonicalize, AggregatedCorpus, BoardInfo, BoardKey, ComparisonMoves};

/// A named output and the share of the corpus it receives.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSplit {
    pub path: PathBuf,
    pub ratio: f64,
    /// Expand entries into comparison triplets instead of writing them as they are.
    pub triplets: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SplitPlan {
    splits: Vec<DatasetSplit>,
}

impl SplitPlan {
    /// Pairs up the parallel output lists. Every check happens here so a bad configuration is
    /// reported before any file is touched.
    pub fn new(
        paths: Vec<PathBuf>,
        ratios: Vec<f64>,
        triplets: Vec<bool>,
        fields: &FieldSelection,
    ) -> Result<Self> {
        if paths.len() != ratios.len() || ratios.len() != triplets.len() {
            bail!(
                "Output lists differ in length: {} files, {} ratios, {} triplet flags",
                paths.len(),
                ratios.len(),
                triplets.len()
            );
        }

        if let Some(ratio) = ratios.iter().find(|r| !(0.0..=1.0).contains(*r)) {
            bail!("Output ratio {} is outside of [0, 1]", ratio);
        }

        let total: f64 = ratios.iter().sum();
        if total > 1.0 + f64::EPSILON {
            bail!("Output ratios sum to {} which is more than 1", total);
        }

        if triplets.iter().any(|t| *t) && !fields.contains(FenField::Placement) {
            bail!("Triplet outputs require the placement FEN field");
        }

        let splits = paths
            .into_iter()
            .zip(ratios)
            .zip(triplets)
            .map(|((path, ratio), triplets)| DatasetSplit {
                path,
                ratio,
                triplets,
            })
            .collect();

        Ok(Self { splits })
    }

    pub fn splits(&self) -> &[DatasetSplit] {
        &self.splits
    }

    pub fn slice_bounds(&self, entries: usize) -> Vec<Range<usize>> {
        let ratios = self.splits.iter().map(|s| s.ratio).collect_vec();
        slice_bounds(entries, &ratios)
    }
}

/// Contiguous slices of `floor(ratio * entries)` entries each, in order. Whatever the rounding leaves
/// at the end is not assigned to any slice.
pub fn slice_bounds(entries: usize, ratios: &[f64]) -> Vec<Range<usize>> {
    let mut start = 0;

    ratios
        .iter()
        .map(|ratio| {
            let len = (ratio * entries as f64).floor() as usize;
            let end = (start + len).min(entries);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub records: usize,
    /// Triplet entries whose board could not be rebuilt from the key.
    pub skipped: usize,
}

/// Writes the aggregated corpus into its split outputs.
pub struct DatasetWriter<C> {
    fields: FieldSelection,
    comparison: C,
    print_interval: usize,
}

impl<C: ComparisonMoves> DatasetWriter<C> {
    pub fn new(fields: FieldSelection, comparison: C, print_interval: usize) -> Self {
        Self {
            fields,
            comparison,
            print_interval,
        }
    }

    /// `<key>,<move>:<count> <move>:<count> ...`
    pub fn plain_record(&self, key: &BoardKey, info: &BoardInfo) -> String {
        format!("{},{}", key, info)
    }

    /// One record per (negative, top move) pair, negatives in the outer loop. Each record is the
    /// anchor, positive child and negative child encodings concatenated. A key whose board is not a
    /// legal position yields no records.
    pub fn triplet_records(&self, key: &BoardKey, info: &BoardInfo) -> Result<Vec<String>> {
        Ok(self.expand_triplets(key, info)?.unwrap_or_default())
    }

    /// `None` when the fields in the key do not rebuild a legal position, which happens when the turn
    /// is not stored and keys were not canonicalized.
    fn expand_triplets(&self, key: &BoardKey, info: &BoardInfo) -> Result<Option<Vec<String>>> {
        let parts = self.fields.parse_line(key.as_str())?;
        let mirrored = parts.is_black_to_move();
        let position = match canonicalize(&parts).to_position() {
            Ok(position) => position,
            Err(e) => {
                warn!("Skipping '{}' for triplets: {}", key, e);
                return Ok(None);
            }
        };

        let anchor = BoardSymbols::from_fen_parts(&FenParts::from_position(&position))?;

        let mut positives = vec![];
        for top_move in info.top_moves() {
            let top_move = if mirrored { top_move.mirrored() } else { top_move };

            match top_move.resolve(&position) {
                Some(m) => positives.push(child_symbols(&position, &m)?),
                None => debug!("Skipping top move {} which is not legal for '{}'", top_move, key),
            }
        }

        if positives.is_empty() {
            return Ok(Some(vec![]));
        }

        let played = if mirrored { info.mirrored() } else { info.clone() };

        let mut records = vec![];
        for negative in self.comparison.comparison_moves(&position, &played) {
            let negative = child_symbols(&position, &negative)?;

            for positive in &positives {
                records.push(format!("{}{}{}", anchor, positive, negative));
            }
        }

        Ok(Some(records))
    }

    /// Opens every output up front, then writes each split's slice of the corpus in iteration order.
    pub fn write(&self, corpus: &AggregatedCorpus, plan: &SplitPlan) -> Result<Vec<SplitSummary>> {
        info!(
            "Writing {} board configurations to {} outputs",
            corpus.len(),
            plan.splits().len()
        );

        let mut writers = plan
            .splits()
            .iter()
            .map(|split| create_writer(&split.path))
            .collect::<Result<Vec<_>>>()?;

        let mut progress = Progress::new("board configurations written", self.print_interval);
        let mut summaries = vec![];

        for ((split, range), writer) in plan
            .splits()
            .iter()
            .zip(plan.slice_bounds(corpus.len()))
            .zip(writers.iter_mut())
        {
            let entries = &corpus.entries()[range];
            let mut summary = SplitSummary {
                path: split.path.clone(),
                entries: entries.len(),
                records: 0,
                skipped: 0,
            };

            for (key, info) in entries {
                match self.write_entry(writer, split, key, info)? {
                    Some(records) => summary.records += records,
                    None => summary.skipped += 1,
                }
                progress.tick();
            }

            info!(
                "Wrote {} board configurations as {} records to {:?}, {} skipped",
                summary.entries, summary.records, split.path, summary.skipped
            );

            summaries.push(summary);
        }

        for (split, writer) in plan.splits().iter().zip(writers) {
            finish(writer, &split.path)?;
        }

        Ok(summaries)
    }

    /// Number of records written, or `None` when the entry was skipped.
    fn write_entry(
        &self,
        writer: &mut OutputWriter,
        split: &DatasetSplit,
        key: &BoardKey,
        info: &BoardInfo,
    ) -> Result<Option<usize>> {
        let records = if split.triplets {
            match self.expand_triplets(key, info)? {
                Some(records) => records,
                None => return Ok(None),
            }
        } else {
            vec![self.plain_record(key, info)]
        };

        for record in &records {
            writeln!(writer, "{}", record)
                .with_context(|| format!("Failed to write to {:?}", split.path))?;
        }

        Ok(Some(records.len()))
    }
}

fn finish(writer: OutputWriter, path: &Path) -> Result<()> {
    writer
        .finish()
        .with_context(|| format!("Failed to finish writing {:?}", path))
}

/// Encoding of the board reached by playing `m`, expressed with White to move.
fn child_symbols(position: &Chess, m: &Move) -> Result<BoardSymbols> {
    let mut child = position.clone();
    child.play_unchecked(m);

    let (parts, _) = canonical_fen(&child);
    BoardSymbols::from_fen_parts(&parts)
}
