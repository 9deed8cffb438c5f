use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use common::{create_writer, open_reader, OutputWriter, Progress};
use engine::{FieldSelection, MoveEnumeration};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{info, warn};
use tokio::task::JoinHandle;

use super::{ChildEvaluator, ExpandedBatch};

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub fields: FieldSelection,
    pub batch_size: usize,
    pub workers: usize,
    pub print_interval: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fields: FieldSelection::default(),
            batch_size: 200,
            workers: 5,
            print_interval: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    pub batches: usize,
    pub records: usize,
    pub children: usize,
}

/// Serialized records of one batch, written by the controller in a single call.
struct ScoredBatch {
    records: usize,
    children: usize,
    buffer: String,
}

struct Shared<E> {
    fields: FieldSelection,
    enumeration: MoveEnumeration,
    evaluator: E,
    cancelled: AtomicBool,
}

type Lines = std::io::Lines<Box<dyn BufRead + Send>>;

/// Scores every child of every board in `input` and writes one JSON record per board to `output`.
///
/// At most `workers` batches are in flight. Batches are written whole in the order they complete. The
/// first failure cancels the remaining work. Batches already written are flushed before the error is
/// returned.
pub async fn score_children<E: ChildEvaluator>(
    input: &Path,
    output: &Path,
    evaluator: E,
    options: &PipelineOptions,
) -> Result<ScoreSummary> {
    if options.batch_size == 0 || options.workers == 0 {
        bail!("batch_size and workers must both be at least 1");
    }

    let lines = open_reader(input)?.lines();
    let mut writer = create_writer(output)?;

    let shared = Arc::new(Shared {
        fields: options.fields.clone(),
        enumeration: MoveEnumeration::new(),
        evaluator,
        cancelled: AtomicBool::new(false),
    });

    let mut in_flight = FuturesUnordered::new();
    let mut summary = ScoreSummary::default();

    let outcome = run(lines, &mut writer, &shared, &mut in_flight, &mut summary, options).await;

    if outcome.is_err() {
        shared.cancelled.store(true, Ordering::SeqCst);
        for handle in in_flight.iter() {
            handle.abort();
        }

        warn!(
            "Scoring stopped after {} batches, aborting {} in flight",
            summary.batches,
            in_flight.len()
        );
    }

    let finished = writer
        .finish()
        .with_context(|| format!("Failed to finish writing {:?}", output));

    outcome?;
    finished?;

    info!(
        "Scored {} children of {} boards in {} batches",
        summary.children, summary.records, summary.batches
    );

    Ok(summary)
}

async fn run<E: ChildEvaluator>(
    mut lines: Lines,
    writer: &mut OutputWriter,
    shared: &Arc<Shared<E>>,
    in_flight: &mut FuturesUnordered<JoinHandle<Result<ScoredBatch>>>,
    summary: &mut ScoreSummary,
    options: &PipelineOptions,
) -> Result<()> {
    let mut progress = Progress::new("batches scored", options.print_interval);
    let mut exhausted = false;

    loop {
        while !exhausted && in_flight.len() < options.workers {
            let (rest, batch) = read_batch(lines, options.batch_size).await?;
            lines = rest;

            if batch.len() < options.batch_size {
                exhausted = true;
            }

            if !batch.is_empty() {
                in_flight.push(tokio::spawn(score_batch(batch, shared.clone())));
            }
        }

        let Some(joined) = in_flight.next().await else {
            return Ok(());
        };

        let scored = joined.context("A scoring worker panicked")??;
        writer
            .write_all(scored.buffer.as_bytes())
            .context("Failed to write scored records")?;

        summary.batches += 1;
        summary.records += scored.records;
        summary.children += scored.children;
        progress.tick();
    }
}

/// Reads the next batch on the blocking pool and hands the reader back.
async fn read_batch(mut lines: Lines, batch_size: usize) -> Result<(Lines, Vec<String>)> {
    tokio::task::spawn_blocking(move || -> Result<(Lines, Vec<String>)> {
        let batch = next_batch(&mut lines, batch_size)?;
        Ok((lines, batch))
    })
    .await
    .context("The board reader panicked")?
}

fn next_batch(lines: &mut Lines, batch_size: usize) -> Result<Vec<String>> {
    let mut batch = Vec::with_capacity(batch_size);

    while batch.len() < batch_size {
        match lines.next() {
            Some(line) => {
                let line = line.context("Failed to read the board file")?;
                if !line.trim().is_empty() {
                    batch.push(line);
                }
            }
            None => break,
        }
    }

    Ok(batch)
}

async fn score_batch<E: ChildEvaluator>(lines: Vec<String>, shared: Arc<Shared<E>>) -> Result<ScoredBatch> {
    let scored = expand_and_score(lines, &shared).await;
    if scored.is_err() {
        shared.cancelled.store(true, Ordering::SeqCst);
    }

    scored
}

/// Move generation and serialization run on the blocking pool. Only the evaluator call runs on the
/// worker task itself.
async fn expand_and_score<E: ChildEvaluator>(lines: Vec<String>, shared: &Arc<Shared<E>>) -> Result<ScoredBatch> {
    let expanding = shared.clone();
    let mut batch = tokio::task::spawn_blocking(move || {
        ExpandedBatch::expand(&lines, &expanding.fields, &expanding.enumeration)
    })
    .await
    .context("Batch expansion panicked")??;

    if shared.cancelled.load(Ordering::SeqCst) {
        bail!("Scoring was cancelled");
    }

    let children = batch.total_children();
    let scores = if children == 0 {
        vec![]
    } else {
        shared
            .evaluator
            .score(batch.take_children())
            .await
            .with_context(|| format!("Failed to score a batch of {} children", children))?
    };

    tokio::task::spawn_blocking(move || -> Result<ScoredBatch> {
        let records = batch.into_records(scores)?;

        let mut buffer = String::new();
        for record in &records {
            buffer.push_str(&record.to_json_line()?);
        }

        Ok(ScoredBatch {
            records: records.len(),
            children,
            buffer,
        })
    })
    .await
    .context("Record serialization panicked")?
}
