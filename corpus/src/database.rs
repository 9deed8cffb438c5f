use anyhow::Result;
use log::info;

use super::{
    AggregationStats, Aggregator, CreateDatabaseOptions, DatasetWriter, SplitSummary, UnplayedQuietMoves,
};

#[derive(Clone, Debug)]
pub struct DatabaseSummary {
    pub stats: AggregationStats,
    pub removed_by_post_filters: usize,
    pub entries: usize,
    pub splits: Vec<SplitSummary>,
}

/// Aggregates the configured PGN files and writes the split outputs.
///
/// Everything that can be checked from the options alone is checked before the first file is opened.
pub fn create_database(options: &CreateDatabaseOptions) -> Result<DatabaseSummary> {
    let plan = options.split_plan()?;
    let aggregator = Aggregator::new(
        options.aggregation_options(),
        options.pre_filter_chain()?,
        options.post_filter_chain()?,
    )?;

    info!("Aggregating {} PGN files", options.pgn_files.len());

    let (mut corpus, stats) = aggregator.aggregate_files(&options.pgn_files)?;
    let removed_by_post_filters = aggregator.apply_post_filters(&mut corpus);

    info!(
        "{} board configurations from {} games remain for splitting",
        corpus.len(),
        stats.games
    );

    let writer = DatasetWriter::new(
        options.fen_fields.clone(),
        UnplayedQuietMoves::with_limit(options.comparison_move_limit),
        options.print_interval,
    );
    let splits = writer.write(&corpus, &plan)?;

    Ok(DatabaseSummary {
        stats,
        removed_by_post_filters,
        entries: corpus.len(),
        splits,
    })
}
