use std::io::Read;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use common::{count_lines, Progress};
use engine::{Chess, FenParts, FieldSelection, Move, MoveKey, PgnGameReader, Position, RecordedGame};
use log::{info, warn};
use rayon::prelude::*;

use super::{canonicalize, AggregatedCorpus, BoardKey, EntryContext, FilterChain, PlyContext, PostFilter, PreFilter};

#[derive(Clone, Debug)]
pub struct AggregationOptions {
    pub fields: FieldSelection,
    pub mirror_black_to_move: bool,
    pub file_parallelism: usize,
    pub print_interval: usize,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            fields: FieldSelection::default(),
            mirror_black_to_move: true,
            file_parallelism: 1,
            print_interval: 100_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub games: usize,
    pub malformed_games: usize,
    pub plies: usize,
    pub vetoed_plies: usize,
}

impl AddAssign for AggregationStats {
    fn add_assign(&mut self, other: Self) {
        self.games += other.games;
        self.malformed_games += other.malformed_games;
        self.plies += other.plies;
        self.vetoed_plies += other.vetoed_plies;
    }
}

/// Walks recorded games into an `AggregatedCorpus`.
///
/// Files are consumed in the order given. The first observation of each key fixes its position in the
/// corpus, so the same file list always produces the same iteration order. Counts do not depend on
/// the order at all.
pub struct Aggregator {
    options: AggregationOptions,
    pre_filters: FilterChain<dyn PreFilter>,
    post_filters: FilterChain<dyn PostFilter>,
}

impl Aggregator {
    /// Fails when a post filter reads a FEN field that is not part of the key.
    pub fn new(
        options: AggregationOptions,
        pre_filters: FilterChain<dyn PreFilter>,
        post_filters: FilterChain<dyn PostFilter>,
    ) -> Result<Self> {
        post_filters.validate(&options.fields)?;

        Ok(Self {
            options,
            pre_filters,
            post_filters,
        })
    }

    pub fn fields(&self) -> &FieldSelection {
        &self.options.fields
    }

    /// Key of the position a move is played from, along with the move in the key's frame.
    /// When the board is mirrored the move is mirrored with it.
    pub fn keys(&self, position: &Chess, m: &Move) -> (BoardKey, MoveKey) {
        let parts = FenParts::from_position(position);
        let move_key = MoveKey::from_move(m);

        if self.options.mirror_black_to_move && parts.is_black_to_move() {
            let canonical = canonicalize(&parts);
            (
                BoardKey::new(self.options.fields.project(&canonical)),
                move_key.mirrored(),
            )
        } else {
            (BoardKey::new(self.options.fields.project(&parts)), move_key)
        }
    }

    /// Walks the main line of one game from its starting position. Vetoed plies are not recorded but
    /// the move is still played.
    pub fn aggregate_game(
        &self,
        game: &RecordedGame,
        corpus: &mut AggregatedCorpus,
        stats: &mut AggregationStats,
    ) {
        let mut position = game.start.clone();
        stats.games += 1;

        for (plies_played, m) in game.moves.iter().enumerate() {
            stats.plies += 1;

            let ply = PlyContext {
                position: &position,
                mv: m,
                plies_played,
            };

            if self.pre_filters.vetoes(&ply) {
                stats.vetoed_plies += 1;
            } else {
                let (key, move_key) = self.keys(&position, m);
                corpus.record(key, move_key);
            }

            position.play_unchecked(m);
        }
    }

    pub fn aggregate_reader<R: Read>(
        &self,
        games: PgnGameReader<R>,
        corpus: &mut AggregatedCorpus,
    ) -> Result<AggregationStats> {
        let mut stats = AggregationStats::default();
        let mut progress = Progress::new("games aggregated", self.options.print_interval);

        for game in games {
            let game = game?;

            if let Some(error) = &game.error {
                stats.malformed_games += 1;
                warn!("Game {} is malformed, keeping its legal prefix: {}", stats.games + 1, error);
            }

            self.aggregate_game(&game, corpus, &mut stats);
            progress.tick();
        }

        Ok(stats)
    }

    /// Aggregates one PGN file (plain or `.gz`) into `corpus`.
    pub fn aggregate_file(&self, path: &Path, corpus: &mut AggregatedCorpus) -> Result<AggregationStats> {
        let lines = count_lines(path)?;
        info!("Aggregating {:?}, {} lines", path, lines);

        let entries_before = corpus.len();
        let games = PgnGameReader::open(path)?;
        let stats = self
            .aggregate_reader(games, corpus)
            .with_context(|| format!("Failed to aggregate {:?}", path))?;

        info!(
            "Finished {:?}: {} games, {} malformed, {} plies, {} vetoed, {} new boards",
            path,
            stats.games,
            stats.malformed_games,
            stats.plies,
            stats.vetoed_plies,
            corpus.len() - entries_before
        );

        Ok(stats)
    }

    /// Aggregates every file in list order. With `file_parallelism > 1` each file is walked into its own
    /// corpus concurrently and the results are merged in list order, which gives the same corpus as the
    /// sequential walk.
    pub fn aggregate_files(&self, paths: &[PathBuf]) -> Result<(AggregatedCorpus, AggregationStats)> {
        let mut corpus = AggregatedCorpus::new();
        let mut stats = AggregationStats::default();

        if self.options.file_parallelism <= 1 || paths.len() <= 1 {
            for path in paths {
                stats += self.aggregate_file(path, &mut corpus)?;
            }

            return Ok((corpus, stats));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.file_parallelism)
            .build()
            .map_err(|e| anyhow!("Failed to build file aggregation pool: {}", e))?;

        let per_file = pool.install(|| {
            paths
                .par_iter()
                .map(|path| -> Result<(AggregatedCorpus, AggregationStats)> {
                    let mut corpus = AggregatedCorpus::new();
                    let stats = self.aggregate_file(path, &mut corpus)?;
                    Ok((corpus, stats))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        for (file_corpus, file_stats) in per_file {
            corpus.merge(file_corpus);
            stats += file_stats;
        }

        Ok((corpus, stats))
    }

    /// Deletes every entry a post filter vetoes. Returns the number deleted.
    pub fn apply_post_filters(&self, corpus: &mut AggregatedCorpus) -> usize {
        if self.post_filters.is_empty() {
            return 0;
        }

        let fields = &self.options.fields;
        let removed = corpus.retain(|key, info| {
            !self.post_filters.vetoes(&EntryContext { key, info, fields })
        });

        info!("Post filters removed {} board configurations", removed);

        removed
    }
}
