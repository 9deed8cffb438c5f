use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use corpus::{AggregatedCorpus, AggregationOptions, Aggregator, FilterChain, PlyContext, PreFilter};
use itertools::Itertools;

const FILES: [&str; 3] = [
    r#"[Event "Open Game"]
[Result "1-0"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0

[Event "Queen's Gambit"]
[Result "1/2-1/2"]

1. d4 d5 2. c4 e6 3. Nc3 Nf6 1/2-1/2
"#,
    r#"[Event "Sicilian"]
[Result "0-1"]

1. e4 c5 2. Nf3 d6 3. d4 cxd4 0-1

[Event "Broken"]
[Result "*"]

1. e4 e5 2. Ke3 Nc6 *
"#,
    r#"[Event "Open Game again"]
[Result "1-0"]

1. e4 e5 2. Nf3 Nf6 3. Nxe5 d6 1-0
"#,
];

fn write_files(dir: &Path) -> Vec<PathBuf> {
    FILES
        .iter()
        .enumerate()
        .map(|(i, contents)| {
            let path = dir.join(format!("games_{}.pgn", i));
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(contents.as_bytes()).unwrap();
            path
        })
        .collect()
}

fn aggregator(options: AggregationOptions) -> Aggregator {
    Aggregator::new(options, FilterChain::new(), FilterChain::new()).unwrap()
}

fn counts(corpus: &AggregatedCorpus) -> BTreeMap<String, BTreeMap<String, u32>> {
    corpus
        .iter()
        .map(|(key, info)| {
            let moves = info.moves().iter().map(|(m, c)| (m.to_string(), *c)).collect();
            (key.to_string(), moves)
        })
        .collect()
}

fn keys(corpus: &AggregatedCorpus) -> Vec<String> {
    corpus.iter().map(|(key, _)| key.to_string()).collect()
}

#[test]
fn counts_do_not_depend_on_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_files(dir.path());
    let aggregator = aggregator(AggregationOptions::default());

    let (reference, stats) = aggregator.aggregate_files(&paths).unwrap();
    assert_eq!(stats.games, 5);
    assert_eq!(stats.malformed_games, 1);
    assert_eq!(stats.plies, 6 + 6 + 6 + 2 + 6);

    for permutation in paths.iter().cloned().permutations(paths.len()) {
        let (corpus, _) = aggregator.aggregate_files(&permutation).unwrap();

        assert_eq!(counts(&corpus), counts(&reference));
    }
}

#[test]
fn iteration_order_follows_first_observation() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_files(dir.path());
    let aggregator = aggregator(AggregationOptions::default());

    let (forward, _) = aggregator.aggregate_files(&paths).unwrap();
    let reversed: Vec<PathBuf> = paths.iter().rev().cloned().collect();
    let (backward, _) = aggregator.aggregate_files(&reversed).unwrap();

    assert_eq!(keys(&forward)[0], keys(&backward)[0]);
    assert_ne!(keys(&forward), keys(&backward));

    let (again, _) = aggregator.aggregate_files(&paths).unwrap();
    assert_eq!(keys(&forward), keys(&again));
}

#[test]
fn parallel_files_merge_into_the_sequential_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_files(dir.path());

    let (sequential, sequential_stats) = aggregator(AggregationOptions::default())
        .aggregate_files(&paths)
        .unwrap();
    let (parallel, parallel_stats) = aggregator(AggregationOptions {
        file_parallelism: 3,
        ..AggregationOptions::default()
    })
    .aggregate_files(&paths)
    .unwrap();

    assert_eq!(keys(&parallel), keys(&sequential));
    assert_eq!(counts(&parallel), counts(&sequential));
    assert_eq!(
        parallel
            .iter()
            .map(|(_, info)| info.to_string())
            .collect_vec(),
        sequential
            .iter()
            .map(|(_, info)| info.to_string())
            .collect_vec()
    );
    assert_eq!(parallel_stats, sequential_stats);
}

fn veto_all(_: &PlyContext) -> bool {
    true
}

#[test]
fn veto_every_ply_yields_no_entries() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_files(dir.path());

    let aggregator = Aggregator::new(
        AggregationOptions::default(),
        FilterChain::<dyn PreFilter>::new().with(Box::new(veto_all)),
        FilterChain::new(),
    )
    .unwrap();

    let (corpus, stats) = aggregator.aggregate_files(&paths).unwrap();

    assert!(corpus.is_empty());
    assert_eq!(stats.plies, stats.vetoed_plies);
    assert_eq!(stats.games, 5);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let aggregator = aggregator(AggregationOptions::default());

    assert!(aggregator
        .aggregate_files(&[dir.path().join("missing.pgn")])
        .is_err());
}
