use std::collections::HashSet;
use std::path::PathBuf;

use corpus::{
    create_database, AggregatedCorpus, BoardInfo, CreateDatabaseOptions, DatasetWriter, SplitPlan,
    UnplayedQuietMoves,
};
use engine::{Chess, FieldSelection, Move, MoveKey};

fn key(s: &str) -> MoveKey {
    s.parse().unwrap()
}

fn read_lines(path: &PathBuf) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn ratios_partition_the_corpus_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = ["train.csv", "validation.csv", "test.csv"]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();

    let mut corpus = AggregatedCorpus::new();
    for i in 0..100 {
        corpus.record(format!("board{:03}", i).as_str().into(), key("e2e4"));
    }

    let plan = SplitPlan::new(
        paths.clone(),
        vec![0.7, 0.1, 0.2],
        vec![false, false, false],
        &FieldSelection::default(),
    )
    .unwrap();

    let writer = DatasetWriter::new(FieldSelection::default(), UnplayedQuietMoves::new(), 10);
    let summaries = writer.write(&corpus, &plan).unwrap();

    let sizes: Vec<usize> = summaries.iter().map(|s| s.entries).collect();
    assert_eq!(sizes, vec![70, 10, 20]);

    let lines: Vec<Vec<String>> = paths.iter().map(read_lines).collect();
    assert_eq!(lines[0].len(), 70);
    assert_eq!(lines[1].len(), 10);
    assert_eq!(lines[2].len(), 20);

    assert_eq!(lines[0][0], "board000,e2e4:1");
    assert_eq!(lines[0][69], "board069,e2e4:1");
    assert_eq!(lines[1][0], "board070,e2e4:1");
    assert_eq!(lines[2][19], "board099,e2e4:1");

    let unique: HashSet<&String> = lines.iter().flatten().collect();
    assert_eq!(unique.len(), 100);
}

#[test]
fn rounding_remainder_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![dir.path().join("a.csv"), dir.path().join("b.csv")];

    let mut corpus = AggregatedCorpus::new();
    for i in 0..7 {
        corpus.record(format!("board{}", i).as_str().into(), key("e2e4"));
    }

    let plan = SplitPlan::new(paths.clone(), vec![0.5, 0.5], vec![false, false], &FieldSelection::default()).unwrap();
    DatasetWriter::new(FieldSelection::default(), UnplayedQuietMoves::new(), 0)
        .write(&corpus, &plan)
        .unwrap();

    assert_eq!(read_lines(&paths[0]), vec!["board0,e2e4:1", "board1,e2e4:1", "board2,e2e4:1"]);
    assert_eq!(read_lines(&paths[1]), vec!["board3,e2e4:1", "board4,e2e4:1", "board5,e2e4:1"]);
}

fn knight_and_rook_pawn_moves(position: &Chess, _: &BoardInfo) -> Vec<Move> {
    ["b1c3", "h2h3"]
        .iter()
        .filter_map(|m| key(m).resolve(position))
        .collect()
}

#[test]
fn triplets_multiply_tied_top_moves_by_negatives() {
    let mut info = BoardInfo::new(key("e2e4"));
    for m in ["e2e4", "e2e4", "d2d4", "d2d4", "d2d4", "g1f3"] {
        info.update(key(m));
    }

    let writer = DatasetWriter::new(FieldSelection::default(), knight_and_rook_pawn_moves, 0);
    let records = writer
        .triplet_records(
            &"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR,KQkq,-".into(),
            &info,
        )
        .unwrap();

    assert_eq!(records.len(), 2 * 2);
    assert!(records.iter().all(|r| r.len() == 3 * 64));
}

#[test]
fn create_database_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let pgn = dir.path().join("games.pgn");
    std::fs::write(
        &pgn,
        "[Event \"1\"]\n\n1. e4 e5 2. Nf3 Nc6 *\n\n[Event \"2\"]\n\n1. e4 c5 2. Nf3 d6 *\n",
    )
    .unwrap();

    let options = CreateDatabaseOptions {
        pgn_files: vec![pgn],
        fen_fields: FieldSelection::default(),
        mirror_black_to_move: true,
        pre_filters: vec!["plies_at_most:0".to_string()],
        post_filters: vec![],
        output_files: vec![dir.path().join("plain.csv"), dir.path().join("triplets.txt")],
        output_ratios: vec![0.5, 0.5],
        output_triplets: vec![false, true],
        comparison_move_limit: 2,
        print_interval: 1,
        file_parallelism: 1,
    };

    let summary = create_database(&options).unwrap();

    assert_eq!(summary.stats.games, 2);
    assert_eq!(summary.stats.vetoed_plies, 2);
    assert_eq!(summary.splits.len(), 2);
    assert_eq!(
        summary.splits.iter().map(|s| s.entries).sum::<usize>(),
        summary.entries / 2 * 2
    );
    assert_eq!(read_lines(&options.output_files[0]).len(), summary.entries / 2);
}

#[test]
fn unbuildable_triplet_boards_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let pgn = dir.path().join("games.pgn");
    std::fs::write(&pgn, "[Event \"1\"]\n\n1. e4 f6 2. Qh5+ g6 *\n").unwrap();

    let options = CreateDatabaseOptions {
        pgn_files: vec![pgn],
        fen_fields: FieldSelection::default(),
        mirror_black_to_move: false,
        pre_filters: vec![],
        post_filters: vec![],
        output_files: vec![dir.path().join("triplets.txt.gz")],
        output_ratios: vec![1.0],
        output_triplets: vec![true],
        comparison_move_limit: 1,
        print_interval: 0,
        file_parallelism: 1,
    };

    let summary = create_database(&options).unwrap();

    // Keys carry no turn, so every board is rebuilt with White to move. After 2. Qh5+ Black is in
    // check and the board is skipped. After 1. e4 the Black reply is not legal for White and gives
    // no records. The other two boards give one record each.
    assert_eq!(summary.entries, 4);
    assert_eq!(summary.splits[0].entries, 4);
    assert_eq!(summary.splits[0].skipped, 1);
    assert_eq!(summary.splits[0].records, 2);
    assert_eq!(common::count_lines(&options.output_files[0]).unwrap(), 2);
}

#[test]
fn bad_configuration_fails_before_any_output_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("plain.csv");

    let options = CreateDatabaseOptions {
        pgn_files: vec![dir.path().join("missing.pgn")],
        fen_fields: FieldSelection::default(),
        mirror_black_to_move: true,
        pre_filters: vec![],
        post_filters: vec![],
        output_files: vec![output.clone()],
        output_ratios: vec![0.5, 0.5],
        output_triplets: vec![false],
        comparison_move_limit: 0,
        print_interval: 1,
        file_parallelism: 1,
    };

    assert!(create_database(&options).is_err());
    assert!(!output.exists());
}
