use std::io::{BufRead, Read};
use std::path::Path;

use anyhow::{Context, Result};
use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Move, Position};

/// The main line of one game as legal moves from its starting position.
#[derive(Clone, Debug)]
pub struct RecordedGame {
    pub start: Chess,
    pub moves: Vec<Move>,
    /// Set when the game text could not be fully replayed. `moves` then holds the legal prefix.
    pub error: Option<String>,
}

impl RecordedGame {
    pub fn is_malformed(&self) -> bool {
        self.error.is_some()
    }
}

struct MainLineVisitor {
    position: Chess,
    game: RecordedGame,
}

impl MainLineVisitor {
    fn new() -> Self {
        Self {
            position: Chess::default(),
            game: RecordedGame {
                start: Chess::default(),
                moves: Vec::new(),
                error: None,
            },
        }
    }
}

impl Visitor for MainLineVisitor {
    type Result = RecordedGame;

    fn begin_game(&mut self) {
        *self = Self::new();
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        if !key.eq_ignore_ascii_case(b"FEN") {
            return;
        }

        let start = value
            .decode_utf8()
            .map_err(|e| e.to_string())
            .and_then(|s| s.parse::<Fen>().map_err(|e| e.to_string()))
            .and_then(|fen| {
                fen.into_position::<Chess>(CastlingMode::Standard)
                    .map_err(|e| e.to_string())
            });

        match start {
            Ok(start) => {
                self.position = start.clone();
                self.game.start = start;
            }
            Err(e) => self.game.error = Some(format!("invalid FEN header: {}", e)),
        }
    }

    fn san(&mut self, san_plus: SanPlus) {
        if self.game.error.is_some() {
            return;
        }

        match san_plus.san.to_move(&self.position) {
            Ok(m) => {
                self.position.play_unchecked(&m);
                self.game.moves.push(m);
            }
            Err(e) => {
                self.game.error = Some(format!(
                    "illegal move {} at ply {}: {}",
                    san_plus,
                    self.game.moves.len() + 1,
                    e
                ));
            }
        }
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn end_game(&mut self) -> Self::Result {
        std::mem::replace(self, Self::new()).game
    }
}

/// Streams games out of PGN text one at a time.
pub struct PgnGameReader<R: Read> {
    inner: BufferedReader<R>,
}

impl PgnGameReader<Box<dyn BufRead + Send>> {
    /// Opens a PGN file, transparently decompressing `.gz` files.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let reader = common::open_reader(path)?;

        Ok(Self::new(reader))
    }
}

impl<R: Read> PgnGameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufferedReader::new(reader),
        }
    }

    /// Returns `Ok(None)` once the input is exhausted.
    pub fn next_game(&mut self) -> Result<Option<RecordedGame>> {
        let mut visitor = MainLineVisitor::new();

        self.inner
            .read_game(&mut visitor)
            .context("Failed to read PGN game")
    }
}

impl<R: Read> Iterator for PgnGameReader<R> {
    type Item = Result<RecordedGame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_game().transpose()
    }
}
