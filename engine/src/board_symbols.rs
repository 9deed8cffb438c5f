use std::fmt;

use anyhow::{bail, Result};

use super::FenParts;

/// `0` is an empty square, `1` the en passant target and `C`/`c` a rook that still carries a castling right.
pub const SYMBOL_ALPHABET: &[u8; 16] = b"01KQRBNPCkqrbnpc";
pub const BOARD_SQUARES: usize = 64;

const EMPTY: u8 = b'0';
const EN_PASSANT: u8 = b'1';

/// One symbol per square in FEN order: a8..h8 first, a1..h1 last.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BoardSymbols([u8; BOARD_SQUARES]);

impl BoardSymbols {
    pub fn from_fen_parts(parts: &FenParts) -> Result<Self> {
        let mut symbols = [EMPTY; BOARD_SQUARES];

        let rows: Vec<&str> = parts.placement.split('/').collect();
        if rows.len() != 8 {
            bail!("Piece placement '{}' does not have 8 ranks", parts.placement);
        }

        for (row, rank) in rows.iter().enumerate() {
            let mut col = 0;
            for c in rank.bytes() {
                if c.is_ascii_digit() {
                    col += (c - b'0') as usize;
                    continue;
                }

                if col >= 8 || !b"KQRBNPkqrbnp".contains(&c) {
                    bail!("Invalid piece placement '{}'", parts.placement);
                }

                symbols[row * 8 + col] = c;
                col += 1;
            }

            if col != 8 {
                bail!("Rank '{}' of '{}' does not have 8 squares", rank, parts.placement);
            }
        }

        for right in parts.castling.bytes() {
            let (idx, rook) = match right {
                b'K' => (63, b'R'),
                b'Q' => (56, b'R'),
                b'k' => (7, b'r'),
                b'q' => (0, b'r'),
                _ => continue,
            };

            if symbols[idx] == rook {
                symbols[idx] = if rook == b'R' { b'C' } else { b'c' };
            }
        }

        let ep = parts.en_passant.as_bytes();
        if ep.len() == 2 && (b'a'..=b'h').contains(&ep[0]) && (b'1'..=b'8').contains(&ep[1]) {
            let col = (ep[0] - b'a') as usize;
            let row = (b'8' - ep[1]) as usize;
            if symbols[row * 8 + col] == EMPTY {
                symbols[row * 8 + col] = EN_PASSANT;
            }
        }

        Ok(Self(symbols))
    }

    /// Reverses the rank order and swaps the colour of every piece.
    pub fn mirrored(&self) -> Self {
        let mut symbols = [EMPTY; BOARD_SQUARES];
        for row in 0..8 {
            for col in 0..8 {
                symbols[(7 - row) * 8 + col] = swap_case(self.0[row * 8 + col]);
            }
        }

        Self(symbols)
    }

    pub fn as_str(&self) -> &str {
        // Every symbol is taken from the ASCII alphabet.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Index of each square's symbol within `SYMBOL_ALPHABET`.
    pub fn indices(&self) -> Vec<u8> {
        self.0
            .iter()
            .map(|s| {
                SYMBOL_ALPHABET
                    .iter()
                    .position(|a| a == s)
                    .unwrap_or_default() as u8
            })
            .collect()
    }
}

fn swap_case(c: u8) -> u8 {
    if c.is_ascii_uppercase() {
        c.to_ascii_lowercase()
    } else {
        c.to_ascii_uppercase()
    }
}

impl fmt::Display for BoardSymbols {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for BoardSymbols {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BoardSymbols({})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(fen: &str) -> BoardSymbols {
        BoardSymbols::from_fen_parts(&FenParts::parse(fen).unwrap()).unwrap()
    }

    #[test]
    fn test_starting_position() {
        let s = symbols("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");

        assert_eq!(
            s.as_str(),
            "cnbqkbnc\
             pppppppp\
             00000000\
             00000000\
             00000000\
             00000000\
             PPPPPPPP\
             CNBQKBNC"
        );
    }

    #[test]
    fn test_rook_without_rights_and_en_passant() {
        let s = symbols("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b Kq e3 0 3");

        assert_eq!(&s.as_str()[0..8], "cnbqkbnr");
        assert_eq!(&s.as_str()[56..64], "RNBQKBNC");
        assert_eq!(&s.as_str()[40..48], "00001000");
    }

    #[test]
    fn test_indices() {
        let s = symbols("8/8/8/8/8/8/8/K6k w - - 0 1");
        let indices = s.indices();

        assert_eq!(indices.len(), BOARD_SQUARES);
        assert_eq!(indices[56], 2);
        assert_eq!(indices[63], 9);
        assert!(indices[..56].iter().all(|i| *i == 0));
    }

    #[test]
    fn test_mirrored_twice_is_identity() {
        let s = symbols("r3k2r/pp3ppp/8/3Pp3/8/8/PP3PPP/R3K2R w Kq e6 0 1");

        assert_eq!(s.mirrored().mirrored(), s);
        assert_eq!(&s.mirrored().as_str()[0..8], "r000k00c");
    }

    #[test]
    fn test_invalid_placement() {
        let parts = FenParts::parse("8/8/8 w - - 0 1").unwrap();

        assert!(BoardSymbols::from_fen_parts(&parts).is_err());
    }
}
