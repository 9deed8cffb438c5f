use engine::{Chess, FenParts};

const CASTLING_ORDER: [char; 4] = ['K', 'Q', 'k', 'q'];

/// Re-expresses a position with White to move. White to move passes through untouched; Black to move
/// is mirrored. Colour mirror images therefore share one canonical form.
pub fn canonicalize(parts: &FenParts) -> FenParts {
    if parts.is_black_to_move() {
        mirror(parts)
    } else {
        parts.clone()
    }
}

/// Canonical fields of a position and whether they had to be mirrored to get there.
pub fn canonical_fen(position: &Chess) -> (FenParts, bool) {
    let parts = FenParts::from_position(position);
    let mirrored = parts.is_black_to_move();

    (canonicalize(&parts), mirrored)
}

/// Reverses the rank order, swaps piece colours, swaps castling rights and reflects the
/// en passant rank. The side to move is always set to White.
pub fn mirror(parts: &FenParts) -> FenParts {
    let placement = parts
        .placement
        .split('/')
        .rev()
        .map(swap_case)
        .collect::<Vec<_>>()
        .join("/");

    FenParts {
        placement,
        turn: "w".to_string(),
        castling: mirror_castling(&parts.castling),
        en_passant: mirror_en_passant(&parts.en_passant),
        halfmove: parts.halfmove.clone(),
        fullmove: parts.fullmove.clone(),
    }
}

fn swap_case(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

fn mirror_castling(castling: &str) -> String {
    let swapped = swap_case(castling);
    let rights: String = CASTLING_ORDER
        .iter()
        .filter(|c| swapped.contains(**c))
        .collect();

    if rights.is_empty() {
        "-".to_string()
    } else {
        rights
    }
}

fn mirror_en_passant(en_passant: &str) -> String {
    let mut chars = en_passant.chars();
    match (chars.next(), chars.next().and_then(|r| r.to_digit(10)), chars.next()) {
        (Some(file), Some(rank), None) if (1..=8).contains(&rank) => format!("{}{}", file, 9 - rank),
        _ => en_passant.to_string(),
    }
}
