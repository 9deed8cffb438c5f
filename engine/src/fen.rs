use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode};

/// The six whitespace separated fields of a FEN string, in FEN order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FenField {
    Placement,
    Turn,
    Castling,
    EnPassant,
    Halfmove,
    Fullmove,
}

impl FenField {
    pub const ALL: [FenField; 6] = [
        FenField::Placement,
        FenField::Turn,
        FenField::Castling,
        FenField::EnPassant,
        FenField::Halfmove,
        FenField::Fullmove,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Value used when a FEN is rebuilt from a subset of its fields.
    pub fn default_value(self) -> &'static str {
        match self {
            FenField::Placement => "8/8/8/8/8/8/8/8",
            FenField::Turn => "w",
            FenField::Castling => "-",
            FenField::EnPassant => "-",
            FenField::Halfmove => "0",
            FenField::Fullmove => "1",
        }
    }
}

impl FromStr for FenField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let field = match s.trim().to_lowercase().as_str() {
            "placement" | "board" | "0" => FenField::Placement,
            "turn" | "side_to_move" | "1" => FenField::Turn,
            "castling" | "castling_rights" | "2" => FenField::Castling,
            "en_passant" | "ep" | "3" => FenField::EnPassant,
            "halfmove" | "halfmove_clock" | "4" => FenField::Halfmove,
            "fullmove" | "fullmove_number" | "5" => FenField::Fullmove,
            other => bail!("Unknown FEN field '{}'", other),
        };

        Ok(field)
    }
}

impl fmt::Display for FenField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FenField::Placement => "placement",
            FenField::Turn => "turn",
            FenField::Castling => "castling",
            FenField::EnPassant => "en_passant",
            FenField::Halfmove => "halfmove",
            FenField::Fullmove => "fullmove",
        };

        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenParts {
    pub placement: String,
    pub turn: String,
    pub castling: String,
    pub en_passant: String,
    pub halfmove: String,
    pub fullmove: String,
}

impl FenParts {
    pub fn from_position(position: &Chess) -> Self {
        let fen = Fen::from_position(position.clone(), EnPassantMode::Legal).to_string();
        let mut fields = fen.split_whitespace().map(str::to_string);
        let mut next = |field: FenField| {
            fields
                .next()
                .unwrap_or_else(|| field.default_value().to_string())
        };

        Self {
            placement: next(FenField::Placement),
            turn: next(FenField::Turn),
            castling: next(FenField::Castling),
            en_passant: next(FenField::EnPassant),
            halfmove: next(FenField::Halfmove),
            fullmove: next(FenField::Fullmove),
        }
    }

    pub fn parse(fen: &str) -> Result<Self> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.is_empty() || fields.len() > FenField::ALL.len() {
            bail!("Malformed FEN '{}'", fen);
        }

        let mut parts = Self::empty();
        for (field, value) in FenField::ALL.iter().zip(fields) {
            parts.set(*field, value.to_string());
        }

        Ok(parts)
    }

    fn empty() -> Self {
        Self {
            placement: FenField::Placement.default_value().to_string(),
            turn: FenField::Turn.default_value().to_string(),
            castling: FenField::Castling.default_value().to_string(),
            en_passant: FenField::EnPassant.default_value().to_string(),
            halfmove: FenField::Halfmove.default_value().to_string(),
            fullmove: FenField::Fullmove.default_value().to_string(),
        }
    }

    pub fn get(&self, field: FenField) -> &str {
        match field {
            FenField::Placement => &self.placement,
            FenField::Turn => &self.turn,
            FenField::Castling => &self.castling,
            FenField::EnPassant => &self.en_passant,
            FenField::Halfmove => &self.halfmove,
            FenField::Fullmove => &self.fullmove,
        }
    }

    pub fn set(&mut self, field: FenField, value: String) {
        match field {
            FenField::Placement => self.placement = value,
            FenField::Turn => self.turn = value,
            FenField::Castling => self.castling = value,
            FenField::EnPassant => self.en_passant = value,
            FenField::Halfmove => self.halfmove = value,
            FenField::Fullmove => self.fullmove = value,
        }
    }

    pub fn is_black_to_move(&self) -> bool {
        self.turn == "b"
    }

    pub fn to_position(&self) -> Result<Chess> {
        let fen: Fen = self
            .to_string()
            .parse()
            .map_err(|e| anyhow!("Invalid FEN '{}': {}", self, e))?;

        fen.into_position(CastlingMode::Standard)
            .map_err(|e| anyhow!("Illegal position '{}': {}", self, e))
    }
}

impl fmt::Display for FenParts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.placement, self.turn, self.castling, self.en_passant, self.halfmove, self.fullmove
        )
    }
}

/// The subset of FEN fields stored in a board key. Fields are always kept in FEN order,
/// whatever order they were configured in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<FenField>,
}

impl FieldSelection {
    pub fn new(fields: impl IntoIterator<Item = FenField>) -> Result<Self> {
        let mut fields: Vec<FenField> = fields.into_iter().collect();
        fields.sort();
        fields.dedup();

        if fields.is_empty() {
            bail!("At least one FEN field must be selected");
        }

        Ok(Self { fields })
    }

    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let fields = names
            .iter()
            .map(|n| n.as_ref().parse::<FenField>())
            .collect::<Result<Vec<_>>>()?;

        Self::new(fields)
    }

    pub fn fields(&self) -> &[FenField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: FenField) -> bool {
        self.fields.contains(&field)
    }

    pub fn position_of(&self, field: FenField) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }

    /// Joins the selected fields with commas.
    pub fn project(&self, parts: &FenParts) -> String {
        self.fields
            .iter()
            .map(|f| parts.get(*f))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Reads a selected field back out of a projected line.
    pub fn field_of<'a>(&self, line: &'a str, field: FenField) -> Option<&'a str> {
        let index = self.position_of(field)?;
        line.split(',').nth(index)
    }

    /// Rebuilds a full FEN from a projected line. Only the first `len()` comma separated values are
    /// read so trailing columns, such as move statistics, are ignored. Unselected fields take their defaults.
    pub fn parse_line(&self, line: &str) -> Result<FenParts> {
        let values: Vec<&str> = line.trim().split(',').take(self.fields.len()).collect();
        if values.len() != self.fields.len() {
            bail!(
                "Expected {} comma separated FEN fields but found {} in '{}'",
                self.fields.len(),
                values.len(),
                line.trim()
            );
        }

        let mut parts = FenParts::empty();
        for (field, value) in self.fields.iter().zip(values) {
            parts.set(*field, value.trim().to_string());
        }

        Ok(parts)
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self {
            fields: vec![FenField::Placement, FenField::Castling, FenField::EnPassant],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Position;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_from_position_matches_standard_fen() {
        let parts = FenParts::from_position(&Chess::default());

        assert_eq!(parts.to_string(), START);
    }

    #[test]
    fn test_selection_is_kept_in_fen_order() {
        let selection = FieldSelection::parse(&["en_passant", "placement", "castling", "castling"]).unwrap();

        assert_eq!(
            selection.fields(),
            &[FenField::Placement, FenField::Castling, FenField::EnPassant]
        );
    }

    #[test]
    fn test_project_and_parse_line() {
        let selection = FieldSelection::default();
        let parts = FenParts::parse(START).unwrap();

        let line = selection.project(&parts);
        assert_eq!(line, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR,KQkq,-");

        let rebuilt = selection.parse_line(&line).unwrap();
        assert_eq!(rebuilt.to_string(), START);
    }

    #[test]
    fn test_parse_line_ignores_trailing_statistics() {
        let selection = FieldSelection::default();

        let parts = selection
            .parse_line("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR,KQkq,-,e2e4:3 d2d4:1")
            .unwrap();

        assert_eq!(parts.castling, "KQkq");
        assert_eq!(parts.en_passant, "-");
        assert_eq!(parts.turn, "w");
    }

    #[test]
    fn test_parse_line_with_too_few_fields() {
        let selection = FieldSelection::default();

        assert!(selection.parse_line("8/8/8/8/8/8/8/8").is_err());
    }

    #[test]
    fn test_field_of() {
        let selection = FieldSelection::default();

        assert_eq!(selection.field_of("8/8/8/8/8/8/8/K6k,-,e3", FenField::EnPassant), Some("e3"));
        assert_eq!(selection.field_of("8/8/8/8/8/8/8/K6k,-,e3", FenField::Turn), None);
    }

    #[test]
    fn test_to_position() {
        let position = FenParts::parse(START).unwrap().to_position().unwrap();

        assert_eq!(position.legal_moves().len(), 20);
    }

    #[test]
    fn test_unknown_field_name() {
        assert!("colour".parse::<FenField>().is_err());
        assert!(FieldSelection::parse::<&str>(&[]).is_err());
    }
}
