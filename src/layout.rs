//! Board layouts: the list of pieces a game starts from.
//!
//! Kinds are carried as names until validation so that a layout naming a
//! piece the engine has no move rule for can be rejected instead of skipped.

use crate::board::{Color, PieceKind, Square};
use crate::error::{ChessError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub square: Square,
    pub kind: String,
    pub color: Color,
}

impl LayoutEntry {
    pub fn new(square: Square, kind: impl Into<String>, color: Color) -> Self {
        Self {
            square,
            kind: kind.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardLayout {
    entries: Vec<LayoutEntry>,
}

impl BoardLayout {
    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: LayoutEntry) {
        self.entries.push(entry);
    }

    /// The standard opening position.
    pub fn standard() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut entries = Vec::with_capacity(32);
        for (color, back, pawns) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
            for (file, kind) in BACK_RANK.iter().enumerate() {
                entries.push(LayoutEntry::new(Square::new(file as i8, back), kind.name(), color));
            }
            for file in 0..8 {
                entries.push(LayoutEntry::new(
                    Square::new(file, pawns),
                    PieceKind::Pawn.name(),
                    color,
                ));
            }
        }
        Self { entries }
    }

    /// Parses `<square> <kind> <color>` lines, e.g. `e1 King White`.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(ChessError::InvalidLayoutLine {
                    line: index + 1,
                    reason: format!("expected `<square> <kind> <color>`, got `{}`", line),
                });
            }
            let square: Square = parts[0].parse()?;
            let color: Color = parts[2]
                .parse()
                .map_err(|reason| ChessError::InvalidLayoutLine {
                    line: index + 1,
                    reason,
                })?;
            entries.push(LayoutEntry::new(square, parts[1], color));
        }
        Ok(Self { entries })
    }

    /// Resolves every entry, failing on the first off-board square, unknown
    /// kind or doubly occupied square, then requires one king per side.
    pub fn validate(&self) -> Result<Vec<(Square, PieceKind, Color)>> {
        let mut occupied = HashSet::new();
        let mut kings = [0usize; 2];
        let mut resolved = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            if !entry.square.is_on_board() {
                return Err(ChessError::InvalidSquare(entry.square.to_string()));
            }
            let kind: PieceKind = entry.kind.parse()?;
            if !occupied.insert(entry.square) {
                return Err(ChessError::SquareOccupied(entry.square));
            }
            if kind == PieceKind::King {
                kings[entry.color.index()] += 1;
            }
            resolved.push((entry.square, kind, entry.color));
        }

        for color in Color::ALL {
            if kings[color.index()] != 1 {
                return Err(ChessError::MissingKing(color));
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_validates() {
        let resolved = BoardLayout::standard().validate().unwrap();
        assert_eq!(resolved.len(), 32);
        let material: i32 = resolved
            .iter()
            .filter(|(_, _, color)| *color == Color::White)
            .map(|(_, kind, _)| kind.value())
            .sum();
        assert_eq!(material, 1290);
    }

    #[test]
    fn test_parse_layout_text() {
        let layout = BoardLayout::parse(
            "# kings only\n\
             e1 King White\n\
             \n\
             e8 king black\n",
        )
        .unwrap();
        assert_eq!(layout.entries().len(), 2);
        assert_eq!(layout.entries()[1].square, Square::new(4, 7));
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(matches!(
            BoardLayout::parse("e1 King"),
            Err(ChessError::InvalidLayoutLine { line: 1, .. })
        ));
        assert!(matches!(
            BoardLayout::parse("e1 King White\ne9 King Black"),
            Err(ChessError::InvalidSquare(_))
        ));
        assert!(matches!(
            BoardLayout::parse("e1 King Purple"),
            Err(ChessError::InvalidLayoutLine { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let mut layout = BoardLayout::parse("e1 King White\ne8 King Black").unwrap();
        layout.push(LayoutEntry::new(Square::new(3, 3), "Archbishop", Color::White));
        assert_eq!(
            layout.validate(),
            Err(ChessError::UnknownPieceKind("Archbishop".to_string()))
        );

        let mut layout = BoardLayout::parse("e1 King White\ne8 King Black").unwrap();
        layout.push(LayoutEntry::new(Square::new(8, 3), "Rook", Color::White));
        assert!(matches!(layout.validate(), Err(ChessError::InvalidSquare(_))));

        let layout = BoardLayout::parse("e1 King White\ne1 Rook Black\ne8 King Black").unwrap();
        assert_eq!(layout.validate(), Err(ChessError::SquareOccupied(Square::new(4, 0))));

        let layout = BoardLayout::parse("e1 King White").unwrap();
        assert_eq!(layout.validate(), Err(ChessError::MissingKing(Color::Black)));
    }
}
