//! Raw cell values as produced by the tabular data source.

use serde::{Deserialize, Serialize};

/// A single untyped cell from a raw tabular row.
///
/// Source spreadsheets are inconsistent about cell types: the same column may
/// hold text in one row and a bare number in the next, and blanks are common.
/// Downstream parsers pattern-match on this instead of coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    /// The cell was empty or whitespace-only.
    Missing,
    /// A textual cell.
    Text(String),
    /// A numeric cell.
    Number(f64),
}

impl CellValue {
    /// Classifies a raw string field into a cell value.
    ///
    /// Blank cells become [`Missing`](Self::Missing); cells that parse as a
    /// finite float become [`Number`](Self::Number); everything else stays
    /// textual. Comma decimals ("8,5") and time strings ("8:30") stay textual
    /// for the time parser to handle.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// Returns true when the cell is empty.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the textual content, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Missing | Self::Number(_) => None,
        }
    }

    /// Returns the cell as a finite float.
    ///
    /// Numeric cells are returned directly; textual cells are parsed with
    /// comma-decimal tolerance. Non-finite values are treated as absent.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Missing => None,
            Self::Number(n) => Some(*n),
            Self::Text(s) => s
                .replace(',', ".")
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// Returns a display form of the cell content, if any.
    ///
    /// Unlike [`as_text`](Self::as_text) this also renders numeric cells, so
    /// label columns that occasionally hold bare numbers are not lost.
    #[must_use]
    pub fn display_text(&self) -> Option<String> {
        match self {
            Self::Missing => None,
            Self::Text(s) => Some(s.trim().to_string()),
            Self::Number(n) => Some(n.to_string()),
        }
    }
}
