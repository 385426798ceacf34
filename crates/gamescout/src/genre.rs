//! Genre normalization.
//!
//! Maps the genre a user typed or pressed to the catalog API's vocabulary.

use std::fmt;

/// Known genre labels and their catalog tokens.
///
/// Keys are compared after case folding.
const GENRE_TABLE: &[(&str, &str)] = &[
    ("action", "action"),
    ("indie", "indie"),
    ("shooter", "shooter"),
    ("other", "other"),
    ("другое", "other"),
];

/// A genre as typed by the user plus its normalized catalog token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreQuery {
    /// Trimmed user input, used in replies.
    pub raw: String,
    /// Token sent to the catalog.
    pub normalized: String,
}

impl GenreQuery {
    /// Build a query from user input. Returns `None` for blank input.
    pub fn from_input(input: &str) -> Option<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        })
    }
}

impl fmt::Display for GenreQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Normalize a genre token.
///
/// Tokens in the table map to their catalog name; anything else is returned
/// case-folded.
pub fn normalize(token: &str) -> String {
    let folded = token.trim().to_lowercase();
    GENRE_TABLE
        .iter()
        .find(|(label, _)| *label == folded)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(folded)
}
