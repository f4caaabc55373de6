use std::sync::OnceLock;

use regex::Regex;

use crate::error::{EtlError, Result};

fn word_pattern() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"\w+").expect("word pattern compiles"))
}

/// Canonicalizes a raw column label into a lowercase snake_case identifier
/// suitable as a staging-store column name.
///
/// Only the text before the first newline counts (later lines in spreadsheet
/// headers tend to carry units or comments). The surviving text is lowercased
/// and every maximal run of word characters becomes one token; tokens are
/// joined with single underscores. A label with no word characters at all
/// fails with [`EtlError::InvalidColumnLabel`].
pub fn normalize(label: &str) -> Result<String> {
    let first_line = label.split('\n').next().unwrap_or_default();
    let lowered = first_line.to_lowercase();
    let tokens: Vec<&str> = word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect();
    if tokens.is_empty() {
        return Err(EtlError::InvalidColumnLabel(label.to_string()));
    }
    Ok(tokens.join("_"))
}

/// Normalizes every label of a header row.
pub fn normalize_all(labels: &[String]) -> Result<Vec<String>> {
    labels.iter().map(|label| normalize(label)).collect()
}
