//! Text folding for team-name matching.
//!
//! Tables spell the same club as "Vitória", "VITORIA" or "vitoria"; all of
//! them must map to one key. Display text is never replaced by the key.

use unicode_normalization::UnicodeNormalization;

/// Decompose accents (NFD), drop every non-ASCII code point and upper-case.
pub fn normalize_key(text: &str) -> String {
    text.nfd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// True when `text` folds to `key`. `key` must already be normalized.
pub fn matches_key(text: &str, key: &str) -> bool {
    normalize_key(text) == key
}
