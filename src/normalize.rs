//! Text canonicalization applied before feature extraction

use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize `text`, then lowercase it when the model was trained
/// lowercased.
///
/// Compatibility variants (full-width Latin, ligatures, composed vs.
/// decomposed diacritics) collapse to one form so they hit the same
/// vocabulary entries.
pub fn normalize(text: &str, lowercase: bool) -> String {
    let nfkc: String = text.nfkc().collect();
    if lowercase {
        nfkc.to_lowercase()
    } else {
        nfkc
    }
}
