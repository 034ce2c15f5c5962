//! Character n-gram TF-IDF vectorizer
//!
//! Closed-vocabulary: n-grams missing from the trained vocabulary are
//! dropped. Produces sparse, L2-normalized feature vectors.
//!
//! Pipeline per text (already normalized):
//! 1. collapse whitespace runs to a single space
//! 2. slide windows of `ngram_min..=ngram_max` characters (may span spaces)
//! 3. count in-vocabulary hits
//! 4. term weight: raw count, or `1 + ln(count)` when sublinear
//! 5. multiply by `idf[index]`, then L2-normalize

use regex::Regex;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Sparse feature vector, entries sorted by feature index.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(usize, f64)>,
    dim: usize,
}

impl FeatureVector {
    /// All-zero vector of the given dimension
    pub fn zeros(dim: usize) -> Self {
        Self {
            entries: Vec::new(),
            dim,
        }
    }

    /// Number of features (vocabulary size)
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|&(_, v)| v == 0.0)
    }

    /// Value at `index` (0.0 when absent)
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Non-zero entries in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|&(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Expand to a dense vector of length `dim`
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for &(i, v) in &self.entries {
            dense[i] = v;
        }
        dense
    }
}

/// TF-IDF vectorizer over a fixed, pre-trained vocabulary.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    ngram_min: usize,
    ngram_max: usize,
    sublinear_tf: bool,
    vocabulary: FxHashMap<String, usize>,
    idf: Vec<f64>,
}

impl Vectorizer {
    /// Build from trained parts. Callers guarantee `idf.len() == vocabulary.len()`
    /// and dense indices; `Model` validation enforces this for loaded artifacts.
    pub fn new(
        ngram_range: (usize, usize),
        vocabulary: FxHashMap<String, usize>,
        idf: Vec<f64>,
        sublinear_tf: bool,
    ) -> Self {
        Self {
            ngram_min: ngram_range.0,
            ngram_max: ngram_range.1,
            sublinear_tf,
            vocabulary,
            idf,
        }
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        (self.ngram_min, self.ngram_max)
    }

    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }

    pub fn vocabulary(&self) -> &FxHashMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Vocabulary size
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Vectorize one normalized text.
    ///
    /// Empty or fully out-of-vocabulary input yields the zero vector.
    pub fn vectorize(&self, normalized: &str) -> FeatureVector {
        let mut counts: FxHashMap<usize, u32> = FxHashMap::default();
        for_each_ngram(normalized, self.ngram_min, self.ngram_max, |gram| {
            if let Some(&index) = self.vocabulary.get(gram) {
                *counts.entry(index).or_insert(0) += 1;
            }
        });

        // Sorted so downstream sums run in a fixed order
        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, count)| (index, self.term_weight(count) * self.idf[index]))
            .collect();
        entries.sort_unstable_by_key(|&(i, _)| i);

        let norm = entries.iter().map(|&(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in entries.iter_mut() {
                *v /= norm;
            }
        }

        FeatureVector {
            entries,
            dim: self.idf.len(),
        }
    }

    fn term_weight(&self, count: u32) -> f64 {
        if count == 0 {
            0.0
        } else if self.sublinear_tf {
            1.0 + (count as f64).ln()
        } else {
            count as f64
        }
    }
}

/// Replace runs of two or more whitespace characters with one space.
pub(crate) fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    static WHITE_SPACES: OnceLock<Regex> = OnceLock::new();
    WHITE_SPACES
        .get_or_init(|| Regex::new(r"\s\s+").expect("valid regex"))
        .replace_all(text, " ")
}

/// Visit every character n-gram of length `min..=max` in `text`, after
/// whitespace collapsing. Lengths count Unicode scalar values, not bytes.
pub(crate) fn for_each_ngram(text: &str, min: usize, max: usize, mut f: impl FnMut(&str)) {
    let text = collapse_whitespace(text);
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;

    for n in min.max(1)..=max.min(char_count) {
        for start in 0..=(char_count - n) {
            f(&text[offsets[start]..offsets[start + n]]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(grams: &[&str]) -> FxHashMap<String, usize> {
        grams
            .iter()
            .enumerate()
            .map(|(i, g)| (g.to_string(), i))
            .collect()
    }

    fn collect_ngrams(text: &str, min: usize, max: usize) -> Vec<String> {
        let mut out = Vec::new();
        for_each_ngram(text, min, max, |g| out.push(g.to_string()));
        out
    }

    #[test]
    fn test_ngrams_span_whitespace() {
        let grams = collect_ngrams("ab c", 2, 3);
        assert_eq!(grams, vec!["ab", "b ", " c", "ab ", "b c"]);
    }

    #[test]
    fn test_ngrams_count_chars_not_bytes() {
        let grams = collect_ngrams("мир", 1, 2);
        assert_eq!(grams, vec!["м", "и", "р", "ми", "ир"]);
    }

    #[test]
    fn test_ngrams_longer_than_text_skipped() {
        assert_eq!(collect_ngrams("ab", 3, 5), Vec::<String>::new());
        assert_eq!(collect_ngrams("", 1, 3), Vec::<String>::new());
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(collapse_whitespace("a  \t\nb"), "a b");
        // a single whitespace char is kept as-is
        assert_eq!(collapse_whitespace("a\nb"), "a\nb");
    }

    #[test]
    fn test_vectorize_raw_counts_l2_normalized() {
        let v = Vectorizer::new((1, 1), vocab(&["a", "b"]), vec![1.0, 1.0], false);
        let fv = v.vectorize("aaab");
        // counts 3 and 1 -> (3, 1) / sqrt(10)
        let n = 10f64.sqrt();
        assert!((fv.get(0) - 3.0 / n).abs() < 1e-12);
        assert!((fv.get(1) - 1.0 / n).abs() < 1e-12);
        assert!((fv.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vectorize_sublinear_and_idf() {
        let v = Vectorizer::new((1, 1), vocab(&["a", "b"]), vec![2.0, 1.0], true);
        let fv = v.vectorize("aaab");
        let wa = (1.0 + 3f64.ln()) * 2.0;
        let wb = 1.0;
        let n = (wa * wa + wb * wb).sqrt();
        assert!((fv.get(0) - wa / n).abs() < 1e-12);
        assert!((fv.get(1) - wb / n).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_vocabulary_is_zero_vector() {
        let v = Vectorizer::new((1, 2), vocab(&["x", "y"]), vec![1.0, 1.0], true);
        let fv = v.vectorize("hello");
        assert!(fv.is_zero());
        assert_eq!(fv.dim(), 2);
        assert_eq!(fv.norm(), 0.0);
        assert!(v.vectorize("").is_zero());
    }

    #[test]
    fn test_entries_sorted_by_index() {
        let v = Vectorizer::new((1, 1), vocab(&["c", "b", "a"]), vec![1.0; 3], false);
        let fv = v.vectorize("abc");
        let indices: Vec<usize> = fv.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(fv.to_dense().len(), 3);
    }
}
