// 🔍 Bank Search - fuzzy match on name and aliases
//
// Score = edit distance between the query and the best-matching substring of
// a candidate name, divided by the query length. 0.0 is a perfect hit; a
// candidate matches when its score is within the threshold.

use super::record::BankRecord;
use super::sort::fold_diacritics;

/// Default tolerance: roughly 30% of the query may be mistyped
pub const DEFAULT_SEARCH_THRESHOLD: f64 = 0.3;

// ============================================================================
// FUZZY MATCHER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl FuzzyMatcher {
    /// Threshold is clamped to 0.0 - 1.0; NaN falls back to the default
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            DEFAULT_SEARCH_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        FuzzyMatcher { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Normalized distance of `query` against `candidate`, if within threshold
    pub fn score(&self, query: &str, candidate: &str) -> Option<f64> {
        let query = normalize_for_search(query);
        let candidate = normalize_for_search(candidate);
        self.score_normalized(&query, &candidate)
    }

    fn score_normalized(&self, query: &str, candidate: &str) -> Option<f64> {
        let query_len = query.chars().count();
        if query_len == 0 {
            return Some(0.0);
        }
        if candidate.contains(query) {
            return Some(0.0);
        }

        let partial = substring_distance(query, candidate) as f64 / query_len as f64;
        let max_len = query_len.max(candidate.chars().count()) as f64;
        let whole = levenshtein_distance(query, candidate) as f64 / max_len;

        let score = partial.min(whole);
        (score <= self.threshold).then_some(score)
    }

    /// Best score over the record's name and aliases
    pub fn score_record(&self, query: &str, record: &BankRecord) -> Option<f64> {
        let query = normalize_for_search(query);
        record
            .all_names()
            .into_iter()
            .filter_map(|name| self.score_normalized(&query, &normalize_for_search(name)))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Records matching `query`, in input order. Blank query is identity.
    pub fn search(&self, records: Vec<BankRecord>, query: &str) -> Vec<BankRecord> {
        let normalized = normalize_for_search(query);
        if normalized.is_empty() {
            return records;
        }

        let before = records.len();
        let matched: Vec<BankRecord> = records
            .into_iter()
            .filter(|r| self.score_record(&normalized, r).is_some())
            .collect();

        tracing::debug!(
            query = %query,
            threshold = self.threshold,
            before,
            after = matched.len(),
            "bank search"
        );
        matched
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        FuzzyMatcher::new(DEFAULT_SEARCH_THRESHOLD)
    }
}

/// `search` with the default threshold
pub fn search(records: Vec<BankRecord>, query: &str) -> Vec<BankRecord> {
    FuzzyMatcher::default().search(records, query)
}

// ============================================================================
// STRING HELPERS
// ============================================================================

/// Fold diacritics and case, turn punctuation into spaces, collapse spaces
pub fn normalize_for_search(input: &str) -> String {
    fold_diacritics(input)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Calculate Levenshtein distance between two strings
///
/// Levenshtein distance = minimum number of single-character edits
/// (insertions, deletions, substitutions) to change one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Smallest edit distance between `pattern` and any substring of `text`
///
/// Same recurrence as Levenshtein, except the first row is all zeros so a
/// match may start anywhere in `text`, and the answer is the minimum of the
/// last row so it may end anywhere.
pub fn substring_distance(pattern: &str, text: &str) -> usize {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    if p.is_empty() {
        return 0;
    }
    if t.is_empty() {
        return p.len();
    }

    let mut prev = vec![0usize; t.len() + 1];
    let mut curr = vec![0usize; t.len() + 1];

    for i in 1..=p.len() {
        curr[0] = i;
        for j in 1..=t.len() {
            let cost = if p[i - 1] == t[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev.into_iter().min().unwrap_or(p.len())
}
