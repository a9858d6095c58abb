//! Index-time tokenization and query-string normalization
//!
//! Two pipelines on purpose:
//! - [`tokenize`] feeds the inverted index: lowercase, split on every
//!   non-alphanumeric character. Stopwords and single-character tokens are
//!   kept, because the stopword set constrains query conjunctions rather
//!   than postings, and author initials ("R.") must stay findable.
//! - [`normalize_query`] is the historical query pre-processing: lowercase,
//!   strip `,.;:`, delete runs of two or more whitespace characters, then
//!   split on single spaces. Deleting a run joins its neighbouring words
//!   ("foo  bar" becomes "foobar"); callers depend on the resulting terms,
//!   so the behavior is pinned by tests rather than corrected.

/// Standard English stopwords (Lucene's classic set).
///
/// Excluded from multi-term query conjunctions so common words do not
/// over-constrain the match; never filtered from postings.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Check if a term is a stopword.
#[inline]
pub fn is_stopword(term: &str) -> bool {
    // Linear scan is fast for ~33 entries.
    STOPWORDS.contains(&term)
}

/// Tokenize document text into indexable terms.
///
/// # Example
///
/// ```
/// use refsearch_index::tokenizer::tokenize;
///
/// let tokens = tokenize("Elven, R. 1980.");
/// assert_eq!(tokens, vec!["elven", "r", "1980"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Normalize a raw query string into search terms.
///
/// # Example
///
/// ```
/// use refsearch_index::tokenizer::normalize_query;
///
/// let terms = normalize_query("Elven, Association; 1981");
/// assert_eq!(terms, vec!["elven", "association", "1981"]);
/// ```
pub fn normalize_query(raw: &str) -> Vec<String> {
    let lower = raw.to_lowercase();
    let stripped: String = lower
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | ';' | ':'))
        .collect();
    collapse_whitespace_runs(&stripped)
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Delete every run of two or more consecutive whitespace characters.
/// Single whitespace characters pass through unchanged.
fn collapse_whitespace_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run_len = 0usize;
    let mut first_ws = ' ';
    for c in s.chars() {
        if c.is_whitespace() {
            if run_len == 0 {
                first_ws = c;
            }
            run_len += 1;
        } else {
            if run_len == 1 {
                out.push(first_ws);
            }
            run_len = 0;
            out.push(c);
        }
    }
    if run_len == 1 {
        out.push(first_ws);
    }
    out
}
