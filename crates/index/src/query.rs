//! Two-pass ranked retrieval
//!
//! A query runs as up to two bounded passes over the postings:
//! 1. **exact pass**: a conjunction of exact term matches (stopwords are
//!    excluded from multi-term conjunctions), top `offset*limit + limit`
//!    hits by score;
//! 2. **wildcard pass**: prefix matches over the query terms longer than
//!    two characters, same bound. Runs only when iteration exhausts the
//!    exact hits, so exact matches always rank ahead of fuzzy ones.
//!
//! Pagination applies one skip of `offset*limit` hits against a counter
//! shared by both passes, and a seen-set suppresses ids the exact pass
//! already produced. Wildcard ranking is independent of exact ranking, so
//! the concatenation is not a global top-k by a single score. Callers
//! depend on this exact shape, down to the counter spanning both passes.
//!
//! Ranking inside a pass is BM25 summed over the contributing terms, ties
//! broken by ascending id; for a fixed index state the order is fully
//! deterministic.

use crate::index::{IndexInner, SearchIndex};
use crate::tokenizer::{is_stopword, normalize_query};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// BM25 term-frequency saturation parameter.
const BM25_K1: f32 = 1.2;
/// BM25 length-normalization parameter.
const BM25_B: f32 = 0.75;
/// Terms must be longer than this to join the wildcard pass.
const WILDCARD_MIN_LEN: usize = 2;

impl SearchIndex {
    /// Execute a free-text search.
    ///
    /// Returns a lazy sequence of at most `limit` ids; `offset` counts in
    /// pages of `limit` (the first `offset * limit` ranked hits are
    /// skipped). The sequence is not restartable; a fresh call re-executes
    /// both passes against the index state current at that time. Dropping
    /// the iterator early has no effect on the index.
    ///
    /// Empty or whitespace-only input is the caller's concern (the
    /// repository layer lists instead of searching); here it simply yields
    /// nothing.
    pub fn search(&self, search: &str, offset: usize, limit: usize) -> SearchHits {
        SearchHits::new(
            Arc::clone(&self.inner),
            normalize_query(search),
            offset,
            limit,
        )
    }
}

// ============================================================================
// SearchHits
// ============================================================================

enum Phase {
    Start,
    Exact(std::vec::IntoIter<Uuid>),
    Wildcard(std::vec::IntoIter<Uuid>),
    Done,
}

/// Lazy, ordered, finite sequence of matching document ids.
///
/// Yields at most `limit` ids. See [`SearchIndex::search`].
pub struct SearchHits {
    inner: Arc<IndexInner>,
    terms: Vec<String>,
    /// Ranked hits to skip before emitting: `offset * limit`.
    skip: usize,
    limit: usize,
    /// Running counter over walked hits; spans both passes.
    walked: usize,
    emitted: usize,
    /// Ids the exact pass produced, suppressed in the wildcard pass.
    found: HashSet<Uuid>,
    phase: Phase,
}

impl SearchHits {
    fn new(inner: Arc<IndexInner>, terms: Vec<String>, offset: usize, limit: usize) -> Self {
        SearchHits {
            inner,
            terms,
            skip: offset.saturating_mul(limit),
            limit,
            walked: 0,
            emitted: 0,
            found: HashSet::new(),
            phase: Phase::Start,
        }
    }

    /// Hits requested from each pass: the skip window plus one page.
    fn top_n(&self) -> usize {
        self.skip + self.limit
    }
}

impl Iterator for SearchHits {
    type Item = Uuid;

    fn next(&mut self) -> Option<Uuid> {
        loop {
            if self.emitted >= self.limit {
                self.phase = Phase::Done;
            }
            match &mut self.phase {
                Phase::Start => {
                    let hits = exact_pass(&self.inner, &self.terms, self.top_n());
                    self.phase = Phase::Exact(hits.into_iter());
                }
                Phase::Exact(hits) => match hits.next() {
                    Some(id) => {
                        self.walked += 1;
                        if self.walked <= self.skip {
                            continue;
                        }
                        self.found.insert(id);
                        self.emitted += 1;
                        return Some(id);
                    }
                    None => {
                        self.phase = match wildcard_pass(&self.inner, &self.terms, self.top_n()) {
                            Some(hits) => Phase::Wildcard(hits.into_iter()),
                            None => Phase::Done,
                        };
                    }
                },
                Phase::Wildcard(hits) => match hits.next() {
                    Some(id) => {
                        self.walked += 1;
                        if self.walked <= self.skip {
                            continue;
                        }
                        if self.found.contains(&id) {
                            continue;
                        }
                        self.emitted += 1;
                        return Some(id);
                    }
                    None => {
                        self.phase = Phase::Done;
                    }
                },
                Phase::Done => return None,
            }
        }
    }
}

// ============================================================================
// Passes
// ============================================================================

/// Conjunctive exact-term match, ranked, truncated to `top_n`.
///
/// A single term queries as-is (even a stopword); multiple terms AND
/// together with stopwords excluded. A conjunction left without clauses
/// matches nothing.
fn exact_pass(inner: &IndexInner, terms: &[String], top_n: usize) -> Vec<Uuid> {
    let query_terms: Vec<&String> = if terms.len() == 1 {
        terms.iter().collect()
    } else {
        terms.iter().filter(|t| !is_stopword(t)).collect()
    };
    if query_terms.is_empty() {
        return Vec::new();
    }

    let total_docs = inner.docs.len() as f32;
    let avg_doc_len = inner.avg_doc_len().max(1.0);

    // Gather each term's postings; any missing term empties the conjunction.
    let mut lists = Vec::with_capacity(query_terms.len());
    for term in &query_terms {
        match inner.postings.get(term.as_str()) {
            Some(list) => {
                let idf = idf(total_docs, list.entries.len());
                lists.push((idf, list.value().clone()));
            }
            None => return Vec::new(),
        }
    }

    // Intersect while accumulating per-document scores.
    let (first_idf, first_list) = &lists[0];
    let mut acc: HashMap<Uuid, f32> = HashMap::with_capacity(first_list.entries.len());
    for entry in &first_list.entries {
        acc.insert(
            entry.id,
            bm25(*first_idf, entry.tf, entry.doc_len, avg_doc_len),
        );
    }
    for (term_idf, list) in &lists[1..] {
        let mut next = HashMap::with_capacity(acc.len().min(list.entries.len()));
        for entry in &list.entries {
            if let Some(score) = acc.get(&entry.id) {
                next.insert(
                    entry.id,
                    score + bm25(*term_idf, entry.tf, entry.doc_len, avg_doc_len),
                );
            }
        }
        if next.is_empty() {
            return Vec::new();
        }
        acc = next;
    }

    rank(acc, top_n)
}

/// Conjunctive prefix match over the long query terms, ranked, truncated.
///
/// Returns `None` when no term is long enough, in which case the caller
/// stops without a second pass. A single long term builds a prefix query
/// even when it is a stopword; multiple long terms AND together with
/// stopwords excluded.
fn wildcard_pass(inner: &IndexInner, terms: &[String], top_n: usize) -> Option<Vec<Uuid>> {
    let long_terms: Vec<&String> = terms
        .iter()
        .filter(|t| t.chars().count() > WILDCARD_MIN_LEN)
        .collect();
    if long_terms.is_empty() {
        return None;
    }

    let prefixes: Vec<&String> = if long_terms.len() == 1 {
        long_terms
    } else {
        long_terms.into_iter().filter(|t| !is_stopword(t)).collect()
    };
    if prefixes.is_empty() {
        return Some(Vec::new());
    }

    let total_docs = inner.docs.len() as f32;
    let avg_doc_len = inner.avg_doc_len().max(1.0);

    let mut acc: Option<HashMap<Uuid, f32>> = None;
    for prefix in &prefixes {
        // Expand the prefix against the indexed vocabulary. Sorted term
        // order keeps float accumulation deterministic across runs.
        let mut matching_terms: Vec<String> = inner
            .postings
            .iter()
            .filter(|entry| entry.key().starts_with(prefix.as_str()))
            .map(|entry| entry.key().clone())
            .collect();
        matching_terms.sort_unstable();

        let mut matched: HashMap<Uuid, f32> = HashMap::new();
        for term in &matching_terms {
            if let Some(list) = inner.postings.get(term) {
                let term_idf = idf(total_docs, list.entries.len());
                for entry in &list.entries {
                    *matched.entry(entry.id).or_insert(0.0) +=
                        bm25(term_idf, entry.tf, entry.doc_len, avg_doc_len);
                }
            }
        }

        acc = Some(match acc {
            None => matched,
            Some(prev) => {
                let mut next = HashMap::with_capacity(prev.len().min(matched.len()));
                for (id, score) in matched {
                    if let Some(prev_score) = prev.get(&id) {
                        next.insert(id, prev_score + score);
                    }
                }
                next
            }
        });
        if acc.as_ref().map_or(true, |m| m.is_empty()) {
            return Some(Vec::new());
        }
    }

    Some(rank(acc.unwrap_or_default(), top_n))
}

// ============================================================================
// Scoring
// ============================================================================

/// IDF with +0.5 smoothing: `ln((N - df + 0.5) / (df + 0.5) + 1)`.
fn idf(total_docs: f32, df: usize) -> f32 {
    let df = df as f32;
    ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln()
}

fn bm25(term_idf: f32, tf: u32, doc_len: u32, avg_doc_len: f32) -> f32 {
    let tf = tf as f32;
    let dl = doc_len as f32;
    let tf_component =
        (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * dl / avg_doc_len));
    term_idf * tf_component
}

/// Descending score, ascending id on ties, truncated to `top_n`.
fn rank(scores: HashMap<Uuid, f32>, top_n: usize) -> Vec<Uuid> {
    let mut ranked: Vec<(Uuid, f32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(top_n);
    ranked.into_iter().map(|(id, _)| id).collect()
}
