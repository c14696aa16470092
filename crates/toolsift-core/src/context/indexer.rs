//! BM25 inverted index over tool descriptors.
//!
//! Maps each token to a posting list of `(document id, term frequency)` and
//! keeps the token count of every document. Corpus statistics (document
//! frequency, IDF, average document length) are derived from the postings in
//! one pass and cached per index generation: any mutation drops them, and the
//! next search rebuilds them wholesale. A search therefore always scores
//! against statistics that match the exact document set it is looking at.
//!
//! ## Scoring
//!
//! ```text
//! score(D,Q) = Σ_t IDF(t) · f(t,D)·(k1+1) / (f(t,D) + k1·(1 − b + b·|D|/avgdl))
//! IDF(t)     = ln((N − df(t) + 0.5) / (df(t) + 0.5) + 1)
//! ```
//!
//! The `+ 1` inside the logarithm keeps IDF positive, so every document that
//! shares a token with the query scores above zero.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use toolsift_config::Bm25Config;

use super::tokenizer::{term_frequencies, tokenize};

/// Errors from index mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("document id must not be empty")]
    EmptyId,
}

/// A document as stored in the index.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// Token -> occurrences in this document.
    pub term_freqs: HashMap<String, u32>,
    /// Total token count (|D|).
    pub length: u32,
}

/// Corpus-wide statistics for one index generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    /// Number of documents (N).
    pub doc_count: usize,
    /// Mean document length in tokens.
    pub avg_doc_len: f64,
    /// Token -> number of documents containing it.
    pub doc_freq: HashMap<String, usize>,
    /// Token -> inverse document frequency.
    pub idf: HashMap<String, f64>,
}

impl CorpusStats {
    /// IDF for `token`, or 0.0 if no document contains it.
    pub fn idf(&self, token: &str) -> f64 {
        self.idf.get(token).copied().unwrap_or(0.0)
    }
}

/// IDF for a token with document frequency `df` in a corpus of `n` documents.
pub fn idf(n: usize, df: usize) -> f64 {
    let n = n as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// A document id with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub id: String,
    pub score: f64,
}

/// Ordering used for every ranked list: score descending, then id ascending.
pub fn rank_order(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

/// In-memory BM25 index.
///
/// Mutation takes `&mut self`; search takes `&self` and may be called from
/// many threads at once. Cloning produces an independent generation, which
/// is how the tool loader publishes immutable snapshots.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Config,
    documents: HashMap<String, IndexedDocument>,
    /// Token -> (document id -> term frequency).
    postings: HashMap<String, BTreeMap<String, u32>>,
    /// Statistics for the current document set; empty means dirty.
    stats: OnceLock<Arc<CorpusStats>>,
}

impl Bm25Index {
    /// Create an empty index with the given constants.
    pub fn new(params: Bm25Config) -> Self {
        Self {
            params,
            documents: HashMap::new(),
            postings: HashMap::new(),
            stats: OnceLock::new(),
        }
    }

    /// Index `text` under `id`, replacing any previous document with that id.
    pub fn add_or_replace(&mut self, id: &str, text: &str) -> Result<(), IndexError> {
        if id.is_empty() {
            return Err(IndexError::EmptyId);
        }
        self.remove_postings(id);

        let tokens = tokenize(text);
        let length = tokens.len() as u32;
        let term_freqs = term_frequencies(&tokens);
        for (token, tf) in &term_freqs {
            self.postings
                .entry(token.clone())
                .or_default()
                .insert(id.to_string(), *tf);
        }
        self.documents.insert(
            id.to_string(),
            IndexedDocument {
                term_freqs,
                length,
            },
        );
        self.mark_dirty();
        Ok(())
    }

    /// Remove the document under `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.remove_postings(id);
        if removed {
            self.mark_dirty();
        }
        removed
    }

    /// Rank documents against `query`, best first.
    ///
    /// Only documents sharing at least one token with the query are
    /// returned, so the result may be shorter than `limit`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredDocument> {
        self.search_tokens(&tokenize(query), limit)
    }

    /// Rank documents against already-normalized query tokens.
    ///
    /// Repeated query tokens are scored once.
    pub fn search_tokens(&self, tokens: &[String], limit: usize) -> Vec<ScoredDocument> {
        if tokens.is_empty() || limit == 0 || self.documents.is_empty() {
            return Vec::new();
        }
        let stats = self.stats();
        let Bm25Config { k1, b } = self.params;

        let mut seen = HashSet::with_capacity(tokens.len());
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for token in tokens {
            if !seen.insert(token.as_str()) {
                continue;
            }
            let Some(postings) = self.postings.get(token) else {
                continue;
            };
            let idf = stats.idf(token);
            for (id, tf) in postings {
                let Some(doc) = self.documents.get(id) else {
                    continue;
                };
                let tf = f64::from(*tf);
                let norm = if stats.avg_doc_len > 0.0 {
                    f64::from(doc.length) / stats.avg_doc_len
                } else {
                    1.0
                };
                let denom = tf + k1 * (1.0 - b + b * norm);
                *scores.entry(id.as_str()).or_insert(0.0) += idf * (tf * (k1 + 1.0)) / denom;
            }
        }

        let mut ranked: Vec<ScoredDocument> = scores
            .into_iter()
            .map(|(id, score)| ScoredDocument {
                id: id.to_string(),
                score,
            })
            .collect();
        top_k(&mut ranked, limit);
        ranked
    }

    /// Current corpus statistics, rebuilding them if the index changed.
    pub fn stats(&self) -> Arc<CorpusStats> {
        Arc::clone(self.stats.get_or_init(|| Arc::new(self.compute_stats())))
    }

    /// Whether the next search has to rebuild corpus statistics.
    pub fn is_dirty(&self) -> bool {
        self.stats.get().is_none()
    }

    /// The BM25 constants in use.
    pub fn params(&self) -> Bm25Config {
        self.params
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Token count of a document.
    pub fn document_length(&self, id: &str) -> Option<u32> {
        self.documents.get(id).map(|d| d.length)
    }

    /// Number of distinct tokens in the index.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn compute_stats(&self) -> CorpusStats {
        let doc_count = self.documents.len();
        let total_len: u64 = self.documents.values().map(|d| u64::from(d.length)).sum();
        let avg_doc_len = if doc_count == 0 {
            0.0
        } else {
            total_len as f64 / doc_count as f64
        };

        let mut doc_freq = HashMap::with_capacity(self.postings.len());
        let mut idf_map = HashMap::with_capacity(self.postings.len());
        for (token, postings) in &self.postings {
            let df = postings.len();
            doc_freq.insert(token.clone(), df);
            idf_map.insert(token.clone(), idf(doc_count, df));
        }

        tracing::trace!(
            docs = doc_count,
            terms = doc_freq.len(),
            avg_doc_len,
            "rebuilt corpus statistics"
        );

        CorpusStats {
            doc_count,
            avg_doc_len,
            doc_freq,
            idf: idf_map,
        }
    }

    fn remove_postings(&mut self, id: &str) -> bool {
        let Some(doc) = self.documents.remove(id) else {
            return false;
        };
        for token in doc.term_freqs.keys() {
            if let Some(postings) = self.postings.get_mut(token) {
                postings.remove(id);
                if postings.is_empty() {
                    self.postings.remove(token);
                }
            }
        }
        true
    }

    fn mark_dirty(&mut self) {
        self.stats = OnceLock::new();
    }
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new(Bm25Config::default())
    }
}

/// Keep the best `limit` entries of `ranked`, sorted by [`rank_order`].
///
/// Partial selection bounds the sort to `limit` elements when the candidate
/// set is large.
pub fn top_k(ranked: &mut Vec<ScoredDocument>, limit: usize) {
    if limit == 0 {
        ranked.clear();
        return;
    }
    if ranked.len() > limit {
        ranked.select_nth_unstable_by(limit - 1, rank_order);
        ranked.truncate(limit);
    }
    ranked.sort_by(rank_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(results: &[ScoredDocument]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample_index() -> Bm25Index {
        let mut index = Bm25Index::default();
        index
            .add_or_replace("read_file", "read_file read a file from disk")
            .unwrap();
        index
            .add_or_replace("write_file", "write_file write a file to disk")
            .unwrap();
        index
            .add_or_replace("slack_send", "slack_send send a message to slack")
            .unwrap();
        index
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut index = Bm25Index::default();
        assert_eq!(index.add_or_replace("", "text"), Err(IndexError::EmptyId));
        assert!(index.is_empty());
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let index = sample_index();
        assert!(index.search("", 10).is_empty());
        assert!(index.search("the a of", 10).is_empty());
    }

    #[test]
    fn test_empty_corpus_returns_nothing() {
        let index = Bm25Index::default();
        assert!(index.search("read file", 10).is_empty());
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let index = sample_index();
        assert!(index.search("file", 0).is_empty());
    }

    #[test]
    fn test_excludes_non_overlapping_documents() {
        let index = sample_index();
        let results = index.search("read file", 10);
        assert_eq!(ids(&results), vec!["read_file", "write_file"]);
        assert!(results.iter().all(|r| r.score > 0.0));
    }

    #[test]
    fn test_unknown_query_token_contributes_nothing() {
        let index = sample_index();
        let plain = index.search("read", 10);
        let with_unknown = index.search("read zebra", 10);
        assert_eq!(plain, with_unknown);
    }

    #[test]
    fn test_repeated_query_tokens_scored_once() {
        let index = sample_index();
        assert_eq!(index.search("slack", 10), index.search("slack slack slack", 10));
    }

    #[test]
    fn test_matches_formula_for_single_document() {
        let mut index = Bm25Index::default();
        index.add_or_replace("only", "alpha beta gamma").unwrap();
        let results = index.search("alpha", 10);
        // N = 1, df = 1, tf = 1, |D| = avgdl
        let expected_idf = (0.5f64 / 1.5 + 1.0).ln();
        let expected = expected_idf * (1.0 * 2.2) / (1.0 + 1.2);
        assert_eq!(results.len(), 1);
        assert!((results[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let index = sample_index();
        let stats = index.stats();
        // "file" appears in two documents, "slack" in one.
        assert!(stats.idf("slack") > stats.idf("file"));
        assert_eq!(stats.doc_freq.get("file"), Some(&2));
        assert_eq!(stats.idf("missing"), 0.0);
    }

    #[test]
    fn test_term_frequency_monotonicity() {
        let mut index = Bm25Index::default();
        index.add_or_replace("a", "deploy deploy deploy build").unwrap();
        index.add_or_replace("b", "deploy build build build").unwrap();
        index.add_or_replace("c", "unrelated words entirely here").unwrap();
        assert_eq!(index.document_length("a"), index.document_length("b"));

        let results = index.search("deploy", 10);
        assert_eq!(ids(&results), vec!["a", "b"]);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_longer_documents_are_normalized_down() {
        let mut index = Bm25Index::default();
        index.add_or_replace("short", "deploy service").unwrap();
        index
            .add_or_replace("long", "deploy service with many extra padding words attached")
            .unwrap();
        let results = index.search("deploy", 10);
        assert_eq!(ids(&results), vec!["short", "long"]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let mut index = Bm25Index::default();
        index.add_or_replace("zeta", "shared token").unwrap();
        index.add_or_replace("alpha", "shared token").unwrap();
        index.add_or_replace("mid", "shared token").unwrap();
        let results = index.search("shared", 10);
        assert_eq!(ids(&results), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_limit_truncates_to_best() {
        let mut index = Bm25Index::default();
        for i in 0..20 {
            let text = format!("common {}", "boost ".repeat(i % 5 + 1));
            index.add_or_replace(&format!("doc{i:02}"), &text).unwrap();
        }
        let all = index.search("boost", 100);
        let top = index.search("boost", 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top, all[..3].to_vec());
    }

    #[test]
    fn test_replace_does_not_duplicate() {
        let mut index = sample_index();
        let before = index.search("slack", 10)[0].score;
        index
            .add_or_replace("slack_send", "slack_send post a message to slack slack channel")
            .unwrap();
        assert_eq!(index.len(), 3);
        let results = index.search("slack", 10);
        assert_eq!(ids(&results), vec!["slack_send"]);
        assert!(results[0].score != before);
        // Old content is no longer searchable.
        assert!(index.search("send", 10).iter().all(|r| r.id == "slack_send"));
        let stats = index.stats();
        assert_eq!(stats.doc_freq.get("channel"), Some(&1));
    }

    #[test]
    fn test_replace_drops_old_tokens() {
        let mut index = Bm25Index::default();
        index.add_or_replace("tool", "legacy behaviour").unwrap();
        index.add_or_replace("tool", "modern behaviour").unwrap();
        assert!(index.search("legacy", 10).is_empty());
        assert_eq!(index.search("modern", 10).len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut index = sample_index();
        assert!(index.remove("slack_send"));
        assert!(!index.remove("slack_send"));
        assert!(index.search("slack", 10).is_empty());
        assert_eq!(index.len(), 2);
        assert!(!index.contains("slack_send"));
    }

    #[test]
    fn test_stats_rebuilt_lazily_after_mutation() {
        let mut index = sample_index();
        assert!(index.is_dirty());
        let first = index.stats();
        assert!(!index.is_dirty());
        assert_eq!(first.doc_count, 3);

        index.add_or_replace("list_dir", "list a directory").unwrap();
        assert!(index.is_dirty());
        // The old snapshot is untouched by the mutation.
        assert_eq!(first.doc_count, 3);
        assert_eq!(index.stats().doc_count, 4);
    }

    #[test]
    fn test_clone_is_independent_generation() {
        let index = sample_index();
        let snapshot = index.clone();
        let mut next = index;
        next.remove("read_file");
        assert_eq!(snapshot.search("read", 10).len(), 1);
        assert!(next.search("read", 10).is_empty());
    }

    #[test]
    fn test_document_with_no_tokens() {
        let mut index = Bm25Index::default();
        index.add_or_replace("blank", "a an to").unwrap();
        assert_eq!(index.document_length("blank"), Some(0));
        assert!(index.search("blank", 10).is_empty());
        index.add_or_replace("real", "real content").unwrap();
        assert_eq!(index.stats().avg_doc_len, 1.0);
    }

    #[test]
    fn test_idf_always_positive() {
        for n in 1..20 {
            for df in 0..=n {
                assert!(idf(n, df) > 0.0);
            }
        }
    }

    #[test]
    fn test_custom_params() {
        let mut flat = Bm25Index::new(Bm25Config { k1: 1.2, b: 0.0 });
        flat.add_or_replace("short", "deploy").unwrap();
        flat.add_or_replace("long", "deploy lots more words here").unwrap();
        let results = flat.search("deploy", 10);
        // Without length normalization equal tf means equal score.
        assert!((results[0].score - results[1].score).abs() < 1e-12);
        assert_eq!(flat.params().b, 0.0);
    }
}
