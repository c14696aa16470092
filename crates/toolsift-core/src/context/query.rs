//! Query normalization, synonym expansion, and domain hinting.
//!
//! Expansion only ever appends tokens: the original tokens keep their
//! positions, so a query never loses the terms the caller actually typed.
//! The domain hint is a tie-break signal for the loader, never a filter.

use std::collections::HashMap;

use super::tokenizer::tokenize;

/// Abbreviation -> expansion, applied to normalized tokens.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("auth", &["authentication"]),
    ("cfg", &["configuration"]),
    ("cmd", &["command"]),
    ("config", &["configuration"]),
    ("del", &["delete"]),
    ("dir", &["directory"]),
    ("doc", &["documentation"]),
    ("env", &["environment"]),
    ("img", &["image"]),
    ("info", &["information"]),
    ("mkdir", &["create", "directory"]),
    ("msg", &["message"]),
    ("pkg", &["package"]),
    ("pwd", &["directory"]),
    ("remove", &["delete"]),
    ("repo", &["repository"]),
    ("sql", &["database", "query"]),
    ("todo", &["task"]),
];

/// Keyword -> coarse domain, used for the domain hint.
const DOMAINS: &[(&str, &str)] = &[
    ("branch", "vcs"),
    ("channel", "communication"),
    ("chat", "communication"),
    ("commit", "vcs"),
    ("database", "database"),
    ("directory", "filesystem"),
    ("disk", "filesystem"),
    ("email", "communication"),
    ("file", "filesystem"),
    ("find", "search"),
    ("folder", "filesystem"),
    ("git", "vcs"),
    ("grep", "search"),
    ("lookup", "search"),
    ("merge", "vcs"),
    ("message", "communication"),
    ("note", "notes"),
    ("path", "filesystem"),
    ("query", "database"),
    ("repository", "vcs"),
    ("search", "search"),
    ("send", "communication"),
    ("slack", "communication"),
    ("table", "database"),
    ("task", "tasks"),
    ("test", "testing"),
];

/// The result of processing a raw query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedQuery {
    /// Normalized tokens, in the order the caller wrote them.
    pub tokens: Vec<String>,
    /// Original tokens followed by synonym expansions, space-joined.
    pub expanded_query: String,
    /// Coarse domain guess, if any token suggests one.
    pub domain_hint: Option<String>,
}

impl ProcessedQuery {
    /// Space-joined original tokens. Equal for queries that normalize alike.
    pub fn normalized(&self) -> String {
        self.tokens.join(" ")
    }

    /// Whether the query normalized to nothing.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Turns raw query text into index-ready form.
#[derive(Debug, Clone)]
pub struct QueryProcessor {
    synonyms: HashMap<&'static str, &'static [&'static str]>,
    domains: HashMap<&'static str, &'static str>,
}

impl QueryProcessor {
    /// Create a processor with the built-in synonym and domain tables.
    pub fn new() -> Self {
        Self {
            synonyms: SYNONYMS.iter().copied().collect(),
            domains: DOMAINS.iter().copied().collect(),
        }
    }

    /// Normalize, expand, and classify `raw`.
    pub fn process(&self, raw: &str) -> ProcessedQuery {
        let tokens = tokenize(raw);

        let mut expanded = tokens.clone();
        for token in &tokens {
            let Some(expansions) = self.synonyms.get(token.as_str()) else {
                continue;
            };
            for expansion in *expansions {
                if !expanded.iter().any(|t| t == expansion) {
                    expanded.push((*expansion).to_string());
                }
            }
        }

        let domain_hint = self.domain_hint(&expanded);
        ProcessedQuery {
            tokens,
            expanded_query: expanded.join(" "),
            domain_hint,
        }
    }

    /// Domain with the most votes; ties go to the domain voted for first.
    fn domain_hint(&self, tokens: &[String]) -> Option<String> {
        let mut votes: Vec<(&str, usize)> = Vec::new();
        for token in tokens {
            let Some(&domain) = self.domains.get(token.as_str()) else {
                continue;
            };
            match votes.iter().position(|(d, _)| *d == domain) {
                Some(i) => votes[i].1 += 1,
                None => votes.push((domain, 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (domain, count) in votes {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((domain, count));
            }
        }
        best.map(|(domain, _)| domain.to_string())
    }
}

impl Default for QueryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_query() {
        let q = QueryProcessor::new().process("Read the File");
        assert_eq!(q.tokens, vec!["read", "file"]);
        assert_eq!(q.expanded_query, "read file");
        assert_eq!(q.domain_hint.as_deref(), Some("filesystem"));
    }

    #[test]
    fn test_empty_query() {
        let q = QueryProcessor::new().process("   ");
        assert!(q.is_empty());
        assert_eq!(q.expanded_query, "");
        assert_eq!(q.domain_hint, None);
    }

    #[test]
    fn test_expansion_appends_without_reordering() {
        let q = QueryProcessor::new().process("send msg to repo");
        assert_eq!(q.tokens, vec!["send", "msg", "repo"]);
        assert_eq!(q.expanded_query, "send msg repo message repository");
    }

    #[test]
    fn test_expansion_skips_tokens_already_present() {
        let q = QueryProcessor::new().process("msg message");
        assert_eq!(q.expanded_query, "msg message");
    }

    #[test]
    fn test_multi_token_expansion() {
        let q = QueryProcessor::new().process("mkdir");
        assert_eq!(q.expanded_query, "mkdir create directory");
        assert_eq!(q.domain_hint.as_deref(), Some("filesystem"));
    }

    #[test]
    fn test_expansions_survive_tokenization() {
        // The index re-tokenizes the expanded query; expansions must be stable.
        for (_, expansions) in SYNONYMS {
            for expansion in *expansions {
                assert_eq!(tokenize(expansion), vec![expansion.to_string()]);
            }
        }
    }

    #[test]
    fn test_table_keys_are_normalized_tokens() {
        for (key, _) in SYNONYMS {
            assert_eq!(tokenize(key), vec![key.to_string()]);
        }
        for (key, _) in DOMAINS {
            assert_eq!(tokenize(key), vec![key.to_string()]);
        }
    }

    #[test]
    fn test_domain_hint_majority() {
        let q = QueryProcessor::new().process("send slack message about file");
        assert_eq!(q.domain_hint.as_deref(), Some("communication"));
    }

    #[test]
    fn test_domain_hint_tie_goes_to_first() {
        let q = QueryProcessor::new().process("commit file");
        assert_eq!(q.domain_hint.as_deref(), Some("vcs"));
        let q = QueryProcessor::new().process("file commit");
        assert_eq!(q.domain_hint.as_deref(), Some("filesystem"));
    }

    #[test]
    fn test_no_domain_hint_for_unknown_words() {
        let q = QueryProcessor::new().process("frobnicate widget");
        assert_eq!(q.domain_hint, None);
    }

    #[test]
    fn test_normalized_collapses_formatting() {
        let p = QueryProcessor::new();
        assert_eq!(
            p.process("  Read   FILES!").normalized(),
            p.process("read file").normalized()
        );
    }
}
