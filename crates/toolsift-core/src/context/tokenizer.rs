//! Text normalization shared by document indexing and query processing.
//!
//! Both sides of the index go through [`tokenize`], so a query token and a
//! document token match exactly when they normalize to the same string.

use std::collections::HashMap;

/// Tokens shorter than this (in characters) are dropped.
pub const MIN_TOKEN_LEN: usize = 3;

/// Common English words that carry no ranking signal.
const STOP_WORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "because", "been", "before", "being",
    "but", "can", "could", "did", "does", "each", "for", "from", "had", "has", "have", "her",
    "here", "him", "his", "how", "into", "its", "just", "more", "most", "not", "now", "only",
    "other", "our", "out", "over", "own", "she", "should", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "too", "under",
    "use", "using", "very", "was", "were", "what", "when", "where", "which", "while", "who",
    "why", "will", "with", "would", "you", "your",
];

/// Split `text` into normalized tokens.
///
/// Lower-cases, splits on every non-alphanumeric character (so `read_file`
/// yields `read` and `file`), strips simple plurals, then drops short tokens
/// and stop words. Order and duplicates are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| stem(&word.to_lowercase()))
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .filter(|token| !is_stop_word(token))
        .collect()
}

/// Whether `token` (already lower-cased) is a stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Count occurrences of each token.
pub fn term_frequencies(tokens: &[String]) -> HashMap<String, u32> {
    let mut tf = HashMap::with_capacity(tokens.len());
    for token in tokens {
        *tf.entry(token.clone()).or_insert(0) += 1;
    }
    tf
}

/// Strip a trailing plural `s` ("files" -> "file", "messages" -> "message").
///
/// Words of four characters or fewer and words ending in `ss`, `us` or `is`
/// ("process", "status", "analysis") are left alone.
fn stem(word: &str) -> String {
    if word.chars().count() > 4
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stop_words_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS.to_vec());
    }

    #[test]
    fn test_lowercases_and_splits() {
        assert_eq!(tokenize("Read FILE"), vec!["read", "file"]);
    }

    #[test]
    fn test_splits_snake_case_names() {
        assert_eq!(tokenize("write_file"), vec!["write", "file"]);
        assert_eq!(tokenize("slack-send.message"), vec!["slack", "send", "message"]);
    }

    #[test]
    fn test_drops_short_tokens() {
        assert_eq!(tokenize("go to db now ok"), Vec::<String>::new());
        assert_eq!(tokenize("a file on disk"), vec!["file", "disk"]);
    }

    #[test]
    fn test_drops_stop_words() {
        assert_eq!(tokenize("read a file from the disk"), vec!["read", "file", "disk"]);
    }

    #[test]
    fn test_strips_plurals() {
        assert_eq!(tokenize("files messages tools"), vec!["file", "message", "tool"]);
    }

    #[test]
    fn test_keeps_non_plural_s_endings() {
        assert_eq!(tokenize("process status analysis"), vec!["process", "status", "analysis"]);
        // Four characters or fewer are never stemmed.
        assert_eq!(tokenize("runs"), vec!["runs"]);
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        assert_eq!(tokenize("file read file"), vec!["file", "read", "file"]);
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  --- !!! ").is_empty());
    }

    #[test]
    fn test_digits_are_alphanumeric() {
        assert_eq!(tokenize("ipv6 http2"), vec!["ipv6", "http2"]);
    }

    #[test]
    fn test_unicode_lowercase() {
        assert_eq!(tokenize("ÜBERSICHT"), vec!["übersicht"]);
    }

    #[test]
    fn test_term_frequencies() {
        let tokens = tokenize("file read file disk file");
        let tf = term_frequencies(&tokens);
        assert_eq!(tf.get("file"), Some(&3));
        assert_eq!(tf.get("read"), Some(&1));
        assert_eq!(tf.get("disk"), Some(&1));
        assert_eq!(tf.len(), 3);
    }
}
