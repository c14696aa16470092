//! Human-readable rendering of search results and stats.

use std::fmt::Write;

use toolsift_core::context::LoaderStats;
use toolsift_core::{LayeredEntry, LayeredResult};

fn entry_line(out: &mut String, entry: &LayeredEntry) {
    match (&entry.score, &entry.descriptor) {
        (Some(score), _) => {
            let _ = writeln!(
                out,
                "  {:<32} {:>7.3}  (bm25 {:.3} + boost {:.3})  ~{} tokens",
                entry.name, score.total, score.relevance, score.boost, entry.estimated_tokens
            );
        }
        (None, Some(_)) => {
            let _ = writeln!(out, "  {:<32} ~{} tokens", entry.name, entry.estimated_tokens);
        }
        (None, None) => {
            let _ = writeln!(out, "  {:<32} (not registered)", entry.name);
        }
    }
}

pub fn render_result(result: &LayeredResult) -> String {
    let mut out = String::new();
    if !result.layer1.is_empty() {
        out.push_str("Essential:\n");
        for entry in &result.layer1 {
            entry_line(&mut out, entry);
        }
    }
    if result.layer2.is_empty() {
        out.push_str("Matched: none\n");
    } else {
        out.push_str("Matched:\n");
        for entry in &result.layer2 {
            entry_line(&mut out, entry);
        }
    }
    let _ = writeln!(
        out,
        "{} more tool(s) available via search; ~{} tokens returned",
        result.layer3_count, result.estimated_tokens
    );
    out
}

pub fn render_stats(stats: &LoaderStats) -> String {
    format!(
        "tools:           {}\n\
         indexed terms:   {}\n\
         avg doc length:  {:.2}\n\
         catalog version: {}\n",
        stats.tools, stats.indexed_terms, stats.avg_doc_len, stats.catalog_version
    )
}
