//! Fuzz target for tokenization, query processing, and search.
//!
//! Run with: cargo +nightly fuzz run fuzz_query
//!
//! Arbitrary text is used both as a tool description and as a query. Token
//! invariants are checked directly; the search must never panic.

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use toolsift_config::SelectorConfig;
use toolsift_core::context::tokenizer::is_stop_word;
use toolsift_core::context::{QueryProcessor, tokenize};
use toolsift_core::{ToolDescriptor, ToolLoader};

fn loader() -> &'static ToolLoader {
    static LOADER: OnceLock<ToolLoader> = OnceLock::new();
    LOADER.get_or_init(|| {
        let config = SelectorConfig {
            essential_tools: vec!["read_file".to_string()],
            ..SelectorConfig::default()
        };
        let loader = ToolLoader::new(config).expect("default config is valid");
        loader
            .register_tools(vec![
                ToolDescriptor::new("read_file", "read a file from disk"),
                ToolDescriptor::new("write_file", "write a file to disk"),
                ToolDescriptor::new("slack_send", "send a message to slack"),
            ])
            .expect("static catalog is valid");
        loader
    })
}

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    for token in tokenize(&text) {
        assert!(token.chars().count() >= 3);
        assert!(!is_stop_word(&token));
        assert!(!token.chars().any(char::is_whitespace));
    }

    let processed = QueryProcessor::new().process(&text);
    assert_eq!(processed.is_empty(), processed.tokens.is_empty());

    let loader = loader();
    let result = loader.search(&text, 5, 4000).expect("budget is non-zero");
    assert_eq!(result.layer1_names(), vec!["read_file"]);
    assert!(result.len() <= 5);

    let name = format!("fuzz_{}", data.len() % 4);
    let _ = loader.register_tools(vec![ToolDescriptor::new(name, text.as_ref())]);
});
