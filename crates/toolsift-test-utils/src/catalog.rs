//! Tool catalog fixtures.
//!
//! [`scenario_tools`] is the small three-tool catalog most loader tests
//! start from; [`synthetic_catalog`] generates larger catalogs with a
//! predictable vocabulary for scale and concurrency tests.

use toolsift_core::ToolDescriptor;

/// `read_file`, `write_file`, and `slack_send`.
pub fn scenario_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("read_file", "read a file from disk").with_category("filesystem"),
        ToolDescriptor::new("write_file", "write a file to disk").with_category("filesystem"),
        ToolDescriptor::new("slack_send", "send a message to slack")
            .with_category("communication"),
    ]
}

/// Nouns the synthetic catalog draws descriptions from.
pub const NOUNS: &[&str] = &[
    "invoice", "ticket", "bucket", "cluster", "calendar", "contact", "branch", "pipeline",
    "spreadsheet", "webhook", "playlist", "shipment", "vault", "dashboard", "printer", "sensor",
];

/// Verbs the synthetic catalog draws descriptions from.
pub const VERBS: &[&str] = &[
    "create", "delete", "update", "list", "archive", "export", "import", "sync", "scan",
    "rotate", "approve", "assign", "render", "publish",
];

/// `n` tools named `tool_0000`, `tool_0001`, … whose descriptions combine
/// one verb and one noun, cycling through [`VERBS`] and [`NOUNS`]
/// independently so every pair eventually appears.
pub fn synthetic_catalog(n: usize) -> Vec<ToolDescriptor> {
    (0..n)
        .map(|i| {
            let verb = VERBS[i % VERBS.len()];
            let noun = NOUNS[(i / VERBS.len()) % NOUNS.len()];
            ToolDescriptor::new(format!("tool_{i:04}"), format!("{verb} a {noun} record"))
                .with_keywords(vec![noun.to_string()])
                .with_source(format!("server_{}", i % 5))
        })
        .collect()
}
