//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! Feeds arbitrary text through `AppConfig::parse()`; any config that passes
//! validation must also be accepted by the tool loader.

#![no_main]

use libfuzzer_sys::fuzz_target;
use toolsift_config::AppConfig;
use toolsift_core::ToolLoader;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = AppConfig::parse(s) {
        assert!(ToolLoader::new(config.selector).is_ok());
    }
});
