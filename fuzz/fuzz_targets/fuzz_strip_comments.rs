//! Fuzz target: comment stripping over arbitrary source text.
//!
//! Stripping must never panic and never grow the text.

#![no_main]

use algobank_core::{LexicalScanner, SourceScanner};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let stripped = LexicalScanner::new().strip_comments(text);
    assert!(stripped.len() <= text.len(), "stripping must not grow the text");
});
