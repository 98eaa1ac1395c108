//! Fuzz target: full policy analysis of arbitrary source text.
//!
//! The first line of the input is used as the class name so that odd
//! identifiers reach the class pattern builder as well.

#![no_main]

use algobank_core::{CodePolicy, LexicalScanner, SourceScanner};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (class_name, source) = text.split_once('\n').unwrap_or((text, ""));
    let scanner = LexicalScanner::new();
    for policy in [CodePolicy::main(), CodePolicy::privacy()] {
        let _ = scanner.analyze(source, &policy, class_name);
    }
});
