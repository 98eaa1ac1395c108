//! Fuzz target: decoding a create/update body into a draft.
//!
//! Arbitrary bytes go through JSON parsing, typed submission parsing and
//! payload decoding. Errors are expected; panics are not.

#![no_main]

use algobank_core::{AlgorithmSubmission, Base64Codec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(submission) = serde_json::from_value::<AlgorithmSubmission>(body) else {
        return;
    };
    let _ = submission.decode(&Base64Codec);
});
