//! Fuzz target: `ContentDigest` hex display and JSON round trip.

#![no_main]

use algobank_core::ContentDigest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() != 32 {
        return;
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(data);
    let digest = ContentDigest::new(bytes);

    let hex = digest.to_string();
    assert_eq!(hex.len(), 64, "digest must display as 64 hex chars");

    let json = serde_json::to_string(&digest).expect("digest serialization must not fail");
    let back: ContentDigest =
        serde_json::from_str(&json).expect("digest deserialization must not fail");
    assert_eq!(back, digest);
});
