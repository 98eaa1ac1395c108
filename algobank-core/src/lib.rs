//! Core types for the algorithm bank.
//!
//! Defines algorithm names and versions, submitted and stored algorithm
//! shapes, the transport codec, the code policy, and the lexical source
//! analyzer that inspects submitted scripts without executing them.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod algorithm;
pub mod analyzer;
pub mod codec;
pub mod error;
pub mod id;
pub mod policy;
pub mod samples;

pub use algorithm::{
    AlgorithmDraft, AlgorithmSubmission, ArtifactRef, LatestVersion, MainCode, MainCodeSubmission,
    PrivacyCode, PrivacyCodeSubmission, ReducerKind, RetrievedAlgorithm, RetrievedMainCode,
    RetrievedPrivacyCode, StoredMainCode, StoredPrivacyCode, StoredRecord,
};
pub use analyzer::{LexicalScanner, SourceScanner, SourceViolation};
pub use codec::{Base64Codec, TransportCodec};
pub use error::CoreError;
pub use id::{AlgoName, ArtifactKey, CodeRole, ContentDigest, Version};
pub use policy::CodePolicy;
