use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::TransportCodec;
use crate::error::CoreError;
use crate::id::{AlgoName, ArtifactKey, ContentDigest, Version};

/// Declared strategy for combining distributed partial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReducerKind {
    /// Partial results are counted.
    Count,
    /// Partial results are summed.
    Sum,
}

impl ReducerKind {
    /// Every accepted reducer.
    pub const ALL: [Self; 2] = [Self::Count, Self::Sum];

    /// Wire literal for this reducer.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReducerKind::Count => "COUNT",
            ReducerKind::Sum => "SUM",
        }
    }
}

impl fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReducerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownReducer { value: s.to_owned() })
    }
}

// ── Submissions (encoded, as received) ───────────────────────────────────────

/// Main algorithm block as submitted; `code` is transport-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainCodeSubmission {
    pub code: String,
    pub class_name: String,
    pub reducer: ReducerKind,
}

/// Privacy block as submitted; `key` must match the service access key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyCodeSubmission {
    pub code: String,
    pub class_name: String,
    pub key: String,
}

/// A create or update request body after it passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmSubmission {
    pub algo_name: AlgoName,
    pub description: String,
    pub algorithm: MainCodeSubmission,
    #[serde(default)]
    pub privacy_algorithm: Option<PrivacyCodeSubmission>,
}

impl AlgorithmSubmission {
    /// Decodes every code payload, producing the draft handed to storage.
    ///
    /// The access key is checked during validation and is not carried further.
    ///
    /// # Errors
    /// Returns [`CoreError::Decode`] if any payload is not valid encoded UTF-8.
    pub fn decode(&self, codec: &dyn TransportCodec) -> Result<AlgorithmDraft, CoreError> {
        let main = MainCode {
            source: codec.decode(&self.algorithm.code)?,
            class_name: self.algorithm.class_name.clone(),
            reducer: self.algorithm.reducer,
        };
        let privacy = self
            .privacy_algorithm
            .as_ref()
            .map(|p| {
                Ok::<_, CoreError>(PrivacyCode {
                    source: codec.decode(&p.code)?,
                    class_name: p.class_name.clone(),
                })
            })
            .transpose()?;
        Ok(AlgorithmDraft {
            name: self.algo_name.clone(),
            description: self.description.clone(),
            main,
            privacy,
        })
    }
}

// ── Drafts (decoded, ready to persist) ───────────────────────────────────────

/// Decoded main algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainCode {
    pub source: String,
    pub class_name: String,
    pub reducer: ReducerKind,
}

/// Decoded privacy script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyCode {
    pub source: String,
    pub class_name: String,
}

/// Everything needed to write one new version of an algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmDraft {
    pub name: AlgoName,
    pub description: String,
    pub main: MainCode,
    pub privacy: Option<PrivacyCode>,
}

// ── Stored records ───────────────────────────────────────────────────────────

/// Pointer to one persisted source text and the digest it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub key: ArtifactKey,
    pub digest: ContentDigest,
}

/// Main algorithm reference inside a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMainCode {
    pub artifact: ArtifactRef,
    pub class_name: String,
    pub reducer: ReducerKind,
}

/// Privacy script reference inside a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPrivacyCode {
    pub artifact: ArtifactRef,
    pub class_name: String,
}

/// One `(name, version)` entry of the record collection.
///
/// Records are immutable once inserted; a new version is always a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub algo_name: AlgoName,
    pub version: Version,
    pub description: String,
    pub algorithm: StoredMainCode,
    pub privacy_algorithm: Option<StoredPrivacyCode>,
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Artifact keys backing this record, main first.
    #[must_use]
    pub fn artifact_keys(&self) -> Vec<&ArtifactKey> {
        let mut keys = vec![&self.algorithm.artifact.key];
        if let Some(privacy) = &self.privacy_algorithm {
            keys.push(&privacy.artifact.key);
        }
        keys
    }
}

// ── Read models ──────────────────────────────────────────────────────────────

/// Main algorithm with its source text inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedMainCode {
    pub code: String,
    pub class_name: String,
    pub reducer: ReducerKind,
}

/// Privacy script with its source text inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedPrivacyCode {
    pub code: String,
    pub class_name: String,
}

/// A stored record with artifact text read back in place of the references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedAlgorithm {
    pub algo_name: AlgoName,
    pub version: Version,
    pub description: String,
    pub algorithm: RetrievedMainCode,
    pub privacy_algorithm: Option<RetrievedPrivacyCode>,
    pub created_at: DateTime<Utc>,
}

/// One row of the listing: a name and its current latest version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestVersion {
    pub algo_name: AlgoName,
    pub version: Version,
}
