//! Error types for the store crate.

use algobank_core::{AlgoName, ArtifactKey, CoreError, Version};

/// Errors that can occur while reading or writing versioned algorithms.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No record exists for the name.
    #[error("algorithm {name} not found")]
    NotFound { name: AlgoName },

    /// The name exists but not at this version.
    #[error("algorithm {name} has no version {version}")]
    VersionNotFound { name: AlgoName, version: Version },

    /// A create targeted a name that already has records.
    #[error("algorithm {name} already exists")]
    AlreadyExists { name: AlgoName },

    /// A conditional insert found a different latest version than expected.
    #[error("version conflict on {name}: expected latest {expected:?}, found {actual:?}")]
    VersionConflict {
        name: AlgoName,
        expected: Option<Version>,
        actual: Option<Version>,
    },

    /// An artifact referenced by a record is missing from the artifact store.
    #[error("artifact {key} not found")]
    ArtifactNotFound { key: ArtifactKey },

    /// An artifact key would resolve outside the storage root.
    #[error("artifact key {key} escapes the storage root")]
    ArtifactEscapesRoot { key: ArtifactKey },

    /// Artifact text no longer matches the digest recorded at write time.
    #[error("artifact {key} does not match its recorded digest")]
    DigestMismatch { key: ArtifactKey },

    /// A domain invariant failed (e.g. version overflow).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// `true` for lookups that found nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::VersionNotFound { .. })
    }

    /// `true` for name or version collisions.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::VersionConflict { .. })
    }
}
