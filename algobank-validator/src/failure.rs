//! Typed rejections produced by field validators.

use std::fmt;

use serde::Serialize;

/// Why a field was rejected, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The record collection could not be queried.
    Internal,
    /// Malformed, missing, or policy-violating value.
    Invalid,
    /// The addressed algorithm does not exist.
    NotFound,
    /// The algorithm to create already exists.
    Conflict,
}

/// A check's verdict before it is attributed to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: FailureKind,
    pub reasons: Vec<String>,
}

impl Rejection {
    /// A single-reason rejection of the given kind.
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reasons: vec![reason.into()],
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::Invalid, reason)
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, reason)
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::Conflict, reason)
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, reason)
    }

    /// `Ok` when `reasons` is empty, otherwise one invalid rejection carrying all of them.
    ///
    /// # Errors
    /// Returns the rejection if any reason was collected.
    pub fn invalid_if_any(reasons: Vec<String>) -> Result<(), Self> {
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(Self {
                kind: FailureKind::Invalid,
                reasons,
            })
        }
    }

    /// Attributes this rejection to `field`.
    #[must_use]
    pub fn for_field(self, field: &str) -> FieldFailure {
        FieldFailure {
            field: field.to_owned(),
            kind: self.kind,
            reasons: self.reasons,
        }
    }
}

/// One field's rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub kind: FailureKind,
    pub reasons: Vec<String>,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.reasons.join("; "))
    }
}

/// Every field failure of one rejected request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field check failed: {}", summary(.failures))]
pub struct ValidationFailure {
    pub failures: Vec<FieldFailure>,
}

fn summary(failures: &[FieldFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationFailure {
    /// The kind that decides how the whole request is answered: internal
    /// first, then invalid, then not-found, then conflict.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.failures
            .iter()
            .map(|f| f.kind)
            .min()
            .unwrap_or(FailureKind::Invalid)
    }
}
