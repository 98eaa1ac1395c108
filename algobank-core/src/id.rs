use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::CoreError;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("algorithm name pattern is valid"));

/// Unique, immutable name of an algorithm (e.g. `"pop-density"`).
///
/// Always a non-empty slug of lowercase ASCII letters, digits and hyphens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlgoName(String);

impl AlgoName {
    /// Parses a name, rejecting anything that is not a lowercase slug.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidName`] if `value` does not match `^[a-z0-9-]+$`.
    pub fn parse(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if !Self::is_valid(&value) {
            return Err(CoreError::InvalidName { value });
        }
        Ok(Self(value))
    }

    /// Returns `true` if `value` is an acceptable algorithm name.
    #[must_use]
    pub fn is_valid(value: &str) -> bool {
        NAME_RE.is_match(value)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlgoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AlgoName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AlgoName> for String {
    fn from(name: AlgoName) -> Self {
        name.0
    }
}

/// Version number of one stored record. Starts at 1 and only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Version(u32);

impl Version {
    /// Version assigned by a create.
    pub const FIRST: Self = Self(1);

    /// Creates a version from a raw number.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidVersion`] for `0`.
    pub const fn new(value: u32) -> Result<Self, CoreError> {
        if value == 0 {
            return Err(CoreError::InvalidVersion { value });
        }
        Ok(Self(value))
    }

    /// Returns the raw number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the version that follows this one.
    ///
    /// # Errors
    /// Returns [`CoreError::VersionOverflow`] at `u32::MAX`.
    pub fn next(self) -> Result<Self, CoreError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(CoreError::VersionOverflow { last: self.0 })
    }

    /// The version that follows `latest`, or [`Version::FIRST`] when there is none.
    ///
    /// # Errors
    /// Returns [`CoreError::VersionOverflow`] if `latest` is `u32::MAX`.
    pub fn after(latest: Option<Self>) -> Result<Self, CoreError> {
        latest.map_or(Ok(Self::FIRST), Self::next)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Version {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Version> for u32 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// Which code block of a record an artifact backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeRole {
    /// The main algorithm script.
    Main,
    /// The optional privacy script.
    Privacy,
}

impl CodeRole {
    fn file_prefix(self) -> &'static str {
        match self {
            CodeRole::Main => "v",
            CodeRole::Privacy => "privacy_v",
        }
    }
}

/// Storage-relative key of one persisted source text.
///
/// Layout: `<name>/<prefix><version>-<token>.py`. The random token keeps two
/// writers racing for the same version from clobbering each other's file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Builds a fresh key for one code block of `(name, version)`.
    #[must_use]
    pub fn generate(name: &AlgoName, version: Version, role: CodeRole) -> Self {
        Self(format!(
            "{name}/{prefix}{version}-{token}.py",
            prefix = role.file_prefix(),
            token = Uuid::new_v4().simple(),
        ))
    }

    /// Wraps an existing key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A SHA-256 digest of an artifact's text, serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Creates a `ContentDigest` from a raw 32-byte array.
    #[must_use]
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digests `text`.
    #[must_use]
    pub fn of(text: &str) -> Self {
        Self(Sha256::digest(text.as_bytes()).into())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_string()
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = CoreError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        if hex.len() != 64 || !hex.is_ascii() {
            return Err(CoreError::InvalidDigest {
                reason: format!("expected 64 hex characters, got {}", hex.len()),
            });
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|e| {
                CoreError::InvalidDigest { reason: e.to_string() }
            })?;
        }
        Ok(Self(bytes))
    }
}
