//! Library and base-class policy applied to one kind of code block.

use serde::{Deserialize, Serialize};

/// Library every submitted script must be built on.
pub const SANDBOX_HELPER_LIBRARY: &str = "opalalgorithms";

/// Libraries no submitted script may import.
pub const DEFAULT_FORBIDDEN_LIBRARIES: &[&str] = &["multiprocessing"];

/// Base class the main algorithm's entry class must derive from.
pub const MAIN_BASE_CLASS: &str = "OPALAlgorithm";

/// Base class the privacy script's entry class must derive from.
pub const PRIVACY_BASE_CLASS: &str = "OPALPrivacy";

/// What a code block may import, must import, and must derive from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePolicy {
    pub forbidden_libraries: Vec<String>,
    pub required_libraries: Vec<String>,
    pub base_class: String,
}

impl CodePolicy {
    /// Policy with the default library lists and the given base class.
    pub fn with_base_class(base_class: impl Into<String>) -> Self {
        Self {
            forbidden_libraries: DEFAULT_FORBIDDEN_LIBRARIES
                .iter()
                .map(|&lib| lib.to_owned())
                .collect(),
            required_libraries: vec![SANDBOX_HELPER_LIBRARY.to_owned()],
            base_class: base_class.into(),
        }
    }

    /// Default policy for the main algorithm.
    #[must_use]
    pub fn main() -> Self {
        Self::with_base_class(MAIN_BASE_CLASS)
    }

    /// Default policy for the privacy script.
    #[must_use]
    pub fn privacy() -> Self {
        Self::with_base_class(PRIVACY_BASE_CLASS)
    }

    /// Replaces the forbidden library list.
    #[must_use]
    pub fn forbidding(mut self, libraries: Vec<String>) -> Self {
        self.forbidden_libraries = libraries;
        self
    }

    /// Replaces the required library list.
    #[must_use]
    pub fn requiring(mut self, libraries: Vec<String>) -> Self {
        self.required_libraries = libraries;
        self
    }
}
