/// Errors produced by the `algobank-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// An algorithm name was not a lowercase slug.
    #[error("invalid algorithm name '{value}': only lowercase letters, digits and hyphens are allowed")]
    InvalidName { value: String },

    /// A version number was zero.
    #[error("invalid version {value}: versions start at 1")]
    InvalidVersion { value: u32 },

    /// The next version number does not fit in a `u32`.
    #[error("version overflow after {last}")]
    VersionOverflow { last: u32 },

    /// A reducer literal outside the closed set.
    #[error("unknown reducer '{value}': expected one of COUNT, SUM")]
    UnknownReducer { value: String },

    /// A submitted code payload could not be decoded into UTF-8 text.
    #[error("malformed code payload: {reason}")]
    Decode { reason: String },

    /// A digest string was not 64 hex characters.
    #[error("invalid content digest: {reason}")]
    InvalidDigest { reason: String },
}
