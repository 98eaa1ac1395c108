//! Request kinds and the loosely typed request data validators inspect.

use std::fmt;

use serde_json::Value;

/// The operation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestKind {
    Create,
    Update,
    List,
    Retrieve,
    Delete,
}

impl RequestKind {
    /// Every request kind.
    pub const ALL: [Self; 5] = [
        Self::Create,
        Self::Update,
        Self::List,
        Self::Retrieve,
        Self::Delete,
    ];

    /// Lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Create => "create",
            RequestKind::Update => "update",
            RequestKind::List => "list",
            RequestKind::Retrieve => "retrieve",
            RequestKind::Delete => "delete",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a validator may look at for one request.
///
/// The body stays untyped JSON so that a field of the wrong type is reported
/// against that field instead of failing the whole body.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub kind: RequestKind,
    pub body: Value,
    /// Name taken from the path (retrieve/delete).
    pub path_name: Option<String>,
    /// Version taken from the path (retrieve/delete).
    pub path_version: Option<u32>,
}

impl ValidationRequest {
    /// A request carrying a JSON body (create/update).
    #[must_use]
    pub fn with_body(kind: RequestKind, body: Value) -> Self {
        Self {
            kind,
            body,
            path_name: None,
            path_version: None,
        }
    }

    /// A request addressed by path parameters (retrieve/delete).
    pub fn with_path(kind: RequestKind, name: impl Into<String>, version: Option<u32>) -> Self {
        Self {
            kind,
            body: Value::Null,
            path_name: Some(name.into()),
            path_version: version,
        }
    }

    /// A request with no data at all (list).
    #[must_use]
    pub fn bare(kind: RequestKind) -> Self {
        Self::with_body(kind, Value::Null)
    }

    /// A body field, with JSON `null` treated as absent.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name).filter(|v| !v.is_null())
    }
}
